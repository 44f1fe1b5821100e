//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (container.rs):
//!     register(a) → register(b) → ... (dependency order)
//!
//! Startup:
//!     activate → start a → start b → ...
//!     start k fails → stop k-1 .. 0 → Failed (terminal)
//!
//! Shutdown:
//!     deactivate → stop started prefix in reverse → aggregate failures
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → host calls deactivate
//! ```
//!
//! # Design Decisions
//! - Ordering is encoded once in the container, not per component pair
//! - A container is itself a component, so containers nest
//! - Background tasks stop through the `Shutdown` coordinator

pub mod component;
pub mod container;
pub mod error;
pub mod shutdown;
pub mod signals;

pub use component::{ComponentHandle, ComponentState, Lifecycle};
pub use container::LifecycleContainer;
pub use error::{ComponentFailure, LifecycleError};
pub use shutdown::{Shutdown, ShutdownSignal};
