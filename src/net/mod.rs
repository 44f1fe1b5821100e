//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! HostnamePort (address.rs, from configuration)
//!     → listener.rs (bind, accept, connection limits)
//!     → connection.rs (tracking for graceful shutdown)
//!     → hand off to the transport's per-connection task
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each connection tracked so stop can wait for drain

pub mod address;
pub mod connection;
pub mod listener;

pub use address::HostnamePort;
pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{ConnectionPermit, Listener, ListenerError};
