//! Data protocol server extension library.

pub mod config;
pub mod database;
pub mod extension;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod session;
pub mod transport;

pub use config::ConfigSnapshot;
pub use database::{EmbeddedDatabase, GraphDatabase};
pub use extension::{build, ExtensionDependencies, ExtensionHandle, EXTENSION_NAME};
pub use lifecycle::{Lifecycle, LifecycleContainer, LifecycleError};
