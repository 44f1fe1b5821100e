//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + --set overrides
//!     → loader.rs (parse & flatten to dotted keys)
//!     → validation.rs (every known setting must parse)
//!     → ConfigSnapshot (immutable key → value map)
//!     → schema.rs Setting<T> descriptors give typed reads with defaults
//! ```
//!
//! # Design Decisions
//! - Snapshot is immutable once loaded
//! - Absent keys resolve to the setting's documented default
//! - Validation separates syntactic (toml) from semantic checks

pub mod loader;
pub mod schema;
pub mod snapshot;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{Setting, SettingDescription, Settings};
pub use snapshot::ConfigSnapshot;
