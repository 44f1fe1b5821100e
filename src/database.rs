//! Graph database reference supplied by the host.

use std::fmt;

/// Opaque handle to the database the sessions run against.
///
/// The extension only passes it through to the session environment; the
/// name is read for diagnostics.
pub trait GraphDatabase: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
}

/// Minimal database handle used by the standalone host binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedDatabase {
    name: String,
}

impl EmbeddedDatabase {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl GraphDatabase for EmbeddedDatabase {
    fn name(&self) -> &str {
        &self.name
    }
}
