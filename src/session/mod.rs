//! Session environment.
//!
//! # Data Flow
//! ```text
//! transport accepts connection
//!     → open_session(peer)     (requires a running environment)
//!     → dispatch(id, bytes)*   (per read)
//!     → close_session(id)      (EOF, error, or shutdown)
//! ```
//!
//! # Design Decisions
//! - The transport sees only the `Sessions` trait, never the database
//! - Stopping the environment closes every remaining session
//! - Execution semantics live behind `dispatch` and are not modelled here

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;
use uuid::Uuid;

pub mod standard;

pub use standard::{SessionInfo, StandardSessions};

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Errors returned by a session environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The environment has not been started or has been stopped.
    #[error("Session environment is not running")]
    NotRunning,

    /// No open session with this ID.
    #[error("Unknown session {0}")]
    UnknownSession(SessionId),
}

/// Session layer consumed by transports.
pub trait Sessions: Send + Sync {
    /// Open a session for a newly accepted peer.
    fn open_session(&self, peer: SocketAddr) -> Result<SessionId, SessionError>;

    /// Hand raw input received on the session's connection to the session.
    fn dispatch(&self, id: SessionId, input: &[u8]) -> Result<(), SessionError>;

    /// Close a session. Returns false if it was already gone.
    fn close_session(&self, id: SessionId) -> bool;

    /// Number of open sessions.
    fn active_sessions(&self) -> usize;
}
