//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! start(): bind HostnamePort → spawn accept loop
//! accept loop: Listener::accept → per-connection task
//! per-connection task: open session → dispatch reads → close session
//! stop(): trigger Shutdown → join accept loop (port released) → drain
//! ```

pub mod socket;

pub use socket::{SocketTransport, TransportSettings};
