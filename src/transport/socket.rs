//! Socket transport.
//!
//! # Responsibilities
//! - Bind the configured address on start (never earlier)
//! - Run the accept loop on a background task
//! - Give each connection its own session and task
//! - On stop: stop accepting, release the port, drain connections
//!
//! # Design Decisions
//! - `start()` returns as soon as the socket is listening
//! - Connection tasks watch the same shutdown signal as the accept loop
//! - Drain is bounded by `shutdown_timeout`; overrun is a release error

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::{ConfigSnapshot, Settings};
use crate::lifecycle::{Lifecycle, LifecycleError, Shutdown, ShutdownSignal};
use crate::net::{ConnectionGuard, ConnectionPermit, ConnectionTracker, HostnamePort, Listener, ListenerError};
use crate::observability::metrics;
use crate::session::Sessions;

/// Name used in lifecycle errors.
const COMPONENT: &str = "socket-transport";

/// Read buffer size per connection.
const READ_BUFFER_BYTES: usize = 8 * 1024;

/// Pause after a failed accept before trying again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Tunables for [`SocketTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    pub max_connections: usize,
    pub shutdown_timeout: Duration,
}

impl TransportSettings {
    /// Read the transport settings from `config`.
    pub fn from_config(config: &ConfigSnapshot) -> Result<Self, LifecycleError> {
        Ok(Self {
            max_connections: config.get(&Settings::MAX_CONNECTIONS)?,
            shutdown_timeout: Duration::from_millis(config.get(&Settings::SHUTDOWN_TIMEOUT_MS)?),
        })
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            max_connections: 10_000,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

struct Running {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    tracker: ConnectionTracker,
    accept_task: JoinHandle<()>,
}

/// TCP transport that routes every connection into a session.
pub struct SocketTransport {
    address: HostnamePort,
    settings: TransportSettings,
    sessions: Arc<dyn Sessions>,
    running: Mutex<Option<Running>>,
}

impl SocketTransport {
    pub fn new(address: HostnamePort, settings: TransportSettings, sessions: Arc<dyn Sessions>) -> Self {
        Self {
            address,
            settings,
            sessions,
            running: Mutex::new(None),
        }
    }

    /// Configured address.
    pub fn address(&self) -> &HostnamePort {
        &self.address
    }

    /// Address actually bound, while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.local_addr)
    }

    /// Open connections, while running.
    pub async fn active_connections(&self) -> u64 {
        self.running
            .lock()
            .await
            .as_ref()
            .map_or(0, |r| r.tracker.active_count())
    }
}

#[async_trait]
impl Lifecycle for SocketTransport {
    async fn start(&self) -> Result<(), LifecycleError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(LifecycleError::invalid_state(
                COMPONENT,
                "start",
                crate::lifecycle::ComponentState::Running,
            ));
        }

        let listener = Listener::bind(&self.address, self.settings.max_connections)
            .await
            .map_err(|e| bind_error(&self.address, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| LifecycleError::Bind {
                address: self.address.to_string(),
                source,
            })?;

        let shutdown = Shutdown::new();
        let tracker = ConnectionTracker::new();
        let accept_task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&self.sessions),
            tracker.clone(),
            shutdown.clone(),
        ));

        tracing::info!(address = %local_addr, "Socket transport listening");
        *running = Some(Running {
            local_addr,
            shutdown,
            tracker,
            accept_task,
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), LifecycleError> {
        let Some(running) = self.running.lock().await.take() else {
            return Ok(());
        };

        running.shutdown.trigger();

        // The listener is owned by the accept task; once it has returned the
        // port is released.
        if let Err(e) = running.accept_task.await {
            return Err(LifecycleError::ResourceRelease {
                component: COMPONENT.to_string(),
                reason: format!("accept loop terminated abnormally: {}", e),
            });
        }

        let drained =
            tokio::time::timeout(self.settings.shutdown_timeout, running.tracker.wait_for_drain()).await;
        if drained.is_err() {
            return Err(LifecycleError::ResourceRelease {
                component: COMPONENT.to_string(),
                reason: format!(
                    "{} connection(s) still open after {:?}",
                    running.tracker.active_count(),
                    self.settings.shutdown_timeout
                ),
            });
        }

        tracing::info!(address = %running.local_addr, "Socket transport stopped");
        Ok(())
    }
}

fn bind_error(address: &HostnamePort, error: ListenerError) -> LifecycleError {
    let source = match error {
        ListenerError::Bind(e) | ListenerError::Accept(e) => e,
    };
    LifecycleError::Bind {
        address: address.to_string(),
        source,
    }
}

async fn accept_loop(
    listener: Listener,
    sessions: Arc<dyn Sessions>,
    tracker: ConnectionTracker,
    shutdown: Shutdown,
) {
    let mut signal = shutdown.subscribe();
    loop {
        tokio::select! {
            _ = signal.recv() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer, permit)) => {
                    metrics::record_connection_accepted();
                    let guard = tracker.track();
                    tokio::spawn(serve_connection(
                        stream,
                        peer,
                        Arc::clone(&sessions),
                        shutdown.subscribe(),
                        guard,
                        permit,
                    ));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            },
        }
    }
    tracing::debug!("Accept loop finished");
}

async fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    sessions: Arc<dyn Sessions>,
    mut signal: ShutdownSignal,
    guard: ConnectionGuard,
    _permit: ConnectionPermit,
) {
    let session = match sessions.open_session(peer) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(connection_id = %guard.id(), peer = %peer, error = %e, "Rejecting connection");
            return;
        }
    };

    let mut buf = vec![0u8; READ_BUFFER_BYTES];
    loop {
        tokio::select! {
            _ = signal.recv() => break,
            read = stream.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => {
                    if let Err(e) = sessions.dispatch(session, &buf[..n]) {
                        tracing::debug!(session = %session, error = %e, "Dispatch rejected");
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(connection_id = %guard.id(), error = %e, "Read failed");
                    break;
                }
            },
        }
    }

    sessions.close_session(session);
}
