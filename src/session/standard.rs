//! Default in-process session environment.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::database::GraphDatabase;
use crate::lifecycle::{ComponentState, Lifecycle, LifecycleError};
use crate::observability::metrics;
use crate::session::{SessionError, SessionId, Sessions};

/// Bookkeeping for one open session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub peer: SocketAddr,
    pub opened_at: Instant,
    pub bytes_received: u64,
}

/// Session table bound to a database.
///
/// Sessions can only be opened between `start()` and `stop()`.
#[derive(Debug)]
pub struct StandardSessions {
    database: Arc<dyn GraphDatabase>,
    sessions: DashMap<SessionId, SessionInfo>,
    running: AtomicBool,
}

impl StandardSessions {
    pub fn new(database: Arc<dyn GraphDatabase>) -> Self {
        Self {
            database,
            sessions: DashMap::new(),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Snapshot of one session's bookkeeping.
    pub fn session(&self, id: SessionId) -> Option<SessionInfo> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    pub fn database(&self) -> &Arc<dyn GraphDatabase> {
        &self.database
    }
}

impl Sessions for StandardSessions {
    fn open_session(&self, peer: SocketAddr) -> Result<SessionId, SessionError> {
        if !self.is_running() {
            return Err(SessionError::NotRunning);
        }

        let id = SessionId::new();
        self.sessions.insert(
            id,
            SessionInfo {
                peer,
                opened_at: Instant::now(),
                bytes_received: 0,
            },
        );

        // A concurrent stop() may have cleared the table before the insert.
        if !self.is_running() {
            self.sessions.remove(&id);
            return Err(SessionError::NotRunning);
        }

        metrics::record_active_sessions(self.sessions.len());
        tracing::debug!(session = %id, peer = %peer, "Session opened");
        Ok(id)
    }

    fn dispatch(&self, id: SessionId, input: &[u8]) -> Result<(), SessionError> {
        if !self.is_running() {
            return Err(SessionError::NotRunning);
        }

        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or(SessionError::UnknownSession(id))?;
        entry.bytes_received += input.len() as u64;
        Ok(())
    }

    fn close_session(&self, id: SessionId) -> bool {
        let removed = self.sessions.remove(&id);
        metrics::record_active_sessions(self.sessions.len());
        if let Some((_, info)) = &removed {
            tracing::debug!(
                session = %id,
                peer = %info.peer,
                bytes_received = info.bytes_received,
                open_ms = info.opened_at.elapsed().as_millis() as u64,
                "Session closed"
            );
        }
        removed.is_some()
    }

    fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl Lifecycle for StandardSessions {
    async fn start(&self) -> Result<(), LifecycleError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(LifecycleError::invalid_state(
                "sessions",
                "start",
                ComponentState::Running,
            ));
        }
        tracing::debug!(database = %self.database.name(), "Session environment started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), LifecycleError> {
        self.running.store(false, Ordering::SeqCst);

        let open = self.sessions.len();
        self.sessions.clear();
        metrics::record_active_sessions(0);

        if open > 0 {
            tracing::info!(sessions = open, "Closed remaining sessions");
        }
        tracing::debug!(database = %self.database.name(), "Session environment stopped");
        Ok(())
    }
}
