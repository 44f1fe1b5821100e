//! Data protocol server extension.
//!
//! # Responsibilities
//! - Decide from configuration whether the server exists at all
//! - Wire the session environment and the socket transport in order
//! - Present both to the host as one start/stop unit
//!
//! # Design Decisions
//! - Disabled means inert, not absent: the host never branches on the flag
//! - The transport only reaches the database through the session layer
//! - Building touches no resources; sockets open on `start()`

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ConfigSnapshot, Settings};
use crate::database::GraphDatabase;
use crate::lifecycle::{Lifecycle, LifecycleContainer, LifecycleError};
use crate::session::{Sessions, StandardSessions};
use crate::transport::{SocketTransport, TransportSettings};

/// Name the host registers the extension under.
pub const EXTENSION_NAME: &str = "data-protocol-server";

/// Component names inside the extension's container, in start order.
pub const SESSIONS_COMPONENT: &str = "sessions";
pub const TRANSPORT_COMPONENT: &str = "socket-transport";

/// Collaborators the host provides to the extension.
#[derive(Debug, Clone)]
pub struct ExtensionDependencies {
    pub database: Arc<dyn GraphDatabase>,
}

impl ExtensionDependencies {
    pub fn new(database: Arc<dyn GraphDatabase>) -> Self {
        Self { database }
    }
}

/// Handle returned to the host.
#[derive(Debug)]
pub enum ExtensionHandle {
    /// Disabled by configuration; start and stop do nothing.
    Inert,
    /// Enabled: sessions then transport.
    Live(LifecycleContainer),
}

impl ExtensionHandle {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ExtensionHandle::Live(_))
    }

    /// Names of the wrapped components, in start order.
    pub fn component_names(&self) -> Vec<&str> {
        match self {
            ExtensionHandle::Inert => Vec::new(),
            ExtensionHandle::Live(life) => life.component_names(),
        }
    }

    pub fn container(&self) -> Option<&LifecycleContainer> {
        match self {
            ExtensionHandle::Inert => None,
            ExtensionHandle::Live(life) => Some(life),
        }
    }
}

#[async_trait]
impl Lifecycle for ExtensionHandle {
    async fn start(&self) -> Result<(), LifecycleError> {
        match self {
            ExtensionHandle::Inert => Ok(()),
            ExtensionHandle::Live(life) => life.activate().await,
        }
    }

    async fn stop(&self) -> Result<(), LifecycleError> {
        match self {
            ExtensionHandle::Inert => Ok(()),
            ExtensionHandle::Live(life) => life.deactivate().await,
        }
    }
}

/// Build the extension from a configuration snapshot.
///
/// Every setting is parsed before anything is constructed, so a malformed
/// value surfaces here as [`LifecycleError::Configuration`].
pub fn build(
    config: &ConfigSnapshot,
    dependencies: &ExtensionDependencies,
) -> Result<ExtensionHandle, LifecycleError> {
    if !config.get(&Settings::ENABLED)? {
        return Ok(ExtensionHandle::Inert);
    }

    let address = config.get(&Settings::ADDRESS)?;
    let settings = TransportSettings::from_config(config)?;

    let mut life = LifecycleContainer::new(EXTENSION_NAME);
    let sessions = life.register(
        SESSIONS_COMPONENT,
        Arc::new(StandardSessions::new(Arc::clone(&dependencies.database))),
    )?;
    let sessions: Arc<dyn Sessions> = sessions;
    life.register(
        TRANSPORT_COMPONENT,
        Arc::new(SocketTransport::new(address.clone(), settings, sessions)),
    )?;

    tracing::info!(
        address = %address,
        database = %dependencies.database.name(),
        "Data protocol server extension loaded"
    );
    Ok(ExtensionHandle::Live(life))
}
