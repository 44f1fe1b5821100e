//! Component handles and their state machine.
//!
//! # States
//! ```text
//! Unstarted ──start ok──▶ Running ──stop──▶ Stopped
//!     │                                        ▲
//!     ├──start err──▶ Failed ──stop────────────┤
//!     └──stop (no-op)──────────────────────────┘
//! ```
//!
//! # Design Decisions
//! - Transitions are driven only by the owning container
//! - Second `start()` is a usage bug and fails with `InvalidState`
//! - `stop()` on a stopped handle is a no-op

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::lifecycle::error::LifecycleError;
use crate::observability::metrics;

/// Start/stop capability of one subsystem instance.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Acquire the subsystem's resources.
    async fn start(&self) -> Result<(), LifecycleError>;

    /// Release everything acquired by `start()`.
    ///
    /// Resources that are already absent are not an error.
    async fn stop(&self) -> Result<(), LifecycleError>;
}

/// Lifecycle state of a component or container.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    Unstarted = 0,
    Running = 1,
    Stopped = 2,
    Failed = 3,
}

impl From<u8> for ComponentState {
    fn from(val: u8) -> Self {
        match val {
            1 => ComponentState::Running,
            2 => ComponentState::Stopped,
            3 => ComponentState::Failed,
            _ => ComponentState::Unstarted,
        }
    }
}

impl ComponentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentState::Unstarted => "unstarted",
            ComponentState::Running => "running",
            ComponentState::Stopped => "stopped",
            ComponentState::Failed => "failed",
        }
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic cell holding a [`ComponentState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(ComponentState::Unstarted as u8))
    }

    pub(crate) fn get(&self) -> ComponentState {
        ComponentState::from(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, component: &str, state: ComponentState) {
        self.0.store(state as u8, Ordering::SeqCst);
        metrics::record_transition(component, state);
        tracing::debug!(component = %component, state = %state, "Lifecycle transition");
    }
}

/// A named component registered in a container.
pub struct ComponentHandle {
    name: String,
    component: Arc<dyn Lifecycle>,
    state: StateCell,
}

impl ComponentHandle {
    /// Wrap `component` in an unstarted handle.
    pub fn new(name: impl Into<String>, component: Arc<dyn Lifecycle>) -> Self {
        Self {
            name: name.into(),
            component,
            state: StateCell::new(),
        }
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state.
    pub fn state(&self) -> ComponentState {
        self.state.get()
    }

    /// Whether this handle wraps the same allocation as `other`.
    pub fn wraps(&self, other: &Arc<dyn Lifecycle>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.component), Arc::as_ptr(other))
    }

    /// Start the wrapped component. Only valid once, from `Unstarted`.
    pub async fn start(&self) -> Result<(), LifecycleError> {
        let current = self.state();
        if current != ComponentState::Unstarted {
            return Err(LifecycleError::invalid_state(&self.name, "start", current));
        }

        match self.component.start().await {
            Ok(()) => {
                self.state.set(&self.name, ComponentState::Running);
                Ok(())
            }
            Err(e) => {
                self.state.set(&self.name, ComponentState::Failed);
                Err(e)
            }
        }
    }

    /// Stop the wrapped component.
    ///
    /// Unstarted and stopped handles are not touched. The handle ends up
    /// `Stopped` even if the inner stop reports an error.
    pub async fn stop(&self) -> Result<(), LifecycleError> {
        match self.state() {
            ComponentState::Stopped => Ok(()),
            ComponentState::Unstarted => {
                self.state.set(&self.name, ComponentState::Stopped);
                Ok(())
            }
            ComponentState::Running | ComponentState::Failed => {
                let result = self.component.stop().await;
                self.state.set(&self.name, ComponentState::Stopped);
                result
            }
        }
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}
