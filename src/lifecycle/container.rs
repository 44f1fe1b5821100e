//! Ordered lifecycle container.
//!
//! # Responsibilities
//! - Hold components in registration (dependency) order
//! - Start them in order, stop them in reverse
//! - Unwind the started prefix when a start fails
//! - Collect stop failures without skipping siblings
//!
//! # Design Decisions
//! - Strictly sequential: each start/stop is awaited before the next
//! - Started components always form a prefix of the registration order
//! - A failed activation is terminal for the container

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::lifecycle::component::{ComponentHandle, ComponentState, Lifecycle, StateCell};
use crate::lifecycle::error::{ComponentFailure, LifecycleError};

/// An ordered registry of components that is itself a [`Lifecycle`].
#[derive(Debug)]
pub struct LifecycleContainer {
    name: String,
    components: Vec<ComponentHandle>,
    state: StateCell,
    /// Length of the started prefix of `components`.
    started: AtomicUsize,
}

impl LifecycleContainer {
    /// Create an empty container.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
            state: StateCell::new(),
            started: AtomicUsize::new(0),
        }
    }

    /// Append `component` after everything registered so far.
    ///
    /// Returns the component back so the caller can keep a typed reference
    /// to it (e.g. to hand it to a later dependent).
    pub fn register<T>(
        &mut self,
        name: impl Into<String>,
        component: Arc<T>,
    ) -> Result<Arc<T>, LifecycleError>
    where
        T: Lifecycle + 'static,
    {
        let name = name.into();
        let current = self.state();
        if current != ComponentState::Unstarted {
            return Err(LifecycleError::invalid_state(name, "register", current));
        }

        let erased: Arc<dyn Lifecycle> = component.clone();
        if let Some(existing) = self.components.iter().find(|h| h.wraps(&erased)) {
            tracing::warn!(
                container = %self.name,
                component = %name,
                existing = %existing.name(),
                "Component registered twice"
            );
            return Err(LifecycleError::invalid_state(name, "register", current));
        }

        self.components.push(ComponentHandle::new(name, erased));
        Ok(component)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ComponentState {
        self.state.get()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Registered names, in start order.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(ComponentHandle::name).collect()
    }

    /// Per-component state, in start order.
    pub fn component_states(&self) -> Vec<(&str, ComponentState)> {
        self.components
            .iter()
            .map(|h| (h.name(), h.state()))
            .collect()
    }

    /// Number of components currently counted as started.
    pub fn started_count(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Start every component in registration order.
    pub async fn activate(&self) -> Result<(), LifecycleError> {
        let current = self.state();
        if current != ComponentState::Unstarted {
            return Err(LifecycleError::invalid_state(&self.name, "activate", current));
        }

        for (index, handle) in self.components.iter().enumerate() {
            if let Err(e) = handle.start().await {
                tracing::error!(
                    container = %self.name,
                    component = %handle.name(),
                    error = %e,
                    "Component failed to start, unwinding"
                );
                self.unwind(index).await;
                self.state.set(&self.name, ComponentState::Failed);
                return Err(e);
            }
            self.started.store(index + 1, Ordering::SeqCst);
        }

        self.state.set(&self.name, ComponentState::Running);
        Ok(())
    }

    /// Stop every started component in reverse order.
    pub async fn deactivate(&self) -> Result<(), LifecycleError> {
        match self.state() {
            ComponentState::Stopped => return Ok(()),
            ComponentState::Unstarted => {
                self.state.set(&self.name, ComponentState::Stopped);
                return Ok(());
            }
            ComponentState::Failed => {
                return Err(LifecycleError::invalid_state(
                    &self.name,
                    "deactivate",
                    ComponentState::Failed,
                ));
            }
            ComponentState::Running => {}
        }

        let failures = self.stop_prefix(self.started_count()).await;
        self.state.set(&self.name, ComponentState::Stopped);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::Aggregate(failures))
        }
    }

    /// Best-effort stop of the first `count` components after a start failure.
    async fn unwind(&self, count: usize) {
        let failures = self.stop_prefix(count).await;
        for failure in &failures {
            tracing::warn!(
                container = %self.name,
                component = %failure.component,
                error = %failure.error,
                "Component failed to stop during unwind"
            );
        }
    }

    async fn stop_prefix(&self, count: usize) -> Vec<ComponentFailure> {
        let mut failures = Vec::new();
        for (index, handle) in self.components[..count].iter().enumerate().rev() {
            if let Err(e) = handle.stop().await {
                ComponentFailure::collect(&mut failures, handle.name(), e);
            }
            self.started.store(index, Ordering::SeqCst);
        }
        failures
    }
}

#[async_trait]
impl Lifecycle for LifecycleContainer {
    async fn start(&self) -> Result<(), LifecycleError> {
        self.activate().await
    }

    async fn stop(&self) -> Result<(), LifecycleError> {
        self.deactivate().await
    }
}
