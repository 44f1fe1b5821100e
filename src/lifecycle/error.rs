//! Lifecycle error definitions.

use std::fmt;

use thiserror::Error;

use crate::lifecycle::component::ComponentState;

/// Errors raised while building, starting or stopping components.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A setting value could not be parsed.
    #[error("Invalid value {value:?} for setting `{key}`: {reason}")]
    Configuration {
        key: String,
        value: String,
        reason: String,
    },

    /// The transport could not acquire its socket address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// A lifecycle operation was invoked out of order.
    #[error("Cannot {operation} `{component}` while it is {state}")]
    InvalidState {
        component: String,
        operation: &'static str,
        state: ComponentState,
    },

    /// A component could not fully release what it acquired on start.
    #[error("Failed to release `{component}`: {reason}")]
    ResourceRelease { component: String, reason: String },

    /// A component failed to start for a reason other than binding.
    #[error("Failed to start `{component}`: {reason}")]
    Startup { component: String, reason: String },

    /// Stop failures collected across several components.
    #[error("{}", AggregateDisplay(.0))]
    Aggregate(Vec<ComponentFailure>),
}

impl LifecycleError {
    /// Shorthand for an out-of-order call on `component`.
    pub fn invalid_state(
        component: impl Into<String>,
        operation: &'static str,
        state: ComponentState,
    ) -> Self {
        LifecycleError::InvalidState {
            component: component.into(),
            operation,
            state,
        }
    }

    /// Names of the components referenced by an aggregate, or empty.
    pub fn failed_components(&self) -> Vec<&str> {
        match self {
            LifecycleError::Aggregate(failures) => {
                failures.iter().map(|f| f.component.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// One component's failure inside an aggregate.
#[derive(Debug)]
pub struct ComponentFailure {
    /// Registered name of the component.
    pub component: String,
    /// The error it returned.
    pub error: LifecycleError,
}

impl ComponentFailure {
    /// Collect `error` for `component` into `failures`.
    ///
    /// Aggregates from nested containers are flattened so the caller sees the
    /// leaf components rather than the intermediate container.
    pub(crate) fn collect(
        failures: &mut Vec<ComponentFailure>,
        component: &str,
        error: LifecycleError,
    ) {
        match error {
            LifecycleError::Aggregate(inner) => failures.extend(inner),
            error => failures.push(ComponentFailure {
                component: component.to_string(),
                error,
            }),
        }
    }
}

struct AggregateDisplay<'a>(&'a [ComponentFailure]);

impl fmt::Display for AggregateDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} component(s) failed to stop: ", self.0.len())?;
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "[{}] {}", failure.component, failure.error)?;
        }
        Ok(())
    }
}
