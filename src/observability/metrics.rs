//! Metrics collection.
//!
//! # Metrics
//! - `ndp_connections_accepted_total` (counter): accepted client sockets
//! - `ndp_active_connections` (gauge): currently open connections
//! - `ndp_active_sessions` (gauge): sessions held by the session environment
//! - `ndp_lifecycle_transitions_total` (counter): state changes by component, state
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; installing an exporter is
//!   left to the host, so these are no-ops without a recorder

use crate::lifecycle::ComponentState;

/// Record an accepted connection.
pub fn record_connection_accepted() {
    ::metrics::counter!("ndp_connections_accepted_total").increment(1);
}

/// Update the open connection gauge.
pub fn record_active_connections(count: u64) {
    ::metrics::gauge!("ndp_active_connections").set(count as f64);
}

/// Update the session gauge.
pub fn record_active_sessions(count: usize) {
    ::metrics::gauge!("ndp_active_sessions").set(count as f64);
}

/// Record a lifecycle state change.
pub fn record_transition(component: &str, state: ComponentState) {
    ::metrics::counter!(
        "ndp_lifecycle_transitions_total",
        "component" => component.to_string(),
        "state" => state.as_str()
    )
    .increment(1);
}
