//! Configuration validation.
//!
//! # Responsibilities
//! - Check that every known setting parses
//! - Flag unknown keys inside the extension's namespace (likely typos)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Unknown keys are warnings: the host owns other namespaces

use crate::config::schema::{Setting, Settings};
use crate::config::snapshot::ConfigSnapshot;
use crate::lifecycle::LifecycleError;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub key: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// Validate a snapshot against the known settings.
pub fn validate_config(config: &ConfigSnapshot) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check(config, &Settings::ENABLED, &mut errors);
    check(config, &Settings::ADDRESS, &mut errors);
    check(config, &Settings::MAX_CONNECTIONS, &mut errors);
    check(config, &Settings::SHUTDOWN_TIMEOUT_MS, &mut errors);

    let known = Settings::keys();
    for key in config.keys() {
        let owned = Settings::PREFIXES.iter().any(|p| key.starts_with(p));
        if owned && !known.contains(&key) {
            tracing::warn!(key = %key, "Unknown data protocol setting ignored");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check<T>(config: &ConfigSnapshot, setting: &Setting<T>, errors: &mut Vec<ValidationError>) {
    if let Err(LifecycleError::Configuration { key, value, reason }) = config.get(setting) {
        errors.push(ValidationError {
            key,
            message: format!("{:?} is invalid: {}", value, reason),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&ConfigSnapshot::new()).is_ok());
    }

    #[test]
    fn reports_every_bad_setting() {
        let config = ConfigSnapshot::new()
            .with("experimental.ndp.enabled", "maybe")
            .with("dbms.ndp.address", "localhost:http")
            .with("dbms.ndp.max_connections", "0");

        let errors = validate_config(&config).unwrap_err();
        let keys: Vec<_> = errors.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["experimental.ndp.enabled", "dbms.ndp.address", "dbms.ndp.max_connections"]
        );
    }

    #[test]
    fn unknown_keys_are_not_errors() {
        let config = ConfigSnapshot::new()
            .with("dbms.ndp.adress", "localhost:1")
            .with("dbms.memory.heap", "1g");
        assert!(validate_config(&config).is_ok());
    }
}
