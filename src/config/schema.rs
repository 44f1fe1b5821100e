//! Setting definitions.
//!
//! Every value the extension reads is declared here as a typed [`Setting`]
//! with its key, default and description. Values are stored as text in the
//! [`ConfigSnapshot`](crate::config::ConfigSnapshot) and parsed on read.

use serde::Serialize;

use crate::net::HostnamePort;

/// A typed, documented configuration key.
#[derive(Debug, Clone, Copy)]
pub struct Setting<T> {
    /// Dotted key (e.g. `dbms.ndp.address`).
    pub name: &'static str,
    /// Textual default used when the key is absent.
    pub default: &'static str,
    /// Operator-facing description.
    pub description: &'static str,
    parser: fn(&str) -> Result<T, String>,
}

impl<T> Setting<T> {
    pub const fn new(
        name: &'static str,
        default: &'static str,
        description: &'static str,
        parser: fn(&str) -> Result<T, String>,
    ) -> Self {
        Self {
            name,
            default,
            description,
            parser,
        }
    }

    /// Parse a raw value for this setting.
    pub fn parse(&self, raw: &str) -> Result<T, String> {
        (self.parser)(raw.trim())
    }

    pub fn describe(&self) -> SettingDescription {
        SettingDescription {
            name: self.name,
            default: self.default,
            description: self.description,
        }
    }
}

/// Serializable summary of a setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingDescription {
    pub name: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

/// Settings read by the data protocol extension.
pub struct Settings;

impl Settings {
    pub const ENABLED: Setting<bool> = Setting::new(
        "experimental.ndp.enabled",
        "false",
        "Enable the data protocol server. When false nothing is constructed.",
        parse_bool,
    );

    pub const ADDRESS: Setting<HostnamePort> = Setting::new(
        "dbms.ndp.address",
        "localhost:7687",
        "Host and port for the data protocol socket transport.",
        parse_address,
    );

    pub const MAX_CONNECTIONS: Setting<usize> = Setting::new(
        "dbms.ndp.max_connections",
        "10000",
        "Maximum number of concurrent client connections.",
        parse_positive_usize,
    );

    pub const SHUTDOWN_TIMEOUT_MS: Setting<u64> = Setting::new(
        "dbms.ndp.shutdown_timeout_ms",
        "5000",
        "Milliseconds to wait for open connections to close when stopping.",
        parse_u64,
    );

    /// Key prefixes owned by this extension.
    pub const PREFIXES: [&'static str; 2] = ["experimental.ndp.", "dbms.ndp."];

    /// Every known key.
    pub fn keys() -> [&'static str; 4] {
        [
            Self::ENABLED.name,
            Self::ADDRESS.name,
            Self::MAX_CONNECTIONS.name,
            Self::SHUTDOWN_TIMEOUT_MS.name,
        ]
    }

    pub fn describe() -> Vec<SettingDescription> {
        vec![
            Self::ENABLED.describe(),
            Self::ADDRESS.describe(),
            Self::MAX_CONNECTIONS.describe(),
            Self::SHUTDOWN_TIMEOUT_MS.describe(),
        ]
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err("expected `true` or `false`".to_string())
    }
}

fn parse_address(raw: &str) -> Result<HostnamePort, String> {
    raw.parse()
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_u64(raw: &str) -> Result<u64, String> {
    raw.parse::<u64>().map_err(|e| e.to_string())
}
