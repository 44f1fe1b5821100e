//! Host/port bind addresses.

use std::fmt;
use std::str::FromStr;

/// An unresolved `host:port` pair.
///
/// Resolution happens when the transport binds, so a hostname such as
/// `localhost` may map to several socket addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostnamePort {
    host: String,
    port: u16,
}

impl HostnamePort {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Tuple form accepted by `tokio::net::TcpListener::bind`.
    pub fn as_bind_target(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

impl FromStr for HostnamePort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("address is empty".to_string());
        }

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| "unterminated `[` in IPv6 address".to_string())?;
            let port = tail
                .strip_prefix(':')
                .ok_or_else(|| "expected `[host]:port`".to_string())?;
            (host, port)
        } else {
            let (host, port) = s
                .rsplit_once(':')
                .ok_or_else(|| "expected `host:port`".to_string())?;
            if host.contains(':') {
                return Err("IPv6 hosts must be written as `[host]:port`".to_string());
            }
            (host, port)
        };

        if host.is_empty() {
            return Err("missing host".to_string());
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| format!("invalid port {:?}: {}", port, e))?;

        Ok(Self::new(host, port))
    }
}

impl fmt::Display for HostnamePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
