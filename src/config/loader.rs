//! Configuration loading from disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::snapshot::ConfigSnapshot;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Unsupported { key: String, kind: &'static str },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Unsupported { key, kind } => {
                write!(f, "Unsupported value for `{}`: {} values are not settings", key, kind)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load a TOML file, apply `overrides`, and validate the result.
///
/// A missing `path` means "defaults plus overrides".
pub fn load_config<I, K, V>(path: Option<&Path>, overrides: I) -> Result<ConfigSnapshot, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let base = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            parse_config(&content)?
        }
        None => ConfigSnapshot::new(),
    };
    let config = base.with_overrides(overrides);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse TOML text into a flat snapshot without validating it.
///
/// Nested tables become dotted keys, so `[dbms.ndp] address = "..."` and
/// `"dbms.ndp.address" = "..."` are equivalent.
pub fn parse_config(content: &str) -> Result<ConfigSnapshot, ConfigError> {
    let table: toml::Table = toml::from_str(content).map_err(ConfigError::Parse)?;
    let mut values = BTreeMap::new();
    flatten("", &table, &mut values)?;
    Ok(values.into_iter().collect())
}

fn flatten(
    prefix: &str,
    table: &toml::Table,
    out: &mut BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        match value {
            toml::Value::Table(inner) => flatten(&key, inner, out)?,
            toml::Value::String(s) => {
                out.insert(key, s.clone());
            }
            toml::Value::Boolean(b) => {
                out.insert(key, b.to_string());
            }
            toml::Value::Integer(i) => {
                out.insert(key, i.to_string());
            }
            toml::Value::Float(x) => {
                out.insert(key, x.to_string());
            }
            toml::Value::Array(_) => {
                return Err(ConfigError::Unsupported { key, kind: "array" });
            }
            toml::Value::Datetime(_) => {
                return Err(ConfigError::Unsupported { key, kind: "datetime" });
            }
        }
    }
    Ok(())
}
