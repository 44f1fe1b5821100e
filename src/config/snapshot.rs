//! Immutable configuration snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::schema::Setting;
use crate::lifecycle::LifecycleError;

/// Flat `key → value` view of the configuration, read once at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigSnapshot {
    values: BTreeMap<String, String>,
}

impl ConfigSnapshot {
    /// An empty snapshot: every setting resolves to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Return a copy with every pair in `overrides` applied on top.
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in overrides {
            self.values.insert(key.into(), value.into());
        }
        self
    }

    /// Raw stored value, if present.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Typed read, falling back to the setting's default when absent.
    pub fn get<T>(&self, setting: &Setting<T>) -> Result<T, LifecycleError> {
        let raw = self.raw(setting.name).unwrap_or(setting.default);
        setting
            .parse(raw)
            .map_err(|reason| LifecycleError::Configuration {
                key: setting.name.to_string(),
                value: raw.to_string(),
                reason,
            })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ConfigSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new().with_overrides(iter)
    }
}
