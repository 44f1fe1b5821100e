//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use data_protocol_server::{ConfigSnapshot, EmbeddedDatabase, ExtensionDependencies, Lifecycle, LifecycleError};
use tokio::net::TcpStream;

/// Ordered record of lifecycle calls across components.
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn record(&self, event: String) {
        self.entries.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// Sequence position of the first `event`; a logical timestamp.
    pub fn position_of(&self, event: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .position(|e| e == event)
            .unwrap_or_else(|| panic!("no {:?} event recorded", event))
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

/// Wraps a real component and journals its start/stop calls.
pub struct Recorder<T> {
    name: &'static str,
    inner: Arc<T>,
    journal: Journal,
}

impl<T> Recorder<T> {
    pub fn new(name: &'static str, inner: Arc<T>, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name,
            inner,
            journal: journal.clone(),
        })
    }
}

#[async_trait]
impl<T: Lifecycle + 'static> Lifecycle for Recorder<T> {
    async fn start(&self) -> Result<(), LifecycleError> {
        self.journal.record(format!("start:{}", self.name));
        self.inner.start().await
    }

    async fn stop(&self) -> Result<(), LifecycleError> {
        self.journal.record(format!("stop:{}", self.name));
        self.inner.stop().await
    }
}

/// Component whose start/stop outcomes are scripted.
pub struct Dummy {
    name: &'static str,
    journal: Journal,
    fail_start: bool,
    fail_stop: bool,
    pub stops: AtomicUsize,
}

impl Dummy {
    pub fn ok(name: &'static str, journal: &Journal) -> Arc<Self> {
        Self::scripted(name, journal, false, false)
    }

    pub fn failing_stop(name: &'static str, journal: &Journal) -> Arc<Self> {
        Self::scripted(name, journal, false, true)
    }

    pub fn failing_start(name: &'static str, journal: &Journal) -> Arc<Self> {
        Self::scripted(name, journal, true, false)
    }

    fn scripted(name: &'static str, journal: &Journal, fail_start: bool, fail_stop: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            journal: journal.clone(),
            fail_start,
            fail_stop,
            stops: AtomicUsize::new(0),
        })
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Lifecycle for Dummy {
    async fn start(&self) -> Result<(), LifecycleError> {
        self.journal.record(format!("start:{}", self.name));
        if self.fail_start {
            return Err(LifecycleError::Startup {
                component: self.name.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), LifecycleError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.journal.record(format!("stop:{}", self.name));
        if self.fail_stop {
            return Err(LifecycleError::ResourceRelease {
                component: self.name.to_string(),
                reason: "scripted release failure".to_string(),
            });
        }
        Ok(())
    }
}

pub fn dependencies() -> ExtensionDependencies {
    ExtensionDependencies::new(Arc::new(EmbeddedDatabase::new("integration.db")))
}

/// Enabled configuration listening on `address`.
pub fn enabled_config(address: &str) -> ConfigSnapshot {
    ConfigSnapshot::new()
        .with("experimental.ndp.enabled", "true")
        .with("dbms.ndp.address", address)
        .with("dbms.ndp.shutdown_timeout_ms", "1000")
}

/// Find a loopback port that is free right now.
pub async fn free_port() -> u16 {
    let dummy = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    dummy.local_addr().unwrap().port()
}

/// Try to connect, with a short timeout.
pub async fn try_connect(addr: SocketAddr) -> std::io::Result<TcpStream> {
    match tokio::time::timeout(Duration::from_secs(2), TcpStream::connect(addr)).await {
        Ok(result) => result,
        Err(_) => Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out")),
    }
}
