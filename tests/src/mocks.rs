//! Mock implementations for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use gateway_core::{Error, Result};
use gateway_rdfi::Alerter;
use gateway_transport::Agent;

/// Agent whose listing always fails with a transport error.
pub struct FailingAgent {
    hostname: String,
    inbound_paths: Vec<String>,
}

impl FailingAgent {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            inbound_paths: vec!["inbound".into()],
        }
    }
}

#[async_trait]
impl Agent for FailingAgent {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn inbound_paths(&self) -> &[String] {
        &self.inbound_paths
    }

    async fn list(&self, _path: &str) -> Result<Vec<String>> {
        Err(Error::transport("connection refused"))
    }

    async fn retrieve(&self, _path: &str) -> Result<Vec<u8>> {
        Err(Error::transport("connection refused"))
    }

    async fn delete(&self, _path: &str) -> Result<()> {
        Err(Error::transport("connection refused"))
    }

    async fn delete_empty_dir(&self, _path: &str) -> Result<()> {
        Err(Error::transport("connection refused"))
    }
}

/// Wraps an agent and records how many listings run concurrently.
///
/// A slow `list` widens the window two leader-elected schedulers would
/// need to overlap in; the max observed concurrency must stay at one.
pub struct CountingAgent {
    inner: Arc<dyn Agent>,
    active: AtomicUsize,
    max_seen: Arc<AtomicUsize>,
    delay: Duration,
}

impl CountingAgent {
    pub fn new(inner: Arc<dyn Agent>, max_seen: Arc<AtomicUsize>, delay: Duration) -> Self {
        Self {
            inner,
            active: AtomicUsize::new(0),
            max_seen,
            delay,
        }
    }
}

#[async_trait]
impl Agent for CountingAgent {
    fn hostname(&self) -> &str {
        self.inner.hostname()
    }

    fn inbound_paths(&self) -> &[String] {
        self.inner.inbound_paths()
    }

    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now_active, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let result = self.inner.list(path).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn retrieve(&self, path: &str) -> Result<Vec<u8>> {
        self.inner.retrieve(path).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.inner.delete(path).await
    }

    async fn delete_empty_dir(&self, path: &str) -> Result<()> {
        self.inner.delete_empty_dir(path).await
    }
}

/// Alerter capturing every error it is handed.
#[derive(Clone, Default)]
pub struct CapturingAlerter {
    seen: Arc<Mutex<Vec<String>>>,
}

impl CapturingAlerter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Alerter for CapturingAlerter {
    fn kind(&self) -> &'static str {
        "capturing"
    }

    async fn alert(&self, err: &Error) -> Result<()> {
        self.seen.lock().push(err.to_string());
        Ok(())
    }
}
