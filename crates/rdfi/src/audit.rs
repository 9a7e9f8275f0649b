//! Audit trail persistence.
//!
//! Every retrieved file is persisted byte-identical, keyed by the agent's
//! hostname and the file's relative path, before any processor observes it.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use gateway_core::{AuditConfig, Error, Result};
use gateway_telemetry::metrics;

/// Storage backend for the audit trail.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<()>;
}

/// Filesystem-backed audit storage.
pub struct FilesystemStorage {
    root: PathBuf,
}

impl FilesystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AuditStorage for FilesystemStorage {
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::audit(format!("creating {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| Error::audit(format!("writing {}: {e}", full.display())))
    }
}

/// In-memory storage capturing every write. Used by tests.
#[derive(Clone, Default)]
pub struct MockStorage {
    saved: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> BTreeMap<String, Vec<u8>> {
        self.saved.lock().clone()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.saved.lock().contains_key(path)
    }
}

#[async_trait]
impl AuditStorage for MockStorage {
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.saved.lock().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Persists retrieved files under `odfi/<hostname>/<relative-path>`.
pub struct AuditSaver {
    storage: Arc<dyn AuditStorage>,
    hostname: String,
}

impl AuditSaver {
    pub fn new(cfg: &AuditConfig, hostname: impl Into<String>) -> Result<Self> {
        let storage: Arc<dyn AuditStorage> = match cfg {
            AuditConfig::Filesystem { root } => Arc::new(FilesystemStorage::new(root.clone())),
        };
        Ok(Self {
            storage,
            hostname: hostname.into(),
        })
    }

    /// Used by tests to capture writes in memory.
    pub fn with_storage(storage: Arc<dyn AuditStorage>, hostname: impl Into<String>) -> Self {
        Self {
            storage,
            hostname: hostname.into(),
        }
    }

    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        let path = format!(
            "odfi/{}/{}",
            self.hostname,
            filename.trim_start_matches('/')
        );
        self.storage.save(&path, bytes).await?;

        metrics().audit_files_saved.inc();
        debug!(path = %path, bytes = bytes.len(), "Saved audit copy");
        Ok(())
    }
}
