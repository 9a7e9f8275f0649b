//! Per-tick download of remote files into a local staging directory.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use gateway_core::{Error, Result, StorageConfig};
use gateway_telemetry::metrics;
use gateway_transport::Agent;

/// One successfully staged file.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    /// Path on the remote agent; cleanup deletes by this.
    pub remote_path: String,
    /// Path inside the staging directory.
    pub local_path: PathBuf,
    /// Staged size in bytes.
    pub size: u64,
}

/// Result of one download pass for one agent.
///
/// The local layout mirrors the remote listing, so processors can rely on
/// relative paths for classification. Partial failures leave the
/// successfully staged files in `files`; the scheduler folds `failures`
/// into the tick's aggregate error.
#[derive(Debug, Default)]
pub struct DownloadBundle {
    /// Staging directory root, unique per call.
    pub dir: PathBuf,
    pub files: Vec<DownloadedFile>,
    pub failures: Vec<String>,
}

impl DownloadBundle {
    /// Remote paths whose staged copy is empty.
    pub fn zero_byte_files(&self) -> impl Iterator<Item = &DownloadedFile> {
        self.files.iter().filter(|f| f.size == 0)
    }
}

/// Copies remote files for one agent into per-run staging directories.
pub struct Downloader {
    staging_root: PathBuf,
}

impl Downloader {
    pub fn new(storage: &StorageConfig) -> Result<Self> {
        std::fs::create_dir_all(&storage.directory).map_err(|e| {
            Error::config(format!(
                "creating staging directory {}: {e}",
                storage.directory.display()
            ))
        })?;
        Ok(Self {
            staging_root: storage.directory.clone(),
        })
    }

    /// Lists the agent's inbound paths and streams every remote file into
    /// a fresh staging directory.
    pub async fn copy_files_from_remote(&self, agent: &Arc<dyn Agent>) -> Result<DownloadBundle> {
        let dir = self.staging_root.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::transport(format!("creating {}: {e}", dir.display())))?;

        let mut bundle = DownloadBundle {
            dir: dir.clone(),
            ..Default::default()
        };

        for inbound in agent.inbound_paths() {
            let listing = match agent.list(inbound).await {
                Ok(listing) => listing,
                Err(e) => {
                    warn!(hostname = agent.hostname(), path = %inbound, error = %e, "Failed to list remote path");
                    metrics().download_errors.inc();
                    bundle.failures.push(format!("listing {inbound}: {e}"));
                    continue;
                }
            };

            for remote_path in listing {
                match self.stage_one(agent, &dir, &remote_path).await {
                    Ok(file) => {
                        metrics().files_downloaded.inc();
                        bundle.files.push(file);
                    }
                    Err(e) => {
                        warn!(hostname = agent.hostname(), path = %remote_path, error = %e, "Failed to download remote file");
                        metrics().download_errors.inc();
                        bundle.failures.push(format!("downloading {remote_path}: {e}"));
                    }
                }
            }
        }

        info!(
            hostname = agent.hostname(),
            dir = %bundle.dir.display(),
            files = bundle.files.len(),
            failures = bundle.failures.len(),
            "Copied inbound files from remote"
        );
        Ok(bundle)
    }

    async fn stage_one(
        &self,
        agent: &Arc<dyn Agent>,
        dir: &std::path::Path,
        remote_path: &str,
    ) -> Result<DownloadedFile> {
        let bytes = agent.retrieve(remote_path).await?;

        let local_path = dir.join(remote_path.trim_start_matches('/'));
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::transport(format!("creating {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&local_path, &bytes)
            .await
            .map_err(|e| Error::transport(format!("staging {}: {e}", local_path.display())))?;

        debug!(remote = remote_path, local = %local_path.display(), bytes = bytes.len(), "Staged remote file");
        Ok(DownloadedFile {
            remote_path: remote_path.to_string(),
            local_path,
            size: bytes.len() as u64,
        })
    }
}
