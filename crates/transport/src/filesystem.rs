//! Filesystem-rooted transport agent.
//!
//! Serves local or mounted drop directories. Remote backends (SFTP, FTP,
//! S3) implement the same `Agent` trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use walkdir::WalkDir;

use gateway_core::{AgentConfig, Error, Result};

use crate::agent::Agent;

pub struct FilesystemAgent {
    hostname: String,
    root: PathBuf,
    inbound_paths: Vec<String>,
}

impl FilesystemAgent {
    pub fn new(cfg: &AgentConfig) -> Self {
        Self {
            hostname: cfg.hostname.clone(),
            root: cfg.root.clone(),
            inbound_paths: cfg.inbound_paths.clone(),
        }
    }

    /// Resolves a relative remote path against the transport root,
    /// rejecting traversal outside of it.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        if Path::new(path)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(Error::transport(format!("path escapes agent root: {path}")));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl Agent for FilesystemAgent {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn inbound_paths(&self) -> &[String] {
        &self.inbound_paths
    }

    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let dir = self.resolve(path)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::transport(format!("listing {path}: {e}")))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| Error::transport(format!("listing {path}: {e}")))?;
            files.push(relative.to_string_lossy().replace('\\', "/"));
        }

        debug!(hostname = %self.hostname, path = path, count = files.len(), "Listed remote files");
        Ok(files)
    }

    async fn retrieve(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full)
            .await
            .map_err(|e| Error::transport(format!("retrieving {path}: {e}")))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        tokio::fs::remove_file(&full)
            .await
            .map_err(|e| Error::transport(format!("deleting {path}: {e}")))
    }

    async fn delete_empty_dir(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        let mut entries = tokio::fs::read_dir(&full)
            .await
            .map_err(|e| Error::transport(format!("reading {path}: {e}")))?;
        if entries
            .next_entry()
            .await
            .map_err(|e| Error::transport(format!("reading {path}: {e}")))?
            .is_some()
        {
            return Ok(()); // not empty, leave it alone
        }

        tokio::fs::remove_dir(&full)
            .await
            .map_err(|e| Error::transport(format!("removing {path}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(root: &Path) -> FilesystemAgent {
        FilesystemAgent::new(&AgentConfig {
            name: "test".into(),
            hostname: "ftp.test.com".into(),
            root: root.to_path_buf(),
            inbound_paths: vec!["inbound".into()],
        })
    }

    #[tokio::test]
    async fn lists_files_recursively_with_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("inbound/reconciliation")).unwrap();
        std::fs::write(dir.path().join("inbound/a.ach"), b"a").unwrap();
        std::fs::write(dir.path().join("inbound/reconciliation/r.txt"), b"r").unwrap();

        let agent = agent(dir.path());
        let files = agent.list("inbound").await.unwrap();
        assert_eq!(files, vec!["inbound/a.ach", "inbound/reconciliation/r.txt"]);
    }

    #[tokio::test]
    async fn missing_path_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent(dir.path());
        assert!(agent.list("inbound").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn retrieve_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("inbound")).unwrap();
        std::fs::write(dir.path().join("inbound/a.ach"), b"bytes").unwrap();

        let agent = agent(dir.path());
        assert_eq!(agent.retrieve("inbound/a.ach").await.unwrap(), b"bytes");

        agent.delete("inbound/a.ach").await.unwrap();
        assert!(!dir.path().join("inbound/a.ach").exists());
    }

    #[tokio::test]
    async fn delete_empty_dir_spares_populated_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("inbound/full")).unwrap();
        std::fs::create_dir_all(dir.path().join("inbound/empty")).unwrap();
        std::fs::write(dir.path().join("inbound/full/a.ach"), b"a").unwrap();

        let agent = agent(dir.path());
        agent.delete_empty_dir("inbound/empty").await.unwrap();
        agent.delete_empty_dir("inbound/full").await.unwrap();

        assert!(!dir.path().join("inbound/empty").exists());
        assert!(dir.path().join("inbound/full").exists());
    }

    #[tokio::test]
    async fn rejects_parent_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent(dir.path());
        assert!(agent.retrieve("../outside").await.is_err());
    }
}
