//! Post-tick cleanup, gated by the storage policy flags.
//!
//! Steps run in order; a failing step aborts the later ones for the same
//! tick. Subsequent ticks are unaffected.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};
use walkdir::WalkDir;

use gateway_core::{Error, Result};
use gateway_transport::Agent;

use crate::downloader::{DownloadBundle, DownloadedFile};

/// Deletes the given remote files. Returns the paths actually deleted so
/// the zero-byte pass can skip them.
pub async fn delete_remote_files<'a>(
    agent: &Arc<dyn Agent>,
    files: impl Iterator<Item = &'a DownloadedFile>,
) -> Result<HashSet<String>> {
    let mut deleted = HashSet::new();
    for file in files {
        agent.delete(&file.remote_path).await?;
        debug!(hostname = agent.hostname(), path = %file.remote_path, "Deleted remote file");
        deleted.insert(file.remote_path.clone());
    }
    Ok(deleted)
}

/// Removes the entire local staging directory.
pub async fn delete_local_directory(bundle: &DownloadBundle) -> Result<()> {
    tokio::fs::remove_dir_all(&bundle.dir)
        .await
        .map_err(|e| Error::internal(format!("removing {}: {e}", bundle.dir.display())))?;
    info!(dir = %bundle.dir.display(), "Removed local staging directory");
    Ok(())
}

/// Prunes empty subdirectories of the staging area, and asks the agent to
/// drop remote directories this tick may have emptied.
pub async fn delete_empty_dirs(agent: &Arc<dyn Agent>, bundle: &DownloadBundle) -> Result<()> {
    // Deepest first, so a chain of empty directories collapses.
    let mut dirs: Vec<_> = WalkDir::new(&bundle.dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect();
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));

    for dir in dirs {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| Error::internal(format!("reading {}: {e}", dir.display())))?;
        if entries
            .next_entry()
            .await
            .map_err(|e| Error::internal(format!("reading {}: {e}", dir.display())))?
            .is_none()
        {
            tokio::fs::remove_dir(&dir)
                .await
                .map_err(|e| Error::internal(format!("removing {}: {e}", dir.display())))?;
            debug!(dir = %dir.display(), "Removed empty staging directory");
        }
    }

    let mut remote_parents: Vec<&str> = bundle
        .files
        .iter()
        .filter_map(|f| f.remote_path.rsplit_once('/').map(|(parent, _)| parent))
        .collect();
    remote_parents.sort_unstable();
    remote_parents.dedup();

    for parent in remote_parents {
        agent.delete_empty_dir(parent).await?;
    }
    Ok(())
}
