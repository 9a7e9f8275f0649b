//! Staged-file records and the classification walk.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use gateway_core::{Error, Result};

use crate::audit::AuditSaver;
use crate::processors::Processors;

/// The unit of processing.
///
/// Constructed only for successfully staged local files. `ach_file` is
/// `None` when the bytes fail NACHA parsing; the record still flows
/// through dispatch so path-only classifiers can inspect it. Processors
/// borrow the record and never mutate the parsed file.
#[derive(Debug)]
pub struct File {
    pub filepath: PathBuf,
    pub ach_file: Option<ach::File>,
}

impl File {
    /// Base name, used in event payloads.
    pub fn filename(&self) -> String {
        self.filepath
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Full staged path as a string, used by path matchers.
    pub fn path_str(&self) -> String {
        self.filepath.to_string_lossy().replace('\\', "/")
    }
}

/// Walks a staging directory and dispatches every regular file.
///
/// Per file: read → audit save → parse → run every processor in
/// registration order. A file that fails ACH parsing still dispatches
/// with `ach_file = None`. Errors are recorded and aggregated; they never
/// halt sibling processors or sibling files.
pub async fn process_dir(dir: &Path, audit: &AuditSaver, processors: &Processors) -> Result<()> {
    let mut failures = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                failures.push(format!("walking {}: {e}", dir.display()));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                failures.push(format!("reading {}: {e}", path.display()));
                continue;
            }
        };

        // The audit copy must exist before any processor observes the file.
        let relative = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        if let Err(e) = audit.save(&relative, &bytes).await {
            failures.push(format!("audit {relative}: {e}"));
            continue;
        }

        let ach_file = match ach::File::parse(&bytes) {
            Ok(file) => Some(file),
            Err(e) => {
                // Not fatal: partially valid files are still inspectable
                // by processors that look only at the path.
                debug!(path = %path.display(), error = %e, "File failed ACH parsing");
                None
            }
        };

        let file = File {
            filepath: path.to_path_buf(),
            ach_file,
        };
        failures.extend(processors.handle_all(&file).await);
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::Processor(failures))
    }
}
