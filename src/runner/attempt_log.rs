//! Per-attempt log files.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Append-only log for one attempt, `<log_dir>/<resource_group>.log`.
///
/// Writes are best effort: a log that cannot be written is reported
/// through tracing and otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptLog {
    path: PathBuf,
}

impl AttemptLog {
    pub fn new(log_dir: &Path, resource_group: &str) -> Self {
        Self {
            path: log_dir.join(format!("{}.log", resource_group)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `text`, adding a trailing newline if it lacks one.
    pub fn append(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut file = match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Error [OpenFile {}] : {}", self.path.display(), e);
                return;
            }
        };
        let result = if text.ends_with('\n') {
            file.write_all(text.as_bytes())
        } else {
            file.write_all(text.as_bytes())
                .and_then(|_| file.write_all(b"\n"))
        };
        if let Err(e) = result {
            warn!("Error [Write {}] : {}", self.path.display(), e);
        }
    }
}
