//! Export of artifacts that must outlive their workspace, and the retention
//! sweep that bounds the export area's growth.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::encode::ArtifactKind;
use super::workspace::sanitize_basename;

/// Why a download handle could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// The handle failed validation; the filesystem was never touched.
    InvalidHandle,
    /// The handle is well-formed but no such artifact exists (it may have
    /// been swept).
    NotFound,
}

/// Flat directory of exported artifacts named `{logical}_{uuid}.{ext}`.
/// Presence is determined by listing; there is no index file.
#[derive(Debug, Clone)]
pub struct ExportStore {
    dir: PathBuf,
}

impl ExportStore {
    /// Opens the export directory, creating it idempotently.
    pub fn open(dir: PathBuf) -> io::Result<ExportStore> {
        std::fs::create_dir_all(&dir)?;
        Ok(ExportStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copies the artifact into the store under a collision-free name and
    /// returns the download handle. Copy, not move: the caller's workspace
    /// cleanup stays unconditional and independent of export success.
    pub fn export(
        &self,
        artifact: &Path,
        logical_name: &str,
        kind: ArtifactKind,
    ) -> io::Result<String> {
        let handle = format!(
            "{}_{}.{}",
            sanitize_basename(logical_name),
            Uuid::new_v4().simple(),
            kind.extension()
        );
        std::fs::copy(artifact, self.dir.join(&handle))?;
        debug!("exported artifact as {handle}");
        Ok(handle)
    }

    /// Resolves a download handle to a path inside the store.
    ///
    /// The handle is validated before any filesystem access: separators,
    /// traversal sequences, or characters outside `[A-Za-z0-9._-]` are
    /// rejected outright.
    pub fn resolve(&self, handle: &str) -> Result<PathBuf, ResolveError> {
        if !is_valid_handle(handle) {
            return Err(ResolveError::InvalidHandle);
        }
        let path = self.dir.join(handle);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ResolveError::NotFound)
        }
    }

    /// Deletes exported artifacts whose modification age is at least
    /// `max_age`. Best-effort: per-file errors are logged and skipped, never
    /// propagated; concurrent deletion is harmless.
    pub fn sweep(&self, max_age: Duration) -> usize {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("retention sweep could not list {}: {e}", self.dir.display());
                return 0;
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age >= max_age {
                match std::fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => debug!("sweep skipped {}: {e}", path.display()),
                }
            }
        }

        if removed > 0 {
            info!("retention sweep removed {removed} artifact(s)");
        }
        removed
    }
}

/// A handle is a bare filename: nonempty, no separators, no traversal, only
/// `[A-Za-z0-9._-]`.
fn is_valid_handle(handle: &str) -> bool {
    !handle.is_empty()
        && !handle.contains("..")
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
