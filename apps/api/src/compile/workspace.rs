//! Per-attempt filesystem isolation.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// An exclusively-owned scratch directory for one compilation attempt.
///
/// The directory and everything inside it (source file, pdflatex byproducts,
/// the output artifact) are removed when the value drops, on every exit path
/// including timeout and panic unwind. Concurrent attempts never share one.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates a uniquely named directory under `root`. The root itself is
    /// created if missing; workspace uniqueness comes from `tempfile`'s
    /// random naming, never from caller-supplied input.
    pub fn acquire(root: &Path) -> io::Result<Workspace> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix("compile-")
            .tempdir_in(root)?;
        Ok(Workspace { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes the markup verbatim as `{basename}.tex` and returns its path.
    pub fn write_source(&self, basename: &str, markup: &str) -> io::Result<PathBuf> {
        let path = self
            .dir
            .path()
            .join(format!("{}.tex", sanitize_basename(basename)));
        std::fs::write(&path, markup)?;
        Ok(path)
    }

    /// Path where the named output artifact is expected after compilation.
    pub fn artifact_path(&self, basename: &str, ext: &str) -> PathBuf {
        self.dir
            .path()
            .join(format!("{}.{ext}", sanitize_basename(basename)))
    }
}

/// Restricts a logical output name to `[A-Za-z0-9_-]`, replacing anything
/// else with `_`. An empty name becomes `resume`.
pub fn sanitize_basename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "resume".to_string()
    } else {
        sanitized
    }
}
