//! pdflatex discovery.
//!
//! Probes a fixed priority list of install locations, then the executable
//! search path, verifying each candidate by running it with `--version`
//! under a short timeout. Absence of a toolchain is a normal outcome on
//! hosts without TeX installed: the result is a sentinel, never an error.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

/// Upper bound for a single `--version` probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// A resolved reference to the pdflatex executable, or its explicit absence.
///
/// Resolved once at startup and shared read-only through `AppState`; every
/// compilation attempt borrows the same handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerHandle {
    Found(PathBuf),
    NotFound,
}

impl CompilerHandle {
    pub fn path(&self) -> Option<&Path> {
        match self {
            CompilerHandle::Found(path) => Some(path),
            CompilerHandle::NotFound => None,
        }
    }
}

/// Install locations probed before consulting the search path.
/// User-local TeX trees first, then system-wide ones.
fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(home) = std::env::var("HOME") {
        candidates.push(PathBuf::from(&home).join(".local/bin/pdflatex"));
        candidates.push(PathBuf::from(&home).join("texlive/bin/pdflatex"));
    }
    candidates.push(PathBuf::from("/usr/local/texlive/bin/pdflatex"));
    candidates.push(PathBuf::from("/usr/local/bin/pdflatex"));
    candidates.push(PathBuf::from("/usr/bin/pdflatex"));
    candidates.push(PathBuf::from("/Library/TeX/texbin/pdflatex"));
    candidates
}

/// Locates a usable pdflatex. First verified candidate wins.
pub async fn discover() -> CompilerHandle {
    let mut candidates = default_candidates();
    if let Ok(path) = which::which("pdflatex") {
        candidates.push(path);
    }
    let handle = discover_among(&candidates).await;
    match &handle {
        CompilerHandle::Found(path) => info!("pdflatex found at {}", path.display()),
        CompilerHandle::NotFound => {
            warn!("pdflatex not found; compilation will be unavailable on this host")
        }
    }
    handle
}

/// Probes the given candidates in order. Split out from [`discover`] so tests
/// can control the candidate list.
pub async fn discover_among(candidates: &[PathBuf]) -> CompilerHandle {
    for candidate in candidates {
        if candidate.is_file() && probe(candidate).await {
            return CompilerHandle::Found(candidate.clone());
        }
        debug!("pdflatex candidate {} rejected", candidate.display());
    }
    CompilerHandle::NotFound
}

/// Runs `<candidate> --version` and checks for a clean exit within the probe
/// timeout. A hung probe is killed and the candidate treated as unusable.
async fn probe(path: &Path) -> bool {
    let child = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn();

    let mut child = match child {
        Ok(child) => child,
        Err(e) => {
            debug!("probe of {} failed to spawn: {e}", path.display());
            return false;
        }
    };

    match tokio::time::timeout(PROBE_TIMEOUT, child.wait()).await {
        Ok(Ok(status)) => status.success(),
        Ok(Err(_)) => false,
        Err(_) => {
            let _ = child.start_kill();
            false
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write_script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).expect("write script");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("set perms");
        path
    }

    #[tokio::test]
    async fn finds_first_working_candidate() {
        let dir = TempDir::new().expect("temp dir");
        let broken = write_script(&dir, "broken", "#!/bin/sh\nexit 1\n");
        let good = write_script(&dir, "good", "#!/bin/sh\necho fake-pdftex\nexit 0\n");

        let handle = discover_among(&[broken, good.clone()]).await;
        assert_eq!(handle, CompilerHandle::Found(good));
    }

    #[tokio::test]
    async fn empty_candidate_list_is_not_found() {
        let handle = discover_among(&[]).await;
        assert_eq!(handle, CompilerHandle::NotFound);
    }

    #[tokio::test]
    async fn missing_and_failing_candidates_are_not_found() {
        let dir = TempDir::new().expect("temp dir");
        let missing = dir.path().join("does-not-exist");
        let failing = write_script(&dir, "failing", "#!/bin/sh\nexit 127\n");

        let handle = discover_among(&[missing, failing]).await;
        assert_eq!(handle, CompilerHandle::NotFound);
    }
}
