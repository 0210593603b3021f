//! LaTeX compilation pipeline.
//!
//! Untrusted, LLM-produced LaTeX goes in; a PDF artifact comes out, or a
//! classified failure. Every attempt runs in its own disposable workspace
//! under a hard timeout, and the artifact's presence on disk, not pdflatex's
//! exit status, decides success.

pub mod discovery;
pub mod encode;
pub mod export;
pub mod handlers;
pub mod pipeline;
pub mod workspace;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use discovery::CompilerHandle;
pub use encode::ArtifactKind;
pub use export::ExportStore;
pub use pipeline::{CompileFailure, CompiledArtifact, FailureKind};

/// The compilation service shared by all request handlers.
///
/// Holds the read-only compiler handle resolved at startup, the workspace
/// root, and the export store. Per-attempt state never leaves [`pipeline`].
pub struct CompileService {
    handle: CompilerHandle,
    work_root: PathBuf,
    exports: ExportStore,
    timeout: Duration,
}

impl CompileService {
    /// Sets up the transient LaTeX area: per-attempt workspaces live under
    /// `<latex_dir>/work`, exported artifacts sit flat in `<latex_dir>`.
    /// Both directories are created idempotently.
    pub fn new(
        handle: CompilerHandle,
        latex_dir: &Path,
        timeout: Duration,
    ) -> io::Result<CompileService> {
        let exports = ExportStore::open(latex_dir.to_path_buf())?;
        let work_root = latex_dir.join("work");
        std::fs::create_dir_all(&work_root)?;
        Ok(CompileService {
            handle,
            work_root,
            exports,
            timeout,
        })
    }

    /// Compiles markup to a PDF artifact in a fresh workspace.
    pub async fn compile(&self, markup: &str) -> Result<CompiledArtifact, CompileFailure> {
        pipeline::compile(&self.handle, &self.work_root, markup, self.timeout).await
    }

    /// Compiles markup and returns the artifact as a base64 data URI.
    pub async fn compile_and_encode(&self, markup: &str) -> Result<String, CompileFailure> {
        let artifact = self.compile(markup).await?;
        let bytes = artifact.read_bytes().await?;
        Ok(encode::data_uri(&bytes, ArtifactKind::Pdf))
    }

    /// Compiles markup and exports the artifact for later download, returning
    /// the fetch handle. The workspace is gone by the time this returns; the
    /// exported copy is subject to the retention sweep.
    pub async fn compile_and_export(&self, markup: &str) -> Result<String, CompileFailure> {
        let artifact = self.compile(markup).await?;
        self.exports
            .export(artifact.path(), pipeline::OUTPUT_BASENAME, ArtifactKind::Pdf)
            .map_err(|e| {
                CompileFailure::new(
                    FailureKind::IoError,
                    format!("failed to export artifact: {e}"),
                )
            })
    }

    pub fn exports(&self) -> &ExportStore {
        &self.exports
    }

    /// Best-effort reclamation of exported artifacts older than `max_age`.
    pub fn sweep_exports(&self, max_age: Duration) -> usize {
        self.exports.sweep(max_age)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Fake pdflatex that copies the source into the artifact.
    fn fake_compiler(dir: &Path) -> CompilerHandle {
        let path = dir.join("fake-pdflatex");
        fs::write(&path, "#!/bin/sh\ncp resume.tex resume.pdf\n").expect("write script");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("set perms");
        CompilerHandle::Found(path)
    }

    fn service(dir: &TempDir) -> CompileService {
        CompileService::new(
            fake_compiler(dir.path()),
            &dir.path().join("latex"),
            Duration::from_secs(10),
        )
        .expect("service")
    }

    #[tokio::test]
    async fn encode_round_trips_the_compiled_artifact() {
        let dir = TempDir::new().expect("temp dir");
        let svc = service(&dir);
        let markup = "\\documentclass{article}";

        let raw = svc
            .compile(markup)
            .await
            .expect("compile")
            .read_bytes()
            .await
            .expect("read");
        let uri = svc.compile_and_encode(markup).await.expect("encode");

        let payload = uri
            .strip_prefix("data:application/pdf;base64,")
            .expect("data uri prefix");
        assert_eq!(STANDARD.decode(payload).expect("valid base64"), raw);
    }

    #[tokio::test]
    async fn exported_artifact_is_fetchable_by_handle() {
        let dir = TempDir::new().expect("temp dir");
        let svc = service(&dir);

        let handle = svc.compile_and_export("BYTES-42").await.expect("export");
        let path = svc.exports().resolve(&handle).expect("resolve");
        assert_eq!(fs::read(path).expect("read exported"), b"BYTES-42");

        // The workspace is gone; only the exported copy remains.
        let work_entries = fs::read_dir(dir.path().join("latex/work"))
            .expect("list work root")
            .count();
        assert_eq!(work_entries, 0);
    }
}
