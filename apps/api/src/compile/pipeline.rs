//! Compile invocation and outcome classification.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

use super::discovery::CompilerHandle;
use super::workspace::Workspace;

/// Logical name of the source and artifact inside every workspace.
pub const OUTPUT_BASENAME: &str = "resume";

/// pdflatex runs per attempt. Fixed, not adaptive: the second run resolves
/// cross-references the first run only records.
const COMPILE_PASSES: u32 = 2;

/// Classified reason a compilation attempt produced no artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    CompilerNotFound,
    Timeout,
    SyntaxOrBuildError,
    IoError,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::CompilerNotFound => "COMPILER_NOT_FOUND",
            FailureKind::Timeout => "TIMEOUT",
            FailureKind::SyntaxOrBuildError => "SYNTAX_OR_BUILD_ERROR",
            FailureKind::IoError => "IO_ERROR",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed compilation attempt: the classified reason plus whatever the
/// compiler wrote before the attempt ended.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct CompileFailure {
    pub kind: FailureKind,
    pub diagnostics: String,
}

impl CompileFailure {
    pub fn new(kind: FailureKind, diagnostics: String) -> CompileFailure {
        CompileFailure { kind, diagnostics }
    }

    /// The last `max` bytes of the captured compiler output, aligned to a
    /// character boundary. pdflatex buries the actual error at the end of a
    /// long log, so the tail is the useful part.
    pub fn diagnostics_tail(&self, max: usize) -> &str {
        let log = self.diagnostics.trim_end();
        if log.len() <= max {
            return log;
        }
        let mut start = log.len() - max;
        while !log.is_char_boundary(start) {
            start += 1;
        }
        &log[start..]
    }

    /// Human-readable message for structured success/error responses.
    /// Only syntax errors carry compiler output; the user needs the log to
    /// fix their document. Other kinds get fixed wording.
    pub fn user_message(&self) -> String {
        match self.kind {
            FailureKind::CompilerNotFound => {
                "The LaTeX toolchain is not installed on this server".to_string()
            }
            FailureKind::Timeout => {
                "Compilation timed out; the LaTeX source may contain an infinite loop".to_string()
            }
            FailureKind::SyntaxOrBuildError => {
                format!("LaTeX compilation failed:\n{}", self.diagnostics_tail(4000))
            }
            FailureKind::IoError => "A storage error occurred during compilation".to_string(),
        }
    }
}

/// A successful compilation. Owns its workspace: the artifact file exists on
/// disk exactly as long as this value lives, and the whole directory is
/// removed when it drops.
#[derive(Debug)]
pub struct CompiledArtifact {
    #[allow(dead_code)]
    workspace: Workspace,
    path: PathBuf,
}

impl CompiledArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the complete artifact byte stream.
    pub async fn read_bytes(&self) -> Result<Vec<u8>, CompileFailure> {
        tokio::fs::read(&self.path).await.map_err(|e| {
            CompileFailure::new(
                FailureKind::IoError,
                format!("failed to read artifact: {e}"),
            )
        })
    }
}

/// Compiles LaTeX markup to a PDF in a fresh workspace.
///
/// Runs pdflatex in non-stopping mode with the workspace as its working
/// directory, twice, each run bounded by `timeout`; an expired run's child is
/// killed. Success is decided by [`classify`]: the artifact's presence in the
/// workspace overrides the exit status, because pdflatex reports nonzero on
/// recoverable warnings while still emitting a usable PDF.
pub async fn compile(
    handle: &CompilerHandle,
    work_root: &Path,
    markup: &str,
    timeout: Duration,
) -> Result<CompiledArtifact, CompileFailure> {
    let Some(compiler) = handle.path() else {
        return Err(CompileFailure::new(
            FailureKind::CompilerNotFound,
            "pdflatex was not found on this host".to_string(),
        ));
    };

    let workspace = Workspace::acquire(work_root).map_err(|e| {
        CompileFailure::new(
            FailureKind::IoError,
            format!("failed to create workspace: {e}"),
        )
    })?;
    let source = workspace
        .write_source(OUTPUT_BASENAME, markup)
        .map_err(|e| {
            CompileFailure::new(
                FailureKind::IoError,
                format!("failed to write source file: {e}"),
            )
        })?;

    let mut diagnostics = String::new();
    let mut timed_out = false;
    let mut exit_code = None;

    for pass in 1..=COMPILE_PASSES {
        let run = run_compiler(compiler, &source, workspace.path(), timeout).await?;
        diagnostics.push_str(&run.output);
        exit_code = run.exit_code;
        debug!(
            "pdflatex pass {pass}/{COMPILE_PASSES}: exit={:?} timed_out={}",
            run.exit_code, run.timed_out
        );
        if run.timed_out {
            timed_out = true;
            break;
        }
    }

    let artifact = workspace.artifact_path(OUTPUT_BASENAME, "pdf");
    classify(timed_out, artifact.is_file(), exit_code, diagnostics)?;
    Ok(CompiledArtifact {
        workspace,
        path: artifact,
    })
}

/// Pure outcome classification, kept free of subprocess state so the policy
/// is testable on its own. Artifact presence overrides exit status; with no
/// artifact, timeout dominates.
fn classify(
    timed_out: bool,
    artifact_exists: bool,
    exit_code: Option<i32>,
    diagnostics: String,
) -> Result<(), CompileFailure> {
    if artifact_exists {
        return Ok(());
    }
    if timed_out {
        return Err(CompileFailure::new(FailureKind::Timeout, diagnostics));
    }
    let diagnostics = if diagnostics.trim().is_empty() {
        format!("pdflatex exited with status {exit_code:?} and produced no output")
    } else {
        diagnostics
    };
    Err(CompileFailure::new(
        FailureKind::SyntaxOrBuildError,
        diagnostics,
    ))
}

struct CompilerRun {
    exit_code: Option<i32>,
    output: String,
    timed_out: bool,
}

/// One bounded pdflatex run. Output capture keeps whatever arrived before a
/// timeout kill; the pipes close when the child dies, so the drain tasks
/// always finish.
async fn run_compiler(
    compiler: &Path,
    source: &Path,
    cwd: &Path,
    timeout: Duration,
) -> Result<CompilerRun, CompileFailure> {
    let mut child = Command::new(compiler)
        .arg("-interaction=nonstopmode")
        .arg("-halt-on-error")
        .arg(source)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                CompileFailure::new(
                    FailureKind::CompilerNotFound,
                    format!("pdflatex disappeared after discovery: {e}"),
                )
            } else {
                CompileFailure::new(
                    FailureKind::IoError,
                    format!("failed to spawn pdflatex: {e}"),
                )
            }
        })?;

    let stdout_task = tokio::spawn(drain(child.stdout.take()));
    let stderr_task = tokio::spawn(drain(child.stderr.take()));

    let (timed_out, exit_code) = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => (false, status.code()),
        Ok(Err(e)) => {
            return Err(CompileFailure::new(
                FailureKind::IoError,
                format!("failed to wait for pdflatex: {e}"),
            ))
        }
        Err(_) => {
            let _ = child.kill().await;
            (true, None)
        }
    };

    let mut captured = stdout_task.await.unwrap_or_default();
    captured.extend(stderr_task.await.unwrap_or_default());

    Ok(CompilerRun {
        exit_code,
        output: String::from_utf8_lossy(&captured).into_owned(),
        timed_out,
    })
}

async fn drain<R: tokio::io::AsyncRead + Unpin>(reader: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        // A short read is fine: the child may have been killed mid-write.
        let _ = reader.read_to_end(&mut buf).await;
    }
    buf
}

#[cfg(test)]
mod classify_tests {
    use super::*;

    #[test]
    fn artifact_presence_overrides_nonzero_exit() {
        assert!(classify(false, true, Some(1), "warnings".to_string()).is_ok());
    }

    #[test]
    fn artifact_presence_overrides_timeout_of_later_pass() {
        assert!(classify(true, true, None, String::new()).is_ok());
    }

    #[test]
    fn clean_exit_without_artifact_is_a_build_error() {
        let failure = classify(false, false, Some(0), String::new()).unwrap_err();
        assert_eq!(failure.kind, FailureKind::SyntaxOrBuildError);
        assert!(!failure.diagnostics.is_empty());
    }

    #[test]
    fn timeout_without_artifact_is_a_timeout() {
        let failure = classify(true, false, None, "partial log".to_string()).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert_eq!(failure.diagnostics, "partial log");
    }

    #[test]
    fn build_error_keeps_captured_log() {
        let failure =
            classify(false, false, Some(1), "! Undefined control sequence.".to_string())
                .unwrap_err();
        assert_eq!(failure.kind, FailureKind::SyntaxOrBuildError);
        assert!(failure.diagnostics.contains("Undefined control sequence"));
    }

    #[test]
    fn diagnostics_tail_respects_char_boundaries() {
        let failure = CompileFailure::new(FailureKind::SyntaxOrBuildError, "é".repeat(100));
        let tail = failure.diagnostics_tail(5);
        assert!(tail.len() <= 5);
        assert!(tail.chars().all(|c| c == 'é'));
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).expect("write script");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("set perms");
        path
    }

    /// Fake pdflatex that copies the source into the artifact, so each
    /// compile's output is distinguishable by its input.
    fn ok_compiler(dir: &Path) -> CompilerHandle {
        CompilerHandle::Found(write_script(
            dir,
            "fake-pdflatex-ok",
            "#!/bin/sh\necho 'This is fake pdfTeX'\ncp resume.tex resume.pdf\n",
        ))
    }

    /// Fake pdflatex that emits a PDF but exits nonzero, like real pdflatex
    /// does on recoverable warnings.
    fn warn_compiler(dir: &Path) -> CompilerHandle {
        CompilerHandle::Found(write_script(
            dir,
            "fake-pdflatex-warn",
            "#!/bin/sh\necho 'Overfull hbox'\ncp resume.tex resume.pdf\nexit 1\n",
        ))
    }

    fn failing_compiler(dir: &Path) -> CompilerHandle {
        CompilerHandle::Found(write_script(
            dir,
            "fake-pdflatex-fail",
            "#!/bin/sh\necho '! Undefined control sequence.'\nexit 1\n",
        ))
    }

    fn sleeping_compiler(dir: &Path) -> CompilerHandle {
        CompilerHandle::Found(write_script(
            dir,
            "fake-pdflatex-sleep",
            "#!/bin/sh\nsleep 30\n",
        ))
    }

    fn workspace_count(work_root: &Path) -> usize {
        match fs::read_dir(work_root) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn valid_input_produces_nonempty_artifact() {
        let dir = TempDir::new().expect("temp dir");
        let handle = ok_compiler(dir.path());
        let work_root = dir.path().join("work");

        let artifact = compile(&handle, &work_root, "\\documentclass{article}", TIMEOUT)
            .await
            .expect("compile succeeds");
        assert!(artifact.path().is_file());
        let bytes = artifact.read_bytes().await.expect("read artifact");
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn artifact_despite_nonzero_exit_is_a_success() {
        let dir = TempDir::new().expect("temp dir");
        let handle = warn_compiler(dir.path());
        let work_root = dir.path().join("work");

        let result = compile(&handle, &work_root, "x", TIMEOUT).await;
        assert!(result.is_ok(), "artifact presence must override exit code");
    }

    #[tokio::test]
    async fn build_error_classified_and_leaves_no_stale_workspace() {
        let dir = TempDir::new().expect("temp dir");
        let handle = failing_compiler(dir.path());
        let work_root = dir.path().join("work");

        let failure = compile(&handle, &work_root, "\\badmacro", TIMEOUT)
            .await
            .expect_err("expected build failure");
        assert_eq!(failure.kind, FailureKind::SyntaxOrBuildError);
        assert!(failure.diagnostics.contains("Undefined control sequence"));
        assert_eq!(
            workspace_count(&work_root),
            0,
            "failed attempt must not leave a workspace behind"
        );
    }

    #[tokio::test]
    async fn timeout_kills_child_and_cleans_up() {
        let dir = TempDir::new().expect("temp dir");
        let handle = sleeping_compiler(dir.path());
        let work_root = dir.path().join("work");

        let started = std::time::Instant::now();
        let failure = compile(&handle, &work_root, "x", Duration::from_millis(250))
            .await
            .expect_err("expected timeout");
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert!(
            started.elapsed() < Duration::from_secs(5),
            "timeout must be enforced by the caller, not the tool"
        );
        assert_eq!(workspace_count(&work_root), 0);
    }

    #[tokio::test]
    async fn missing_compiler_is_classified_not_a_crash() {
        let dir = TempDir::new().expect("temp dir");
        let work_root = dir.path().join("work");

        let failure = compile(&CompilerHandle::NotFound, &work_root, "x", TIMEOUT)
            .await
            .expect_err("expected not-found failure");
        assert_eq!(failure.kind, FailureKind::CompilerNotFound);
    }

    #[tokio::test]
    async fn success_workspace_is_removed_once_artifact_drops() {
        let dir = TempDir::new().expect("temp dir");
        let handle = ok_compiler(dir.path());
        let work_root = dir.path().join("work");

        let artifact = compile(&handle, &work_root, "x", TIMEOUT)
            .await
            .expect("compile succeeds");
        assert_eq!(workspace_count(&work_root), 1);
        drop(artifact);
        assert_eq!(workspace_count(&work_root), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_compiles_do_not_interfere() {
        let dir = TempDir::new().expect("temp dir");
        let handle = ok_compiler(dir.path());
        let work_root = dir.path().join("work");

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..12 {
            let handle = handle.clone();
            let work_root = work_root.clone();
            tasks.spawn(async move {
                let markup = format!("PAYLOAD-{i}");
                let artifact = compile(&handle, &work_root, &markup, TIMEOUT)
                    .await
                    .expect("compile succeeds");
                let bytes = artifact.read_bytes().await.expect("read artifact");
                (markup, bytes)
            });
        }

        let mut seen = 0;
        while let Some(joined) = tasks.join_next().await {
            let (markup, bytes) = joined.expect("task completes");
            assert_eq!(
                String::from_utf8_lossy(&bytes),
                markup,
                "each compile must resolve to its own artifact"
            );
            seen += 1;
        }
        assert_eq!(seen, 12);
        assert_eq!(workspace_count(&work_root), 0);
    }
}
