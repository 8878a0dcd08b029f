//! NX-011: Local process execution on the tokio runtime.

use super::ExecOutput;
use crate::core::error::{ExecError, InfraError};
use indexmap::IndexMap;
use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// Run `program` with `args`, capturing stdout and stderr.
pub async fn exec_capture(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
) -> Result<ExecOutput, ExecError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd.output().await.map_err(|e| InfraError::Spawn {
        program: program.to_string(),
        source: e,
    })?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Run `program` attached to this process's terminal (or to null when `inherit` is false).
pub async fn exec_attached(
    program: &str,
    args: &[String],
    cwd: &Path,
    env: &IndexMap<String, OsString>,
    inherit: bool,
) -> Result<ExitStatus, ExecError> {
    let stdio = || if inherit { Stdio::inherit() } else { Stdio::null() };
    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_os_str())))
        .stdin(stdio())
        .stdout(stdio())
        .stderr(stdio())
        .spawn()
        .map_err(|e| InfraError::Spawn {
            program: program.to_string(),
            source: e,
        })?;

    let status = child.wait().await.map_err(|e| InfraError::Spawn {
        program: program.to_string(),
        source: e,
    })?;
    Ok(status)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_nx011_capture_echo() {
        let out = exec_capture("sh", &sh("echo hello"), None).await.unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_nx011_capture_failure() {
        let out = exec_capture("sh", &sh("echo bad >&2; exit 42"), None).await.unwrap();
        assert!(!out.success());
        assert_eq!(out.exit_code, 42);
        assert!(out.stderr.contains("bad"));
    }

    #[tokio::test]
    async fn test_nx011_capture_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let out = exec_capture("sh", &sh("pwd"), Some(dir.path())).await.unwrap();
        let reported = std::path::PathBuf::from(out.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_nx011_spawn_missing_program() {
        let err = exec_capture("npexec-definitely-not-a-program", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecError::Infrastructure(InfraError::Spawn { .. })
        ));
    }

    #[tokio::test]
    async fn test_nx011_attached_env_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = IndexMap::new();
        env.insert("NPEXEC_PROBE".to_string(), OsString::from("7"));
        let status = exec_attached("sh", &sh("exit $NPEXEC_PROBE"), dir.path(), &env, false)
            .await
            .unwrap();
        assert_eq!(status.code(), Some(7));
    }
}
