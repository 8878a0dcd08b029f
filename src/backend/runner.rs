//! NX-016: Script runner for shell command lines with inherited stdio.

use super::{RunOptions, ScriptRunner, StdioMode};
use crate::core::error::{ExecError, InfraError};
use crate::core::launcher::join_search_path;
use crate::transport::{local, shell_args};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `node_modules/.bin` of `dir` and of each ancestor, nearest first.
pub fn local_bin_dirs(dir: &Path) -> Vec<PathBuf> {
    dir.ancestors()
        .map(|d| d.join("node_modules").join(".bin"))
        .collect()
}

/// Runs scripts through `<shell> -c`.
///
/// Local bins under the target directory and its ancestors go ahead of the
/// PATH in `RunOptions.env`, or of the inherited PATH when none is given.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

#[async_trait]
impl ScriptRunner for ShellRunner {
    async fn run(&self, options: &RunOptions) -> Result<(), ExecError> {
        if options.banner {
            eprintln!("\n> {}\n> {}\n", options.event, options.script);
        }

        let mut env = options.env.clone();
        env.insert(
            "npm_lifecycle_event".to_string(),
            OsString::from(&options.event),
        );
        env.insert(
            "npm_lifecycle_script".to_string(),
            OsString::from(&options.script),
        );
        let base = env
            .get("PATH")
            .cloned()
            .or_else(|| std::env::var_os("PATH"));
        let bins = local_bin_dirs(&options.target_dir);
        if let Some(path) = join_search_path(&bins, base.as_ref())? {
            env.insert("PATH".to_string(), path);
        }

        let args = shell_args(&self.shell, &options.script);
        debug!(shell = %self.shell, script = %options.script, "spawning");
        let status = local::exec_attached(
            &self.shell,
            &args,
            &options.target_dir,
            &env,
            options.stdio == StdioMode::Inherit,
        )
        .await?;

        if status.success() {
            Ok(())
        } else {
            Err(InfraError::Script {
                script: options.script.clone(),
                code: status.code(),
            }
            .into())
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn opts(dir: &std::path::Path, script: &str) -> RunOptions {
        RunOptions {
            target_dir: dir.to_path_buf(),
            script: script.to_string(),
            event: "npx".to_string(),
            env: IndexMap::new(),
            stdio: StdioMode::Null,
            banner: false,
        }
    }

    #[tokio::test]
    async fn test_nx016_success() {
        let dir = tempfile::tempdir().unwrap();
        ShellRunner::new("sh").run(&opts(dir.path(), "true")).await.unwrap();
    }

    #[tokio::test]
    async fn test_nx016_nonzero_exit_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ShellRunner::new("sh")
            .run(&opts(dir.path(), "exit 3"))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_nx016_event_exported() {
        let dir = tempfile::tempdir().unwrap();
        let script = "test \"$npm_lifecycle_event\" = npx && echo \"$npm_lifecycle_event\" > event.txt";
        ShellRunner::new("sh").run(&opts(dir.path(), script)).await.unwrap();
        let written = std::fs::read_to_string(dir.path().join("event.txt")).unwrap();
        assert_eq!(written.trim(), "npx");
    }

    #[tokio::test]
    async fn test_nx016_path_from_env() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let tool = bin.join("npexec-probe-tool");
        std::fs::write(&tool, "#!/bin/sh\necho probed > \"$1\"\n").unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut o = opts(dir.path(), "npexec-probe-tool out.txt");
        let path = std::env::join_paths([bin.clone(), std::path::PathBuf::from("/usr/bin"), std::path::PathBuf::from("/bin")]).unwrap();
        o.env.insert("PATH".to_string(), path);
        ShellRunner::new("sh").run(&o).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out.txt")).unwrap().trim(),
            "probed"
        );
    }

    fn write_tool(bin: &std::path::Path, name: &str) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::create_dir_all(bin).unwrap();
        let tool = bin.join(name);
        std::fs::write(&tool, "#!/bin/sh\necho local > \"$1\"\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_nx016_local_bin_dirs_nearest_first() {
        let dirs = local_bin_dirs(std::path::Path::new("/a/b"));
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/a/b/node_modules/.bin"),
                PathBuf::from("/a/node_modules/.bin"),
                PathBuf::from("/node_modules/.bin"),
            ]
        );
    }

    #[tokio::test]
    async fn test_nx016_local_bins_on_path() {
        let dir = tempfile::tempdir().unwrap();
        write_tool(&dir.path().join("node_modules").join(".bin"), "npexec-local-tool");

        let mut o = opts(dir.path(), "npexec-local-tool out.txt");
        let ambient = std::env::join_paths([PathBuf::from("/usr/bin"), PathBuf::from("/bin")]).unwrap();
        o.env.insert("PATH".to_string(), ambient);
        ShellRunner::new("sh").run(&o).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out.txt")).unwrap().trim(),
            "local"
        );
    }

    #[tokio::test]
    async fn test_nx016_ancestor_bins_on_path() {
        let dir = tempfile::tempdir().unwrap();
        write_tool(&dir.path().join("node_modules").join(".bin"), "npexec-parent-tool");
        let nested = dir.path().join("packages").join("app");
        std::fs::create_dir_all(&nested).unwrap();

        ShellRunner::new("sh")
            .run(&opts(&nested, "npexec-parent-tool out.txt"))
            .await
            .unwrap();
        assert!(nested.join("out.txt").is_file());
    }

    #[tokio::test]
    async fn test_nx016_missing_shell_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ShellRunner::new("npexec-no-such-shell")
            .run(&opts(dir.path(), "true"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecError::Infrastructure(InfraError::Spawn { .. })
        ));
    }
}
