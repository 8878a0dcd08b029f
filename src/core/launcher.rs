//! NX-006: Execution launcher (PATH assembly, progress pause, script runner call).

use super::error::{ExecError, InfraError};
use super::types::{InstallLocation, ResolvedExecutable};
use crate::backend::{
    ProgressController, ProgressPause, RunOptions, ScriptRunner, StdioMode, NPX_EVENT,
};
use crate::transport::quote_arg;
use indexmap::IndexMap;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::info;

/// Launches resolved executables through a [`ScriptRunner`].
pub struct Launcher<'a> {
    pub runner: &'a dyn ScriptRunner,
    pub progress: &'a dyn ProgressController,
    /// Working directory handed to the runner.
    pub cwd: PathBuf,
    /// PATH inherited from the environment.
    pub ambient_path: Option<OsString>,
}

/// Directories to put ahead of the ambient PATH for `location`.
pub fn search_path_for(location: &InstallLocation) -> Vec<PathBuf> {
    if location.is_cache() {
        vec![location.bin_dir()]
    } else {
        Vec::new()
    }
}

/// Prepend `prefix` to `ambient` using the platform path-list delimiter.
pub fn join_search_path(
    prefix: &[PathBuf],
    ambient: Option<&OsString>,
) -> Result<Option<OsString>, ExecError> {
    if prefix.is_empty() {
        return Ok(ambient.cloned());
    }
    let mut dirs: Vec<PathBuf> = prefix.to_vec();
    if let Some(ambient) = ambient {
        dirs.extend(std::env::split_paths(ambient));
    }
    let joined = std::env::join_paths(dirs)
        .map_err(|e| InfraError::Config(format!("cannot build PATH: {}", e)))?;
    Ok(Some(joined))
}

/// Full command line: the bin (or call string) followed by quoted arguments.
pub fn command_line(bin_name: &str, args: &[String]) -> String {
    let mut line = bin_name.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&quote_arg(arg));
    }
    line
}

impl Launcher<'_> {
    /// The runner options `launch` would use.
    pub fn run_options(
        &self,
        exe: &ResolvedExecutable,
        args: &[String],
    ) -> Result<RunOptions, ExecError> {
        let mut env = IndexMap::new();
        if let Some(path) = join_search_path(&exe.search_path, self.ambient_path.as_ref())? {
            env.insert("PATH".to_string(), path);
        }
        Ok(RunOptions {
            target_dir: self.cwd.clone(),
            script: command_line(&exe.bin_name, args),
            event: NPX_EVENT.to_string(),
            env,
            stdio: StdioMode::Inherit,
            banner: false,
        })
    }

    /// Run `exe` with `args`. Progress output is paused for the child's lifetime.
    pub async fn launch(
        &self,
        exe: &ResolvedExecutable,
        location: &InstallLocation,
        args: &[String],
    ) -> Result<(), ExecError> {
        let options = self.run_options(exe, args)?;
        info!(script = %options.script, location = %location, "launching");

        let _pause = ProgressPause::new(self.progress);
        self.runner.run(&options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fakes::FakeWorld;
    use crate::core::types::CacheKey;
    use std::path::Path;

    fn launcher(world: &FakeWorld) -> Launcher<'_> {
        Launcher {
            runner: world,
            progress: world,
            cwd: PathBuf::from("/work"),
            ambient_path: Some(OsString::from("/usr/bin")),
        }
    }

    fn cache_location() -> InstallLocation {
        InstallLocation::cache(Path::new("/cache"), CacheKey("0123456789abcdef".into()))
    }

    #[test]
    fn test_nx006_search_path_local_is_empty() {
        assert!(search_path_for(&InstallLocation::Local(PathBuf::from("/p"))).is_empty());
        assert_eq!(
            search_path_for(&cache_location()),
            vec![PathBuf::from("/cache/_npx/0123456789abcdef/node_modules/.bin")]
        );
    }

    #[test]
    fn test_nx006_join_search_path() {
        let ambient = OsString::from("/usr/bin");
        assert_eq!(join_search_path(&[], Some(&ambient)).unwrap(), Some(ambient.clone()));
        assert_eq!(join_search_path(&[], None).unwrap(), None);

        let prefix = vec![PathBuf::from("/c/node_modules/.bin")];
        let joined = join_search_path(&prefix, Some(&ambient)).unwrap().unwrap();
        let parts: Vec<PathBuf> = std::env::split_paths(&joined).collect();
        assert_eq!(parts, vec![PathBuf::from("/c/node_modules/.bin"), PathBuf::from("/usr/bin")]);
    }

    #[test]
    fn test_nx006_command_line_quotes_args() {
        assert_eq!(command_line("foo", &[]), "foo");
        assert_eq!(
            command_line("bar", &["--some=arg".into(), "two words".into()]),
            "bar --some=arg 'two words'"
        );
        assert_eq!(command_line("ls -laF", &[]), "ls -laF");
    }

    #[tokio::test]
    async fn test_nx006_local_launch_keeps_path() {
        let world = FakeWorld::new();
        let exe = ResolvedExecutable {
            bin_name: "foo".into(),
            search_path: vec![],
        };
        launcher(&world)
            .launch(&exe, &InstallLocation::Local(PathBuf::from("/p")), &[])
            .await
            .unwrap();

        let runs = world.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].script, "foo");
        assert_eq!(runs[0].event, "npx");
        assert_eq!(runs[0].target_dir, PathBuf::from("/work"));
        assert_eq!(runs[0].stdio, StdioMode::Inherit);
        assert!(!runs[0].banner);
        assert_eq!(runs[0].env.get("PATH"), Some(&OsString::from("/usr/bin")));
    }

    #[tokio::test]
    async fn test_nx006_cache_launch_prefixes_path() {
        let world = FakeWorld::new();
        let location = cache_location();
        let exe = ResolvedExecutable {
            bin_name: "foo".into(),
            search_path: search_path_for(&location),
        };
        launcher(&world).launch(&exe, &location, &[]).await.unwrap();

        let path = world.runs()[0].env.get("PATH").cloned().unwrap();
        let parts: Vec<PathBuf> = std::env::split_paths(&path).collect();
        assert_eq!(parts[0], location.bin_dir());
        assert_eq!(parts[1], PathBuf::from("/usr/bin"));
    }

    #[tokio::test]
    async fn test_nx006_progress_paused_for_run() {
        let world = FakeWorld::new();
        let exe = ResolvedExecutable {
            bin_name: "foo".into(),
            search_path: vec![],
        };
        launcher(&world)
            .launch(&exe, &InstallLocation::Local(PathBuf::from("/p")), &[])
            .await
            .unwrap();
        assert_eq!(world.progress_during_runs(), vec![false]);
        assert_eq!(world.progress_calls(), vec!["disable", "enable"]);
        assert!(world.progress_enabled());
    }

    #[tokio::test]
    async fn test_nx006_progress_restored_on_failure() {
        let world = FakeWorld::new();
        world.fail_run(2);
        let exe = ResolvedExecutable {
            bin_name: "foo".into(),
            search_path: vec![],
        };
        let err = launcher(&world)
            .launch(&exe, &InstallLocation::Local(PathBuf::from("/p")), &[])
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(world.progress_during_runs(), vec![false]);
        assert_eq!(world.progress_calls(), vec!["disable", "enable"]);
        assert!(world.progress_enabled());
    }
}
