//! NX-017: CLI subcommands (exec, cache-dir).

use crate::backend::{
    FsDirs, NodeModulesTree, NpmInstaller, NpmRegistry, ShellRunner, StderrProgress,
};
use crate::core::cachekey;
use crate::core::config::{self, ExecConfig};
use crate::core::error::{ExecError, InfraError};
use crate::core::executor::{self, ExecContext, ExecInput, Prepared};
use crate::core::types::{InstallLocation, PackageSpec};
use clap::Subcommand;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command from a local or cached package, installing it if needed
    Exec {
        /// Package to make available (repeatable)
        #[arg(short, long = "package", value_name = "SPEC")]
        package: Vec<String>,

        /// Shell command line to run instead of a bin
        #[arg(short, long)]
        call: Option<String>,

        /// Cache root (default: ~/.npm)
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Registry URL passed to npm
        #[arg(long)]
        registry: Option<String>,

        /// Path to npexec.yaml
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print resolution events to stderr as JSON lines before launching
        #[arg(long)]
        json: bool,

        /// Command (or package) followed by its arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Print the shared cache directory a set of packages would use
    CacheDir {
        /// Package specs
        #[arg(required = true)]
        specs: Vec<String>,

        /// Cache root (default: ~/.npm)
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Path to npexec.yaml
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Dispatch a CLI command.
pub async fn dispatch(cmd: Commands) -> Result<(), ExecError> {
    match cmd {
        Commands::Exec {
            package,
            call,
            cache,
            registry,
            config,
            json,
            args,
        } => {
            let cfg = effective_config(config.as_deref(), cache, registry)?;
            let cwd = current_dir()?;
            let input = ExecInput {
                packages: &package,
                call: call.as_deref(),
                args: &args,
            };
            cmd_exec(&cfg, &cwd, input, json).await.map(|_| ())
        }
        Commands::CacheDir {
            specs,
            cache,
            config,
        } => {
            let cfg = effective_config(config.as_deref(), cache, None)?;
            let location = cache_dir_for(&specs, &cfg.cache)?;
            println!("{}", location.path().display());
            Ok(())
        }
    }
}

fn current_dir() -> Result<PathBuf, ExecError> {
    std::env::current_dir()
        .map_err(|e| InfraError::Config(format!("cannot read working directory: {}", e)).into())
}

/// File and environment config with command-line flags applied last.
fn effective_config(
    file: Option<&Path>,
    cache: Option<PathBuf>,
    registry: Option<String>,
) -> Result<ExecConfig, ExecError> {
    let mut cfg = config::load_config(file)?;
    if let Some(cache) = cache {
        cfg.cache = cache;
    }
    if registry.is_some() {
        cfg.registry = registry;
    }
    config::check_config(&cfg)?;
    Ok(cfg)
}

/// Shared cache location for `specs`, without touching the filesystem.
fn cache_dir_for(specs: &[String], cache_root: &Path) -> Result<InstallLocation, ExecError> {
    let parsed = specs
        .iter()
        .map(|s| PackageSpec::parse(s))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(InstallLocation::cache(cache_root, cachekey::derive(&parsed)))
}

/// Default npm-backed collaborators built from config.
struct Backends {
    tree: NodeModulesTree,
    dirs: FsDirs,
    registry: NpmRegistry,
    installer: NpmInstaller,
    runner: ShellRunner,
    progress: StderrProgress,
}

impl Backends {
    fn from_config(cfg: &ExecConfig) -> Self {
        Self {
            tree: NodeModulesTree,
            dirs: FsDirs,
            registry: NpmRegistry::new(&cfg.npm),
            installer: NpmInstaller::new(&cfg.npm),
            runner: ShellRunner::new(&cfg.shell),
            progress: StderrProgress::new(cfg.progress),
        }
    }

    fn context(
        &self,
        cfg: &ExecConfig,
        cwd: &Path,
        ambient_path: Option<OsString>,
    ) -> ExecContext<'_> {
        ExecContext {
            tree: &self.tree,
            dirs: &self.dirs,
            manifests: &self.registry,
            installer: &self.installer,
            runner: &self.runner,
            progress: &self.progress,
            cache_root: cfg.cache.clone(),
            local_root: config::local_prefix(cwd),
            cwd: cwd.to_path_buf(),
            registry: cfg.registry.clone(),
            ambient_path,
        }
    }
}

async fn cmd_exec(
    cfg: &ExecConfig,
    cwd: &Path,
    input: ExecInput<'_>,
    json: bool,
) -> Result<Prepared, ExecError> {
    let backends = Backends::from_config(cfg);
    let ctx = backends.context(cfg, cwd, std::env::var_os("PATH"));

    let prepared = executor::prepare(&ctx, input).await?;
    for event in prepared.events() {
        if json {
            match serde_json::to_string(event) {
                Ok(line) => eprintln!("{}", line),
                Err(e) => tracing::warn!(error = %e, "cannot serialize event"),
            }
        } else {
            backends.progress.status(&event.to_string());
        }
    }

    executor::launch(&ctx, &prepared).await?;
    Ok(prepared)
}
