//! NX-008: Executor for one ephemeral execution, end to end.
//!
//! request → resolve (local → cache → install) → bin → launch
//!
//! [`prepare`] does everything up to the launch so callers can inspect or
//! report the resolution first; [`exec`] runs the whole pipeline.

use super::bin;
use super::error::ExecError;
use super::launcher::{self, Launcher};
use super::request;
use super::resolver::{Resolution, ResolutionEngine};
use super::types::*;
use crate::backend::{
    DirEnsurer, Installer, ManifestFetcher, ProgressController, ScriptRunner, TreeReader,
};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;

/// Collaborators and environment for an execution.
pub struct ExecContext<'a> {
    pub tree: &'a dyn TreeReader,
    pub dirs: &'a dyn DirEnsurer,
    pub manifests: &'a dyn ManifestFetcher,
    pub installer: &'a dyn Installer,
    pub runner: &'a dyn ScriptRunner,
    pub progress: &'a dyn ProgressController,
    /// Root of the shared install cache (`<cache>/_npx/<key>` lives under it).
    pub cache_root: PathBuf,
    /// Project whose tree is checked first.
    pub local_root: PathBuf,
    /// Working directory of the launched command.
    pub cwd: PathBuf,
    pub registry: Option<String>,
    pub ambient_path: Option<OsString>,
}

/// Raw CLI-level inputs.
#[derive(Debug, Clone, Copy)]
pub struct ExecInput<'a> {
    pub packages: &'a [String],
    pub call: Option<&'a str>,
    pub args: &'a [String],
}

/// Everything decided before launch.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub request: ExecutionRequest,
    pub resolution: Resolution,
    pub executable: ResolvedExecutable,
}

impl Prepared {
    /// Stage events in the order they happened.
    pub fn events(&self) -> &[ExecEvent] {
        &self.resolution.events
    }
}

/// Build the request, resolve packages, and pick the executable.
pub async fn prepare(ctx: &ExecContext<'_>, input: ExecInput<'_>) -> Result<Prepared, ExecError> {
    let request = request::build(input.packages, input.call, input.args)?;
    debug!(?request, "request built");

    let engine = ResolutionEngine {
        tree: ctx.tree,
        dirs: ctx.dirs,
        manifests: ctx.manifests,
        installer: ctx.installer,
        cache_root: &ctx.cache_root,
        registry: ctx.registry.as_deref(),
    };
    let mut resolution = engine.resolve(&request, &ctx.local_root).await?;

    let bin_name = match &request.target {
        ExecTarget::Call(script) => script.clone(),
        ExecTarget::Command(name) => name.clone(),
        ExecTarget::PackageBin(spec) => {
            let manifest = resolution
                .manifest_for(spec)
                .ok_or_else(|| ExecError::NoExecutable {
                    pkgid: spec.normalized(),
                })?;
            let bin = bin::resolve_bin(manifest, Some(spec.base_name()))?;
            let package = manifest.id();
            resolution.events.push(ExecEvent::BinSelected {
                package,
                bin: bin.clone(),
            });
            bin
        }
    };

    let executable = ResolvedExecutable {
        bin_name,
        search_path: launcher::search_path_for(&resolution.location),
    };

    Ok(Prepared {
        request,
        resolution,
        executable,
    })
}

/// Launch a prepared execution.
pub async fn launch(ctx: &ExecContext<'_>, prepared: &Prepared) -> Result<(), ExecError> {
    let launcher = Launcher {
        runner: ctx.runner,
        progress: ctx.progress,
        cwd: ctx.cwd.clone(),
        ambient_path: ctx.ambient_path.clone(),
    };
    launcher
        .launch(
            &prepared.executable,
            &prepared.resolution.location,
            &prepared.request.args,
        )
        .await
}

/// Run the full pipeline.
pub async fn exec(ctx: &ExecContext<'_>, input: ExecInput<'_>) -> Result<Prepared, ExecError> {
    let prepared = prepare(ctx, input).await?;
    launch(ctx, &prepared).await?;
    Ok(prepared)
}
