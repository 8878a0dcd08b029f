//! NX-010: Collaborator boundary. Traits the core awaits, plus default implementations.
//!
//! The resolver never touches npm, the registry, or child processes directly.
//! Each call site goes through one of these traits with a typed option struct:
//!
//! 1. [`TreeReader`]: packages physically present under a directory
//! 2. [`DirEnsurer`]: idempotent directory creation
//! 3. [`ManifestFetcher`]: registry metadata, including range → version
//! 4. [`Installer`]: converge a directory to include a set of specs
//! 5. [`ScriptRunner`]: run a command line with inherited stdio
//! 6. [`ProgressController`]: process-wide progress toggle

pub mod installer;
pub mod progress;
pub mod registry;
pub mod runner;
pub mod tree;

use crate::core::error::ExecError;
use crate::core::types::{DependencyTree, Manifest, PackageSpec};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub use installer::NpmInstaller;
pub use progress::{ProgressPause, StderrProgress};
pub use registry::NpmRegistry;
pub use runner::ShellRunner;
pub use tree::{FsDirs, NodeModulesTree};

/// Event tag for ephemeral execution, distinct from lifecycle scripts.
pub const NPX_EVENT: &str = "npx";

/// Options for a manifest lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestOptions {
    /// Registry URL override; `None` uses the fetcher's default.
    pub registry: Option<String>,
}

/// Options for one installer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    /// Root of the tree to converge.
    pub target_dir: PathBuf,
    /// Normalized specs to add, sorted.
    pub add: Vec<String>,
    pub registry: Option<String>,
}

/// How the child's stdio is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    Inherit,
    Null,
}

/// Options for one script-runner invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Working directory of the child.
    pub target_dir: PathBuf,
    /// Full command line handed to the shell.
    pub script: String,
    /// Event tag exported to the child as `npm_lifecycle_event`.
    pub event: String,
    /// Variables set on top of the inherited environment.
    pub env: IndexMap<String, OsString>,
    pub stdio: StdioMode,
    /// Echo the event and script to stderr before running.
    pub banner: bool,
}

#[async_trait]
pub trait TreeReader: Send + Sync {
    /// Read the tree rooted at `dir`. A directory with no tree yields an empty tree.
    async fn load_tree(&self, dir: &Path) -> Result<DependencyTree, ExecError>;
}

#[async_trait]
pub trait DirEnsurer: Send + Sync {
    async fn ensure_dir(&self, path: &Path) -> Result<(), ExecError>;
}

#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    async fn fetch_manifest(
        &self,
        spec: &PackageSpec,
        options: &ManifestOptions,
    ) -> Result<Manifest, ExecError>;
}

#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self, options: &InstallOptions) -> Result<(), ExecError>;
}

#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run to completion. Non-zero exit and spawn failure are errors.
    async fn run(&self, options: &RunOptions) -> Result<(), ExecError>;
}

pub trait ProgressController: Send + Sync {
    fn disable(&self);
    fn enable(&self);
}
