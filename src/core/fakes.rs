//! In-memory collaborators for resolver and launcher tests.

use super::error::{ExecError, InfraError};
use super::types::{DependencyTree, Manifest, PackageSpec};
use crate::backend::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Every collaborator at once, recording each call it receives.
pub struct FakeWorld {
    trees: Mutex<HashMap<PathBuf, DependencyTree>>,
    calls: Mutex<Vec<String>>,
    manifests: Mutex<HashMap<String, Manifest>>,
    tree_reads: Mutex<Vec<PathBuf>>,
    mkdirs: Mutex<Vec<PathBuf>>,
    installs: Mutex<Vec<InstallOptions>>,
    runs: Mutex<Vec<RunOptions>>,
    install_failure: Mutex<Option<String>>,
    run_exit: Mutex<Option<i32>>,
    progress_enabled: AtomicBool,
    progress_calls: Mutex<Vec<&'static str>>,
    progress_during_runs: Mutex<Vec<bool>>,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self {
            trees: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            manifests: Mutex::new(HashMap::new()),
            tree_reads: Mutex::new(Vec::new()),
            mkdirs: Mutex::new(Vec::new()),
            installs: Mutex::new(Vec::new()),
            runs: Mutex::new(Vec::new()),
            install_failure: Mutex::new(None),
            run_exit: Mutex::new(None),
            progress_enabled: AtomicBool::new(true),
            progress_calls: Mutex::new(Vec::new()),
            progress_during_runs: Mutex::new(Vec::new()),
        }
    }

    pub fn add_tree_entry(&self, root: impl AsRef<Path>, name: &str, version: &str) {
        self.trees
            .lock()
            .unwrap()
            .entry(root.as_ref().to_path_buf())
            .or_default()
            .insert(name, version);
    }

    /// Register the manifest `spec` resolves to.
    pub fn add_manifest(&self, spec: &str, name: &str, version: &str, bins: &[&str]) {
        let spec = PackageSpec::parse(spec).unwrap();
        let manifest = Manifest {
            name: name.to_string(),
            version: version.to_string(),
            bin: bins.iter().map(|b| (b.to_string(), b.to_string())).collect(),
            resolved_spec: spec.normalized(),
        };
        self.manifests
            .lock()
            .unwrap()
            .insert(spec.normalized(), manifest);
    }

    pub fn fail_install(&self, reason: &str) {
        *self.install_failure.lock().unwrap() = Some(reason.to_string());
    }

    pub fn fail_run(&self, code: i32) {
        *self.run_exit.lock().unwrap() = Some(code);
    }

    /// Every collaborator call in order, as `"<op> <target>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &str, target: impl std::fmt::Display) {
        self.calls.lock().unwrap().push(format!("{} {}", op, target));
    }

    pub fn tree_reads(&self) -> Vec<PathBuf> {
        self.tree_reads.lock().unwrap().clone()
    }

    pub fn mkdirs(&self) -> Vec<PathBuf> {
        self.mkdirs.lock().unwrap().clone()
    }

    pub fn installs(&self) -> Vec<InstallOptions> {
        self.installs.lock().unwrap().clone()
    }

    pub fn runs(&self) -> Vec<RunOptions> {
        self.runs.lock().unwrap().clone()
    }

    pub fn progress_enabled(&self) -> bool {
        self.progress_enabled.load(Ordering::SeqCst)
    }

    pub fn progress_calls(&self) -> Vec<&'static str> {
        self.progress_calls.lock().unwrap().clone()
    }

    /// Progress state observed at the start of each run.
    pub fn progress_during_runs(&self) -> Vec<bool> {
        self.progress_during_runs.lock().unwrap().clone()
    }
}

#[async_trait]
impl TreeReader for FakeWorld {
    async fn load_tree(&self, dir: &Path) -> Result<DependencyTree, ExecError> {
        self.record("load_tree", dir.display());
        self.tree_reads.lock().unwrap().push(dir.to_path_buf());
        Ok(self
            .trees
            .lock()
            .unwrap()
            .get(dir)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl DirEnsurer for FakeWorld {
    async fn ensure_dir(&self, path: &Path) -> Result<(), ExecError> {
        self.record("ensure_dir", path.display());
        self.mkdirs.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

#[async_trait]
impl ManifestFetcher for FakeWorld {
    async fn fetch_manifest(
        &self,
        spec: &PackageSpec,
        _options: &ManifestOptions,
    ) -> Result<Manifest, ExecError> {
        self.manifests
            .lock()
            .unwrap()
            .get(&spec.normalized())
            .cloned()
            .ok_or_else(|| {
                InfraError::Manifest {
                    spec: spec.normalized(),
                    reason: "404 Not Found".to_string(),
                }
                .into()
            })
    }
}

#[async_trait]
impl Installer for FakeWorld {
    async fn install(&self, options: &InstallOptions) -> Result<(), ExecError> {
        self.record("install", options.target_dir.display());
        self.installs.lock().unwrap().push(options.clone());
        match self.install_failure.lock().unwrap().clone() {
            Some(reason) => Err(InfraError::Install {
                dir: options.target_dir.clone(),
                reason,
            }
            .into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ScriptRunner for FakeWorld {
    async fn run(&self, options: &RunOptions) -> Result<(), ExecError> {
        self.progress_during_runs
            .lock()
            .unwrap()
            .push(self.progress_enabled());
        self.record("run", &options.script);
        self.runs.lock().unwrap().push(options.clone());
        match *self.run_exit.lock().unwrap() {
            Some(code) => Err(InfraError::Script {
                script: options.script.clone(),
                code: Some(code),
            }
            .into()),
            None => Ok(()),
        }
    }
}

impl ProgressController for FakeWorld {
    fn disable(&self) {
        self.progress_enabled.store(false, Ordering::SeqCst);
        self.progress_calls.lock().unwrap().push("disable");
    }

    fn enable(&self) {
        self.progress_enabled.store(true, Ordering::SeqCst);
        self.progress_calls.lock().unwrap().push("enable");
    }
}
