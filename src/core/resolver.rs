//! NX-004: Three-tier resolution (local tree, shared cache tree, install).
//!
//! Tiers short-circuit on full satisfaction:
//! local tree → `<cache>/_npx/<key>` tree → installer (missing specs only).
//! Range resolution is delegated to the manifest fetcher; a tree satisfies a
//! spec when it holds the manifest's package at the manifest's version, or at
//! any version for an unversioned spec.

use super::cachekey;
use super::error::ExecError;
use super::types::*;
use crate::backend::{
    DirEnsurer, InstallOptions, Installer, ManifestFetcher, ManifestOptions, TreeReader,
};
use std::path::Path;
use tracing::{debug, info};

/// Collaborators and settings for one resolution.
pub struct ResolutionEngine<'a> {
    pub tree: &'a dyn TreeReader,
    pub dirs: &'a dyn DirEnsurer,
    pub manifests: &'a dyn ManifestFetcher,
    pub installer: &'a dyn Installer,
    pub cache_root: &'a Path,
    pub registry: Option<&'a str>,
}

/// Result of resolving a request.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Tree the executables come from.
    pub location: InstallLocation,
    /// Manifest for every requested spec, in request order.
    pub manifests: Vec<(PackageSpec, Manifest)>,
    /// Specs handed to the installer; empty when nothing was installed.
    pub installed: Vec<String>,
    pub events: Vec<ExecEvent>,
}

impl Resolution {
    pub fn manifest_for(&self, spec: &PackageSpec) -> Option<&Manifest> {
        self.manifests
            .iter()
            .find(|(s, _)| s == spec)
            .map(|(_, m)| m)
    }
}

/// True when `tree` already holds what `spec` resolved to.
pub fn is_satisfied(tree: &DependencyTree, spec: &PackageSpec, manifest: &Manifest) -> bool {
    match tree.get(&manifest.name) {
        None => false,
        Some(_) if spec.is_unversioned() => true,
        Some(node) => node.version == manifest.version,
    }
}

fn unsatisfied<'m>(
    tree: &DependencyTree,
    manifests: &'m [(PackageSpec, Manifest)],
) -> Vec<&'m PackageSpec> {
    manifests
        .iter()
        .filter(|(spec, mani)| !is_satisfied(tree, spec, mani))
        .map(|(spec, _)| spec)
        .collect()
}

impl ResolutionEngine<'_> {
    /// Resolve `request` against `local_root`, installing into the cache if needed.
    pub async fn resolve(
        &self,
        request: &ExecutionRequest,
        local_root: &Path,
    ) -> Result<Resolution, ExecError> {
        let mut events = Vec::new();
        let options = ManifestOptions {
            registry: self.registry.map(str::to_string),
        };

        let mut manifests = Vec::with_capacity(request.packages.len());
        for spec in &request.packages {
            let manifest = self.manifests.fetch_manifest(spec, &options).await?;
            debug!(spec = %spec, id = %manifest.id(), "manifest resolved");
            events.push(ExecEvent::ManifestResolved {
                spec: spec.normalized(),
                id: manifest.id(),
            });
            manifests.push((spec.clone(), manifest));
        }

        let local_location = InstallLocation::Local(local_root.to_path_buf());
        if manifests.is_empty() {
            return Ok(Resolution {
                location: local_location,
                manifests,
                installed: Vec::new(),
                events,
            });
        }

        // Tier 1: the caller's own tree.
        let local_tree = self.tree.load_tree(local_root).await?;
        let missing_local: Vec<String> = unsatisfied(&local_tree, &manifests)
            .into_iter()
            .map(PackageSpec::normalized)
            .collect();
        if missing_local.is_empty() {
            info!(root = %local_root.display(), "all packages present locally");
            events.push(ExecEvent::LocalSatisfied {
                root: local_root.to_path_buf(),
            });
            return Ok(Resolution {
                location: local_location,
                manifests,
                installed: Vec::new(),
                events,
            });
        }
        debug!(missing = ?missing_local, "local tree incomplete");
        events.push(ExecEvent::LocalMissing {
            missing: missing_local,
        });

        // Tier 2: shared cache keyed by the full requested set.
        let key = cachekey::derive(&request.packages);
        let location = InstallLocation::cache(self.cache_root, key.clone());
        self.dirs.ensure_dir(location.path()).await?;
        events.push(ExecEvent::CacheDirEnsured {
            key: key.to_string(),
            path: location.path().to_path_buf(),
        });
        let cache_tree = self.tree.load_tree(location.path()).await?;

        // Tier 3: install exactly what the cache tree lacks.
        let mut add: Vec<String> = unsatisfied(&cache_tree, &manifests)
            .into_iter()
            .map(PackageSpec::normalized)
            .collect();
        add.sort();

        if add.is_empty() {
            info!(key = %key, "cache tree already satisfies request");
            events.push(ExecEvent::CacheSatisfied {
                path: location.path().to_path_buf(),
            });
        } else {
            info!(key = %key, add = ?add, "installing into cache");
            self.installer
                .install(&InstallOptions {
                    target_dir: location.path().to_path_buf(),
                    add: add.clone(),
                    registry: options.registry.clone(),
                })
                .await?;
            events.push(ExecEvent::Installed {
                path: location.path().to_path_buf(),
                add: add.clone(),
            });
        }

        Ok(Resolution {
            location,
            manifests,
            installed: add,
            events,
        })
    }
}
