//! NX-012: On-disk trees (read `node_modules`, ensure directories).

use super::{DirEnsurer, TreeReader};
use crate::core::error::{ExecError, InfraError};
use crate::core::types::DependencyTree;
use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads the top level of `<dir>/node_modules`, including `@scope/*` entries.
#[derive(Debug, Clone, Default)]
pub struct NodeModulesTree;

#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

#[async_trait]
impl TreeReader for NodeModulesTree {
    async fn load_tree(&self, dir: &Path) -> Result<DependencyTree, ExecError> {
        let modules = dir.join("node_modules");
        let mut tree = DependencyTree::new();

        let Some(entries) = list_dir(&modules).await? else {
            debug!(path = %modules.display(), "no node_modules; empty tree");
            return Ok(tree);
        };

        for (entry_name, entry_path) in entries {
            if entry_name.starts_with('.') {
                continue;
            }
            if entry_name.starts_with('@') {
                let scoped = list_dir(&entry_path).await?.unwrap_or_default();
                for (child_name, child_path) in scoped {
                    let fallback = format!("{}/{}", entry_name, child_name);
                    add_package(&mut tree, &child_path, &fallback).await;
                }
            } else {
                add_package(&mut tree, &entry_path, &entry_name).await;
            }
        }

        debug!(path = %dir.display(), packages = tree.len(), "loaded tree");
        Ok(tree)
    }
}

/// Directory entries sorted by name, or `None` if the directory does not exist.
async fn list_dir(dir: &Path) -> Result<Option<Vec<(String, PathBuf)>>, ExecError> {
    let tree_err = |e: std::io::Error| InfraError::TreeRead {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    };

    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(tree_err(e).into()),
    };

    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await.map_err(tree_err)? {
        let is_dir = entry
            .file_type()
            .await
            .map(|ft| ft.is_dir() || ft.is_symlink())
            .unwrap_or(false);
        if is_dir {
            entries.push((entry.file_name().to_string_lossy().to_string(), entry.path()));
        }
    }
    entries.sort();
    Ok(Some(entries))
}

/// Record the package at `path`. Unreadable manifests are skipped.
async fn add_package(tree: &mut DependencyTree, path: &Path, fallback_name: &str) {
    let manifest_path = path.join("package.json");
    let content = match tokio::fs::read_to_string(&manifest_path).await {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %manifest_path.display(), error = %e, "skipping package without readable package.json");
            return;
        }
    };
    let pkg: PackageJson = match serde_json::from_str(&content) {
        Ok(p) => p,
        Err(e) => {
            warn!(path = %manifest_path.display(), error = %e, "skipping invalid package.json");
            return;
        }
    };
    let Some(version) = pkg.version else {
        warn!(path = %manifest_path.display(), "skipping package.json without version");
        return;
    };
    let name = pkg.name.unwrap_or_else(|| fallback_name.to_string());
    tree.insert(&name, &version);
}

/// Creates directories on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsDirs;

#[async_trait]
impl DirEnsurer for FsDirs {
    async fn ensure_dir(&self, path: &Path) -> Result<(), ExecError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| InfraError::CreateDir {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(())
    }
}
