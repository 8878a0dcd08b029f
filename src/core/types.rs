//! NX-001: Core types (package specs, requests, install locations, trees, manifests).
//!
//! Everything here is plain data. Parsing of package specifiers lives on
//! [`PackageSpec`]; every other type is constructed by the stage that owns it.

use super::error::ExecError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Package specifiers
// ============================================================================

/// A package name plus an optional version, range, or tag.
///
/// Accepted shapes: `name`, `name@range`, `@scope/name`, `@scope/name@range`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageSpec {
    name: String,
    range: String,
}

impl PackageSpec {
    /// Parse a raw specifier as typed on the command line.
    pub fn parse(raw: &str) -> Result<Self, ExecError> {
        let raw = raw.trim();
        let invalid = |reason: &str| ExecError::InvalidSpec {
            spec: raw.to_string(),
            reason: reason.to_string(),
        };

        // The version separator is the first '@' after the scope prefix.
        let search_from = if raw.starts_with('@') {
            raw.find('/').ok_or_else(|| invalid("scoped name needs a '/'"))? + 1
        } else {
            0
        };
        let (name, range) = match raw[search_from..].find('@') {
            Some(at) => raw.split_at(search_from + at),
            None => (raw, ""),
        };
        let range = range.strip_prefix('@').unwrap_or(range);

        if name.is_empty() || name.ends_with('/') {
            return Err(invalid("empty package name"));
        }
        if name.chars().any(|c| c.is_whitespace() || c == ',') {
            return Err(invalid("package name contains whitespace or ','"));
        }
        if name.starts_with('@') && (name.starts_with("@/") || name.matches('/').count() != 1) {
            return Err(invalid("scoped name must look like @scope/name"));
        }

        Ok(Self {
            name: name.to_string(),
            range: range.to_string(),
        })
    }

    /// Full package name, including the scope.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requested range, tag, or version. Empty when unversioned.
    pub fn range(&self) -> &str {
        &self.range
    }

    /// True when no range was requested (any installed version satisfies).
    pub fn is_unversioned(&self) -> bool {
        self.range.is_empty()
    }

    /// Package name without its `@scope/` prefix.
    pub fn base_name(&self) -> &str {
        unscoped(&self.name)
    }

    /// Canonical `name@range` form. Unversioned specs render as `name@`.
    pub fn normalized(&self) -> String {
        format!("{}@{}", self.name, self.range)
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.range)
    }
}

/// Strip an `@scope/` prefix from a package name.
pub fn unscoped(name: &str) -> &str {
    match name.strip_prefix('@') {
        Some(rest) => rest.split_once('/').map(|(_, n)| n).unwrap_or(name),
        None => name,
    }
}

// ============================================================================
// Requests
// ============================================================================

/// What the launcher ends up running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecTarget {
    /// A literal call string, run verbatim.
    Call(String),
    /// An explicit command name supplied next to an explicit package list.
    Command(String),
    /// The bin of a requested package, picked from its manifest.
    PackageBin(PackageSpec),
}

/// Canonical, immutable description of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Unique specs in first-seen order.
    pub packages: Vec<PackageSpec>,
    /// Literal call string, if one was given.
    pub call: Option<String>,
    /// Arguments passed to the target (never set together with `call`).
    pub args: Vec<String>,
    pub target: ExecTarget,
}

// ============================================================================
// Cache keys and install locations
// ============================================================================

/// Fixed-length hex digest naming a shared cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(pub(crate) String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a dependency tree lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallLocation {
    /// The caller's own project tree.
    Local(PathBuf),
    /// `<cacheRoot>/_npx/<key>`.
    Cache { key: CacheKey, path: PathBuf },
}

impl InstallLocation {
    /// Shared cache location for a key under a cache root.
    pub fn cache(cache_root: &Path, key: CacheKey) -> Self {
        let path = cache_root.join("_npx").join(key.as_str());
        Self::Cache { key, path }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Local(p) => p,
            Self::Cache { path, .. } => path,
        }
    }

    pub fn is_cache(&self) -> bool {
        matches!(self, Self::Cache { .. })
    }

    /// Directory holding the linked executables of this tree.
    pub fn bin_dir(&self) -> PathBuf {
        self.path().join("node_modules").join(".bin")
    }
}

impl fmt::Display for InstallLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(p) => write!(f, "local:{}", p.display()),
            Self::Cache { path, .. } => write!(f, "cache:{}", path.display()),
        }
    }
}

// ============================================================================
// Trees and manifests
// ============================================================================

/// One package physically present in a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub version: String,
}

/// Packages present at an install location, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyTree {
    pub children: HashMap<String, TreeNode>,
}

impl DependencyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, version: &str) {
        self.children.insert(
            name.to_string(),
            TreeNode {
                name: name.to_string(),
                version: version.to_string(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&TreeNode> {
        self.children.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }
}

/// Registry metadata for one resolved package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: String,

    /// Bin name → relative script path, in declaration order.
    #[serde(default)]
    pub bin: IndexMap<String, String>,

    /// The normalized spec this manifest was fetched for.
    #[serde(default)]
    pub resolved_spec: String,
}

impl Manifest {
    /// `name@version`, used to identify the package in errors.
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// The final decision of what to run and which directories to expose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExecutable {
    pub bin_name: String,
    /// Directories prepended to PATH, highest priority first.
    pub search_path: Vec<PathBuf>,
}

// ============================================================================
// Events
// ============================================================================

/// Stage outcomes, returned to callers instead of logged into shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecEvent {
    ManifestResolved {
        spec: String,
        id: String,
    },
    LocalSatisfied {
        root: PathBuf,
    },
    LocalMissing {
        missing: Vec<String>,
    },
    CacheDirEnsured {
        key: String,
        path: PathBuf,
    },
    Installed {
        path: PathBuf,
        add: Vec<String>,
    },
    CacheSatisfied {
        path: PathBuf,
    },
    BinSelected {
        package: String,
        bin: String,
    },
}

impl fmt::Display for ExecEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManifestResolved { spec, id } => write!(f, "manifest {} -> {}", spec, id),
            Self::LocalSatisfied { root } => write!(f, "local tree satisfies ({})", root.display()),
            Self::LocalMissing { missing } => write!(f, "local tree missing {}", missing.join(", ")),
            Self::CacheDirEnsured { key, path } => {
                write!(f, "cache dir {} ({})", key, path.display())
            }
            Self::Installed { path, add } => {
                write!(f, "installed {} into {}", add.join(", "), path.display())
            }
            Self::CacheSatisfied { path } => write!(f, "cache tree satisfies ({})", path.display()),
            Self::BinSelected { package, bin } => write!(f, "bin {} from {}", bin, package),
        }
    }
}
