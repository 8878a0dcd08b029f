//! NX-009: Configuration (YAML file, environment overrides, validation).
//!
//! Precedence, highest first: CLI flags (applied by the caller), environment
//! (`NPEXEC_CACHE`, `NPEXEC_REGISTRY`), config file (`--config` or
//! `NPEXEC_CONFIG`), built-in defaults.

use super::error::{ExecError, InfraError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_CONFIG: &str = "NPEXEC_CONFIG";
pub const ENV_CACHE: &str = "NPEXEC_CACHE";
pub const ENV_REGISTRY: &str = "NPEXEC_REGISTRY";

/// Resolver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecConfig {
    /// Cache root; shared installs go to `<cache>/_npx/<key>`
    #[serde(default = "default_cache")]
    pub cache: PathBuf,

    /// Program used to fetch manifests and install packages
    #[serde(default = "default_npm")]
    pub npm: String,

    /// Shell that runs commands
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Registry URL passed to npm
    #[serde(default)]
    pub registry: Option<String>,

    /// Show status lines on stderr
    #[serde(default = "default_true")]
    pub progress: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            cache: default_cache(),
            npm: default_npm(),
            shell: default_shell(),
            registry: None,
            progress: true,
        }
    }
}

fn default_cache() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".npm"))
        .unwrap_or_else(|| PathBuf::from(".npm"))
}

fn default_npm() -> String {
    if cfg!(windows) { "npm.cmd" } else { "npm" }.to_string()
}

fn default_shell() -> String {
    if cfg!(windows) { "cmd" } else { "sh" }.to_string()
}

fn default_true() -> bool {
    true
}

/// Validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

/// Parse a config file from disk.
pub fn parse_config_file(path: &Path) -> Result<ExecConfig, ExecError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        InfraError::Config(format!("failed to read {}: {}", path.display(), e))
    })?;
    parse_config(&content)
}

/// Parse a config from YAML. An empty document yields the defaults.
pub fn parse_config(yaml: &str) -> Result<ExecConfig, ExecError> {
    if yaml.trim().is_empty() {
        return Ok(ExecConfig::default());
    }
    serde_yaml_ng::from_str(yaml)
        .map_err(|e| InfraError::Config(format!("YAML parse error: {}", e)).into())
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &ExecConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.cache.as_os_str().is_empty() {
        errors.push(ValidationError {
            message: "cache must not be empty".to_string(),
        });
    }
    if config.npm.trim().is_empty() {
        errors.push(ValidationError {
            message: "npm must name a program".to_string(),
        });
    }
    if config.shell.trim().is_empty() {
        errors.push(ValidationError {
            message: "shell must name a program".to_string(),
        });
    }
    if let Some(registry) = &config.registry {
        if !(registry.starts_with("http://") || registry.starts_with("https://")) {
            errors.push(ValidationError {
                message: format!("registry must be an http(s) URL, got \"{}\"", registry),
            });
        }
    }

    errors
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env<F>(mut config: ExecConfig, lookup: F) -> ExecConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(cache) = lookup(ENV_CACHE).filter(|v| !v.is_empty()) {
        config.cache = PathBuf::from(cache);
    }
    if let Some(registry) = lookup(ENV_REGISTRY).filter(|v| !v.is_empty()) {
        config.registry = Some(registry);
    }
    config
}

/// Load file (explicit or from `NPEXEC_CONFIG`) and env layers.
///
/// Not validated: callers apply their own overrides, then call [`check_config`].
pub fn load_config(explicit: Option<&Path>) -> Result<ExecConfig, ExecError> {
    let from_env = std::env::var_os(ENV_CONFIG).map(PathBuf::from);
    let file = explicit.map(Path::to_path_buf).or(from_env);
    let config = match file {
        Some(path) => parse_config_file(&path)?,
        None => ExecConfig::default(),
    };
    Ok(apply_env(config, |k| std::env::var(k).ok()))
}

/// [`validate_config`] folded into a single error.
pub fn check_config(config: &ExecConfig) -> Result<(), ExecError> {
    let errors = validate_config(config);
    if errors.is_empty() {
        return Ok(());
    }
    let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
    Err(InfraError::Config(joined.join("; ")).into())
}

/// Nearest ancestor of `cwd` that holds a `package.json` or `node_modules`.
/// Falls back to `cwd` itself.
pub fn local_prefix(cwd: &Path) -> PathBuf {
    let mut dir = cwd.to_path_buf();
    loop {
        if dir.join("package.json").is_file() || dir.join("node_modules").is_dir() {
            return dir;
        }
        if !dir.pop() {
            return cwd.to_path_buf();
        }
    }
}
