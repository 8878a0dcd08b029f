//! NX-007: Error taxonomy.
//!
//! Usage and executable-selection failures are terminal and carry context for
//! display. Anything a collaborator reports is an [`InfraError`] and passes
//! through untouched.

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the resolver can surface.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Conflicting or empty invocation. `usage` holds the full help text.
    #[error("{message}")]
    Usage { message: String, usage: String },

    #[error("invalid package spec '{spec}': {reason}")]
    InvalidSpec { spec: String, reason: String },

    /// The manifest offers no unambiguous bin. `pkgid` is `name@version`.
    #[error("could not determine executable to run")]
    NoExecutable { pkgid: String },

    #[error(transparent)]
    Infrastructure(#[from] InfraError),
}

impl ExecError {
    /// Package id attached to a [`ExecError::NoExecutable`].
    pub fn pkgid(&self) -> Option<&str> {
        match self {
            Self::NoExecutable { pkgid } => Some(pkgid),
            _ => None,
        }
    }

    /// Process exit code the CLI should use for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Infrastructure(InfraError::Script { code: Some(c), .. }) if *c != 0 => *c,
            _ => 1,
        }
    }
}

/// Failures reported by external collaborators.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("cannot read dependency tree at {}: {reason}", path.display())]
    TreeRead { path: PathBuf, reason: String },

    #[error("cannot create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot resolve manifest for {spec}: {reason}")]
    Manifest { spec: String, reason: String },

    #[error("install into {} failed: {reason}", dir.display())]
    Install { dir: PathBuf, reason: String },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed with {}: {script}", describe_code(*code))]
    Script { script: String, code: Option<i32> },

    #[error("config error: {0}")]
    Config(String),
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "signal".to_string(),
    }
}
