//! NX-014: Installation through `npm install --prefix`.

use super::{InstallOptions, Installer};
use crate::core::error::{ExecError, InfraError};
use crate::transport::local;
use async_trait::async_trait;
use tracing::{debug, info};

/// Converges a target directory by running `<npm> install` against it.
#[derive(Debug, Clone)]
pub struct NpmInstaller {
    npm: String,
}

impl NpmInstaller {
    pub fn new(npm: impl Into<String>) -> Self {
        Self { npm: npm.into() }
    }
}

/// Arguments for the `npm install` call.
pub fn install_args(options: &InstallOptions) -> Vec<String> {
    let mut args: Vec<String> = [
        "install",
        "--no-save",
        "--no-package-lock",
        "--no-audit",
        "--no-fund",
        "--prefix",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(options.target_dir.to_string_lossy().to_string());
    if let Some(registry) = &options.registry {
        args.push("--registry".to_string());
        args.push(registry.clone());
    }
    args.extend(options.add.iter().cloned());
    args
}

#[async_trait]
impl Installer for NpmInstaller {
    async fn install(&self, options: &InstallOptions) -> Result<(), ExecError> {
        let args = install_args(options);
        info!(dir = %options.target_dir.display(), add = ?options.add, "installing");
        let out = local::exec_capture(&self.npm, &args, Some(&options.target_dir)).await?;
        debug!(stdout = %out.stdout.trim(), "npm install finished");
        if !out.success() {
            return Err(InfraError::Install {
                dir: options.target_dir.clone(),
                reason: out.diagnostic(),
            }
            .into());
        }
        Ok(())
    }
}
