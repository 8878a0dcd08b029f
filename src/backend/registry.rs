//! NX-013: Manifest fetching through `npm view`.
//!
//! Range and tag resolution is left to npm: the fetcher asks for the
//! manifest a spec resolves to and the resolver compares concrete versions.

use super::{ManifestFetcher, ManifestOptions};
use crate::core::error::{ExecError, InfraError};
use crate::core::types::{unscoped, Manifest, PackageSpec};
use crate::transport::local;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

/// Fetches manifests by running `<npm> view <spec> name version bin --json`.
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    npm: String,
}

impl NpmRegistry {
    pub fn new(npm: impl Into<String>) -> Self {
        Self { npm: npm.into() }
    }
}

/// Arguments for the `npm view` call.
pub fn view_args(spec: &PackageSpec, options: &ManifestOptions) -> Vec<String> {
    let target = if spec.is_unversioned() {
        spec.name().to_string()
    } else {
        spec.normalized()
    };
    let mut args = vec![
        "view".to_string(),
        target,
        "name".to_string(),
        "version".to_string(),
        "bin".to_string(),
        "--json".to_string(),
    ];
    if let Some(registry) = &options.registry {
        args.push("--registry".to_string());
        args.push(registry.clone());
    }
    args
}

/// Parse `npm view --json` output into a manifest.
///
/// A range matching several versions prints an array in ascending order; the
/// last element is the version npm would install.
pub fn parse_view_output(spec: &PackageSpec, stdout: &str) -> Result<Manifest, ExecError> {
    let fail = |reason: String| InfraError::Manifest {
        spec: spec.normalized(),
        reason,
    };

    let value: Value = serde_json::from_str(stdout.trim())
        .map_err(|e| fail(format!("invalid npm view output: {}", e)))?;
    let object = match value {
        Value::Array(mut items) => items
            .pop()
            .ok_or_else(|| fail("no version matches".to_string()))?,
        other => other,
    };
    let Value::Object(fields) = object else {
        return Err(fail("npm view did not return an object".to_string()).into());
    };

    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(spec.name())
        .to_string();
    let version = fields
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| fail("manifest has no version".to_string()))?
        .to_string();

    let mut bin = IndexMap::new();
    match fields.get("bin") {
        Some(Value::String(path)) => {
            bin.insert(unscoped(&name).to_string(), path.clone());
        }
        Some(Value::Object(map)) => {
            for (k, v) in map {
                if let Some(path) = v.as_str() {
                    bin.insert(k.clone(), path.to_string());
                }
            }
        }
        _ => {}
    }

    Ok(Manifest {
        name,
        version,
        bin,
        resolved_spec: spec.normalized(),
    })
}

#[async_trait]
impl ManifestFetcher for NpmRegistry {
    async fn fetch_manifest(
        &self,
        spec: &PackageSpec,
        options: &ManifestOptions,
    ) -> Result<Manifest, ExecError> {
        let args = view_args(spec, options);
        debug!(npm = %self.npm, ?args, "fetching manifest");
        let out = local::exec_capture(&self.npm, &args, None).await?;
        if !out.success() {
            return Err(InfraError::Manifest {
                spec: spec.normalized(),
                reason: out.diagnostic(),
            }
            .into());
        }
        parse_view_output(spec, &out.stdout)
    }
}
