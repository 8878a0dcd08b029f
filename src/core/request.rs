//! NX-003: Request building (raw CLI inputs into an [`ExecutionRequest`]).
//!
//! Pure. Fails before any filesystem or registry access.

use super::error::ExecError;
use super::types::{ExecTarget, ExecutionRequest, PackageSpec};

/// Usage text attached to every usage error.
pub const USAGE: &str = "\
npexec exec -- <pkg>[@<version>] [args...]
npexec exec --package=<pkg>[@<version>] -- <cmd> [args...]
npexec exec -c '<cmd> [args...]'
npexec exec --package=foo -c '<cmd> [args...]'";

fn usage_error(message: &str) -> ExecError {
    ExecError::Usage {
        message: message.to_string(),
        usage: USAGE.to_string(),
    }
}

/// Build a request from explicit `--package` values, an optional call string,
/// and positional arguments.
///
/// A call string that is empty or only whitespace is a usage error.
pub fn build(
    packages: &[String],
    call: Option<&str>,
    positional: &[String],
) -> Result<ExecutionRequest, ExecError> {
    let call = call.map(str::trim);
    if call == Some("") {
        return Err(usage_error("call string is empty"));
    }

    if call.is_some() && !positional.is_empty() {
        return Err(usage_error("cannot specify both a command and a call string"));
    }

    let mut specs: Vec<PackageSpec> = Vec::with_capacity(packages.len() + 1);
    for raw in packages {
        push_unique(&mut specs, PackageSpec::parse(raw)?);
    }

    let (target, args) = if !specs.is_empty() {
        match (call, positional.split_first()) {
            (Some(c), _) => (ExecTarget::Call(c.to_string()), Vec::new()),
            (None, Some((cmd, rest))) => (ExecTarget::Command(cmd.clone()), rest.to_vec()),
            (None, None) => {
                let last = specs.last().cloned().ok_or_else(|| {
                    usage_error("nothing to run: supply a package or a command")
                })?;
                (ExecTarget::PackageBin(last), Vec::new())
            }
        }
    } else {
        match (call, positional.split_first()) {
            (Some(c), _) => (ExecTarget::Call(c.to_string()), Vec::new()),
            (None, Some((first, rest))) => {
                let spec = PackageSpec::parse(first)?;
                specs.push(spec.clone());
                (ExecTarget::PackageBin(spec), rest.to_vec())
            }
            (None, None) => {
                return Err(usage_error("nothing to run: supply a package or a command"))
            }
        }
    };

    Ok(ExecutionRequest {
        packages: specs,
        call: call.map(str::to_string),
        args,
        target,
    })
}

fn push_unique(specs: &mut Vec<PackageSpec>, spec: PackageSpec) {
    if !specs.contains(&spec) {
        specs.push(spec);
    }
}
