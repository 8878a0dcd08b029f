//! NX-011: Process transport (spawn local programs for the default collaborators).

pub mod local;

/// Output from a captured command.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Trimmed stderr, or stdout when stderr is empty. Used for error messages.
    pub fn diagnostic(&self) -> String {
        let err = self.stderr.trim();
        if err.is_empty() {
            self.stdout.trim().to_string()
        } else {
            err.to_string()
        }
    }
}

/// Arguments that run `script` through `shell`.
///
/// `cmd` takes `/d /s /c`; every POSIX-style shell takes `-c`.
pub fn shell_args(shell: &str, script: &str) -> Vec<String> {
    let program = std::path::Path::new(shell)
        .file_stem()
        .map(|s| s.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if program == "cmd" {
        vec!["/d".into(), "/s".into(), "/c".into(), script.to_string()]
    } else {
        vec!["-c".into(), script.to_string()]
    }
}

/// Quote one argument for a POSIX shell command line.
pub fn quote_arg(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}
