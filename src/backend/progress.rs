//! NX-015: Progress indicator and the scoped pause used around child processes.

use super::ProgressController;
use std::sync::atomic::{AtomicBool, Ordering};

/// Status lines on stderr, suppressed while a child owns the terminal.
pub struct StderrProgress {
    configured: bool,
    enabled: AtomicBool,
}

impl StderrProgress {
    /// `configured = false` silences the indicator for the whole run.
    pub fn new(configured: bool) -> Self {
        Self {
            configured,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.configured && self.enabled.load(Ordering::SeqCst)
    }

    /// Print a status line if the indicator is currently shown.
    pub fn status(&self, message: &str) {
        if self.is_enabled() {
            eprintln!("npexec: {}", message);
        }
    }
}

impl ProgressController for StderrProgress {
    fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }
}

/// Disables progress on construction and re-enables it on drop.
///
/// Restored on every exit path, including cancellation of the owning future.
pub struct ProgressPause<'a> {
    progress: &'a dyn ProgressController,
}

impl<'a> ProgressPause<'a> {
    pub fn new(progress: &'a dyn ProgressController) -> Self {
        progress.disable();
        Self { progress }
    }
}

impl Drop for ProgressPause<'_> {
    fn drop(&mut self) {
        self.progress.enable();
    }
}
