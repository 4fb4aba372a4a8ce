//! Progress reporting hooks shared by the merge and build pipelines.

use crate::merge::ModuleDiagnostic;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each module has been attempted.
    fn module_done(&self, diagnostic: &ModuleDiagnostic, current: usize, total: usize);
    /// Called after each headword lookup completes, successful or not.
    fn headword_done(&self, headword: &str, current: usize, total: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn module_done(&self, _diagnostic: &ModuleDiagnostic, _current: usize, _total: usize) {}
    fn headword_done(&self, _headword: &str, _current: usize, _total: usize) {}
}
