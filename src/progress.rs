/// Trait for reporting scan progress.
///
/// The CLI implements this with indicatif; library callers that want a quiet
/// scan use SilentReporter. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_walk_start(&self) {}
    fn on_walk_progress(&self, _candidates_found: usize, _current_root: &str) {}
    fn on_walk_complete(&self, _candidates: usize, _duration_secs: f64) {}
    fn on_extract_start(&self, _total_files: usize) {}
    fn on_extract_progress(&self, _files_done: usize, _total_files: usize) {}
    fn on_extract_complete(&self, _with_author: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
