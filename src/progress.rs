//! Progress reporting for long-running scans
//!
//! A scan checks [`ProgressMonitor::cancelled`] once per transaction; on
//! cancellation partial results are discarded, never reported.

/// Collaborator interface for long-running operations.
pub trait ProgressMonitor {
    /// Announces the number of work units about to be processed.
    fn begin(&mut self, total: u64);

    /// Reports completed work units.
    fn advance(&mut self, units: u64);

    /// Polled cooperatively; `true` aborts the operation.
    fn cancelled(&self) -> bool;
}

/// No-op monitor for callers that do not track progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressMonitor for NoProgress {
    fn begin(&mut self, _total: u64) {}

    fn advance(&mut self, _units: u64) {}

    fn cancelled(&self) -> bool {
        false
    }
}
