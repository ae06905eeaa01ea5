//! Progress notification port
//!
//! Defines the interface for reporting progress during an experiment run.

use veil_domain::{ParticipantId, Phase};

/// Callback for progress updates during an experiment
///
/// Implementations live in the outer layers and can display progress in
/// various ways (log lines, progress bars, ...).
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: &Phase, total_tasks: usize);

    /// Called when one participant's task completes within a phase
    fn on_task_complete(&self, phase: &Phase, participant: &ParticipantId, success: bool);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: &Phase);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: &Phase, _total_tasks: usize) {}
    fn on_task_complete(&self, _phase: &Phase, _participant: &ParticipantId, _success: bool) {}
    fn on_phase_complete(&self, _phase: &Phase) {}
}
