//! Progress reporting through tracing

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;
use veil_application::ProgressNotifier;
use veil_domain::{ParticipantId, Phase};

/// Logs one line per phase start/finish with task counts
#[derive(Default)]
pub struct LogProgress {
    /// Per phase: (completed, failed, expected)
    counts: Mutex<HashMap<Phase, (usize, usize, usize)>>,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressNotifier for LogProgress {
    fn on_phase_start(&self, phase: &Phase, total_tasks: usize) {
        if let Ok(mut counts) = self.counts.lock() {
            counts.insert(*phase, (0, 0, total_tasks));
        }
        info!("> {}", phase.display_name());
    }

    fn on_task_complete(&self, phase: &Phase, participant: &ParticipantId, success: bool) {
        if let Ok(mut counts) = self.counts.lock() {
            let entry = counts.entry(*phase).or_insert((0, 0, 0));
            if success {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
            tracing::debug!(
                "  {} {} ({}/{})",
                participant,
                if success { "done" } else { "failed" },
                entry.0 + entry.1,
                entry.2
            );
        }
    }

    fn on_phase_complete(&self, phase: &Phase) {
        let (done, failed) = self
            .counts
            .lock()
            .ok()
            .and_then(|counts| counts.get(phase).map(|c| (c.0, c.1)))
            .unwrap_or_default();
        if done + failed > 0 {
            info!(
                "< {} ({} tasks, {} failed)",
                phase.display_name(),
                done,
                failed
            );
        } else {
            info!("< {}", phase.display_name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_tasks_per_phase() {
        let progress = LogProgress::new();
        let id = ParticipantId::new("agent_1");

        progress.on_phase_start(&Phase::SecretBallot, 2);
        progress.on_task_complete(&Phase::SecretBallot, &id, true);
        progress.on_task_complete(&Phase::SecretBallot, &id, false);
        progress.on_phase_complete(&Phase::SecretBallot);

        let counts = progress.counts.lock().unwrap();
        assert_eq!(counts[&Phase::SecretBallot], (1, 1, 2));
    }
}
