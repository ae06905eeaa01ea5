//! Group deliberation: sequential rounds with a consensus check after each.

use super::{OrchestrationError, RunExperimentUseCase, RunState};
use crate::ports::conversation_logger::ConversationEvent;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::ProgressNotifier;
use serde_json::json;
use tracing::info;
use veil_domain::Phase;

impl<G: LlmGateway + 'static> RunExperimentUseCase<G> {
    /// Rounds `1..=max_rounds`, stopping at the first unanimous round
    pub(super) async fn group_deliberation(
        &self,
        state: &mut RunState<G>,
        progress: &dyn ProgressNotifier,
    ) -> Result<(), OrchestrationError> {
        for round in 1..=self.config.max_rounds {
            let RunState {
                participants,
                transcript,
                memory,
                conversation,
                rng,
                ..
            } = &mut *state;
            let order = conversation
                .conduct_round(round, participants, transcript, memory, rng)
                .await?;
            for id in &order.order {
                progress.on_task_complete(&Phase::GroupDeliberation, id, true);
            }

            let result = state.consensus.detect(&state.transcript);
            info!(round, "Consensus check: {}", result);
            let payload = json!({ "round": round, "result": result });
            self.logger
                .log(ConversationEvent::new("consensus_check", payload));

            let unanimous = result.unanimous;
            state.consensus_history.push(result);
            if unanimous {
                info!("Unanimous agreement reached in round {}", round);
                break;
            }
        }

        if let Some(result) = state.consensus_history.last() {
            let expected = state.participants.len();
            let consensus = &state.consensus;
            if !consensus.validate(result, &state.transcript, expected) {
                state.consensus_findings = consensus.findings(result, &state.transcript, expected);
            }
        }
        Ok(())
    }
}
