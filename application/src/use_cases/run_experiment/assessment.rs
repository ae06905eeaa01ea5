//! Private-choice phases: initial assessment, secret ballot, final assessment.
//!
//! All three ask every participant independently, so they run through the
//! bounded fan-out; results are applied on the control flow in roster order.

use super::{OrchestrationError, RunExperimentUseCase, RunState, describe_outcome};
use crate::ports::conversation_logger::ConversationEvent;
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::progress::ProgressNotifier;
use crate::use_cases::fan_out::BoundedFanOut;
use crate::use_cases::shared::ask_participant;
use std::sync::Arc;
use tracing::info;
use veil_domain::{
    BallotEntry, Choice, DisclosureCheckpoint, FinalAssessment, Participant, ParticipantId, Phase,
    PromptTemplate, TranscriptEntry,
};

impl<G: LlmGateway + 'static> RunExperimentUseCase<G> {
    /// Ask each participant one prompt and extract a choice from each answer
    ///
    /// Returns `(statement, choice)` pairs in roster order.
    pub(super) async fn private_choices(
        &self,
        phase: Phase,
        participants: &[Participant],
        prompts: Vec<String>,
        progress: &dyn ProgressNotifier,
    ) -> Result<Vec<(String, Choice)>, OrchestrationError> {
        let fan_out = BoundedFanOut::new(self.config.max_concurrent_calls);
        let ids: Vec<ParticipantId> = participants.iter().map(|p| p.id.clone()).collect();
        let inputs: Vec<(Participant, String)> =
            participants.iter().cloned().zip(prompts).collect();

        let gateway = Arc::clone(&self.gateway);
        let extractor = self.extractor.clone();
        let results = fan_out
            .run(
                inputs,
                move |(participant, prompt)| {
                    let gateway = Arc::clone(&gateway);
                    let extractor = extractor.clone();
                    async move {
                        let statement =
                            ask_participant(gateway.as_ref(), &participant, &prompt).await?;
                        let choice = extractor
                            .extract(gateway.as_ref(), &participant.model, &statement)
                            .await?;
                        Ok::<_, GatewayError>((statement, choice))
                    }
                },
                |index, output: &Result<(String, Choice), GatewayError>| {
                    progress.on_task_complete(&phase, &ids[index], output.is_ok())
                },
            )
            .await;

        let mut answers = Vec::with_capacity(results.len());
        for result in results {
            answers.push(result??);
        }
        Ok(answers)
    }

    /// Round 0: every participant's first private choice, recorded in the transcript
    pub(super) async fn initial_assessment(
        &self,
        state: &mut RunState<G>,
        progress: &dyn ProgressNotifier,
    ) -> Result<(), OrchestrationError> {
        let prompt = PromptTemplate::initial_assessment(state.economics.distributions());
        let prompts = vec![prompt; state.participants.len()];
        let answers = self
            .private_choices(
                Phase::InitialAssessment,
                &state.participants,
                prompts,
                progress,
            )
            .await?;

        for (position, (statement, choice)) in answers.into_iter().enumerate() {
            let participant = &mut state.participants[position];
            let entry = TranscriptEntry::new(
                participant.id.clone(),
                0,
                statement,
                choice.clone(),
                position,
            );
            self.logger
                .log(ConversationEvent::from_record("utterance", &entry));
            state.transcript.append(entry);
            participant.set_choice(choice);
        }

        info!(
            "Initial assessment: {}",
            state
                .participants
                .iter()
                .filter_map(|p| p.current_choice().map(|c| format!("{}={}", p.id, c.principle_id)))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(())
    }

    /// Private vote after deliberation ended without agreement
    ///
    /// Returns the agreed choice when every ballot names the same principle
    /// (the last ballot in roster order), `None` otherwise.
    pub(super) async fn secret_ballot(
        &self,
        state: &mut RunState<G>,
        progress: &dyn ProgressNotifier,
    ) -> Result<Option<Choice>, OrchestrationError> {
        let prompts = state
            .participants
            .iter()
            .map(|p| PromptTemplate::secret_ballot(p.notes()))
            .collect();
        let answers = self
            .private_choices(Phase::SecretBallot, &state.participants, prompts, progress)
            .await?;

        for (participant, (statement, choice)) in state.participants.iter_mut().zip(answers) {
            let ballot = BallotEntry {
                participant_id: participant.id.clone(),
                statement,
                choice: choice.clone(),
            };
            self.logger
                .log(ConversationEvent::from_record("ballot", &ballot));
            state.secret_ballot.push(ballot);
            participant.set_choice(choice);
        }

        let first = state.secret_ballot.first().map(|b| b.choice.principle_id);
        let unanimous = first.is_some()
            && state
                .secret_ballot
                .iter()
                .all(|b| Some(b.choice.principle_id) == first);

        if unanimous {
            let agreed = state.secret_ballot.last().map(|b| b.choice.clone());
            info!(
                "Secret ballot agreed on principle {}",
                first.unwrap_or_default()
            );
            Ok(agreed)
        } else {
            info!("Secret ballot split, no agreement");
            Ok(None)
        }
    }

    /// Each participant's closing choice, then the experiment-end disclosure
    pub(super) async fn final_assessment(
        &self,
        state: &mut RunState<G>,
        progress: &dyn ProgressNotifier,
    ) -> Result<(), OrchestrationError> {
        let outcome = match &state.group_outcome {
            Some(outcome) => {
                let name = state
                    .economics
                    .distributions()
                    .iter()
                    .find(|d| d.id == outcome.distribution_id)
                    .map(|d| d.name.as_str())
                    .unwrap_or(outcome.distribution_id.as_str());
                describe_outcome(outcome, name)
            }
            None => String::new(),
        };
        let prompts = state
            .participants
            .iter()
            .map(|p| PromptTemplate::final_assessment(&outcome, p.notes()))
            .collect();
        let answers = self
            .private_choices(
                Phase::FinalAssessment,
                &state.participants,
                prompts,
                progress,
            )
            .await?;

        for (participant, (statement, choice)) in state.participants.iter_mut().zip(answers) {
            let assessment = FinalAssessment {
                participant_id: participant.id.clone(),
                statement,
                choice: choice.clone(),
            };
            self.logger
                .log(ConversationEvent::from_record("final_assessment", &assessment));
            state.final_assessments.push(assessment);
            participant.set_choice(choice);
        }

        self.disclose_all(state, DisclosureCheckpoint::ExperimentEnd)
    }
}
