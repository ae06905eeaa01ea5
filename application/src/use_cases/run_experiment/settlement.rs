//! Phases with economic consequences: worked examples, individual rounds,
//! group settlement, and the disclosures tied to them.

use super::{OrchestrationError, RunExperimentUseCase, RunState, describe_outcome};
use crate::ports::conversation_logger::ConversationEvent;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::ProgressNotifier;
use serde_json::json;
use tracing::{debug, info, warn};
use veil_domain::{
    Choice, DisclosureCheckpoint, DomainError, GroupOutcome, IndividualChoice, Phase,
    PromptTemplate,
};

impl<G: LlmGateway + 'static> RunExperimentUseCase<G> {
    /// What each principle would select, appended to every participant's notes
    pub(super) fn detailed_examples(&self, state: &mut RunState<G>) {
        let examples = state.economics.worked_examples();
        for participant in state.participants.iter_mut() {
            for example in &examples {
                participant.add_note(format!("Worked example: {}", example.explanation()));
            }
        }
        self.logger
            .log(ConversationEvent::new("worked_examples", json!({ "examples": examples })));
        debug!("{} worked examples shared", examples.len());
        state.worked_examples = examples;
    }

    /// Private rounds with real payouts
    ///
    /// Choices are collected concurrently; selection, class assignment and
    /// payout happen afterwards on the control flow in roster order, so the
    /// seeded generator is consumed in a fixed order.
    pub(super) async fn individual_rounds(
        &self,
        state: &mut RunState<G>,
        progress: &dyn ProgressNotifier,
    ) -> Result<(), OrchestrationError> {
        for round in 1..=self.config.individual_rounds {
            let prompts = state
                .participants
                .iter()
                .map(|p| {
                    PromptTemplate::individual_round(
                        round,
                        state.economics.distributions(),
                        p.notes(),
                    )
                })
                .collect();
            let answers = self
                .private_choices(
                    Phase::IndividualRounds,
                    &state.participants,
                    prompts,
                    progress,
                )
                .await?;

            for (index, (statement, choice)) in answers.into_iter().enumerate() {
                let participant_id = state.participants[index].id.clone();
                let selection = state.economics.select(&choice);
                let outcome = state.economics.outcome(
                    &participant_id,
                    round,
                    Some(choice.principle_id),
                    selection.index,
                    &mut state.rng,
                )?;
                state.earnings.add_individual_round_payout(
                    &participant_id,
                    round,
                    outcome.payout_amount,
                    format!("Individual round {}: {}", round, choice.label()),
                )?;

                let participant = &mut state.participants[index];
                participant.add_note(format!("Individual round {}: {}", round, outcome.summary()));
                participant.set_choice(choice.clone());

                self.logger
                    .log(ConversationEvent::from_record("economic_outcome", &outcome));
                state.economic_outcomes.push(outcome.clone());
                state.individual_choices.push(IndividualChoice {
                    participant_id,
                    round_number: round,
                    statement,
                    choice,
                    outcome,
                });
            }

            info!("Individual round {} settled", round);
            self.disclose_all(state, DisclosureCheckpoint::AfterRound(round))?;
        }

        self.disclose_all(state, DisclosureCheckpoint::EndOfIndividualPhase)
    }

    /// Apply the group decision: one distribution, one class draw and payout each
    pub(super) fn settle(
        &self,
        state: &mut RunState<G>,
        agreed: Option<Choice>,
        via_secret_ballot: bool,
    ) -> Result<(), OrchestrationError> {
        let (index, selection_fallback_used) = match &agreed {
            Some(choice) => {
                let selection = state.economics.select(choice);
                (selection.index, selection.fallback_used)
            }
            None => {
                warn!("No group agreement, assigning a distribution at random");
                let index = state.economics.random_distribution_index(&mut state.rng);
                (index, false)
            }
        };
        let distribution = state.economics.distribution(index).ok_or_else(|| {
            DomainError::InvalidConfiguration(format!("no income distribution at index {}", index))
        })?;
        let distribution_name = distribution.name.clone();

        let chosen_principle = agreed.as_ref().map(|c| c.principle_id);
        let outcome = GroupOutcome {
            via_secret_ballot: via_secret_ballot && agreed.is_some(),
            random_assignment: agreed.is_none(),
            agreed_choice: agreed,
            distribution_id: distribution.id.clone(),
            selection_fallback_used,
        };
        let description = describe_outcome(&outcome, &distribution_name);
        info!("{}", description);

        let round_number = state.rounds_held();
        for index_in_roster in 0..state.participants.len() {
            let participant_id = state.participants[index_in_roster].id.clone();
            let economic = state.economics.outcome(
                &participant_id,
                round_number,
                chosen_principle,
                index,
                &mut state.rng,
            )?;
            state.earnings.add_group_payout(
                &participant_id,
                economic.payout_amount,
                description.clone(),
            )?;
            let note = format!("{} Your result: {}", description, economic.summary());
            state.participants[index_in_roster].add_note(note);

            self.logger
                .log(ConversationEvent::from_record("economic_outcome", &economic));
            state.economic_outcomes.push(economic);
        }

        self.logger
            .log(ConversationEvent::from_record("group_outcome", &outcome));
        state.group_outcome = Some(outcome);

        self.disclose_all(state, DisclosureCheckpoint::AfterGroupSettlement)
    }

    /// Disclose earnings to every participant, if the checkpoint is configured
    pub(super) fn disclose_all(
        &self,
        state: &mut RunState<G>,
        checkpoint: DisclosureCheckpoint,
    ) -> Result<(), OrchestrationError> {
        for participant in state.participants.iter_mut() {
            if let Some(record) = state.earnings.disclose(&participant.id, checkpoint)? {
                participant.add_note(record.message.clone());
                self.logger
                    .log(ConversationEvent::from_record("disclosure", &record));
            }
        }
        Ok(())
    }
}
