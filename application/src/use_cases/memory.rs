//! Memory service: per-participant ledgers and memory synthesis.
//!
//! The configured [`MemoryStrategyKind`] decides both what a participant
//! sees of their own past notes (the last `window` entries) and how the new
//! entry is produced:
//!
//! - `RecentWindow`: one structured call answered in
//!   `SITUATION:` / `OTHERS:` / `STRATEGY:` sections.
//! - `Decomposed`: three chained calls (recap of recent utterances, analysis
//!   of the most recent other speaker, one next action). Each step's prompt
//!   embeds the previous step's reply, so the steps always run in sequence.

use crate::ports::llm_gateway::LlmGateway;
use crate::use_cases::run_experiment::OrchestrationError;
use crate::use_cases::shared::ask_participant;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use veil_domain::{
    DomainError, MemoryEntry, MemoryLedger, MemoryStrategyKind, Participant, ParticipantId,
    PromptTemplate, Transcript,
};

/// Utterances covered by the decomposed recap step
pub const RECAP_WINDOW: usize = 5;

/// Analysis text used when nobody else has spoken yet
const NO_OTHER_SPEAKER: &str = "No other participant has spoken yet.";

pub struct MemoryService<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    strategy: MemoryStrategyKind,
    ledgers: BTreeMap<ParticipantId, MemoryLedger>,
}

impl<G: LlmGateway + 'static> MemoryService<G> {
    pub fn new(
        gateway: Arc<G>,
        strategy: MemoryStrategyKind,
        participants: &[ParticipantId],
    ) -> Self {
        let ledgers = participants
            .iter()
            .map(|id| (id.clone(), MemoryLedger::new(id.clone())))
            .collect();
        Self {
            gateway,
            strategy,
            ledgers,
        }
    }

    pub fn strategy(&self) -> MemoryStrategyKind {
        self.strategy
    }

    pub fn ledger(&self, participant_id: &ParticipantId) -> Option<&MemoryLedger> {
        self.ledgers.get(participant_id)
    }

    /// Own entries visible to the participant (the last `window`)
    pub fn visible(&self, participant_id: &ParticipantId) -> &[MemoryEntry] {
        self.ledgers
            .get(participant_id)
            .map(|l| l.recent(self.strategy.window()))
            .unwrap_or(&[])
    }

    /// Visible entries rendered for a prompt
    pub fn context_for(&self, participant_id: &ParticipantId) -> String {
        let visible = self.visible(participant_id);
        if visible.is_empty() {
            return "(no notes yet)".to_string();
        }
        visible
            .iter()
            .map(MemoryEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Synthesize and append this round's entry for `participant`
    pub async fn synthesize(
        &mut self,
        participant: &Participant,
        round_number: u32,
        speaking_position: usize,
        transcript: &Transcript,
        public_context: &str,
    ) -> Result<MemoryEntry, OrchestrationError> {
        if !self.ledgers.contains_key(&participant.id) {
            return Err(DomainError::UnknownParticipant(participant.id.to_string()).into());
        }

        let entry = match self.strategy {
            MemoryStrategyKind::RecentWindow { .. } => {
                let prompt = PromptTemplate::memory_synthesis(
                    round_number,
                    self.visible(&participant.id),
                    public_context,
                );
                let reply = ask_participant(self.gateway.as_ref(), participant, &prompt).await?;
                MemoryEntry::from_structured_reply(round_number, speaking_position, &reply)
            }
            MemoryStrategyKind::Decomposed { .. } => {
                self.decomposed(participant, round_number, speaking_position, transcript)
                    .await?
            }
        };

        debug!(
            participant = %participant.id,
            round = round_number,
            strategy = %self.strategy,
            "Memory entry synthesized"
        );

        let ledger = self
            .ledgers
            .get_mut(&participant.id)
            .ok_or_else(|| DomainError::UnknownParticipant(participant.id.to_string()))?;
        Ok(ledger.append(entry).clone())
    }

    async fn decomposed(
        &self,
        participant: &Participant,
        round_number: u32,
        speaking_position: usize,
        transcript: &Transcript,
    ) -> Result<MemoryEntry, OrchestrationError> {
        let gateway = self.gateway.as_ref();

        let recap_prompt = PromptTemplate::memory_recap(transcript.recent(RECAP_WINDOW));
        let recap = ask_participant(gateway, participant, &recap_prompt).await?;

        let analysis = match transcript.last_speaker_except(&participant.id) {
            Some(other) => {
                let prompt = PromptTemplate::memory_analysis(&recap, other);
                ask_participant(gateway, participant, &prompt).await?
            }
            None => NO_OTHER_SPEAKER.to_string(),
        };

        let action_prompt = PromptTemplate::memory_action(&recap, &analysis);
        let action = ask_participant(gateway, participant, &action_prompt).await?;

        Ok(MemoryEntry::new(
            round_number,
            recap.trim(),
            analysis.trim(),
            action.trim(),
            speaking_position,
        ))
    }

    pub fn into_ledgers(self) -> BTreeMap<ParticipantId, Vec<MemoryEntry>> {
        self.ledgers
            .into_iter()
            .map(|(id, ledger)| (id, ledger.into_entries()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGateway;
    use veil_domain::{Choice, ModelSpec, TranscriptEntry};

    fn participant(index: usize, name: &str) -> Participant {
        Participant::new(
            ParticipantId::from_index(index),
            name,
            "A thoughtful citizen.",
            ModelSpec::new("test-model"),
        )
    }

    fn said(transcript: &mut Transcript, who: &Participant, round: u32, text: &str) {
        transcript.append(TranscriptEntry::new(
            who.id.clone(),
            round,
            text,
            Choice::raw(1, text),
            0,
        ));
    }

    #[tokio::test]
    async fn test_recent_window_one_call_per_entry() {
        let gateway = Arc::new(ScriptedGateway::voting(&[]));
        let alice = participant(0, "Alice");
        let mut memory = MemoryService::new(
            Arc::clone(&gateway),
            MemoryStrategyKind::RecentWindow { window: 2 },
            &[alice.id.clone()],
        );
        let transcript = Transcript::new();

        for round in 1..=3 {
            let entry = memory
                .synthesize(&alice, round, 0, &transcript, "")
                .await
                .unwrap();
            assert_eq!(entry.round_number, round);
            assert_eq!(entry.situation_assessment, "split");
            assert_eq!(entry.strategy, "argue");
        }

        assert_eq!(gateway.call_count(), 3);
        assert_eq!(memory.ledger(&alice.id).unwrap().len(), 3);
        let visible: Vec<u32> = memory
            .visible(&alice.id)
            .iter()
            .map(|e| e.round_number)
            .collect();
        assert_eq!(visible, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_decomposed_chains_three_calls() {
        let gateway = Arc::new(ScriptedGateway::voting(&[]));
        let alice = participant(0, "Alice");
        let bob = participant(1, "Bob");
        let mut memory = MemoryService::new(
            Arc::clone(&gateway),
            MemoryStrategyKind::Decomposed { window: 3 },
            &[alice.id.clone(), bob.id.clone()],
        );
        let mut transcript = Transcript::new();
        said(&mut transcript, &bob, 1, "The floor matters most.");

        let entry = memory
            .synthesize(&alice, 1, 1, &transcript, "")
            .await
            .unwrap();

        assert_eq!(entry.situation_assessment, "recap");
        assert_eq!(entry.other_participant_analysis, "analysis");
        assert_eq!(entry.strategy, "action");
        assert_eq!(gateway.call_count(), 3);

        let calls = gateway.calls();
        assert!(calls[1].prompt.contains("The floor matters most."));
        assert!(calls[1].prompt.contains("recap"));
        assert!(calls[2].prompt.contains("analysis"));
    }

    #[tokio::test]
    async fn test_decomposed_skips_analysis_without_other_speaker() {
        let gateway = Arc::new(ScriptedGateway::voting(&[]));
        let alice = participant(0, "Alice");
        let mut memory = MemoryService::new(
            Arc::clone(&gateway),
            MemoryStrategyKind::Decomposed { window: 3 },
            &[alice.id.clone()],
        );
        let mut transcript = Transcript::new();
        said(&mut transcript, &alice, 1, "Only me so far.");

        let entry = memory
            .synthesize(&alice, 1, 0, &transcript, "")
            .await
            .unwrap();

        assert_eq!(entry.other_participant_analysis, NO_OTHER_SPEAKER);
        assert_eq!(gateway.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_participant_rejected() {
        let gateway = Arc::new(ScriptedGateway::voting(&[]));
        let mut memory = MemoryService::new(gateway, MemoryStrategyKind::default(), &[]);
        let stranger = participant(5, "Stranger");

        let result = memory
            .synthesize(&stranger, 1, 0, &Transcript::new(), "")
            .await;
        assert!(matches!(
            result,
            Err(OrchestrationError::Domain(DomainError::UnknownParticipant(_)))
        ));
    }

    #[tokio::test]
    async fn test_gateway_failure_appends_nothing() {
        let alice = participant(0, "Alice");
        let mut memory = MemoryService::new(
            Arc::new(ScriptedGateway::failing()),
            MemoryStrategyKind::default(),
            &[alice.id.clone()],
        );

        assert!(
            memory
                .synthesize(&alice, 1, 0, &Transcript::new(), "")
                .await
                .is_err()
        );
        assert!(memory.ledger(&alice.id).unwrap().is_empty());
        assert_eq!(memory.context_for(&alice.id), "(no notes yet)");
    }
}
