//! Conversation service: speaking order and turn-taking rounds.
//!
//! A round is driven strictly in sequence. Each speaker's prompt is built
//! from the utterances already made earlier in the same round, so turns are
//! never dispatched concurrently.

use crate::config::PublicContextMode;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::llm_gateway::LlmGateway;
use crate::use_cases::memory::MemoryService;
use crate::use_cases::run_experiment::OrchestrationError;
use crate::use_cases::shared::{ChoiceExtractor, ask_model, ask_participant};
use rand::rngs::StdRng;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use veil_domain::{
    DomainError, ModelSpec, Participant, ParticipantId, PromptTemplate, RoundSummary,
    SpeakingOrder, SpeakingOrderGenerator, SpeakingOrderPattern, Transcript, TranscriptEntry,
};

pub struct ConversationService<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    extractor: ChoiceExtractor,
    speaking_order: SpeakingOrderGenerator,
    public_context: PublicContextMode,
    summarizer: Option<ModelSpec>,
    summaries: Vec<RoundSummary>,
    logger: Arc<dyn ConversationLogger>,
}

impl<G: LlmGateway + 'static> ConversationService<G> {
    pub fn new(
        gateway: Arc<G>,
        extractor: ChoiceExtractor,
        pattern: SpeakingOrderPattern,
        public_context: PublicContextMode,
        summarizer: Option<ModelSpec>,
        logger: Arc<dyn ConversationLogger>,
    ) -> Self {
        Self {
            gateway,
            extractor,
            speaking_order: SpeakingOrderGenerator::new(pattern),
            public_context,
            summarizer,
            summaries: Vec::new(),
            logger,
        }
    }

    /// Generate and record this round's speaking order
    pub fn next_speaking_order(
        &mut self,
        round_number: u32,
        participants: &[ParticipantId],
        rng: &mut StdRng,
    ) -> SpeakingOrder {
        let order = self
            .speaking_order
            .generate(round_number, participants, rng);
        debug!(
            round = round_number,
            "Speaking order: {}",
            order
                .order
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        order
    }

    pub fn speaking_order_history(&self) -> &[SpeakingOrder] {
        self.speaking_order.history()
    }

    pub fn summaries(&self) -> &[RoundSummary] {
        &self.summaries
    }

    /// Public context visible to the next speaker in `round_number`
    pub fn public_context(&self, round_number: u32, transcript: &Transcript) -> String {
        match self.public_context {
            PublicContextMode::FullTranscript => {
                PromptTemplate::format_entries(transcript.entries())
            }
            PublicContextMode::Summarized => {
                let current: Vec<TranscriptEntry> =
                    transcript.round(round_number).cloned().collect();
                let mut parts: Vec<String> = self
                    .summaries
                    .iter()
                    .map(|s| format!("Summary of round {}: {}", s.round_number, s.summary))
                    .collect();
                parts.push(format!(
                    "This round so far:\n{}",
                    PromptTemplate::format_entries(&current)
                ));
                parts.join("\n\n")
            }
        }
    }

    /// Drive one deliberation round, one speaker at a time
    ///
    /// Per turn: memory synthesis, public context, utterance, choice
    /// extraction, transcript append, `current_choice` update.
    pub async fn conduct_round(
        &mut self,
        round_number: u32,
        participants: &mut [Participant],
        transcript: &mut Transcript,
        memory: &mut MemoryService<G>,
        rng: &mut StdRng,
    ) -> Result<SpeakingOrder, OrchestrationError> {
        let ids: Vec<ParticipantId> = participants.iter().map(|p| p.id.clone()).collect();
        let order = self.next_speaking_order(round_number, &ids, rng);
        info!("Round {}: {} speakers", round_number, order.order.len());

        for (position, participant_id) in order.order.iter().enumerate() {
            let index = participants
                .iter()
                .position(|p| &p.id == participant_id)
                .ok_or_else(|| DomainError::UnknownParticipant(participant_id.to_string()))?;
            let participant = &participants[index];

            let public_context = self.public_context(round_number, transcript);
            let memory_entry = memory
                .synthesize(
                    participant,
                    round_number,
                    position,
                    transcript,
                    &public_context,
                )
                .await?;
            let payload = json!({ "participant_id": participant_id, "entry": memory_entry });
            self.logger
                .log(ConversationEvent::new("memory_entry", payload));

            let prompt = PromptTemplate::deliberation_turn(
                round_number,
                position,
                &memory.context_for(participant_id),
                &public_context,
                participant.notes(),
            );
            let utterance = ask_participant(self.gateway.as_ref(), participant, &prompt).await?;
            let choice = self
                .extractor
                .extract(self.gateway.as_ref(), &participant.model, &utterance)
                .await?;

            debug!(
                participant = %participant_id,
                position,
                principle = choice.principle_id,
                "Turn complete"
            );

            let entry = TranscriptEntry::new(
                participant_id.clone(),
                round_number,
                utterance,
                choice.clone(),
                position,
            );
            self.logger
                .log(ConversationEvent::from_record("utterance", &entry));
            transcript.append(entry);
            participants[index].set_choice(choice);
        }

        if self.public_context == PublicContextMode::Summarized {
            self.summarize_round(round_number, transcript).await?;
        }

        Ok(order)
    }

    /// Condense the round's utterances with the summarizer model
    pub async fn summarize_round(
        &mut self,
        round_number: u32,
        transcript: &Transcript,
    ) -> Result<&RoundSummary, OrchestrationError> {
        let entries: Vec<TranscriptEntry> = transcript.round(round_number).cloned().collect();
        let summary = match &self.summarizer {
            Some(model) => {
                ask_model(
                    self.gateway.as_ref(),
                    model,
                    PromptTemplate::summary_system(),
                    &PromptTemplate::round_summary(round_number, &entries),
                )
                .await?
            }
            None => PromptTemplate::format_entries(&entries),
        };

        self.summaries.push(RoundSummary {
            round_number,
            summary: summary.trim().to_string(),
        });
        let last = self.summaries.len() - 1;
        Ok(&self.summaries[last])
    }

    pub fn into_parts(self) -> (Vec<SpeakingOrder>, Vec<RoundSummary>) {
        (self.speaking_order.into_history(), self.summaries)
    }
}
