//! Shared utilities for use cases.
//!
//! One-shot model calls and the choice-extraction pipeline used by every
//! phase that turns a free-text statement into a [`Choice`].

use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use std::sync::Arc;
use tracing::{debug, warn};
use veil_domain::{
    Choice, ChoiceDecoder, DigitScanDecoder, ModelSpec, Participant, PromptTemplate,
    ValidationService, truncate,
};

/// Send one prompt in a fresh session.
pub(crate) async fn ask_model<G: LlmGateway + ?Sized>(
    gateway: &G,
    model: &ModelSpec,
    system_prompt: &str,
    prompt: &str,
) -> Result<String, GatewayError> {
    let session = gateway
        .create_session_with_system_prompt(model, system_prompt)
        .await?;
    let reply = session.send(prompt).await?;
    debug!("Model {} replied: {}", model, truncate(&reply, 120));
    Ok(reply)
}

/// Send one prompt as a participant (persona as system prompt).
pub(crate) async fn ask_participant<G: LlmGateway + ?Sized>(
    gateway: &G,
    participant: &Participant,
    prompt: &str,
) -> Result<String, GatewayError> {
    let system = PromptTemplate::participant_system(&participant.name, &participant.persona);
    ask_model(gateway, &participant.model, &system, prompt).await
}

/// Statement → extractor call → decoder → validation, with the
/// principle-1 fallback at the end of the line
#[derive(Clone)]
pub struct ChoiceExtractor {
    decoder: Arc<dyn ChoiceDecoder>,
    validation: ValidationService,
}

impl Default for ChoiceExtractor {
    fn default() -> Self {
        Self::new(Arc::new(DigitScanDecoder::new()))
    }
}

impl ChoiceExtractor {
    pub fn new(decoder: Arc<dyn ChoiceDecoder>) -> Self {
        Self {
            decoder,
            validation: ValidationService::new(),
        }
    }

    /// Ask the extractor model what `statement` chose, then decode the reply
    pub async fn extract<G: LlmGateway + ?Sized>(
        &self,
        gateway: &G,
        model: &ModelSpec,
        statement: &str,
    ) -> Result<Choice, GatewayError> {
        let reply = ask_model(
            gateway,
            model,
            PromptTemplate::extraction_system(),
            &PromptTemplate::extraction(statement),
        )
        .await?;
        Ok(self.decode(&reply, statement))
    }

    /// Decode an extractor reply; the statement becomes the reasoning text.
    ///
    /// Never fails: an unreadable reply or an invalid choice (e.g. principle 3
    /// without an amount) becomes the principle-1 fallback.
    pub fn decode(&self, reply: &str, statement: &str) -> Choice {
        let decoded = self.decoder.decode(reply);
        if decoded.fallback {
            warn!(
                "No principle found in extractor reply '{}', defaulting to principle 1",
                truncate(reply, 80)
            );
        }

        let choice = decoded.into_choice(statement.trim());
        let report = self.validation.validate(&choice);
        if report.is_valid {
            return choice;
        }

        warn!(
            principle_id = choice.principle_id,
            "Extracted choice is invalid ({}), defaulting to principle 1",
            report.messages()
        );
        Choice::fallback(statement.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGateway;

    #[test]
    fn test_decode_principle_with_constraint() {
        let extractor = ChoiceExtractor::default();
        let choice = extractor.decode("3 $13,000", "I want a safety net of 13k.");

        assert_eq!(choice.principle_id, 3);
        assert_eq!(choice.floor_constraint, Some(13_000));
        assert_eq!(choice.reasoning, "I want a safety net of 13k.");
    }

    #[test]
    fn test_decode_falls_back_without_digit() {
        let choice = ChoiceExtractor::default().decode("no idea", "Hmm.");
        assert_eq!(choice.principle_id, 1);
        assert_eq!(choice.reasoning, "Hmm.");
    }

    #[test]
    fn test_decode_invalid_choice_falls_back() {
        // principle 4 without a range amount
        let choice = ChoiceExtractor::default().decode("4", "Keep the gap small.");
        assert_eq!(choice.principle_id, 1);
        assert_eq!(choice.range_constraint, None);
    }

    #[tokio::test]
    async fn test_extract_uses_extractor_model() {
        let gateway = ScriptedGateway::echo();
        let choice = ChoiceExtractor::default()
            .extract(&gateway, &ModelSpec::new("m"), "I back principle 2.")
            .await
            .unwrap();

        assert_eq!(choice.principle_id, 2);
        assert_eq!(gateway.call_count(), 1);
    }
}
