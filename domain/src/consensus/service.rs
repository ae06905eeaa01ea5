//! Consensus service: strategy dispatch plus the advisory validator.

use super::result::ConsensusResult;
use super::strategy::ConsensusStrategy;
use super::validator::{ConsensusValidator, SuspicionReason};
use crate::deliberation::transcript::Transcript;
use tracing::{debug, warn};

/// Decides whether the group has converged, using a strategy fixed at construction
#[derive(Debug, Clone, Default)]
pub struct ConsensusService {
    strategy: ConsensusStrategy,
    validator: ConsensusValidator,
}

impl ConsensusService {
    pub fn new(strategy: ConsensusStrategy) -> Self {
        Self {
            strategy,
            validator: ConsensusValidator::new(),
        }
    }

    pub fn strategy(&self) -> ConsensusStrategy {
        self.strategy
    }

    pub fn detect(&self, transcript: &Transcript) -> ConsensusResult {
        let result = self.strategy.detect(transcript);
        debug!(
            strategy = %self.strategy,
            unanimous = result.unanimous,
            ratio = result.agreement_ratio,
            "Consensus check: {}",
            result
        );
        result
    }

    /// Advisory trust check; logs each finding and returns `false` if any apply
    pub fn validate(
        &self,
        result: &ConsensusResult,
        transcript: &Transcript,
        expected_participants: usize,
    ) -> bool {
        let findings = self.findings(result, transcript, expected_participants);
        for finding in &findings {
            warn!("Suspicious consensus: {}", finding);
        }
        findings.is_empty()
    }

    pub fn findings(
        &self,
        result: &ConsensusResult,
        transcript: &Transcript,
        expected_participants: usize,
    ) -> Vec<SuspicionReason> {
        self.validator
            .findings(result, transcript, expected_participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deliberation::transcript::TranscriptEntry;
    use crate::participant::ParticipantId;
    use crate::principle::choice::Choice;

    #[test]
    fn test_service_uses_configured_strategy() {
        let transcript = Transcript::from_entries(
            [1u8, 1, 1, 2, 2]
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    TranscriptEntry::new(
                        ParticipantId::from_index(i),
                        1,
                        "",
                        Choice::raw(*p, format!("r{}", i)),
                        i,
                    )
                })
                .collect(),
        );

        let exact = ConsensusService::new(ConsensusStrategy::ExactMatch);
        let threshold = ConsensusService::new(ConsensusStrategy::Threshold(0.6));

        assert!(!exact.detect(&transcript).has_agreement());
        assert_eq!(threshold.detect(&transcript).agreed_principle_id(), Some(1));
        assert_eq!(threshold.strategy(), ConsensusStrategy::Threshold(0.6));
    }

    #[test]
    fn test_service_validate_delegates() {
        let transcript = Transcript::from_entries(vec![TranscriptEntry::new(
            ParticipantId::from("solo"),
            1,
            "",
            Choice::raw(1, "only me"),
            0,
        )]);
        let service = ConsensusService::default();
        let result = service.detect(&transcript);

        assert!(!service.validate(&result, &transcript, 1));
    }
}
