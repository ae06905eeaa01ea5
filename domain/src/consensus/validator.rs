//! Advisory checks for degenerate consensus.
//!
//! The validator never changes a [`ConsensusResult`]; it only reports why a
//! result might not be trustworthy so that downstream auditing can flag it.

use super::result::ConsensusResult;
use crate::deliberation::transcript::Transcript;
use serde::{Deserialize, Serialize};

/// Why a consensus result looks implausible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SuspicionReason {
    /// Fewer than two distinct participants ever spoke
    TooFewContributors { count: usize },
    /// Agreement was reached at round 0 before everyone had spoken
    ImmediateConsensus { entries: usize, expected: usize },
    /// Every contributor's latest reasoning is the same text
    IdenticalReasoning,
}

impl std::fmt::Display for SuspicionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuspicionReason::TooFewContributors { count } => {
                write!(f, "only {} distinct contributor(s)", count)
            }
            SuspicionReason::ImmediateConsensus { entries, expected } => write!(
                f,
                "consensus at round 0 with {} of {} expected entries",
                entries, expected
            ),
            SuspicionReason::IdenticalReasoning => {
                write!(f, "all contributors gave byte-identical reasoning")
            }
        }
    }
}

/// Heuristic guard against implausibly fast or non-diverse agreement
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusValidator;

impl ConsensusValidator {
    pub fn new() -> Self {
        Self
    }

    /// Every reason the result looks untrustworthy (empty when it looks fine)
    pub fn findings(
        &self,
        result: &ConsensusResult,
        transcript: &Transcript,
        expected_participants: usize,
    ) -> Vec<SuspicionReason> {
        let mut findings = Vec::new();

        let contributors = transcript.contributors().len();
        if contributors < 2 {
            findings.push(SuspicionReason::TooFewContributors {
                count: contributors,
            });
        }

        if result.has_agreement()
            && result.rounds_to_consensus == 0
            && transcript.len() < expected_participants
        {
            findings.push(SuspicionReason::ImmediateConsensus {
                entries: transcript.len(),
                expected: expected_participants,
            });
        }

        let latest = transcript.latest_per_participant();
        if latest.len() >= 2
            && latest
                .windows(2)
                .all(|pair| pair[0].choice.reasoning == pair[1].choice.reasoning)
        {
            findings.push(SuspicionReason::IdenticalReasoning);
        }

        findings
    }

    /// `false` when any finding applies
    pub fn validate(
        &self,
        result: &ConsensusResult,
        transcript: &Transcript,
        expected_participants: usize,
    ) -> bool {
        self.findings(result, transcript, expected_participants)
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::strategy::ConsensusStrategy;
    use crate::deliberation::transcript::TranscriptEntry;
    use crate::participant::ParticipantId;
    use crate::principle::choice::Choice;

    fn entry(id: &str, round: u32, principle: u8, reasoning: &str) -> TranscriptEntry {
        TranscriptEntry::new(
            ParticipantId::from(id),
            round,
            "utterance",
            Choice::raw(principle, reasoning),
            0,
        )
    }

    #[test]
    fn test_genuine_consensus_passes() {
        let transcript = Transcript::from_entries(vec![
            entry("a", 1, 2, "the average lifts everyone"),
            entry("b", 1, 2, "I was persuaded by a"),
            entry("c", 1, 2, "growth matters most to me"),
        ]);
        let result = ConsensusStrategy::ExactMatch.detect(&transcript);

        assert!(result.unanimous);
        assert!(ConsensusValidator::new().validate(&result, &transcript, 3));
    }

    #[test]
    fn test_single_contributor_is_suspicious() {
        let transcript = Transcript::from_entries(vec![entry("a", 1, 1, "alone")]);
        let result = ConsensusStrategy::ExactMatch.detect(&transcript);

        let findings = ConsensusValidator::new().findings(&result, &transcript, 3);
        assert!(findings.contains(&SuspicionReason::TooFewContributors { count: 1 }));
    }

    #[test]
    fn test_round_zero_consensus_with_missing_entries() {
        let transcript = Transcript::from_entries(vec![
            entry("a", 0, 1, "safety first"),
            entry("b", 0, 1, "protect the poorest"),
        ]);
        let result = ConsensusStrategy::ExactMatch.detect(&transcript);

        let findings = ConsensusValidator::new().findings(&result, &transcript, 4);
        assert_eq!(
            findings,
            vec![SuspicionReason::ImmediateConsensus {
                entries: 2,
                expected: 4
            }]
        );
    }

    #[test]
    fn test_identical_reasoning_is_suspicious() {
        let transcript = Transcript::from_entries(vec![
            entry("a", 1, 3, "As an AI I choose this."),
            entry("b", 1, 3, "As an AI I choose this."),
        ]);
        let result = ConsensusStrategy::ExactMatch.detect(&transcript);

        assert!(!ConsensusValidator::new().validate(&result, &transcript, 2));
        assert_eq!(
            ConsensusValidator::new().findings(&result, &transcript, 2),
            vec![SuspicionReason::IdenticalReasoning]
        );
    }

    #[test]
    fn test_validation_does_not_alter_result() {
        let transcript = Transcript::from_entries(vec![entry("a", 0, 2, "x")]);
        let result = ConsensusStrategy::ExactMatch.detect(&transcript);
        let before = result.clone();

        let _ = ConsensusValidator::new().validate(&result, &transcript, 5);
        assert_eq!(result, before);
    }
}
