//! Orchestration value objects

use super::entities::Phase;
use crate::consensus::{ConsensusResult, SuspicionReason};
use crate::deliberation::memory::MemoryEntry;
use crate::deliberation::speaking_order::SpeakingOrder;
use crate::deliberation::transcript::TranscriptEntry;
use crate::earnings::disclosure::DisclosureRecord;
use crate::earnings::ledger::EarningsLedgerEntry;
use crate::economics::outcome::EconomicOutcome;
use crate::economics::service::WorkedExample;
use crate::participant::ParticipantId;
use crate::principle::choice::Choice;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A private choice made during an individual round, with its payout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualChoice {
    pub participant_id: ParticipantId,
    pub round_number: u32,
    pub statement: String,
    pub choice: Choice,
    pub outcome: EconomicOutcome,
}

/// Condensed account of one deliberation round (summarized context mode)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round_number: u32,
    pub summary: String,
}

/// One secret-ballot vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallotEntry {
    pub participant_id: ParticipantId,
    pub statement: String,
    pub choice: Choice,
}

/// How the group settlement was decided
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub agreed_choice: Option<Choice>,
    /// Agreement came from the secret ballot rather than deliberation
    pub via_secret_ballot: bool,
    pub distribution_id: String,
    /// The agreed principle had no qualifying distribution
    pub selection_fallback_used: bool,
    /// No agreement: the distribution was drawn at random
    pub random_assignment: bool,
}

impl GroupOutcome {
    pub fn reached_agreement(&self) -> bool {
        self.agreed_choice.is_some()
    }
}

/// A participant's closing choice and statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAssessment {
    pub participant_id: ParticipantId,
    pub statement: String,
    pub choice: Choice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub id: ParticipantId,
    pub name: String,
    pub model: String,
    pub final_choice: Option<Choice>,
    pub total_earnings: f64,
    pub percentile: f64,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTiming {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_duration_ms: u64,
    pub phases: Vec<PhaseTiming>,
}

impl RunTiming {
    pub fn phase_duration_ms(&self, phase: Phase) -> Option<u64> {
        self.phases
            .iter()
            .filter(|t| t.phase == phase)
            .map(|t| t.duration_ms)
            .reduce(|a, b| a + b)
    }
}

/// Complete record of one experiment run
///
/// Serialization to files is the caller's concern; every field is plain
/// serde data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub experiment_id: String,
    /// Seed of the run's random generator (speaking orders, class assignment)
    pub seed: u64,
    pub participants: Vec<ParticipantSummary>,
    pub worked_examples: Vec<WorkedExample>,
    pub individual_choices: Vec<IndividualChoice>,
    /// Round 0 assessments followed by every deliberation utterance
    pub transcript: Vec<TranscriptEntry>,
    pub memory: BTreeMap<ParticipantId, Vec<MemoryEntry>>,
    pub speaking_orders: Vec<SpeakingOrder>,
    pub round_summaries: Vec<RoundSummary>,
    pub consensus: ConsensusResult,
    /// Advisory findings against the final consensus (empty when trusted)
    pub consensus_findings: Vec<SuspicionReason>,
    pub secret_ballot: Vec<BallotEntry>,
    pub group_outcome: GroupOutcome,
    pub economic_outcomes: Vec<EconomicOutcome>,
    pub earnings: BTreeMap<ParticipantId, Vec<EarningsLedgerEntry>>,
    pub disclosures: BTreeMap<ParticipantId, Vec<DisclosureRecord>>,
    pub final_assessments: Vec<FinalAssessment>,
    pub timing: RunTiming,
}

impl ExperimentResult {
    pub fn consensus_trusted(&self) -> bool {
        self.consensus_findings.is_empty()
    }

    /// Number of deliberation rounds actually held
    pub fn deliberation_rounds(&self) -> usize {
        self.speaking_orders.len()
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&ParticipantSummary> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn total_payout(&self) -> f64 {
        self.participants.iter().map(|p| p.total_earnings).sum()
    }
}
