//! Consensus strategies for deciding whether the group has converged.

use super::result::ConsensusResult;
use super::tally::PrincipleTally;
use crate::deliberation::transcript::{Transcript, TranscriptEntry};
use crate::participant::ParticipantId;
use crate::principle::choice::Choice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Closed set of consensus strategies, selected at construction
///
/// # Example
///
/// ```
/// use veil_domain::ConsensusStrategy;
///
/// let strategy: ConsensusStrategy = "threshold:0.6".parse().unwrap();
/// assert_eq!(strategy, ConsensusStrategy::Threshold(0.6));
/// assert_eq!(strategy.to_string(), "threshold:0.6");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusStrategy {
    /// Every participant's latest principle must match
    #[default]
    ExactMatch,
    /// The leading principle must be backed by at least this share (0.0-1.0)
    Threshold(f64),
    /// Reserved for reasoning-text similarity; currently behaves as `ExactMatch`
    Semantic,
}

impl ConsensusStrategy {
    /// Detect consensus from the accumulated transcript
    pub fn detect(&self, transcript: &Transcript) -> ConsensusResult {
        match self {
            ConsensusStrategy::ExactMatch | ConsensusStrategy::Semantic => exact_match(transcript),
            ConsensusStrategy::Threshold(theta) => threshold(transcript, *theta),
        }
    }

    pub fn description(&self) -> String {
        match self {
            ConsensusStrategy::ExactMatch => "exact match (all latest choices agree)".to_string(),
            ConsensusStrategy::Threshold(theta) => {
                format!("threshold (at least {:.0}% agree)", theta * 100.0)
            }
            ConsensusStrategy::Semantic => "semantic (exact match for now)".to_string(),
        }
    }
}

impl std::fmt::Display for ConsensusStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsensusStrategy::ExactMatch => write!(f, "exact"),
            ConsensusStrategy::Threshold(theta) => write!(f, "threshold:{}", theta),
            ConsensusStrategy::Semantic => write!(f, "semantic"),
        }
    }
}

impl std::str::FromStr for ConsensusStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" | "exact_match" => Ok(ConsensusStrategy::ExactMatch),
            "semantic" => Ok(ConsensusStrategy::Semantic),
            s if s.starts_with("threshold:") => {
                let theta: f64 = s
                    .trim_start_matches("threshold:")
                    .parse()
                    .map_err(|_| "Invalid threshold value")?;
                if !(0.0..=1.0).contains(&theta) {
                    return Err(format!("Threshold must be within 0.0-1.0, got {}", theta));
                }
                Ok(ConsensusStrategy::Threshold(theta))
            }
            _ => Err(format!(
                "Unknown consensus strategy: {}. Valid: exact, threshold:0.N, semantic",
                s
            )),
        }
    }
}

fn exact_match(transcript: &Transcript) -> ConsensusResult {
    let latest = transcript.latest_per_participant();
    let tally = PrincipleTally::from_entries(&latest);
    let Some((leader, _)) = tally.leader() else {
        return ConsensusResult::empty(transcript.len());
    };

    let agreed_choice = tally
        .is_unanimous()
        .then(|| majority_choice(&latest, leader))
        .flatten();

    ConsensusResult {
        unanimous: agreed_choice.is_some(),
        agreed_choice,
        dissenting_participant_ids: dissenters(&latest, leader),
        rounds_to_consensus: latest_round(&latest),
        total_messages: transcript.len(),
        agreement_ratio: tally.agreement_ratio(),
    }
}

fn threshold(transcript: &Transcript, theta: f64) -> ConsensusResult {
    let latest = transcript.latest_per_participant();
    let tally = PrincipleTally::from_entries(&latest);
    let Some((leader, count)) = tally.leader() else {
        return ConsensusResult::empty(transcript.len());
    };

    let ratio = tally.agreement_ratio();
    let agreed_choice = if ratio >= theta {
        majority_choice(&latest, leader)
    } else {
        None
    };

    ConsensusResult {
        unanimous: agreed_choice.is_some() && count == tally.total(),
        agreed_choice,
        dissenting_participant_ids: dissenters(&latest, leader),
        rounds_to_consensus: latest_round(&latest),
        total_messages: transcript.len(),
        agreement_ratio: ratio,
    }
}

/// The most recently appended latest choice backing `leader`
fn majority_choice(latest: &[&TranscriptEntry], leader: u8) -> Option<Choice> {
    latest
        .iter()
        .rev()
        .find(|e| e.choice.principle_id == leader)
        .map(|e| e.choice.clone())
}

fn dissenters(latest: &[&TranscriptEntry], leader: u8) -> BTreeSet<ParticipantId> {
    latest
        .iter()
        .filter(|e| e.choice.principle_id != leader)
        .map(|e| e.participant_id.clone())
        .collect()
}

fn latest_round(latest: &[&TranscriptEntry]) -> u32 {
    latest.iter().map(|e| e.round_number).max().unwrap_or(0)
}
