//! Consensus result value object

use crate::participant::ParticipantId;
use crate::principle::choice::Choice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Outcome of one consensus check (recomputed after every round, never mutated)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub unanimous: bool,
    pub agreed_choice: Option<Choice>,
    pub dissenting_participant_ids: BTreeSet<ParticipantId>,
    /// Highest round number among the latest choices
    pub rounds_to_consensus: u32,
    /// Transcript length at the time of the check
    pub total_messages: usize,
    /// Share of participants backing the leading principle
    pub agreement_ratio: f64,
}

impl ConsensusResult {
    /// Result for a transcript with nobody in it
    pub fn empty(total_messages: usize) -> Self {
        Self {
            unanimous: false,
            agreed_choice: None,
            dissenting_participant_ids: BTreeSet::new(),
            rounds_to_consensus: 0,
            total_messages,
            agreement_ratio: 0.0,
        }
    }

    /// Whether any choice was agreed on (unanimously or by threshold)
    pub fn has_agreement(&self) -> bool {
        self.agreed_choice.is_some()
    }

    pub fn agreed_principle_id(&self) -> Option<u8> {
        self.agreed_choice.as_ref().map(|c| c.principle_id)
    }
}

impl std::fmt::Display for ConsensusResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.agreed_choice, self.unanimous) {
            (Some(choice), true) => write!(f, "unanimous on {}", choice.label()),
            (Some(choice), false) => write!(
                f,
                "{:.0}% on {} ({} dissenting)",
                self.agreement_ratio * 100.0,
                choice.label(),
                self.dissenting_participant_ids.len()
            ),
            (None, _) => write!(
                f,
                "no agreement ({} dissenting)",
                self.dissenting_participant_ids.len()
            ),
        }
    }
}
