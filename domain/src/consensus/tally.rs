//! Principle tally over participants' latest choices.

use crate::deliberation::transcript::TranscriptEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Count of latest choices per principle id
///
/// # Example
///
/// ```
/// use veil_domain::{Choice, ParticipantId, Principle, PrincipleTally, TranscriptEntry};
///
/// let entries: Vec<TranscriptEntry> = [1, 2, 2]
///     .iter()
///     .enumerate()
///     .map(|(i, p)| {
///         TranscriptEntry::new(ParticipantId::from_index(i), 1, "", Choice::raw(*p, ""), i)
///     })
///     .collect();
/// let refs: Vec<&TranscriptEntry> = entries.iter().collect();
///
/// let tally = PrincipleTally::from_entries(&refs);
/// assert_eq!(tally.leader(), Some((2, 2)));
/// assert_eq!(tally.summary(), "[1:1 2:2]");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipleTally {
    counts: BTreeMap<u8, usize>,
    total: usize,
}

impl PrincipleTally {
    pub fn from_entries(entries: &[&TranscriptEntry]) -> Self {
        let mut counts = BTreeMap::new();
        for entry in entries {
            *counts.entry(entry.choice.principle_id).or_insert(0) += 1;
        }
        Self {
            counts,
            total: entries.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn count(&self, principle_id: u8) -> usize {
        self.counts.get(&principle_id).copied().unwrap_or(0)
    }

    /// Number of distinct principles in play
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Most frequent principle and its count; equal counts go to the lowest id
    pub fn leader(&self) -> Option<(u8, usize)> {
        let mut best: Option<(u8, usize)> = None;
        for (&id, &count) in &self.counts {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((id, count));
            }
        }
        best
    }

    /// Leader's share of all participants (0.0 when empty)
    pub fn agreement_ratio(&self) -> f64 {
        match self.leader() {
            Some((_, count)) if self.total > 0 => count as f64 / self.total as f64,
            _ => 0.0,
        }
    }

    pub fn is_unanimous(&self) -> bool {
        self.total > 0 && self.counts.len() == 1
    }

    /// Compact form such as `[1:3 2:2]`
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(id, count)| format!("{}:{}", id, count))
            .collect();
        format!("[{}]", parts.join(" "))
    }
}
