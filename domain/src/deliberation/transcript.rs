//! Public transcript of a deliberation.

use crate::participant::ParticipantId;
use crate::principle::choice::Choice;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One public utterance (immutable once appended)
///
/// Round 0 is the pre-deliberation individual assessment; deliberation
/// rounds start at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub participant_id: ParticipantId,
    pub round_number: u32,
    pub utterance: String,
    pub choice: Choice,
    pub speaking_position: usize,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(
        participant_id: ParticipantId,
        round_number: u32,
        utterance: impl Into<String>,
        choice: Choice,
        speaking_position: usize,
    ) -> Self {
        Self {
            participant_id,
            round_number,
            utterance: utterance.into(),
            choice,
            speaking_position,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only sequence of [`TranscriptEntry`], in insertion order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<TranscriptEntry>) -> Self {
        Self { entries }
    }

    pub fn append(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<TranscriptEntry> {
        self.entries
    }

    /// Entries of a single round, in speaking order
    pub fn round(&self, round_number: u32) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries
            .iter()
            .filter(move |e| e.round_number == round_number)
    }

    /// The last `n` entries, oldest first
    pub fn recent(&self, n: usize) -> &[TranscriptEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Every participant that has at least one entry
    pub fn contributors(&self) -> BTreeSet<&ParticipantId> {
        self.entries.iter().map(|e| &e.participant_id).collect()
    }

    /// Most recent entry per participant.
    ///
    /// "Most recent" is the highest `round_number`; within the same round the
    /// entry appended last wins. The result is ordered by insertion position
    /// of the winning entries.
    pub fn latest_per_participant(&self) -> Vec<&TranscriptEntry> {
        let mut latest: HashMap<&ParticipantId, usize> = HashMap::new();

        for (index, entry) in self.entries.iter().enumerate() {
            match latest.get(&entry.participant_id) {
                Some(&current) if self.entries[current].round_number > entry.round_number => {}
                _ => {
                    latest.insert(&entry.participant_id, index);
                }
            }
        }

        let mut indices: Vec<usize> = latest.into_values().collect();
        indices.sort_unstable();
        indices.into_iter().map(|i| &self.entries[i]).collect()
    }

    /// The most recent speaker who is not `exclude`
    pub fn last_speaker_except(&self, exclude: &ParticipantId) -> Option<&TranscriptEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| &e.participant_id != exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principle::choice::Principle;

    fn entry(id: &str, round: u32, principle: Principle) -> TranscriptEntry {
        TranscriptEntry::new(
            ParticipantId::from(id),
            round,
            format!("{} speaks in round {}", id, round),
            Choice::new(principle, "because"),
            0,
        )
    }

    #[test]
    fn test_latest_per_participant_prefers_higher_round() {
        let transcript = Transcript::from_entries(vec![
            entry("a", 2, Principle::MaximizeAverage),
            entry("a", 1, Principle::MaximizeFloor),
            entry("b", 1, Principle::MaximizeFloor),
        ]);

        let latest = transcript.latest_per_participant();

        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].participant_id.as_str(), "a");
        assert_eq!(latest[0].round_number, 2);
        assert_eq!(latest[1].participant_id.as_str(), "b");
    }

    #[test]
    fn test_latest_per_participant_same_round_last_appended_wins() {
        let transcript = Transcript::from_entries(vec![
            entry("a", 1, Principle::MaximizeFloor),
            entry("a", 1, Principle::RangeConstraint),
        ]);

        let latest = transcript.latest_per_participant();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].choice.principle_id, 4);
    }

    #[test]
    fn test_round_and_recent() {
        let mut transcript = Transcript::new();
        transcript.append(entry("a", 0, Principle::MaximizeFloor));
        transcript.append(entry("b", 1, Principle::MaximizeFloor));
        transcript.append(entry("c", 1, Principle::MaximizeFloor));

        assert_eq!(transcript.round(1).count(), 2);
        assert_eq!(transcript.recent(2)[0].participant_id.as_str(), "b");
        assert_eq!(transcript.recent(10).len(), 3);
        assert_eq!(transcript.contributors().len(), 3);
    }

    #[test]
    fn test_last_speaker_except_self() {
        let transcript = Transcript::from_entries(vec![
            entry("a", 1, Principle::MaximizeFloor),
            entry("b", 1, Principle::MaximizeFloor),
            entry("c", 1, Principle::MaximizeFloor),
        ]);

        let other = transcript.last_speaker_except(&ParticipantId::from("c"));
        assert_eq!(other.map(|e| e.participant_id.as_str()), Some("b"));

        let lonely = Transcript::from_entries(vec![entry("a", 1, Principle::MaximizeFloor)]);
        assert!(lonely.last_speaker_except(&ParticipantId::from("a")).is_none());
    }
}
