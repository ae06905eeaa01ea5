//! Participant entities

use crate::principle::choice::Choice;
use serde::{Deserialize, Serialize};

/// Stable participant identifier (Value Object)
///
/// Identifiers are assigned from roster position (`agent_1`, `agent_2`, ...)
/// and never change during a run. Ordering compares a trailing number
/// numerically, so `agent_2` sorts before `agent_10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for the participant at a zero-based roster position
    pub fn from_index(index: usize) -> Self {
        Self(format!("agent_{}", index + 1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn sort_key(&self) -> (&str, Option<u64>, &str) {
        let prefix = self.0.trim_end_matches(|c: char| c.is_ascii_digit());
        let number = self.0[prefix.len()..].parse().ok();
        (prefix, number, &self.0)
    }
}

impl Ord for ParticipantId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for ParticipantId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Language model backing a participant (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Provider-side model identifier
    pub name: String,
    /// Sampling temperature, provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl std::fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.temperature {
            Some(t) => write!(f, "{} (t={:.2})", self.name, t),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A deliberating agent (Entity)
///
/// Created at experiment start and never removed. `current_choice` is
/// overwritten after every utterance; `notes` is the participant's private,
/// append-only record of what they have been told (worked examples, their
/// own payouts, earnings disclosures).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub persona: String,
    pub model: ModelSpec,
    current_choice: Option<Choice>,
    notes: Vec<String>,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        name: impl Into<String>,
        persona: impl Into<String>,
        model: ModelSpec,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            persona: persona.into(),
            model,
            current_choice: None,
            notes: Vec::new(),
        }
    }

    pub fn current_choice(&self) -> Option<&Choice> {
        self.current_choice.as_ref()
    }

    pub fn set_choice(&mut self, choice: Choice) {
        self.current_choice = Some(choice);
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principle::choice::Principle;

    #[test]
    fn test_participant_id_from_index() {
        assert_eq!(ParticipantId::from_index(0).as_str(), "agent_1");
        assert_eq!(ParticipantId::from_index(4).to_string(), "agent_5");
    }

    #[test]
    fn test_participant_ids_order_lexically() {
        let mut ids = vec![
            ParticipantId::from("carol"),
            ParticipantId::from("alice"),
            ParticipantId::from("bob"),
        ];
        ids.sort();
        assert_eq!(ids[0].as_str(), "alice");
        assert_eq!(ids[2].as_str(), "carol");
    }

    #[test]
    fn test_roster_ids_order_numerically() {
        let mut ids: Vec<ParticipantId> = (0..12).rev().map(ParticipantId::from_index).collect();
        ids.sort();
        let expected: Vec<ParticipantId> = (0..12).map(ParticipantId::from_index).collect();
        assert_eq!(ids, expected);
        let two = ParticipantId::from("agent_2");
        let ten = ParticipantId::from("agent_10");
        assert!(two < ten);

        let bare = ParticipantId::from("agent_");
        assert!(bare < ParticipantId::from_index(0));
    }

    #[test]
    fn test_choice_is_overwritten() {
        let mut participant = Participant::new(
            ParticipantId::from_index(0),
            "Alice",
            "A pragmatic economist",
            ModelSpec::new("gpt-4.1-mini"),
        );
        assert!(participant.current_choice().is_none());

        participant.set_choice(Choice::new(Principle::MaximizeFloor, "safety first"));
        participant.set_choice(Choice::new(Principle::MaximizeAverage, "changed my mind"));

        assert_eq!(participant.current_choice().unwrap().principle_id, 2);
    }

    #[test]
    fn test_notes_are_append_only() {
        let mut participant = Participant::new(
            ParticipantId::from_index(1),
            "Bob",
            "",
            ModelSpec::new("m").with_temperature(0.3),
        );
        participant.add_note("first");
        participant.add_note("second");
        assert_eq!(participant.notes(), ["first", "second"]);
        assert_eq!(participant.model.to_string(), "m (t=0.30)");
    }
}
