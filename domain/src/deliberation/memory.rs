//! Private memory ledgers.
//!
//! Each participant owns exactly one [`MemoryLedger`]. One [`MemoryEntry`] is
//! synthesized per deliberation round the participant speaks in; nothing is
//! ever rewritten or removed.

use crate::participant::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Section headers expected in a single-call structured memory reply
pub const SITUATION_HEADER: &str = "SITUATION:";
pub const OTHERS_HEADER: &str = "OTHERS:";
pub const STRATEGY_HEADER: &str = "STRATEGY:";

/// How a participant's memory is exposed and synthesized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryStrategyKind {
    /// One structured model call; the last `window` entries are visible
    RecentWindow { window: usize },
    /// Three chained calls (recap, one-participant analysis, next action)
    Decomposed { window: usize },
}

impl Default for MemoryStrategyKind {
    fn default() -> Self {
        MemoryStrategyKind::RecentWindow { window: 3 }
    }
}

impl MemoryStrategyKind {
    /// Number of own entries exposed as context
    pub fn window(&self) -> usize {
        match self {
            MemoryStrategyKind::RecentWindow { window } => *window,
            MemoryStrategyKind::Decomposed { window } => *window,
        }
    }
}

impl std::fmt::Display for MemoryStrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryStrategyKind::RecentWindow { window } => write!(f, "recent_window:{}", window),
            MemoryStrategyKind::Decomposed { window } => write!(f, "decomposed:{}", window),
        }
    }
}

impl std::str::FromStr for MemoryStrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let (name, window) = match lower.split_once(':') {
            Some((name, n)) => (
                name.to_string(),
                n.parse::<usize>()
                    .map_err(|_| format!("Invalid memory window: {}", n))?,
            ),
            None => (lower.clone(), 3),
        };

        match name.as_str() {
            "recent_window" | "recent" => Ok(MemoryStrategyKind::RecentWindow { window }),
            "decomposed" => Ok(MemoryStrategyKind::Decomposed { window }),
            _ => Err(format!(
                "Unknown memory strategy: {}. Valid: recent_window:K, decomposed:K",
                s
            )),
        }
    }
}

/// A participant's private note for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub round_number: u32,
    pub situation_assessment: String,
    pub other_participant_analysis: String,
    pub strategy: String,
    pub speaking_position: usize,
    pub created_at: DateTime<Utc>,
}

impl MemoryEntry {
    pub fn new(
        round_number: u32,
        situation_assessment: impl Into<String>,
        other_participant_analysis: impl Into<String>,
        strategy: impl Into<String>,
        speaking_position: usize,
    ) -> Self {
        Self {
            round_number,
            situation_assessment: situation_assessment.into(),
            other_participant_analysis: other_participant_analysis.into(),
            strategy: strategy.into(),
            speaking_position,
            created_at: Utc::now(),
        }
    }

    /// Split a `SITUATION:` / `OTHERS:` / `STRATEGY:` reply into fields.
    ///
    /// Missing headers leave their field empty; a reply without any header is
    /// kept whole as the situation assessment.
    pub fn from_structured_reply(round_number: u32, speaking_position: usize, reply: &str) -> Self {
        let situation = section(reply, SITUATION_HEADER);
        let others = section(reply, OTHERS_HEADER);
        let strategy = section(reply, STRATEGY_HEADER);

        if situation.is_none() && others.is_none() && strategy.is_none() {
            return Self::new(round_number, reply.trim(), "", "", speaking_position);
        }

        Self::new(
            round_number,
            situation.unwrap_or_default(),
            others.unwrap_or_default(),
            strategy.unwrap_or_default(),
            speaking_position,
        )
    }

    /// Render for inclusion in the owner's next prompt
    pub fn render(&self) -> String {
        format!(
            "Round {} (spoke {}):\n  Situation: {}\n  Others: {}\n  Strategy: {}",
            self.round_number,
            self.speaking_position + 1,
            self.situation_assessment,
            self.other_participant_analysis,
            self.strategy
        )
    }
}

/// Text after `header` up to the next known header
fn section(reply: &str, header: &str) -> Option<String> {
    let upper = reply.to_ascii_uppercase();
    let start = upper.find(header)? + header.len();
    let end = [SITUATION_HEADER, OTHERS_HEADER, STRATEGY_HEADER]
        .iter()
        .filter_map(|h| upper[start..].find(h).map(|i| start + i))
        .min()
        .unwrap_or(reply.len());
    reply.get(start..end).map(|s| s.trim().to_string())
}

/// Append-only memory ledger owned by one participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryLedger {
    owner: ParticipantId,
    entries: Vec<MemoryEntry>,
}

impl MemoryLedger {
    pub fn new(owner: ParticipantId) -> Self {
        Self {
            owner,
            entries: Vec::new(),
        }
    }

    pub fn append(&mut self, entry: MemoryEntry) -> &MemoryEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `k` most recent entries, oldest first
    pub fn recent(&self, k: usize) -> &[MemoryEntry] {
        let start = self.entries.len().saturating_sub(k);
        &self.entries[start..]
    }

    pub fn into_entries(self) -> Vec<MemoryEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_reply_is_split() {
        let reply = "Situation: Most favour principle 3.\n\
                     Others: agent_2 worries about the floor.\n\
                     Strategy: Propose a $12,000 floor.";
        let entry = MemoryEntry::from_structured_reply(2, 1, reply);

        assert_eq!(entry.situation_assessment, "Most favour principle 3.");
        assert_eq!(
            entry.other_participant_analysis,
            "agent_2 worries about the floor."
        );
        assert_eq!(entry.strategy, "Propose a $12,000 floor.");
        assert_eq!(entry.round_number, 2);
    }

    #[test]
    fn test_unstructured_reply_is_kept_whole() {
        let entry = MemoryEntry::from_structured_reply(1, 0, "  just prose  ");
        assert_eq!(entry.situation_assessment, "just prose");
        assert!(entry.strategy.is_empty());
    }

    #[test]
    fn test_headers_out_of_order() {
        let reply = "STRATEGY: hold firm\nSITUATION: split group";
        let entry = MemoryEntry::from_structured_reply(1, 0, reply);
        assert_eq!(entry.strategy, "hold firm");
        assert_eq!(entry.situation_assessment, "split group");
        assert!(entry.other_participant_analysis.is_empty());
    }

    #[test]
    fn test_ledger_recent_window() {
        let mut ledger = MemoryLedger::new(ParticipantId::from_index(0));
        for round in 1..=5 {
            ledger.append(MemoryEntry::new(round, "s", "o", "a", 0));
        }

        let recent = ledger.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].round_number, 4);
        assert_eq!(recent[1].round_number, 5);
        assert_eq!(ledger.recent(10).len(), 5);
    }

    #[test]
    fn test_parse_strategy_kind() {
        assert_eq!(
            "recent_window:5".parse::<MemoryStrategyKind>().ok(),
            Some(MemoryStrategyKind::RecentWindow { window: 5 })
        );
        assert_eq!(
            "decomposed".parse::<MemoryStrategyKind>().ok(),
            Some(MemoryStrategyKind::Decomposed { window: 3 })
        );
        assert!("vector".parse::<MemoryStrategyKind>().is_err());
        assert_eq!(
            MemoryStrategyKind::Decomposed { window: 4 }.to_string(),
            "decomposed:4"
        );
    }
}
