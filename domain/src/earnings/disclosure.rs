//! Disclosure styles, checkpoints and rendered records.

use super::ledger::EarningsLedgerEntry;
use crate::participant::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tone and detail of an earnings disclosure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisclosureStyle {
    Minimal,
    #[default]
    Standard,
    Motivational,
    Detailed,
}

impl DisclosureStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisclosureStyle::Minimal => "minimal",
            DisclosureStyle::Standard => "standard",
            DisclosureStyle::Motivational => "motivational",
            DisclosureStyle::Detailed => "detailed",
        }
    }

    /// Render a disclosure message
    pub fn render(
        &self,
        checkpoint: DisclosureCheckpoint,
        total: f64,
        percentile: f64,
        ledger: &[EarningsLedgerEntry],
    ) -> String {
        let when = checkpoint.phrase();
        match self {
            DisclosureStyle::Minimal => format!("Earnings {}: ${:.2}.", when, total),
            DisclosureStyle::Standard => {
                let last = ledger
                    .last()
                    .map(|e| format!(" (last payout ${:.2})", e.payout_amount))
                    .unwrap_or_default();
                format!(
                    "{}, you have earned ${:.2} in total{}. You are ahead of {:.0}% of participants.",
                    capitalize(when),
                    total,
                    last,
                    percentile * 100.0
                )
            }
            DisclosureStyle::Motivational => {
                let nudge = if percentile >= 0.5 {
                    "You are among the top earners, keep it up!"
                } else {
                    "There is still room to climb, every decision counts!"
                };
                format!(
                    "{}, your earnings stand at ${:.2}, ahead of {:.0}% of participants. {}",
                    capitalize(when),
                    total,
                    percentile * 100.0,
                    nudge
                )
            }
            DisclosureStyle::Detailed => {
                let mut lines = vec![format!(
                    "Earnings statement {} (ahead of {:.0}% of participants):",
                    when,
                    percentile * 100.0
                )];
                for entry in ledger {
                    lines.push(format!(
                        "- {}: ${:.2} (running total ${:.2}) {}",
                        entry.label(),
                        entry.payout_amount,
                        entry.cumulative_total_after,
                        entry.context
                    ));
                }
                lines.push(format!("Total: ${:.2}", total));
                lines.join("\n")
            }
        }
    }
}

impl std::fmt::Display for DisclosureStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DisclosureStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimal" => Ok(DisclosureStyle::Minimal),
            "standard" => Ok(DisclosureStyle::Standard),
            "motivational" => Ok(DisclosureStyle::Motivational),
            "detailed" => Ok(DisclosureStyle::Detailed),
            _ => Err(format!(
                "Unknown disclosure style: {}. Valid: minimal, standard, motivational, detailed",
                s
            )),
        }
    }
}

/// Point in the experiment at which earnings may be disclosed
///
/// Serialized as its string form (`after_round:2`, `end_of_individual_phase`,
/// `after_group_settlement`, `experiment_end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DisclosureCheckpoint {
    AfterRound(u32),
    EndOfIndividualPhase,
    AfterGroupSettlement,
    ExperimentEnd,
}

impl DisclosureCheckpoint {
    fn phrase(&self) -> String {
        match self {
            DisclosureCheckpoint::AfterRound(n) => format!("after individual round {}", n),
            DisclosureCheckpoint::EndOfIndividualPhase => {
                "at the end of the individual phase".to_string()
            }
            DisclosureCheckpoint::AfterGroupSettlement => {
                "after the group settlement".to_string()
            }
            DisclosureCheckpoint::ExperimentEnd => "at the end of the experiment".to_string(),
        }
    }
}

impl std::fmt::Display for DisclosureCheckpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisclosureCheckpoint::AfterRound(n) => write!(f, "after_round:{}", n),
            DisclosureCheckpoint::EndOfIndividualPhase => write!(f, "end_of_individual_phase"),
            DisclosureCheckpoint::AfterGroupSettlement => write!(f, "after_group_settlement"),
            DisclosureCheckpoint::ExperimentEnd => write!(f, "experiment_end"),
        }
    }
}

impl std::str::FromStr for DisclosureCheckpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "end_of_individual_phase" => Ok(DisclosureCheckpoint::EndOfIndividualPhase),
            "after_group_settlement" => Ok(DisclosureCheckpoint::AfterGroupSettlement),
            "experiment_end" => Ok(DisclosureCheckpoint::ExperimentEnd),
            s if s.starts_with("after_round:") => s
                .trim_start_matches("after_round:")
                .parse()
                .map(DisclosureCheckpoint::AfterRound)
                .map_err(|_| format!("Invalid round in checkpoint: {}", s)),
            _ => Err(format!(
                "Unknown disclosure checkpoint: {}. Valid: after_round:N, end_of_individual_phase, after_group_settlement, experiment_end",
                s
            )),
        }
    }
}

impl TryFrom<String> for DisclosureCheckpoint {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DisclosureCheckpoint> for String {
    fn from(checkpoint: DisclosureCheckpoint) -> Self {
        checkpoint.to_string()
    }
}

/// Which checkpoints disclose, and in what style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisclosureConfig {
    #[serde(default)]
    pub style: DisclosureStyle,
    #[serde(default)]
    pub checkpoints: Vec<DisclosureCheckpoint>,
}

impl Default for DisclosureConfig {
    fn default() -> Self {
        Self {
            style: DisclosureStyle::Standard,
            checkpoints: vec![
                DisclosureCheckpoint::EndOfIndividualPhase,
                DisclosureCheckpoint::ExperimentEnd,
            ],
        }
    }
}

impl DisclosureConfig {
    /// No disclosures at all
    pub fn disabled() -> Self {
        Self {
            style: DisclosureStyle::Standard,
            checkpoints: Vec::new(),
        }
    }

    pub fn with_style(mut self, style: DisclosureStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: DisclosureCheckpoint) -> Self {
        if !self.checkpoints.contains(&checkpoint) {
            self.checkpoints.push(checkpoint);
        }
        self
    }

    pub fn is_enabled(&self, checkpoint: DisclosureCheckpoint) -> bool {
        self.checkpoints.contains(&checkpoint)
    }
}

/// A disclosure delivered to a participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisclosureRecord {
    pub participant_id: ParticipantId,
    pub checkpoint: DisclosureCheckpoint,
    pub style: DisclosureStyle,
    pub message: String,
    pub total_earnings: f64,
    pub percentile: f64,
    pub timestamp: DateTime<Utc>,
}

fn capitalize(s: String) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => s,
    }
}
