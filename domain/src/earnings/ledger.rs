//! Per-participant earnings ledgers.

use super::disclosure::{DisclosureCheckpoint, DisclosureConfig, DisclosureRecord};
use crate::core::error::DomainError;
use crate::participant::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Source of a payout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundType {
    IndividualRound,
    GroupOutcome,
}

/// One ledger line (append-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsLedgerEntry {
    pub round_type: RoundType,
    pub round_number: Option<u32>,
    pub payout_amount: f64,
    /// Running sum of every payout up to and including this one
    pub cumulative_total_after: f64,
    pub context: String,
    pub timestamp: DateTime<Utc>,
}

impl EarningsLedgerEntry {
    pub fn label(&self) -> String {
        match (self.round_type, self.round_number) {
            (RoundType::IndividualRound, Some(n)) => format!("Individual round {}", n),
            (RoundType::IndividualRound, None) => "Individual round".to_string(),
            (RoundType::GroupOutcome, _) => "Group outcome".to_string(),
        }
    }
}

/// Tracks every participant's payouts, ranking and disclosures
#[derive(Debug, Clone, Default)]
pub struct EarningsTrackingService {
    disclosure: DisclosureConfig,
    ledgers: BTreeMap<ParticipantId, Vec<EarningsLedgerEntry>>,
    disclosures: BTreeMap<ParticipantId, Vec<DisclosureRecord>>,
}

impl EarningsTrackingService {
    pub fn new(disclosure: DisclosureConfig) -> Self {
        Self {
            disclosure,
            ledgers: BTreeMap::new(),
            disclosures: BTreeMap::new(),
        }
    }

    /// Open an empty ledger (no-op if already registered)
    pub fn register(&mut self, participant_id: &ParticipantId) {
        self.ledgers.entry(participant_id.clone()).or_default();
        self.disclosures.entry(participant_id.clone()).or_default();
    }

    pub fn add_individual_round_payout(
        &mut self,
        participant_id: &ParticipantId,
        round_number: u32,
        payout_amount: f64,
        context: impl Into<String>,
    ) -> Result<&EarningsLedgerEntry, DomainError> {
        self.append(
            participant_id,
            RoundType::IndividualRound,
            Some(round_number),
            payout_amount,
            context.into(),
        )
    }

    pub fn add_group_payout(
        &mut self,
        participant_id: &ParticipantId,
        payout_amount: f64,
        context: impl Into<String>,
    ) -> Result<&EarningsLedgerEntry, DomainError> {
        self.append(
            participant_id,
            RoundType::GroupOutcome,
            None,
            payout_amount,
            context.into(),
        )
    }

    fn append(
        &mut self,
        participant_id: &ParticipantId,
        round_type: RoundType,
        round_number: Option<u32>,
        payout_amount: f64,
        context: String,
    ) -> Result<&EarningsLedgerEntry, DomainError> {
        let ledger = self
            .ledgers
            .get_mut(participant_id)
            .ok_or_else(|| DomainError::UnknownParticipant(participant_id.to_string()))?;

        let previous = ledger.last().map_or(0.0, |e| e.cumulative_total_after);
        ledger.push(EarningsLedgerEntry {
            round_type,
            round_number,
            payout_amount,
            cumulative_total_after: previous + payout_amount,
            context,
            timestamp: Utc::now(),
        });
        debug!(
            participant = %participant_id,
            payout = payout_amount,
            total = previous + payout_amount,
            "Recorded payout"
        );

        ledger
            .last()
            .ok_or_else(|| DomainError::UnknownParticipant(participant_id.to_string()))
    }

    pub fn ledger(&self, participant_id: &ParticipantId) -> &[EarningsLedgerEntry] {
        self.ledgers
            .get(participant_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn ledgers(&self) -> &BTreeMap<ParticipantId, Vec<EarningsLedgerEntry>> {
        &self.ledgers
    }

    /// Cumulative total (0.0 for an empty or unknown ledger)
    pub fn total(&self, participant_id: &ParticipantId) -> f64 {
        self.ledger(participant_id)
            .last()
            .map(|e| e.cumulative_total_after)
            .unwrap_or(0.0)
    }

    /// Share of participants whose total is strictly lower, in `[0, 1)`
    pub fn percentile(&self, participant_id: &ParticipantId) -> Result<f64, DomainError> {
        if !self.ledgers.contains_key(participant_id) {
            return Err(DomainError::UnknownParticipant(participant_id.to_string()));
        }
        let own = self.total(participant_id);
        let lower = self
            .ledgers
            .keys()
            .filter(|other| *other != participant_id && self.total(other) < own)
            .count();
        Ok(lower as f64 / self.ledgers.len() as f64)
    }

    /// Disclose earnings at a checkpoint
    ///
    /// Returns `None` when the checkpoint is not configured. A checkpoint is
    /// disclosed at most once per participant; repeating it returns the
    /// recorded disclosure.
    pub fn disclose(
        &mut self,
        participant_id: &ParticipantId,
        checkpoint: DisclosureCheckpoint,
    ) -> Result<Option<DisclosureRecord>, DomainError> {
        if !self.disclosure.is_enabled(checkpoint) {
            return Ok(None);
        }
        let percentile = self.percentile(participant_id)?;

        if let Some(existing) = self
            .disclosure_history(participant_id)
            .iter()
            .find(|r| r.checkpoint == checkpoint)
        {
            return Ok(Some(existing.clone()));
        }

        let total = self.total(participant_id);
        let record = DisclosureRecord {
            participant_id: participant_id.clone(),
            checkpoint,
            style: self.disclosure.style,
            message: self.disclosure.style.render(
                checkpoint,
                total,
                percentile,
                self.ledger(participant_id),
            ),
            total_earnings: total,
            percentile,
            timestamp: Utc::now(),
        };
        self.disclosures
            .entry(participant_id.clone())
            .or_default()
            .push(record.clone());
        Ok(Some(record))
    }

    pub fn disclosure_history(&self, participant_id: &ParticipantId) -> &[DisclosureRecord] {
        self.disclosures
            .get(participant_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn disclosures(&self) -> &BTreeMap<ParticipantId, Vec<DisclosureRecord>> {
        &self.disclosures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earnings::disclosure::DisclosureStyle;

    fn ids() -> Vec<ParticipantId> {
        (0..3).map(ParticipantId::from_index).collect()
    }

    fn tracker(config: DisclosureConfig) -> EarningsTrackingService {
        let mut tracker = EarningsTrackingService::new(config);
        for id in ids() {
            tracker.register(&id);
        }
        tracker
    }

    #[test]
    fn test_cumulative_total_matches_sum_of_payouts() {
        let mut tracker = tracker(DisclosureConfig::disabled());
        let id = ParticipantId::from_index(0);
        let payouts = [1.2, 0.7, 2.45, 0.13];

        for (round, payout) in payouts.iter().enumerate() {
            tracker
                .add_individual_round_payout(&id, round as u32 + 1, *payout, "")
                .unwrap();
        }
        let entry = tracker.add_group_payout(&id, 3.3, "group").unwrap();
        assert_eq!(entry.round_type, RoundType::GroupOutcome);

        let ledger = tracker.ledger(&id);
        let sum: f64 = ledger.iter().map(|e| e.payout_amount).sum();
        assert_eq!(ledger.len(), 5);
        assert_eq!(ledger[4].cumulative_total_after, sum);
        assert_eq!(tracker.total(&id), sum);
    }

    #[test]
    fn test_unknown_participant_rejected() {
        let mut tracker = tracker(DisclosureConfig::disabled());
        let stranger = ParticipantId::from("stranger");

        assert!(matches!(
            tracker.add_group_payout(&stranger, 1.0, ""),
            Err(DomainError::UnknownParticipant(_))
        ));
        assert!(tracker.percentile(&stranger).is_err());
        assert_eq!(tracker.total(&stranger), 0.0);
    }

    #[test]
    fn test_percentile_counts_strictly_lower() {
        let mut tracker = tracker(DisclosureConfig::disabled());
        let [a, b, c] = [ids()[0].clone(), ids()[1].clone(), ids()[2].clone()];
        tracker.add_group_payout(&a, 1.0, "").unwrap();
        tracker.add_group_payout(&b, 2.0, "").unwrap();
        tracker.add_group_payout(&c, 2.0, "").unwrap();

        assert_eq!(tracker.percentile(&a).unwrap(), 0.0);
        assert!((tracker.percentile(&b).unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(
            tracker.percentile(&b).unwrap(),
            tracker.percentile(&c).unwrap()
        );
        for id in ids() {
            let p = tracker.percentile(&id).unwrap();
            assert!((0.0..1.0).contains(&p));
        }
    }

    #[test]
    fn test_disclose_only_configured_checkpoints() {
        let config = DisclosureConfig::disabled()
            .with_style(DisclosureStyle::Minimal)
            .with_checkpoint(DisclosureCheckpoint::ExperimentEnd);
        let mut tracker = tracker(config);
        let id = ParticipantId::from_index(0);
        tracker.add_group_payout(&id, 2.0, "").unwrap();

        assert!(
            tracker
                .disclose(&id, DisclosureCheckpoint::AfterRound(1))
                .unwrap()
                .is_none()
        );
        let record = tracker
            .disclose(&id, DisclosureCheckpoint::ExperimentEnd)
            .unwrap()
            .unwrap();
        assert_eq!(
            record.message,
            "Earnings at the end of the experiment: $2.00."
        );
        assert_eq!(tracker.disclosure_history(&id).len(), 1);
    }

    #[test]
    fn test_disclose_is_idempotent() {
        let mut tracker = tracker(DisclosureConfig::default());
        let id = ParticipantId::from_index(1);
        tracker
            .add_individual_round_payout(&id, 1, 1.0, "")
            .unwrap();

        let first = tracker
            .disclose(&id, DisclosureCheckpoint::EndOfIndividualPhase)
            .unwrap();
        tracker
            .add_individual_round_payout(&id, 2, 5.0, "")
            .unwrap();
        let second = tracker
            .disclose(&id, DisclosureCheckpoint::EndOfIndividualPhase)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(tracker.disclosure_history(&id).len(), 1);
    }

    #[test]
    fn test_detailed_disclosure_lists_ledger() {
        let config = DisclosureConfig::disabled()
            .with_style(DisclosureStyle::Detailed)
            .with_checkpoint(DisclosureCheckpoint::AfterGroupSettlement);
        let mut tracker = tracker(config);
        let id = ParticipantId::from_index(2);
        tracker
            .add_individual_round_payout(&id, 1, 1.5, "d1, low")
            .unwrap();
        tracker.add_group_payout(&id, 2.5, "d2, high").unwrap();

        let record = tracker
            .disclose(&id, DisclosureCheckpoint::AfterGroupSettlement)
            .unwrap()
            .unwrap();
        assert!(record.message.contains("Individual round 1: $1.50"));
        assert!(record.message.contains("Group outcome: $2.50 (running total $4.00)"));
        assert!(record.message.ends_with("Total: $4.00"));
    }
}
