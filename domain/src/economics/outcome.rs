//! Economic outcome value object

use super::distribution::IncomeClass;
use crate::core::string::format_dollars;
use crate::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// Realized income and payout for one participant in one round or settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicOutcome {
    pub participant_id: ParticipantId,
    pub round_number: u32,
    /// `None` when the distribution was assigned at random (no group agreement)
    pub chosen_principle: Option<u8>,
    pub distribution_id: String,
    pub assigned_income_class: IncomeClass,
    pub actual_income: i64,
    pub payout_amount: f64,
}

impl EconomicOutcome {
    pub fn summary(&self) -> String {
        let principle = match self.chosen_principle {
            Some(id) => format!("principle {}", id),
            None => "random assignment".to_string(),
        };
        format!(
            "{} -> {}, class {}: income {}, payout ${:.2}",
            principle,
            self.distribution_id,
            self.assigned_income_class.label(),
            format_dollars(self.actual_income),
            self.payout_amount
        )
    }
}
