//! Principle and choice value objects

use crate::core::string::format_dollars;
use serde::{Deserialize, Serialize};

/// One of the four distributive-justice principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Principle {
    /// 1. Maximize the lowest income
    MaximizeFloor,
    /// 2. Maximize the average income
    MaximizeAverage,
    /// 3. Maximize the average subject to a minimum income
    FloorConstraint,
    /// 4. Maximize the average subject to a maximum spread
    RangeConstraint,
}

impl Principle {
    pub const ALL: [Principle; 4] = [
        Principle::MaximizeFloor,
        Principle::MaximizeAverage,
        Principle::FloorConstraint,
        Principle::RangeConstraint,
    ];

    pub fn id(&self) -> u8 {
        match self {
            Principle::MaximizeFloor => 1,
            Principle::MaximizeAverage => 2,
            Principle::FloorConstraint => 3,
            Principle::RangeConstraint => 4,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Principle::MaximizeFloor),
            2 => Some(Principle::MaximizeAverage),
            3 => Some(Principle::FloorConstraint),
            4 => Some(Principle::RangeConstraint),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Principle::MaximizeFloor => "Maximizing the floor income",
            Principle::MaximizeAverage => "Maximizing the average income",
            Principle::FloorConstraint => "Maximizing the average income with a floor constraint",
            Principle::RangeConstraint => "Maximizing the average income with a range constraint",
        }
    }

    pub fn requires_floor(&self) -> bool {
        matches!(self, Principle::FloorConstraint)
    }

    pub fn requires_range(&self) -> bool {
        matches!(self, Principle::RangeConstraint)
    }
}

impl std::fmt::Display for Principle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. {}", self.id(), self.name())
    }
}

/// A participant's structured choice (Value Object)
///
/// `principle_id` is kept as a raw number so that out-of-range values coming
/// from a decoder can still be represented and rejected by validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub principle_id: u8,
    pub name: String,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_constraint: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_constraint: Option<i64>,
}

impl Choice {
    /// Create a choice for a principle without any constraint
    pub fn new(principle: Principle, reasoning: impl Into<String>) -> Self {
        Self {
            principle_id: principle.id(),
            name: principle.name().to_string(),
            reasoning: reasoning.into(),
            floor_constraint: None,
            range_constraint: None,
        }
    }

    /// Create a choice from a raw principle id, which may be out of range
    pub fn raw(principle_id: u8, reasoning: impl Into<String>) -> Self {
        let name = Principle::from_id(principle_id)
            .map(|p| p.name().to_string())
            .unwrap_or_else(|| format!("Unknown principle {}", principle_id));
        Self {
            principle_id,
            name,
            reasoning: reasoning.into(),
            floor_constraint: None,
            range_constraint: None,
        }
    }

    /// Principle 3 with floor `floor`
    pub fn with_floor(floor: i64, reasoning: impl Into<String>) -> Self {
        Self::new(Principle::FloorConstraint, reasoning).with_floor_constraint(floor)
    }

    /// Principle 4 with range `range`
    pub fn with_range(range: i64, reasoning: impl Into<String>) -> Self {
        Self::new(Principle::RangeConstraint, reasoning).with_range_constraint(range)
    }

    /// The default choice used when nothing usable could be recovered
    pub fn fallback(reasoning: impl Into<String>) -> Self {
        Self::new(Principle::MaximizeFloor, reasoning)
    }

    pub fn with_floor_constraint(mut self, floor: i64) -> Self {
        self.floor_constraint = Some(floor);
        self
    }

    pub fn with_range_constraint(mut self, range: i64) -> Self {
        self.range_constraint = Some(range);
        self
    }

    pub fn principle(&self) -> Option<Principle> {
        Principle::from_id(self.principle_id)
    }

    /// Two choices agree when they name the same principle
    pub fn same_principle(&self, other: &Choice) -> bool {
        self.principle_id == other.principle_id
    }

    /// Short human-readable label, e.g. `3. ... (floor $13,000)`
    pub fn label(&self) -> String {
        let mut label = format!("{}. {}", self.principle_id, self.name);
        if let Some(floor) = self.floor_constraint {
            label.push_str(&format!(" (floor {})", format_dollars(floor)));
        }
        if let Some(range) = self.range_constraint {
            label.push_str(&format!(" (range {})", format_dollars(range)));
        }
        label
    }
}
