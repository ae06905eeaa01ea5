//! Income classes and distributions.

use crate::core::string::format_dollars;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Income class a participant can be assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeClass {
    High,
    MediumHigh,
    Medium,
    MediumLow,
    Low,
}

impl IncomeClass {
    pub const ALL: [IncomeClass; 5] = [
        IncomeClass::High,
        IncomeClass::MediumHigh,
        IncomeClass::Medium,
        IncomeClass::MediumLow,
        IncomeClass::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeClass::High => "high",
            IncomeClass::MediumHigh => "medium_high",
            IncomeClass::Medium => "medium",
            IncomeClass::MediumLow => "medium_low",
            IncomeClass::Low => "low",
        }
    }

    /// Human-readable label used in prompts and disclosures
    pub fn label(&self) -> &'static str {
        match self {
            IncomeClass::High => "High",
            IncomeClass::MediumHigh => "Medium high",
            IncomeClass::Medium => "Medium",
            IncomeClass::MediumLow => "Medium low",
            IncomeClass::Low => "Low",
        }
    }
}

impl std::fmt::Display for IncomeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IncomeClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "high" => Ok(IncomeClass::High),
            "medium_high" => Ok(IncomeClass::MediumHigh),
            "medium" => Ok(IncomeClass::Medium),
            "medium_low" => Ok(IncomeClass::MediumLow),
            "low" => Ok(IncomeClass::Low),
            _ => Err(format!("Unknown income class: {}", s)),
        }
    }
}

/// One candidate income distribution (immutable experiment input)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeDistribution {
    pub id: String,
    pub name: String,
    pub incomes: BTreeMap<IncomeClass, i64>,
}

impl IncomeDistribution {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            incomes: BTreeMap::new(),
        }
    }

    pub fn with_income(mut self, class: IncomeClass, amount: i64) -> Self {
        self.incomes.insert(class, amount);
        self
    }

    pub fn income_for(&self, class: IncomeClass) -> Option<i64> {
        self.incomes.get(&class).copied()
    }

    /// Classes this distribution defines, in class order
    pub fn classes(&self) -> Vec<IncomeClass> {
        self.incomes.keys().copied().collect()
    }

    pub fn floor(&self) -> i64 {
        self.incomes.values().copied().min().unwrap_or(0)
    }

    pub fn ceiling(&self) -> i64 {
        self.incomes.values().copied().max().unwrap_or(0)
    }

    pub fn average(&self) -> f64 {
        if self.incomes.is_empty() {
            return 0.0;
        }
        self.incomes.values().sum::<i64>() as f64 / self.incomes.len() as f64
    }

    /// Spread between highest and lowest income
    pub fn range(&self) -> i64 {
        self.ceiling() - self.floor()
    }

    /// One-line description for prompts
    pub fn describe(&self) -> String {
        let amounts: Vec<String> = self
            .incomes
            .iter()
            .map(|(class, amount)| format!("{} {}", class.label(), format_dollars(*amount)))
            .collect();
        format!(
            "{} ({}): {}; floor {}, average {}, range {}",
            self.name,
            self.id,
            amounts.join(", "),
            format_dollars(self.floor()),
            format_dollars(self.average().round() as i64),
            format_dollars(self.range())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d1() -> IncomeDistribution {
        IncomeDistribution::new("d1", "Distribution 1")
            .with_income(IncomeClass::High, 32_000)
            .with_income(IncomeClass::MediumHigh, 27_000)
            .with_income(IncomeClass::Medium, 24_000)
            .with_income(IncomeClass::MediumLow, 13_000)
            .with_income(IncomeClass::Low, 12_000)
    }

    #[test]
    fn test_statistics() {
        let d = d1();
        assert_eq!(d.floor(), 12_000);
        assert_eq!(d.ceiling(), 32_000);
        assert_eq!(d.range(), 20_000);
        assert_eq!(d.average(), 21_600.0);
        assert_eq!(d.income_for(IncomeClass::Medium), Some(24_000));
    }

    #[test]
    fn test_empty_distribution() {
        let d = IncomeDistribution::new("empty", "Empty");
        assert_eq!(d.floor(), 0);
        assert_eq!(d.average(), 0.0);
        assert!(d.classes().is_empty());
    }

    #[test]
    fn test_describe() {
        let text = d1().describe();
        assert!(text.starts_with("Distribution 1 (d1): High $32,000"));
        assert!(text.ends_with("floor $12,000, average $21,600, range $20,000"));
    }

    #[test]
    fn test_income_class_parse() {
        assert_eq!(
            "medium-high".parse::<IncomeClass>().ok(),
            Some(IncomeClass::MediumHigh)
        );
        assert_eq!("LOW".parse::<IncomeClass>().ok(), Some(IncomeClass::Low));
        assert!("middle".parse::<IncomeClass>().is_err());
        assert_eq!(IncomeClass::MediumLow.to_string(), "medium_low");
    }
}
