//! Economics service: principle-driven distribution selection and payouts.

use super::distribution::{IncomeClass, IncomeDistribution};
use super::outcome::EconomicOutcome;
use crate::core::error::DomainError;
use crate::core::string::format_dollars;
use crate::participant::ParticipantId;
use crate::principle::choice::{Choice, Principle};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Relative weights for income class assignment (missing classes weigh 0)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassWeights(BTreeMap<IncomeClass, f64>);

impl ClassWeights {
    pub fn new(weights: BTreeMap<IncomeClass, f64>) -> Self {
        Self(weights)
    }

    pub fn with_weight(mut self, class: IncomeClass, weight: f64) -> Self {
        self.0.insert(class, weight);
        self
    }

    pub fn weight(&self, class: IncomeClass) -> f64 {
        self.0.get(&class).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn validate(&self) -> Result<(), DomainError> {
        if let Some((class, w)) = self.0.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
            return Err(DomainError::InvalidConfiguration(format!(
                "class weight for {} must be a non-negative number, got {}",
                class, w
            )));
        }
        if !self.0.is_empty() && self.0.values().sum::<f64>() <= 0.0 {
            return Err(DomainError::InvalidConfiguration(
                "class weights must not all be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which distribution a choice resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    /// The principle's own rule had no qualifying distribution
    pub fallback_used: bool,
}

/// Deterministic explanation of what one principle would select
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkedExample {
    pub principle_id: u8,
    pub constraint: Option<i64>,
    pub distribution_id: String,
    pub distribution_name: String,
    pub fallback_used: bool,
}

impl WorkedExample {
    pub fn explanation(&self) -> String {
        let principle = Principle::from_id(self.principle_id)
            .map(|p| p.to_string())
            .unwrap_or_else(|| format!("Principle {}", self.principle_id));
        let constraint = match (self.principle_id, self.constraint) {
            (3, Some(f)) => format!(" with a floor of {}", format_dollars(f)),
            (4, Some(r)) => format!(" with a range of at most {}", format_dollars(r)),
            _ => String::new(),
        };
        let fallback = if self.fallback_used {
            " (no distribution satisfied the constraint, so the fallback rule applied)"
        } else {
            ""
        };
        format!(
            "{}{} selects {}{}.",
            principle, constraint, self.distribution_name, fallback
        )
    }
}

/// Selects distributions and computes payouts over a fixed distribution set
#[derive(Debug, Clone)]
pub struct EconomicsService {
    distributions: Vec<IncomeDistribution>,
    payout_ratio: f64,
    class_weights: Option<ClassWeights>,
}

impl EconomicsService {
    pub fn new(
        distributions: Vec<IncomeDistribution>,
        payout_ratio: f64,
        class_weights: Option<ClassWeights>,
    ) -> Result<Self, DomainError> {
        if distributions.is_empty() {
            return Err(DomainError::EmptyDistributionSet);
        }
        if let Some(empty) = distributions.iter().find(|d| d.incomes.is_empty()) {
            return Err(DomainError::EmptyDistribution(empty.id.clone()));
        }
        if !payout_ratio.is_finite() || payout_ratio < 0.0 {
            return Err(DomainError::InvalidConfiguration(format!(
                "payout ratio must be a non-negative number, got {}",
                payout_ratio
            )));
        }
        if let Some(weights) = &class_weights {
            weights.validate()?;
        }

        Ok(Self {
            distributions,
            payout_ratio,
            class_weights: class_weights.filter(|w| !w.is_empty()),
        })
    }

    pub fn distributions(&self) -> &[IncomeDistribution] {
        &self.distributions
    }

    pub fn distribution(&self, index: usize) -> Option<&IncomeDistribution> {
        self.distributions.get(index)
    }

    pub fn payout_ratio(&self) -> f64 {
        self.payout_ratio
    }

    /// Resolve a choice to a distribution
    ///
    /// Never fails: an unknown principle or a missing constraint resolves to
    /// the principle-1 selection.
    pub fn select(&self, choice: &Choice) -> Selection {
        let (floor, range) = (choice.floor_constraint, choice.range_constraint);
        match (choice.principle(), floor, range) {
            (Some(Principle::MaximizeFloor), _, _) => Selection {
                index: self.max_floor(),
                fallback_used: false,
            },
            (Some(Principle::MaximizeAverage), _, _) => Selection {
                index: self.max_average(),
                fallback_used: false,
            },
            (Some(Principle::FloorConstraint), Some(floor), _) => {
                let meeting = self.indexed().filter(|(_, d)| d.floor() >= floor);
                match best_by(meeting, |d| d.average()) {
                    Some(index) => Selection {
                        index,
                        fallback_used: false,
                    },
                    None => {
                        warn!(floor, "No distribution meets the floor, using principle 1");
                        Selection {
                            index: self.max_floor(),
                            fallback_used: true,
                        }
                    }
                }
            }
            (Some(Principle::RangeConstraint), _, Some(range)) => {
                let meeting = self.indexed().filter(|(_, d)| d.range() <= range);
                match best_by(meeting, |d| d.average()) {
                    Some(index) => Selection {
                        index,
                        fallback_used: false,
                    },
                    None => {
                        warn!(
                            range,
                            "No distribution meets the range, using the smallest range"
                        );
                        Selection {
                            index: self.min_range(),
                            fallback_used: true,
                        }
                    }
                }
            }
            _ => {
                warn!(
                    principle_id = choice.principle_id,
                    "Choice cannot drive a selection, using principle 1"
                );
                Selection {
                    index: self.max_floor(),
                    fallback_used: true,
                }
            }
        }
    }

    /// Draw an income class for the distribution, uniformly unless weights are configured
    pub fn assign_class<R: Rng + ?Sized>(
        &self,
        distribution: &IncomeDistribution,
        rng: &mut R,
    ) -> Result<IncomeClass, DomainError> {
        let classes = distribution.classes();
        if classes.is_empty() {
            return Err(DomainError::EmptyDistribution(distribution.id.clone()));
        }

        if let Some(weights) = &self.class_weights {
            match WeightedIndex::new(classes.iter().map(|c| weights.weight(*c))) {
                Ok(index) => return Ok(classes[index.sample(rng)]),
                Err(e) => warn!(
                    distribution = %distribution.id,
                    "Class weights unusable for this distribution ({}), assigning uniformly",
                    e
                ),
            }
        }

        Ok(classes[rng.gen_range(0..classes.len())])
    }

    /// Uniformly pick a distribution (used when the group did not agree)
    pub fn random_distribution_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.distributions.len())
    }

    pub fn payout(&self, actual_income: i64) -> f64 {
        actual_income as f64 * self.payout_ratio
    }

    /// Assign a class in the selected distribution and compute the payout
    pub fn outcome<R: Rng + ?Sized>(
        &self,
        participant_id: &ParticipantId,
        round_number: u32,
        chosen_principle: Option<u8>,
        distribution_index: usize,
        rng: &mut R,
    ) -> Result<EconomicOutcome, DomainError> {
        let distribution = self.distribution(distribution_index).ok_or_else(|| {
            DomainError::InvalidConfiguration(format!(
                "no income distribution at index {}",
                distribution_index
            ))
        })?;
        let class = self.assign_class(distribution, rng)?;
        let actual_income = distribution
            .income_for(class)
            .ok_or_else(|| DomainError::EmptyDistribution(distribution.id.clone()))?;

        Ok(EconomicOutcome {
            participant_id: participant_id.clone(),
            round_number,
            chosen_principle,
            distribution_id: distribution.id.clone(),
            assigned_income_class: class,
            actual_income,
            payout_amount: self.payout(actual_income),
        })
    }

    /// What each principle would select here, with sample constraints for 3 and 4
    ///
    /// The sample floor is the mean of the distributions' floors and the
    /// sample range the mean of their ranges, both rounded to $1,000.
    pub fn worked_examples(&self) -> Vec<WorkedExample> {
        let n = self.distributions.len() as f64;
        let round_k = |v: f64| ((v / 1000.0).round() * 1000.0) as i64;
        let floors: f64 = self.distributions.iter().map(|d| d.floor() as f64).sum();
        let ranges: f64 = self.distributions.iter().map(|d| d.range() as f64).sum();
        let sample_floor = round_k(floors / n);
        let sample_range = round_k(ranges / n);

        Principle::ALL
            .iter()
            .map(|principle| {
                let (choice, constraint) = match principle {
                    Principle::FloorConstraint => {
                        (Choice::with_floor(sample_floor, ""), Some(sample_floor))
                    }
                    Principle::RangeConstraint => {
                        (Choice::with_range(sample_range, ""), Some(sample_range))
                    }
                    p => (Choice::new(*p, ""), None),
                };
                let selection = self.select(&choice);
                let distribution = &self.distributions[selection.index];
                WorkedExample {
                    principle_id: principle.id(),
                    constraint,
                    distribution_id: distribution.id.clone(),
                    distribution_name: distribution.name.clone(),
                    fallback_used: selection.fallback_used,
                }
            })
            .collect()
    }

    fn indexed(&self) -> impl Iterator<Item = (usize, &IncomeDistribution)> {
        self.distributions.iter().enumerate()
    }

    fn max_floor(&self) -> usize {
        best_by(self.indexed(), |d| d.floor() as f64).unwrap_or(0)
    }

    fn max_average(&self) -> usize {
        best_by(self.indexed(), |d| d.average()).unwrap_or(0)
    }

    fn min_range(&self) -> usize {
        best_by(self.indexed(), |d| -(d.range() as f64)).unwrap_or(0)
    }
}

/// Index with the strictly highest key; equal keys keep the first encountered
fn best_by<'a, I, F>(candidates: I, key: F) -> Option<usize>
where
    I: Iterator<Item = (usize, &'a IncomeDistribution)>,
    F: Fn(&IncomeDistribution) -> f64,
{
    let mut best: Option<(usize, f64)> = None;
    for (index, distribution) in candidates {
        let value = key(distribution);
        if best.is_none_or(|(_, b)| value > b) {
            best = Some((index, value));
        }
    }
    best.map(|(index, _)| index)
}
