//! Choice validation.
//!
//! Every [`Choice`] must carry exactly the constraints its principle needs:
//!
//! | Principle | floor_constraint | range_constraint |
//! |-----------|------------------|------------------|
//! | 1, 2      | absent           | absent           |
//! | 3         | present, `>= 0`  | absent           |
//! | 4         | absent           | present, `>= 0`  |

use super::choice::{Choice, Principle};
use crate::core::error::ValidationError;

/// Outcome of validating a single choice
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// All error messages joined into a single line
    pub fn messages(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A choice that failed inside a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    /// Position in the submitted batch
    pub index: usize,
    pub errors: Vec<ValidationError>,
}

/// Aggregated outcome of validating many choices
#[derive(Debug, Clone, PartialEq)]
pub struct BatchValidationReport {
    pub total: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchValidationReport {
    pub fn all_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.total - self.failures.len()
    }
}

/// Checks principle-specific constraint requirements
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationService;

impl ValidationService {
    pub fn new() -> Self {
        Self
    }

    /// Collect every rule the choice breaks
    pub fn validate(&self, choice: &Choice) -> ValidationReport {
        let mut errors = Vec::new();

        let Some(principle) = Principle::from_id(choice.principle_id) else {
            errors.push(ValidationError::UnknownPrinciple(choice.principle_id));
            return ValidationReport::from_errors(errors);
        };

        match (principle.requires_floor(), choice.floor_constraint) {
            (true, None) => errors.push(ValidationError::MissingFloorConstraint),
            (true, Some(f)) if f < 0 => errors.push(ValidationError::NegativeFloorConstraint(f)),
            (false, Some(_)) => {
                errors.push(ValidationError::UnexpectedFloorConstraint(principle.id()))
            }
            _ => {}
        }

        match (principle.requires_range(), choice.range_constraint) {
            (true, None) => errors.push(ValidationError::MissingRangeConstraint),
            (true, Some(r)) if r < 0 => errors.push(ValidationError::NegativeRangeConstraint(r)),
            (false, Some(_)) => {
                errors.push(ValidationError::UnexpectedRangeConstraint(principle.id()))
            }
            _ => {}
        }

        ValidationReport::from_errors(errors)
    }

    /// Validate every choice; never stops at the first failure
    pub fn validate_batch(&self, choices: &[Choice]) -> BatchValidationReport {
        let failures = choices
            .iter()
            .enumerate()
            .filter_map(|(index, choice)| {
                let report = self.validate(choice);
                (!report.is_valid).then_some(BatchFailure {
                    index,
                    errors: report.errors,
                })
            })
            .collect();

        BatchValidationReport {
            total: choices.len(),
            failures,
        }
    }
}
