//! Domain error types

use thiserror::Error;

/// A principle-specific constraint rule was broken by a [`Choice`](crate::Choice).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown principle id {0}: must be one of 1, 2, 3, 4")]
    UnknownPrinciple(u8),

    #[error("Principle 3 requires a floor constraint, but the floor constraint is missing")]
    MissingFloorConstraint,

    #[error("Floor constraint must be non-negative, got {0}")]
    NegativeFloorConstraint(i64),

    #[error("Principle 4 requires a range constraint, but the range constraint is missing")]
    MissingRangeConstraint,

    #[error("Range constraint must be non-negative, got {0}")]
    NegativeRangeConstraint(i64),

    #[error("Principle {0} does not take a floor constraint")]
    UnexpectedFloorConstraint(u8),

    #[error("Principle {0} does not take a range constraint")]
    UnexpectedRangeConstraint(u8),
}

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid choice: {0}")]
    Validation(#[from] ValidationError),

    #[error("No income distributions configured")]
    EmptyDistributionSet,

    #[error("Income distribution '{0}' has no income classes")]
    EmptyDistribution(String),

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
