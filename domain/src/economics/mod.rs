//! Deterministic economics
//!
//! Turns a principle choice into a concrete [`IncomeDistribution`] and an
//! assigned income class into an [`EconomicOutcome`] with a payout.

pub mod distribution;
pub mod outcome;
pub mod service;

pub use distribution::{IncomeClass, IncomeDistribution};
pub use outcome::EconomicOutcome;
pub use service::{ClassWeights, EconomicsService, Selection, WorkedExample};
