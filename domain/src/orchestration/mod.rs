//! Orchestration domain: experiment phases and the result record
//!
//! The phase machine itself lives in the application layer; this module
//! holds the vocabulary it speaks and the value objects it produces.

pub mod entities;
pub mod value_objects;

pub use entities::Phase;
pub use value_objects::{
    BallotEntry, ExperimentResult, FinalAssessment, GroupOutcome, IndividualChoice,
    ParticipantSummary, PhaseTiming, RoundSummary, RunTiming,
};
