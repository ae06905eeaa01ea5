//! Domain layer for veil-council
//!
//! This crate contains the core rules of a veil-of-ignorance deliberation
//! experiment. It has no dependencies on infrastructure, presentation or an
//! async runtime.
//!
//! # Core Concepts
//!
//! ## Principles
//!
//! Participants choose one of four distributive-justice principles:
//!
//! - **1. Maximize the floor**: pick the distribution with the best-off worst class
//! - **2. Maximize the average**: pick the distribution with the highest mean income
//! - **3. Average with floor constraint**: highest mean among those whose floor meets `f`
//! - **4. Average with range constraint**: highest mean among those whose spread is at most `r`
//!
//! ## Deliberation
//!
//! Participants speak in turn (speaking order), every utterance lands in an
//! append-only [`Transcript`], and a [`ConsensusService`] decides after each
//! round whether the group has converged.
//!
//! ## Settlement
//!
//! The [`EconomicsService`] turns a principle into a concrete income
//! distribution and an income class into a payout; the
//! [`EarningsTrackingService`] keeps each participant's running total.

pub mod consensus;
pub mod core;
pub mod deliberation;
pub mod earnings;
pub mod economics;
pub mod orchestration;
pub mod participant;
pub mod principle;
pub mod prompt;

// Re-export commonly used types
pub use consensus::{
    ConsensusResult, ConsensusService, ConsensusStrategy, ConsensusValidator, PrincipleTally,
    SuspicionReason,
};
pub use core::{
    error::{DomainError, ValidationError},
    string::{format_dollars, truncate},
};
pub use deliberation::{
    memory::{MemoryEntry, MemoryLedger, MemoryStrategyKind},
    speaking_order::{SpeakingOrder, SpeakingOrderGenerator, SpeakingOrderPattern},
    transcript::{Transcript, TranscriptEntry},
};
pub use earnings::{
    disclosure::{DisclosureCheckpoint, DisclosureConfig, DisclosureRecord, DisclosureStyle},
    ledger::{EarningsLedgerEntry, EarningsTrackingService, RoundType},
};
pub use economics::{
    distribution::{IncomeClass, IncomeDistribution},
    outcome::EconomicOutcome,
    service::{ClassWeights, EconomicsService, Selection, WorkedExample},
};
pub use orchestration::{
    entities::Phase,
    value_objects::{
        BallotEntry, ExperimentResult, FinalAssessment, GroupOutcome, IndividualChoice,
        ParticipantSummary, PhaseTiming, RoundSummary, RunTiming,
    },
};
pub use participant::{ModelSpec, Participant, ParticipantId};
pub use principle::{
    choice::{Choice, Principle},
    decoder::{ChoiceDecoder, DecodedChoice, DigitScanDecoder},
    validation::{BatchFailure, BatchValidationReport, ValidationReport, ValidationService},
};
pub use prompt::PromptTemplate;
