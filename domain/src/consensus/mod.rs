//! Consensus detection
//!
//! After every deliberation round the orchestrator asks a
//! [`ConsensusService`] whether the group has converged. The service reduces
//! the transcript to each participant's latest choice, tallies principles and
//! applies the configured [`ConsensusStrategy`].
//!
//! ```text
//! Transcript ──latest per participant──▶ PrincipleTally ──strategy──▶ ConsensusResult
//!                                                                        │
//!                                              ConsensusValidator ◀──────┘ (advisory)
//! ```
//!
//! Strategies are a closed set selected at construction:
//!
//! | Strategy | Agreed choice when | Unanimous when |
//! |----------|--------------------|----------------|
//! | `exact` | every latest principle matches | same |
//! | `threshold:θ` | leader share `>= θ` | leader share is 1.0 |
//! | `semantic` | (currently identical to `exact`) | |

pub mod result;
pub mod service;
pub mod strategy;
pub mod tally;
pub mod validator;

// Re-export main types
pub use result::ConsensusResult;
pub use service::ConsensusService;
pub use strategy::ConsensusStrategy;
pub use tally::PrincipleTally;
pub use validator::{ConsensusValidator, SuspicionReason};
