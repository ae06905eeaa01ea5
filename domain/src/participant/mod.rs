//! Participants of a deliberation.
//!
//! - [`entities::Participant`]: one autonomous agent with persona and mutable choice
//! - [`entities::ParticipantId`]: stable identifier used across ledgers
//! - [`entities::ModelSpec`]: which language model backs a participant

pub mod entities;

pub use entities::{ModelSpec, Participant, ParticipantId};
