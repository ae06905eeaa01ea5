//! Distributive-justice principles and participant choices.
//!
//! - [`choice`]: the four principles and a participant's [`Choice`](choice::Choice)
//! - [`validation`]: constraint rules every choice must satisfy
//! - [`decoder`]: recovering a structured choice from free-form model text

pub mod choice;
pub mod decoder;
pub mod validation;
