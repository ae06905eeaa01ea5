//! Deliberation records.
//!
//! - [`transcript`]: the public, append-only record of utterances
//! - [`speaking_order`]: per-round turn order and its history
//! - [`memory`]: each participant's private, append-only notes

pub mod memory;
pub mod speaking_order;
pub mod transcript;
