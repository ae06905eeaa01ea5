//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod conversation;
pub mod fan_out;
pub mod memory;
pub mod run_batch;
pub mod run_experiment;
pub(crate) mod shared;
