//! Application-level configuration.
//!
//! - [`ExperimentConfig`]: the complete, validated description of one
//!   experiment, built once and shared by the orchestrator and every service

pub mod experiment_config;

pub use experiment_config::{ConfigError, ExperimentConfig, ParticipantConfig, PublicContextMode};
