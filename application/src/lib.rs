//! Application layer for veil-council
//!
//! This crate contains use cases, port definitions, and the experiment
//! configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{ConfigError, ExperimentConfig, ParticipantConfig, PublicContextMode};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{GatewayError, LlmGateway, LlmSession},
    progress::{NoProgress, ProgressNotifier},
};
pub use use_cases::conversation::ConversationService;
pub use use_cases::fan_out::{BoundedFanOut, FanOutError};
pub use use_cases::memory::MemoryService;
pub use use_cases::run_batch::RunBatchUseCase;
pub use use_cases::run_experiment::{OrchestrationError, RunExperimentUseCase};
pub use use_cases::shared::ChoiceExtractor;
