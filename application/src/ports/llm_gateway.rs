//! LLM Gateway port
//!
//! Defines the interface for communicating with the language-model
//! capability. The experiment treats it as a black box: persona and prompt
//! in, free text out, after an arbitrary delay, possibly failing.

use async_trait::async_trait;
use thiserror::Error;
use veil_domain::ModelSpec;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Gateway for LLM communication
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Create a new session with the specified model
    async fn create_session(&self, model: &ModelSpec) -> Result<Box<dyn LlmSession>, GatewayError>;

    /// Create a new session with a system prompt (the participant's persona)
    async fn create_session_with_system_prompt(
        &self,
        model: &ModelSpec,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError>;
}

/// An active LLM session
#[async_trait]
pub trait LlmSession: Send + Sync {
    /// Get the model used by this session
    fn model(&self) -> &ModelSpec;

    /// Send a message and get a response
    async fn send(&self, content: &str) -> Result<String, GatewayError>;
}
