//! Chat-completions LLM Gateway implementation

use super::error::{OpenAiError, Result};
use super::protocol::{ChatMessage, ChatRequest, ChatResponse};
use super::session::OpenAiSession;
use crate::config::FileGatewayConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use veil_application::{GatewayError, LlmGateway, LlmSession};
use veil_domain::ModelSpec;

/// Endpoint settings resolved from configuration
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl GatewaySettings {
    pub fn from_config(config: &FileGatewayConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.resolve_api_key(),
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

/// Shared HTTP client plus endpoint settings, used by every session
pub struct ChatClient {
    http: reqwest::Client,
    settings: GatewaySettings,
}

impl ChatClient {
    pub fn new(settings: GatewaySettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    /// One non-streaming completion over the given messages
    pub async fn complete(&self, model: &ModelSpec, messages: &[ChatMessage]) -> Result<String> {
        let body = ChatRequest {
            model: &model.name,
            messages,
            temperature: model.temperature,
            max_tokens: self.settings.max_tokens,
            stream: false,
        };

        let mut request = self.http.post(self.completions_url()).json(&body);
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(OpenAiError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OpenAiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        if let Some(usage) = &parsed.usage {
            debug!(
                model = %model.name,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Token usage"
            );
        }
        parsed.into_text().ok_or(OpenAiError::EmptyResponse)
    }
}

/// LLM Gateway implementation for OpenAI-compatible endpoints
pub struct OpenAiGateway {
    client: Arc<ChatClient>,
}

impl OpenAiGateway {
    pub fn new(settings: GatewaySettings) -> std::result::Result<Self, GatewayError> {
        info!(base_url = %settings.base_url, "Chat-completions gateway initialized");
        let client =
            ChatClient::new(settings).map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    pub fn from_config(config: &FileGatewayConfig) -> std::result::Result<Self, GatewayError> {
        Self::new(GatewaySettings::from_config(config))
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn create_session(
        &self,
        model: &ModelSpec,
    ) -> std::result::Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(OpenAiSession::new(Arc::clone(&self.client), model.clone(), None)))
    }

    async fn create_session_with_system_prompt(
        &self,
        model: &ModelSpec,
        system_prompt: &str,
    ) -> std::result::Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(OpenAiSession::new(
            Arc::clone(&self.client),
            model.clone(),
            Some(system_prompt),
        )))
    }
}
