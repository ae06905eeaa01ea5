//! Chat-completions session.
//!
//! The endpoint is stateless, so the session keeps the conversation locally
//! and sends the full history with every request.

use super::gateway::ChatClient;
use super::protocol::ChatMessage;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use veil_application::{GatewayError, LlmSession};
use veil_domain::ModelSpec;

pub struct OpenAiSession {
    client: Arc<ChatClient>,
    model: ModelSpec,
    /// System prompt first (if any), then alternating user/assistant turns
    messages: Mutex<Vec<ChatMessage>>,
}

impl OpenAiSession {
    pub fn new(client: Arc<ChatClient>, model: ModelSpec, system_prompt: Option<&str>) -> Self {
        let messages = system_prompt
            .filter(|p| !p.is_empty())
            .map(|p| vec![ChatMessage::system(p)])
            .unwrap_or_default();
        Self {
            client,
            model,
            messages: Mutex::new(messages),
        }
    }

    pub async fn history_len(&self) -> usize {
        self.messages.lock().await.len()
    }
}

#[async_trait]
impl LlmSession for OpenAiSession {
    fn model(&self) -> &ModelSpec {
        &self.model
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        let mut messages = self.messages.lock().await;
        messages.push(ChatMessage::user(content));

        match self.client.complete(&self.model, &messages).await {
            Ok(reply) => {
                debug!(model = %self.model, turns = messages.len(), "Chat completion received");
                messages.push(ChatMessage::assistant(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                // Keep the history replayable after a failed turn
                messages.pop();
                Err(e.into())
            }
        }
    }
}
