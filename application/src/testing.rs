//! In-process gateway doubles shared by the use-case tests.

use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use veil_domain::{ModelSpec, PromptTemplate};

type Responder = dyn Fn(&str, &str) -> Result<String, GatewayError> + Send + Sync;

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub model: String,
    pub system: String,
    pub prompt: String,
}

/// Gateway whose replies come from a `(system_prompt, prompt) -> reply` function
#[derive(Clone)]
pub(crate) struct ScriptedGateway {
    responder: Arc<Responder>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedGateway {
    pub fn new(
        responder: impl Fn(&str, &str) -> Result<String, GatewayError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Arc::new(responder),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replies with the prompt's quoted statement (or the whole prompt)
    pub fn echo() -> Self {
        Self::new(|_, prompt| Ok(quoted_statement(prompt).unwrap_or(prompt).to_string()))
    }

    /// Every call fails
    pub fn failing() -> Self {
        Self::new(|_, _| Err(GatewayError::RequestFailed("scripted failure".to_string())))
    }

    /// Full experiment script: each named participant always backs the given
    /// principle; extraction echoes the statement; memory and summary calls
    /// get canned structured replies.
    pub fn voting(votes: &[(&str, u8)]) -> Self {
        let votes: HashMap<String, u8> = votes
            .iter()
            .map(|(name, principle)| (name.to_string(), *principle))
            .collect();

        Self::new(move |system, prompt| {
            if system == PromptTemplate::extraction_system() {
                return Ok(quoted_statement(prompt).unwrap_or_default().to_string());
            }
            if system == PromptTemplate::summary_system() {
                return Ok("Round summary.".to_string());
            }
            if prompt.contains("Reply in exactly three sections") {
                return Ok("SITUATION: split\nOTHERS: undecided\nSTRATEGY: argue".to_string());
            }
            if prompt.starts_with("Summarize factually") {
                return Ok("recap".to_string());
            }
            if prompt.contains("What do they want") {
                return Ok("analysis".to_string());
            }
            if prompt.contains("Name ONE concrete thing") {
                return Ok("action".to_string());
            }

            let name = speaker_name(system).unwrap_or_default();
            let reply = match votes.get(name).copied().unwrap_or(1) {
                3 => "I support principle 3 with a floor of $13,000.".to_string(),
                4 => "I support principle 4 with a range of $15,000.".to_string(),
                p => format!("I support principle {}.", p),
            };
            Ok(reply)
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn count_prompts(&self, needle: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.prompt.contains(needle))
            .count()
    }
}

fn quoted_statement(prompt: &str) -> Option<&str> {
    let start = prompt.find("Statement:\n\"")? + "Statement:\n\"".len();
    Some(prompt[start..].trim_end().trim_end_matches('"'))
}

fn speaker_name(system: &str) -> Option<&str> {
    system.strip_prefix("You are ")?.split('.').next()
}

struct ScriptedSession {
    model: ModelSpec,
    system: String,
    gateway: ScriptedGateway,
}

#[async_trait]
impl LlmSession for ScriptedSession {
    fn model(&self) -> &ModelSpec {
        &self.model
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        self.gateway.calls.lock().unwrap().push(RecordedCall {
            model: self.model.name.clone(),
            system: self.system.clone(),
            prompt: content.to_string(),
        });
        (self.gateway.responder)(&self.system, content)
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn create_session(&self, model: &ModelSpec) -> Result<Box<dyn LlmSession>, GatewayError> {
        self.create_session_with_system_prompt(model, "").await
    }

    async fn create_session_with_system_prompt(
        &self,
        model: &ModelSpec,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(ScriptedSession {
            model: model.clone(),
            system: system_prompt.to_string(),
            gateway: self.clone(),
        }))
    }
}
