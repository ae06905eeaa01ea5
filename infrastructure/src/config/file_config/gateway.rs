//! Chat-completions endpoint configuration from TOML (`[gateway]` section)
//!
//! Any OpenAI-compatible server works (OpenAI, vLLM, Ollama, LocalAI).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGatewayConfig {
    /// Base URL up to and including the API version, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Environment variable holding the API key (default: "OPENAI_API_KEY")
    pub api_key_env: String,
    /// Direct API key (not recommended, use the env var instead)
    pub api_key: Option<String>,
    /// Max tokens per response
    pub max_tokens: Option<u32>,
    /// Timeout in seconds for one request
    pub timeout_seconds: u64,
}

impl Default for FileGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            max_tokens: Some(1024),
            timeout_seconds: 120,
        }
    }
}

impl FileGatewayConfig {
    /// The direct key if set, otherwise the key from `api_key_env`
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| {
                let key = std::env::var(&self.api_key_env).ok()?;
                (!key.is_empty()).then_some(key)
            })
    }
}
