//! OpenAI-compatible chat-completions adapter
//!
//! Implements the [`LlmGateway`](veil_application::LlmGateway) port over
//! `POST {base_url}/chat/completions`. Works with any server speaking that
//! API (OpenAI, vLLM, Ollama, LocalAI).

pub mod error;
pub mod gateway;
pub mod protocol;
pub mod session;
