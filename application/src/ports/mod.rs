//! Port definitions for the application layer
//!
//! Ports are interfaces the use cases depend on; adapters in the
//! infrastructure layer implement them.

pub mod conversation_logger;
pub mod llm_gateway;
pub mod progress;
