//! Prompt domain
//!
//! Templates for every model call an experiment makes: participant turns,
//! memory synthesis, choice extraction and round summaries.

mod template;

pub use template::PromptTemplate;
