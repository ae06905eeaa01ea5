//! Port for structured experiment logging.
//!
//! Defines the [`ConversationLogger`] trait for recording experiment events
//! (utterances, memory entries, consensus checks, payouts, disclosures and
//! phase boundaries) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures the deliberation
//! record in a machine-readable format (JSONL).

use serde::Serialize;
use serde_json::Value;

/// A structured experiment event for logging.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "utterance", "consensus_check").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    /// Build an event from any serializable record
    ///
    /// A record that fails to serialize is logged as `null` rather than
    /// interrupting the run.
    pub fn from_record(event_type: &'static str, record: &impl Serialize) -> Self {
        Self::new(
            event_type,
            serde_json::to_value(record).unwrap_or(Value::Null),
        )
    }
}

/// Port for logging experiment events to a structured log.
///
/// The `log` method is synchronous and non-fallible so that logging never
/// disrupts a run; write failures are the adapter's concern.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
