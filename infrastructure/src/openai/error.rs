//! Error types for the chat-completions adapter

use thiserror::Error;
use veil_application::GatewayError;

/// Result type alias for chat-completions operations
pub type Result<T> = std::result::Result<T, OpenAiError>;

#[derive(Error, Debug)]
pub enum OpenAiError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Rate limited by the endpoint")]
    RateLimited,

    #[error("Response contained no choices")]
    EmptyResponse,
}

impl From<OpenAiError> for GatewayError {
    fn from(error: OpenAiError) -> Self {
        match error {
            OpenAiError::Http(e) if e.is_timeout() => GatewayError::Timeout,
            OpenAiError::Http(e) if e.is_connect() => GatewayError::ConnectionError(e.to_string()),
            OpenAiError::Status { status: 404, body } => GatewayError::ModelNotAvailable(body),
            other => GatewayError::RequestFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_model_not_available() {
        let error: GatewayError = OpenAiError::Status {
            status: 404,
            body: "model 'x' not found".to_string(),
        }
        .into();
        assert!(matches!(error, GatewayError::ModelNotAvailable(ref m) if m.contains("'x'")));
    }

    #[test]
    fn test_other_errors_map_to_request_failed() {
        let error: GatewayError = OpenAiError::RateLimited.into();
        assert!(matches!(error, GatewayError::RequestFailed(_)));

        let error: GatewayError = OpenAiError::Status {
            status: 500,
            body: "boom".to_string(),
        }
        .into();
        assert_eq!(error.to_string(), "Request failed: HTTP 500: boom");
    }
}
