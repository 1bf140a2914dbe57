//! Text generation errors

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// The API key env var is unset or empty
    #[error("Gemini API key not found. Set the {0} environment variable.")]
    MissingKey(String),

    /// 429; the caller decides whether to wait `retry_after`
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Gemini API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Prompt or candidate stopped by a safety filter
    #[error("Prompt blocked: {0}")]
    Blocked(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Worth another attempt with the same prompt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 408 || *status >= 500,
            Self::RateLimited { .. } | Self::Network(_) | Self::Timeout(_) => true,
            Self::MissingKey(_) | Self::Blocked(_) | Self::InvalidResponse(_) | Self::Json(_) => false,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_retry_client_errors_dont() {
        let overloaded = LlmError::Api {
            status: 503,
            message: "The model is overloaded.".to_string(),
        };
        let bad_key = LlmError::Api {
            status: 400,
            message: "API key not valid.".to_string(),
        };
        assert!(overloaded.is_retryable());
        assert!(!bad_key.is_retryable());
    }

    #[test]
    fn test_blocked_and_missing_key_are_final() {
        assert!(!LlmError::Blocked("SAFETY".to_string()).is_retryable());
        assert!(!LlmError::MissingKey("GEMINI_API_KEY".to_string()).is_retryable());
        assert!(LlmError::Timeout(Duration::from_secs(60)).is_retryable());
    }

    #[test]
    fn test_rate_limit_carries_delay() {
        let err = LlmError::RateLimited {
            retry_after: Duration::from_secs(7),
        };
        assert!(err.is_rate_limit());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
        assert_eq!(LlmError::Blocked("OTHER".to_string()).retry_after(), None);
    }

    #[test]
    fn test_missing_key_message_names_variable() {
        let err = LlmError::MissingKey("MY_KEY".to_string());
        assert!(err.to_string().contains("MY_KEY"));
    }
}
