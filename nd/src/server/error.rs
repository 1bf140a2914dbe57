//! HTTP error responses

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::assistant::AssistantError;
use crate::interpret::ControlError;
use crate::workspace::WorkspaceError;

/// Error body returned by every handler: `{"error": ..., "details": ...}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn unauthorized(error: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Map an operation failure, keeping `what` as the headline
    ///
    /// Missing tokens are 401 and objects the workspace can't find are 404;
    /// everything else is a 500.
    pub fn failed(what: &str, err: AssistantError) -> Self {
        let status = match &err {
            AssistantError::Workspace(WorkspaceError::MissingToken) => StatusCode::UNAUTHORIZED,
            AssistantError::Workspace(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %err, "{}", what);
        }
        Self::new(status, what).with_details(err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.error, details),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        Self::failed("Request failed", err)
    }
}

impl From<WorkspaceError> for ApiError {
    fn from(err: WorkspaceError) -> Self {
        match err {
            WorkspaceError::MissingToken => Self::unauthorized("Notion token required"),
            other => Self::failed("Workspace request failed", other.into()),
        }
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::MissingTarget(message) => Self::bad_request(message),
            ControlError::Assistant(e) => Self::failed("Failed to process page control command", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;

    #[test]
    fn test_remote_not_found_maps_to_404() {
        let err = AssistantError::Workspace(WorkspaceError::Remote {
            status: 404,
            message: "Could not find page".to_string(),
        });
        let api = ApiError::failed("Failed to summarize page", err);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.error, "Failed to summarize page");
        assert!(api.details.unwrap().contains("Could not find page"));
    }

    #[test]
    fn test_generation_failure_is_500() {
        let err = AssistantError::Generation(LlmError::Blocked("SAFETY".to_string()));
        let api = ApiError::failed("Failed to generate questions", err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_token_is_401() {
        let api: ApiError = WorkspaceError::MissingToken.into();
        assert_eq!(api.status, StatusCode::UNAUTHORIZED);
        assert_eq!(api.error, "Notion token required");
    }

    #[test]
    fn test_missing_target_is_400() {
        let api: ApiError = ControlError::MissingTarget("Page ID required for update operations").into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
    }
}
