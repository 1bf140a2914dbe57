//! Workspace error types

use thiserror::Error;

/// Errors that can occur talking to the workspace API
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Workspace API error {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Notion token required")]
    MissingToken,
}

impl WorkspaceError {
    /// HTTP status of a remote failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            WorkspaceError::Remote { status, .. } => Some(*status),
            WorkspaceError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if the object asked for does not exist (or is not shared)
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// A 429; the request was rejected before it was applied
    pub fn is_rate_limit(&self) -> bool {
        self.status() == Some(429)
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkspaceError::Remote { status, .. } => matches!(*status, 408 | 429) || *status >= 500,
            WorkspaceError::Network(_) => true,
            WorkspaceError::InvalidResponse(_) => false,
            WorkspaceError::Json(_) => false,
            WorkspaceError::MissingToken => false,
        }
    }
}
