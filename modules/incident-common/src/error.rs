use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use gcp_client::GcpError;
use thiserror::Error;
use tracing::{error, warn};

/// Everything a handler can fail with. The variant decides the status code,
/// and the status code is the only retry signal the queue sees.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Client sent a report without a required field. Not retryable.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Push body or payload could not be decoded. Not retryable.
    #[error("Format error: {0}")]
    Format(String),

    /// Store or queue call failed. Answered with 500 so the queue redelivers.
    #[error("Dependency error: {0}")]
    Dependency(String),
}

impl PipelineError {
    pub fn dependency(context: &str, err: impl std::fmt::Display) -> Self {
        PipelineError::Dependency(format!("{context}: {err}"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::Validation(_) | PipelineError::Format(_) => StatusCode::BAD_REQUEST,
            PipelineError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Dependency(_))
    }

    pub fn message(&self) -> &str {
        match self {
            PipelineError::Validation(m) | PipelineError::Format(m) | PipelineError::Dependency(m) => m,
        }
    }

    /// Log with the handler's context before the response goes out.
    pub fn log(&self, stage: &str) {
        if self.is_retryable() {
            error!(stage, error = %self, "Request failed, upstream will redeliver");
        } else {
            warn!(stage, error = %self, "Request rejected");
        }
    }

    /// `{"error": ...}` body, used by the client-facing ingestor.
    pub fn into_json_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({ "error": self.message() })),
        )
            .into_response()
    }

    /// Plain-text body, used by push subscribers.
    pub fn into_text_response(self) -> Response {
        let prefix = match self.status() {
            StatusCode::BAD_REQUEST => "Bad Request",
            _ => "Internal Server Error",
        };
        (self.status(), format!("{prefix}: {}", self.message())).into_response()
    }
}

impl From<GcpError> for PipelineError {
    fn from(err: GcpError) -> Self {
        PipelineError::Dependency(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcp_client::Service;

    #[test]
    fn only_dependency_errors_are_retryable() {
        assert!(!PipelineError::Validation("x".into()).is_retryable());
        assert!(!PipelineError::Format("x".into()).is_retryable());
        assert!(PipelineError::Dependency("x".into()).is_retryable());
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(PipelineError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(PipelineError::Format("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PipelineError::Dependency("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn gcp_errors_become_dependency_errors() {
        let err: PipelineError = GcpError::from_error_body(
            Service::PubSub,
            503,
            r#"{"error": {"code": 503, "message": "The service is currently unavailable.", "status": "UNAVAILABLE"}}"#,
        )
        .into();
        assert!(err.is_retryable());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message().contains("503 UNAVAILABLE"));
    }
}
