use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GcpError>;

/// Which Google API produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Firestore,
    PubSub,
    Metadata,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Service::Firestore => "Firestore",
            Service::PubSub => "Pub/Sub",
            Service::Metadata => "metadata server",
        })
    }
}

#[derive(Debug, Error)]
pub enum GcpError {
    /// The request never got an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The client-side request deadline passed.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Google answered with a non-2xx status. `code` is the canonical status
    /// string from the error body, e.g. `ALREADY_EXISTS` or `PERMISSION_DENIED`.
    #[error("{service} returned {http_status} {}: {message}", .code.as_deref().unwrap_or("UNKNOWN"))]
    Api {
        service: Service,
        http_status: u16,
        code: Option<String>,
        message: String,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("could not decode response body: {0}")]
    Decode(String),

    #[error("no access token: {0}")]
    Auth(String),

    #[error("publish returned no message id")]
    EmptyPublishResponse,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GcpError {
    /// Build an `Api` error from a non-2xx response body.
    ///
    /// Google APIs answer with `{"error": {"code", "message", "status"}}`;
    /// anything else (emulators, proxies) is kept verbatim as the message.
    pub fn from_error_body(service: Service, http_status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => GcpError::Api {
                service,
                http_status,
                code: envelope.error.status,
                message: envelope.error.message,
            },
            Err(_) => GcpError::Api {
                service,
                http_status,
                code: None,
                message: body.trim().to_string(),
            },
        }
    }

    /// Status string Google attached to the failure, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            GcpError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GcpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GcpError::Decode(err.to_string())
        } else if err.is_timeout() {
            GcpError::Timeout(err.to_string())
        } else {
            GcpError::Transport(err.to_string())
        }
    }
}

/// Turn a non-2xx response into `GcpError::Api`, passing 2xx responses through.
pub(crate) async fn check_status(
    service: Service,
    resp: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(GcpError::from_error_body(service, status.as_u16(), &body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_error_body_yields_status_code() {
        let body = r#"{"error": {"code": 409, "message": "Document already exists: projects/p/databases/(default)/documents/UserReports/abc", "status": "ALREADY_EXISTS"}}"#;
        let err = GcpError::from_error_body(Service::Firestore, 409, body);
        assert_eq!(err.code(), Some("ALREADY_EXISTS"));
        let GcpError::Api { http_status, message, .. } = &err else {
            panic!("expected api error, got {err:?}");
        };
        assert_eq!(*http_status, 409);
        assert!(message.starts_with("Document already exists"));
        assert!(err.to_string().contains("Firestore returned 409 ALREADY_EXISTS"));
    }

    #[test]
    fn plain_text_error_body_is_kept() {
        let err = GcpError::from_error_body(Service::PubSub, 503, "upstream connect error\n");
        assert_eq!(err.code(), None);
        assert_eq!(
            err.to_string(),
            "Pub/Sub returned 503 UNKNOWN: upstream connect error"
        );
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let err: GcpError = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err()
            .into();
        assert!(matches!(err, GcpError::Transport(_)), "got {err:?}");
        assert_eq!(err.code(), None);
    }
}
