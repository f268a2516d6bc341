//! Error taxonomy for the compile clients.
//!
//! Transport failures and non-2xx responses are the only error values; a
//! malformed line inside an otherwise healthy event stream is not an error
//! at all — it is skipped with a debug-level diagnostic (see
//! `events::CompileEvent::parse_line`).

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Unified error type for compile backend operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network/connection failure (DNS, refused connection, mid-stream
    /// reset). Surfaced via `on_error` on the streaming path, returned on
    /// the sync path.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status. `message` carries
    /// the server-provided text when the body had one.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The request failed front-end validation before any network activity.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Build a [`ClientError::Server`] from a failed response body.
    ///
    /// Prefers the backend's JSON `message` field; falls back to a generic
    /// message carrying the status code.
    pub(crate) fn from_failure(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_owned)
            })
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("server error {}", status.as_u16()));
        Self::Server {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_extracted_from_body() {
        let err = ClientError::from_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"message":"syntax error line 3"}"#,
        );
        assert_eq!(err.to_string(), "syntax error line 3");
    }

    #[test]
    fn missing_message_falls_back_to_status_code() {
        let err = ClientError::from_failure(StatusCode::SERVICE_UNAVAILABLE, "<html>busy</html>");
        assert_eq!(err.to_string(), "server error 503");
        match err {
            ClientError::Server { status, .. } => assert_eq!(status, 503),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn empty_message_field_falls_back() {
        let err = ClientError::from_failure(StatusCode::BAD_REQUEST, r#"{"message":"  "}"#);
        assert_eq!(err.to_string(), "server error 400");
    }
}
