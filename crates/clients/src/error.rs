//! Client error types and HTTP error mapping.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the HTTP clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request did not complete within the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The service could not be reached or the connection failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("Service responded with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Invalid response payload: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /// Returns the HTTP status for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub(crate) fn map_transport_error(error: reqwest::Error) -> ClientError {
    if error.is_timeout() {
        ClientError::Timeout(error.to_string())
    } else {
        ClientError::Transport(error.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Builds a `Status` error, preferring the service's `{"error": ...}` message.
pub(crate) fn map_status_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body_preview(body),
    };
    ClientError::Status {
        status: status.as_u16(),
        message,
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
        format!("{preview}...")
    } else {
        compact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_uses_service_message() {
        let err = map_status_error(StatusCode::BAD_REQUEST, br#"{"error":"Insufficient stock"}"#);
        match err {
            ClientError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Insufficient stock");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn status_error_falls_back_to_truncated_body() {
        let body = "x".repeat(500);
        let err = map_status_error(StatusCode::BAD_GATEWAY, body.as_bytes());
        let ClientError::Status { message, .. } = err else {
            panic!("expected status error");
        };
        assert_eq!(message.chars().count(), 163);
        assert!(message.ends_with("..."));
    }
}
