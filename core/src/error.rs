//! Error types for the todo API client.
//!
//! # Design
//! Two layers. `ApiError` describes what went wrong on the wire: a transport
//! failure, an unexpected status, or a payload that would not (de)serialize.
//! `ClientError` is what the session and collection components report to the
//! view: either a local validation failure or a request failure carrying a
//! message fit for display.

use thiserror::Error;

/// Errors produced while building, executing, or parsing an HTTP exchange.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404, with its payload.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The server rejected the bearer token or the credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The server returned a status other than the expected one.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The request never produced a response (connection refused, timeout).
    #[error("transport failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// Message carried by the server's error payload, if any.
    ///
    /// The API answers failures with a plain-text body; an empty body means
    /// the caller should fall back to its own wording.
    pub fn server_message(&self) -> Option<&str> {
        let body = match self {
            ApiError::NotFound(body)
            | ApiError::Unauthorized(body)
            | ApiError::HttpError { body, .. } => body,
            _ => return None,
        };
        let trimmed = body.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Failures surfaced by `SessionManager` and `TodoCollection`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// A required field was empty; no request was issued.
    #[error("{0}")]
    Validation(String),

    /// The request failed; the message is the server payload or a fallback.
    #[error("{0}")]
    Request(String),
}

impl ClientError {
    /// Convert a wire-level failure, preferring the server's own message.
    pub(crate) fn from_api(err: &ApiError, fallback: &str) -> Self {
        let message = err.server_message().unwrap_or(fallback);
        ClientError::Request(message.to_string())
    }

    pub fn message(&self) -> &str {
        match self {
            ClientError::Validation(msg) | ClientError::Request(msg) => msg,
        }
    }
}
