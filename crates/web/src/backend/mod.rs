//! REST backend client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for identities and orders
//! - Every call forwards the browser's backend session cookie
//! - Every call has a bounded timeout, surfaced as [`ApiError::Timeout`]
//! - Mutating calls return the full updated order document
//!
//! # Example
//!
//! ```rust,ignore
//! use gamekart_core::Projection;
//! use gamekart_web::backend::{BackendClient, BackendSession};
//!
//! let client = BackendClient::new(&config.backend)?;
//! let session = BackendSession::new(cookie_value);
//!
//! let current = client.current_user(&session).await?;
//! let orders = client.orders(&session, Projection::MyOrders).await?;
//! ```

mod client;
pub mod types;

pub use client::BackendClient;
pub use types::*;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The backend did not answer within the configured timeout.
    #[error("backend request timed out")]
    Timeout,

    /// The backend session is missing or expired.
    #[error("backend session is not authenticated")]
    Unauthorized,

    /// The session is valid but lacks permission.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Unknown resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend refused the request (validation, bad state).
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend failed.
    #[error("backend error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// The response body was not what we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

impl ApiError {
    /// Map a non-success status and its body.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let message = ErrorBody::message_from(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::Timeout,
            s if s.is_client_error() => Self::Rejected {
                status: s.as_u16(),
                message,
            },
            s => Self::Upstream {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// Whether trying the same request again may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout | Self::Upstream { .. })
    }
}

/// The browser's backend session cookie, forwarded on every call.
#[derive(Debug, Clone)]
pub struct BackendSession(SecretString);

impl BackendSession {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Session cookie value, for the `Cookie` header and cache keys.
    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, r#"{"error":"Order not found"}"#),
            ApiError::NotFound(message) if message == "Order not found"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"message":"Invalid status"}"#),
            ApiError::Rejected { status: 400, message } if message == "Invalid status"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            ApiError::Upstream { status: 502, message } if message == "Bad Gateway"
        ));
    }

    #[test]
    fn test_retryable() {
        assert!(ApiError::Timeout.is_retryable());
        assert!(
            ApiError::Upstream {
                status: 500,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(!ApiError::Unauthorized.is_retryable());
        assert!(
            !ApiError::Rejected {
                status: 400,
                message: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_session_debug_is_redacted() {
        let session = BackendSession::new("s%3Asecret");
        assert!(!format!("{session:?}").contains("secret"));
        assert_eq!(session.expose(), "s%3Asecret");
    }
}
