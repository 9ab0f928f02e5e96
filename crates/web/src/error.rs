//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding. All route handlers return `Result<T, AppError>`.
//!
//! Every error answers with a JSON body `{error, kind, retryable}` so the
//! initiating view can show it inline without touching its current state.
//! A backend 401 is the exception: it redirects to sign-in.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use thiserror::Error;

use gamekart_core::access::SIGN_IN_PATH;
use gamekart_core::{AddressError, CartError, TransitionError};

use crate::backend::ApiError;
use crate::catalog::CatalogError;

/// Application-level error type for the web shell.
#[derive(Debug, Error)]
pub enum AppError {
    /// The backend no longer accepts the session.
    #[error("Sign-in required")]
    AuthRequired,

    /// Illegal status change or missing transition input.
    #[error("{0}")]
    Transition(#[from] TransitionError),

    #[error("{0}")]
    Cart(#[from] CartError),

    #[error("{0}")]
    Address(#[from] AddressError),

    #[error("{0}")]
    Catalog(#[from] CatalogError),

    /// Bad input that is not covered by a more specific variant.
    #[error("{0}")]
    Validation(String),

    /// The same transition is already in flight for this order.
    #[error("{0}")]
    Conflict(String),

    /// Unknown order, product or page.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend call failed.
    #[error("Backend error: {0}")]
    Backend(ApiError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => Self::AuthRequired,
            ApiError::NotFound(what) => Self::NotFound(what),
            other => Self::Backend(other),
        }
    }
}

/// Response extension marking a response caused by an expired backend session.
///
/// The access guard sees it on the way out and forgets the cached identity.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
    retryable: bool,
}

impl AppError {
    /// Machine-readable category.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AuthRequired => "auth_required",
            Self::Transition(_) => "transition_invalid",
            Self::Cart(_) | Self::Address(_) | Self::Validation(_) => "validation",
            Self::Catalog(CatalogError::NotFound(_)) | Self::NotFound(_) => "not_found",
            Self::Catalog(CatalogError::Io(_) | CatalogError::Parse(_))
            | Self::Session(_)
            | Self::Internal(_) => "internal",
            Self::Catalog(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Backend(ApiError::Timeout) => "timeout",
            Self::Backend(ApiError::Forbidden(_)) => "forbidden",
            Self::Backend(ApiError::Rejected { .. }) => "rejected",
            Self::Backend(_) => "network",
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::AuthRequired => StatusCode::SEE_OTHER,
            Self::Transition(_) | Self::Cart(_) | Self::Address(_) | Self::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Catalog(err) => match err {
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::Io(_) | CatalogError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Backend(err) => match err {
                ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
                ApiError::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
                ApiError::Http(_) | ApiError::Upstream { .. } | ApiError::Parse(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Backend(err) => err.is_retryable(),
            _ => false,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Session(_)
                | Self::Catalog(CatalogError::Io(_) | CatalogError::Parse(_))
                | Self::Backend(ApiError::Http(_) | ApiError::Upstream { .. } | ApiError::Parse(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::AuthRequired) {
            let mut response = Redirect::to(SIGN_IN_PATH).into_response();
            response.extensions_mut().insert(SessionExpired);
            return response;
        }

        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, kind = self.kind(), "Request rejected");
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_)
            | Self::Session(_)
            | Self::Catalog(CatalogError::Io(_) | CatalogError::Parse(_)) => {
                "Internal server error".to_string()
            }
            Self::Backend(ApiError::Timeout) => "The server took too long to respond".to_string(),
            Self::Backend(ApiError::Rejected { message, .. } | ApiError::Forbidden(message)) => {
                message.clone()
            }
            Self::Backend(_) => "Could not reach the server, please try again".to_string(),
            _ => self.to_string(),
        };

        let body = ErrorBody {
            error: message,
            kind: self.kind(),
            retryable: self.is_retryable(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after the session resolves to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::header::LOCATION;

    use gamekart_core::{OrderStatus, ProductId};

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Transition(TransitionError::MissingRider)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Conflict("busy".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Catalog(CatalogError::NotFound(ProductId::new("x")))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Catalog(CatalogError::InvalidQuantity)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(ApiError::Timeout.into()),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            get_status(
                ApiError::Upstream {
                    status: 500,
                    message: "boom".to_string()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(
                ApiError::Rejected {
                    status: 400,
                    message: "bad".to_string()
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(ApiError::NotFound("order".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_backend_401_redirects_to_sign_in() {
        let response = AppError::from(ApiError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/signin");
        assert!(response.extensions().get::<SessionExpired>().is_some());
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let err = AppError::Transition(TransitionError::Invalid {
            from: OrderStatus::Delivered,
            to: OrderStatus::Shipped,
        });
        let body = body_json(err.into_response()).await;
        assert_eq!(body["kind"], "transition_invalid");
        assert_eq!(body["retryable"], false);
        assert_eq!(
            body["error"],
            "an order cannot move from Delivered to Shipped"
        );

        let body = body_json(AppError::from(ApiError::Timeout).into_response()).await;
        assert_eq!(body["kind"], "timeout");
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let body =
            body_json(AppError::Internal("db password wrong".to_string()).into_response()).await;
        assert_eq!(body["error"], "Internal server error");
    }
}
