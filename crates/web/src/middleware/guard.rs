//! Access guard middleware and identity extractor.
//!
//! Every request to a guarded path resolves the backend session and is then
//! either redirected, answered with the loading view, or admitted with a
//! [`CurrentIdentity`] in its extensions.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::cookie::Cookie;
use tracing::Span;

use gamekart_core::{Decision, Identity, RoutePolicy, guard};

use crate::backend::BackendSession;
use crate::error::{AppError, SessionExpired, set_sentry_user};
use crate::state::AppState;

/// The signed-in identity and the backend session it came from.
#[derive(Debug, Clone)]
pub struct CurrentIdentity {
    pub identity: Identity,
    pub backend: BackendSession,
}

/// Extractor for handlers behind the guard.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_orders(RequireIdentity(current): RequireIdentity) -> impl IntoResponse {
///     format!("Hello, {}!", current.identity.display_name)
/// }
/// ```
pub struct RequireIdentity(pub CurrentIdentity);

impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentIdentity>()
            .cloned()
            .map(Self)
            .ok_or(AppError::AuthRequired)
    }
}

/// Pull the backend session cookie out of the browser's `Cookie` header.
#[must_use]
pub fn backend_session_from_headers(
    headers: &HeaderMap,
    cookie_name: &str,
) -> Option<BackendSession> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == cookie_name && !cookie.value().is_empty())
        .map(|cookie| BackendSession::new(cookie.value()))
}

pub async fn access_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if RoutePolicy::for_path(&path) == RoutePolicy::Public {
        return next.run(request).await;
    }

    let backend = backend_session_from_headers(
        request.headers(),
        &state.config().backend.session_cookie,
    );
    let session = state.sessions().resolve(backend.as_ref()).await;

    match guard(&session, &path) {
        Decision::RedirectTo(target) => return Redirect::to(target).into_response(),
        Decision::Pending => return Json(json!({ "view": "loading" })).into_response(),
        Decision::Render => {}
    }

    if let (Some(identity), Some(backend)) = (session.identity(), backend.clone()) {
        Span::current().record("user_id", identity.id.as_str());
        set_sentry_user(&identity.id, Some(identity.email.as_str()));
        request.extensions_mut().insert(CurrentIdentity {
            identity: identity.clone(),
            backend,
        });
    }

    let response = next.run(request).await;

    if response.extensions().get::<SessionExpired>().is_some()
        && let Some(backend) = backend
    {
        tracing::info!("Backend session expired, forgetting identity");
        state.sessions().forget(&backend).await;
    }

    response
}
