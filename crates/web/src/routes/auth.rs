//! Sign-in and sign-out handlers.
//!
//! Sign-in itself happens on the backend (Google OAuth); the shell only
//! points the browser there and tears the session down again on sign-out.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tower_sessions::{Session, cookie::Cookie};

use gamekart_core::access::SIGN_IN_PATH;

use crate::error::{AppError, clear_sentry_user};
use crate::middleware::backend_session_from_headers;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInView {
    pub view: &'static str,
    pub google_sign_in_url: String,
}

/// `GET /` is always answered by the guard with a redirect. Reaching this
/// handler means the guard was bypassed.
pub async fn root() -> AppError {
    AppError::Internal("landing page reached without the access guard".to_string())
}

pub async fn sign_in(State(state): State<AppState>) -> Json<SignInView> {
    let public = state.config().backend.public_url.as_str().trim_end_matches('/');
    Json(SignInView {
        view: "signin",
        google_sign_in_url: format!("{public}/api/auth/google"),
    })
}

/// End the backend session, forget the identity and drop the cart session.
///
/// Always lands on the sign-in page; a failed backend logout is logged and
/// otherwise ignored.
pub async fn sign_out(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Response {
    let cookie_name = &state.config().backend.session_cookie;

    if let Some(backend) = backend_session_from_headers(&headers, cookie_name) {
        if let Err(e) = state.backend().logout(&backend).await {
            tracing::warn!(error = %e, "Backend logout failed");
        }
        state.sessions().forget(&backend).await;
    }

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }
    clear_sentry_user();

    let mut removal = Cookie::new(cookie_name.clone(), "");
    removal.set_path("/");
    removal.make_removal();

    let mut response = Redirect::to(SIGN_IN_PATH).into_response();
    if let Ok(value) = HeaderValue::from_str(&removal.to_string()) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}
