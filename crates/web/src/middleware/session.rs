//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. The shell keeps only the
//! cart here; identity comes from the backend's own session cookie.

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use gamekart_core::Cart;

use crate::config::WebConfig;
use crate::models::session_keys;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "gk_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &WebConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// The cart stored in the session, or an empty one.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// The cart as it is in the store now, including writes other requests
/// made since this request first read the session.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn reload_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    session.load().await?;
    load_cart(session).await
}

/// Persist the cart.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn save_cart(
    session: &Session,
    cart: &Cart,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}
