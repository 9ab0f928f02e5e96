//! Session resolution.
//!
//! Turns the backend cookie a browser sent into a [`SessionState`]. Identities
//! are cached briefly so that a page view does not cost a backend round trip
//! per request.

use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument, warn};

use gamekart_core::{Identity, SessionState};

use crate::backend::{BackendClient, BackendSession};

/// Resolves and caches identities for backend sessions.
#[derive(Clone)]
pub struct SessionService {
    backend: BackendClient,
    identities: Cache<String, Identity>,
}

impl SessionService {
    #[must_use]
    pub fn new(backend: BackendClient, ttl: Duration) -> Self {
        let identities = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .build();
        Self {
            backend,
            identities,
        }
    }

    /// Resolve a session.
    ///
    /// Never fails: no cookie, a rejected cookie and a failed lookup all
    /// resolve to [`SessionState::Anonymous`], so the sign-in page can always
    /// be shown.
    #[instrument(skip_all, fields(has_cookie = session.is_some()))]
    pub async fn resolve(&self, session: Option<&BackendSession>) -> SessionState {
        let Some(session) = session else {
            return SessionState::Anonymous;
        };

        if let Some(identity) = self.identities.get(session.expose()).await {
            debug!("Cache hit for identity");
            return SessionState::Authenticated(identity);
        }

        match self.backend.current_user(session).await {
            Ok(current) => {
                let state = SessionState::from_current_user(current.is_authenticated, current.user);
                if let Some(identity) = state.identity() {
                    self.identities
                        .insert(session.expose().to_string(), identity.clone())
                        .await;
                }
                state
            }
            Err(e) => {
                warn!(error = %e, "Session lookup failed, treating as signed out");
                SessionState::Anonymous
            }
        }
    }

    /// Drop the cached identity for a session (sign-out, expired session).
    pub async fn forget(&self, session: &BackendSession) {
        self.identities.invalidate(session.expose()).await;
    }
}
