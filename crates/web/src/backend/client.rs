use std::sync::Arc;

use reqwest::header::COOKIE;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::instrument;

use gamekart_core::{DeliveryOutcome, NewOrder, Order, OrderId, Projection, Rider, RiderId};

use super::{ApiError, BackendSession, CurrentUser, DeliverRequest, ShipRequest};
use crate::config::BackendConfig;

/// Client for the GameKart REST backend.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    session_cookie: String,
}

impl BackendClient {
    /// Create a client for the configured backend.
    ///
    /// Redirects are not followed: the backend answers logout with a redirect
    /// to the browser-facing site, which the shell has no reason to fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.url.as_str().trim_end_matches('/').to_string(),
                session_cookie: config.session_cookie.clone(),
            }),
        })
    }

    fn request(&self, method: Method, path: &str, session: &BackendSession) -> RequestBuilder {
        self.inner
            .client
            .request(method, format!("{}{path}", self.inner.base_url))
            .header(
                COOKIE,
                format!("{}={}", self.inner.session_cookie, session.expose()),
            )
    }

    /// Send a request and decode a JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = ApiError::from_status(status, &body);
            tracing::debug!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Resolve the session cookie to an identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the answer cannot be parsed.
    #[instrument(skip_all)]
    pub async fn current_user(&self, session: &BackendSession) -> Result<CurrentUser, ApiError> {
        self.send(self.request(Method::GET, "/api/auth/current_user", session))
            .await
    }

    /// End the backend session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend answers with an
    /// error status. Redirects count as success.
    #[instrument(skip_all)]
    pub async fn logout(&self, session: &BackendSession) -> Result<(), ApiError> {
        let response = self
            .request(Method::GET, "/api/auth/logout", session)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() || status.is_redirection() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects the order.
    #[instrument(skip_all, fields(items = order.items.len()))]
    pub async fn create_order(
        &self,
        session: &BackendSession,
        order: &NewOrder,
    ) -> Result<Order, ApiError> {
        self.send(self.request(Method::POST, "/api/orders", session).json(order))
            .await
    }

    /// Fetch the order list behind a projection.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all, fields(projection = %projection))]
    pub async fn orders(
        &self,
        session: &BackendSession,
        projection: Projection,
    ) -> Result<Vec<Order>, ApiError> {
        self.send(self.request(Method::GET, projection.endpoint(), session))
            .await
    }

    /// Ship a paid order with a rider.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip_all, fields(order_id = %order_id, rider_id = %rider_id))]
    pub async fn ship_order(
        &self,
        session: &BackendSession,
        order_id: &OrderId,
        rider_id: &RiderId,
    ) -> Result<Order, ApiError> {
        let path = format!("/api/orders/{order_id}/ship");
        self.send(
            self.request(Method::PATCH, &path, session)
                .json(&ShipRequest { rider_id }),
        )
        .await
    }

    /// Record the outcome of a delivery.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn deliver_order(
        &self,
        session: &BackendSession,
        order_id: &OrderId,
        outcome: DeliveryOutcome,
    ) -> Result<Order, ApiError> {
        let path = format!("/api/orders/{order_id}/deliver");
        self.send(
            self.request(Method::PATCH, &path, session)
                .json(&DeliverRequest { status: outcome }),
        )
        .await
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Riders orders can be assigned to.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn riders(&self, session: &BackendSession) -> Result<Vec<Rider>, ApiError> {
        self.send(self.request(Method::GET, "/api/admin/riders", session))
            .await
    }

    /// Check the backend is reachable.
    ///
    /// Any HTTP answer counts; only transport failures and timeouts do not.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    pub async fn ping(&self) -> Result<(), ApiError> {
        self.inner
            .client
            .get(format!("{}/api/auth/current_user", self.inner.base_url))
            .send()
            .await?;
        Ok(())
    }
}
