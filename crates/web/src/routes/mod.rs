//! HTTP route handlers for the web shell.
//!
//! Views are JSON documents tagged with a `view` field; a front end renders
//! them. Everything under `/home`, `/admin` and `/rider` sits behind the
//! access guard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                           - Redirect to the role's landing page (guard)
//! GET  /signin                     - Sign-in view
//! POST /signout                    - End the backend session
//! GET  /health                     - Liveness
//! GET  /health/ready               - Readiness (pings the backend)
//!
//! # Customer
//! GET  /home                       - Catalog
//! GET  /home/products/{id}         - Product detail
//! GET  /home/cart                  - Cart with estimated totals
//! POST /home/cart/add              - Add a line (merges variants)
//! POST /home/cart/update           - Set a line's quantity
//! POST /home/cart/remove           - Remove a line
//! POST /home/cart/clear            - Empty the cart
//! POST /home/cart/checkout         - Place the order
//! GET  /home/my-orders             - The customer's orders
//!
//! # Admin
//! GET  /admin                      - Stats, all orders, riders
//! POST /admin/orders/{id}/ship     - Paid -> Shipped with a rider
//!
//! # Rider
//! GET  /rider                      - Stats and assigned orders
//! POST /rider/orders/{id}/deliver  - Shipped -> Delivered / Undelivered
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod home;
pub mod orders;
pub mod rider;
pub mod views;

use axum::{
    Router,
    http::Uri,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// Create the customer cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/checkout", post(cart::checkout))
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::catalog))
        .route("/products/{id}", get(home::product))
        .route("/my-orders", get(orders::my_orders))
        .nest("/cart", cart_routes())
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/orders/{id}/ship", post(admin::ship))
}

/// Create the rider routes router.
pub fn rider_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(rider::dashboard))
        .route("/orders/{id}/deliver", post(rider::deliver))
}

/// Create all routes for the shell.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Landing redirect; the guard answers before this handler runs
        .route("/", get(auth::root))
        .route("/signin", get(auth::sign_in))
        .route("/signout", post(auth::sign_out))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/home", customer_routes())
        .nest("/admin", admin_routes())
        .nest("/rider", rider_routes())
}

/// Fallback for unknown paths.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("page {}", uri.path()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Json,
        body::{Body, to_bytes},
        http::{HeaderMap, Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::{app_state, spawn_backend};

    /// Answers `current_user` with the role named by the session cookie.
    async fn current_user(headers: HeaderMap) -> Json<Value> {
        let cookie = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let role = cookie.strip_prefix("connect.sid=").unwrap_or_default();
        if role.is_empty() || role == "expired" {
            return Json(json!({ "isAuthenticated": false, "user": null }));
        }
        Json(json!({
            "isAuthenticated": true,
            "user": {
                "_id": format!("{role}-1"),
                "displayName": role,
                "email": "someone@gamekart.in",
                "role": role
            }
        }))
    }

    async fn app() -> Router {
        let backend = Router::new()
            .route("/api/auth/current_user", get(current_user))
            .route(
                "/api/orders/my",
                get(|| async { StatusCode::UNAUTHORIZED }),
            );
        let url = spawn_backend(backend).await;
        crate::build_app(app_state(&url))
    }

    async fn get_as(app: Router, path: &str, role: Option<&str>) -> axum::response::Response {
        let mut request = Request::builder().uri(path);
        if let Some(role) = role {
            request = request.header(header::COOKIE, format!("connect.sid={role}"));
        }
        app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap()
    }

    fn location(response: &axum::response::Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_is_sent_to_sign_in() {
        let response = get_as(app().await, "/home/cart", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/signin");
    }

    #[tokio::test]
    async fn test_root_redirects_by_role() {
        for (role, target) in [("customer", "/home"), ("admin", "/admin"), ("rider", "/rider")] {
            let response = get_as(app().await, "/", Some(role)).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{role}");
            assert_eq!(location(&response), target, "{role}");
        }
    }

    #[tokio::test]
    async fn test_wrong_role_is_sent_home() {
        let response = get_as(app().await, "/admin", Some("rider")).await;
        assert_eq!(location(&response), "/rider");

        let response = get_as(app().await, "/signin", Some("customer")).await;
        assert_eq!(location(&response), "/home");
    }

    #[tokio::test]
    async fn test_catalog_and_product_views() {
        let response = get_as(app().await, "/home", Some("customer")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["view"], "catalog");
        assert_eq!(body["products"].as_array().unwrap().len(), 5);

        let response = get_as(app().await, "/home/products/no-such-thing", Some("customer")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_backend_401_redirects_to_sign_in() {
        let response = get_as(app().await, "/home/my-orders", Some("customer")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/signin");
    }

    #[tokio::test]
    async fn test_unknown_path_and_health() {
        let response = get_as(app().await, "/nowhere", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = get_as(app().await, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
