//! Integration tests for GameKart.
//!
//! Each test starts two servers on ephemeral ports: an in-memory mock of the
//! GameKart REST backend and the web shell pointed at it. Tests then drive
//! the shell over HTTP with `reqwest`, one client (and cookie jar) per
//! signed-in user.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gamekart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `access` - route guarding and sign-in/sign-out
//! - `checkout` - cart and order placement
//! - `order_lifecycle` - ship and deliver transitions, cache behaviour

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use chrono::Utc;
use reqwest::{Client, Url, cookie::Jar, redirect};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use gamekart_core::{Identity, NewOrder, Order, OrderId, OrderStatus, Rider, RiderId, Role};
use gamekart_web::catalog::Catalog;
use gamekart_web::config::WebConfig;
use gamekart_web::state::AppState;

/// Session cookie the mock backend issues.
pub const BACKEND_COOKIE: &str = "connect.sid";

/// Well-known sessions the mock backend accepts.
pub const CUSTOMER_TOKEN: &str = "customer-token";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const RIDER_TOKEN: &str = "rider-token";
pub const OTHER_RIDER_TOKEN: &str = "other-rider-token";

#[derive(Default)]
struct BackendData {
    users: HashMap<String, Identity>,
    riders: Vec<Rider>,
    /// Orders with the id of the customer who placed them.
    orders: Vec<(String, Order)>,
    next_order: u32,
    calls: HashMap<&'static str, usize>,
}

/// In-memory stand-in for the GameKart REST backend.
#[derive(Clone, Default)]
pub struct MockBackend {
    data: Arc<Mutex<BackendData>>,
    mutation_delay: Arc<Mutex<Duration>>,
}

fn identity(id: &str, name: &str, role: Role) -> Identity {
    serde_json::from_value(json!({
        "_id": id,
        "displayName": name,
        "email": format!("{id}@gamekart.in"),
        "role": role,
    }))
    .expect("valid identity document")
}

impl MockBackend {
    /// A backend with one customer, one admin and two riders.
    #[must_use]
    pub fn new() -> Self {
        let backend = Self::default();
        {
            let mut data = backend.lock();
            data.users
                .insert(CUSTOMER_TOKEN.to_string(), identity("c-1", "Meera", Role::Customer));
            data.users
                .insert(ADMIN_TOKEN.to_string(), identity("a-1", "Arjun", Role::Admin));
            data.users
                .insert(RIDER_TOKEN.to_string(), identity("r-1", "Ravi", Role::Rider));
            data.users
                .insert(OTHER_RIDER_TOKEN.to_string(), identity("r-2", "Sana", Role::Rider));
            data.riders = vec![
                Rider {
                    id: RiderId::new("r-1"),
                    name: "Ravi".to_string(),
                    username: "ravi".to_string(),
                    phone: "9800000001".to_string(),
                },
                Rider {
                    id: RiderId::new("r-2"),
                    name: "Sana".to_string(),
                    username: "sana".to_string(),
                    phone: "9800000002".to_string(),
                },
            ];
        }
        backend
    }

    fn lock(&self) -> MutexGuard<'_, BackendData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make order placement, ship and deliver calls take at least `delay`.
    pub fn set_mutation_delay(&self, delay: Duration) {
        *self
            .mutation_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = delay;
    }

    fn mutation_delay(&self) -> Duration {
        *self
            .mutation_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Store an order as if customer `owner` had placed it.
    pub fn seed(&self, owner: &str, order: Order) {
        self.lock().orders.push((owner.to_string(), order));
    }

    /// End a session on the backend side only; the shell still has it cached.
    pub fn expire(&self, token: &str) {
        self.lock().users.remove(token);
    }

    /// Change an order behind the shell's back.
    pub fn set_status(&self, id: &str, status: OrderStatus) {
        if let Some((_, order)) = self.lock().orders.iter_mut().find(|(_, o)| o.id.as_str() == id) {
            order.status = status;
        }
    }

    #[must_use]
    pub fn order(&self, id: &str) -> Option<Order> {
        self.lock()
            .orders
            .iter()
            .find(|(_, o)| o.id.as_str() == id)
            .map(|(_, o)| o.clone())
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.iter().map(|(_, o)| o.clone()).collect()
    }

    /// How many times an endpoint was called, by handler name.
    #[must_use]
    pub fn calls(&self, endpoint: &str) -> usize {
        self.lock().calls.get(endpoint).copied().unwrap_or(0)
    }

    fn record(&self, endpoint: &'static str) {
        *self.lock().calls.entry(endpoint).or_default() += 1;
    }

    fn user(&self, headers: &HeaderMap) -> Result<Identity, Response> {
        let token = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|cookies| {
                cookies.split(';').find_map(|pair| {
                    pair.trim()
                        .strip_prefix(BACKEND_COOKIE)
                        .and_then(|rest| rest.strip_prefix('='))
                })
            })
            .unwrap_or_default();
        self.lock().users.get(token).cloned().ok_or_else(|| {
            (StatusCode::UNAUTHORIZED, Json(json!({"error": "Not authenticated"}))).into_response()
        })
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/api/auth/current_user", get(current_user))
            .route("/api/auth/logout", get(logout))
            .route("/api/orders", get(all_orders).post(create_order))
            .route("/api/orders/my", get(my_orders))
            .route("/api/orders/rider/orders", get(rider_orders))
            .route("/api/orders/{id}/ship", patch(ship))
            .route("/api/orders/{id}/deliver", patch(deliver))
            .route("/api/admin/riders", get(riders))
            .with_state(self.clone())
    }
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, Json(json!({"error": "Access denied"}))).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Order not found"}))).into_response()
}

async fn current_user(State(backend): State<MockBackend>, headers: HeaderMap) -> Json<Value> {
    backend.record("current_user");
    match backend.user(&headers) {
        Ok(user) => Json(json!({"isAuthenticated": true, "user": user})),
        Err(_) => Json(json!({"isAuthenticated": false, "user": null})),
    }
}

async fn logout(State(backend): State<MockBackend>) -> Response {
    backend.record("logout");
    (StatusCode::FOUND, [(header::LOCATION, "http://localhost:3000/")]).into_response()
}

async fn create_order(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(new_order): Json<NewOrder>,
) -> Response {
    backend.record("create_order");
    let user = match backend.user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    tokio::time::sleep(backend.mutation_delay()).await;

    let mut data = backend.lock();
    data.next_order += 1;
    let order = Order {
        id: OrderId::new(format!("ord-{}", data.next_order)),
        customer_info: new_order.customer_info,
        items: new_order.items,
        address: new_order.address,
        subtotal: new_order.subtotal,
        shipping: new_order.shipping,
        tax: new_order.tax,
        total: new_order.total,
        status: OrderStatus::Paid,
        assigned_rider_id: None,
        created_at: Utc::now(),
    };
    data.orders.push((user.id.to_string(), order.clone()));
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn all_orders(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    backend.record("all_orders");
    match backend.user(&headers) {
        Ok(user) if user.role == Role::Admin => Json(backend.orders()).into_response(),
        Ok(_) => forbidden(),
        Err(response) => response,
    }
}

async fn my_orders(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    backend.record("my_orders");
    let user = match backend.user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let orders: Vec<Order> = backend
        .lock()
        .orders
        .iter()
        .filter(|(owner, _)| owner == user.id.as_str())
        .map(|(_, o)| o.clone())
        .collect();
    Json(orders).into_response()
}

async fn rider_orders(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    backend.record("rider_orders");
    let user = match backend.user(&headers) {
        Ok(user) if user.role == Role::Rider => user,
        Ok(_) => return forbidden(),
        Err(response) => return response,
    };
    let rider = RiderId::from_user(&user.id);
    let orders: Vec<Order> = backend
        .orders()
        .into_iter()
        .filter(|o| o.assigned_rider_id.as_ref() == Some(&rider))
        .collect();
    Json(orders).into_response()
}

async fn ship(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    backend.record("ship");
    match backend.user(&headers) {
        Ok(user) if user.role == Role::Admin => {}
        Ok(_) => return forbidden(),
        Err(response) => return response,
    }
    tokio::time::sleep(backend.mutation_delay()).await;

    let Some(rider) = body["riderId"].as_str().map(RiderId::new) else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Rider is required"})))
            .into_response();
    };
    let mut data = backend.lock();
    let Some((_, order)) = data.orders.iter_mut().find(|(_, o)| o.id.as_str() == id) else {
        return not_found();
    };
    order.status = OrderStatus::Shipped;
    order.assigned_rider_id = Some(rider);
    Json(order.clone()).into_response()
}

async fn deliver(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    backend.record("deliver");
    let user = match backend.user(&headers) {
        Ok(user) if user.role == Role::Rider => user,
        Ok(_) => return forbidden(),
        Err(response) => return response,
    };
    tokio::time::sleep(backend.mutation_delay()).await;

    let status = match serde_json::from_value::<OrderStatus>(body["status"].clone()) {
        Ok(status @ (OrderStatus::Delivered | OrderStatus::Undelivered)) => status,
        _ => {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "Invalid status"})))
                .into_response();
        }
    };
    let rider = RiderId::from_user(&user.id);
    let mut data = backend.lock();
    let Some((_, order)) = data.orders.iter_mut().find(|(_, o)| o.id.as_str() == id) else {
        return not_found();
    };
    if order.assigned_rider_id.as_ref() != Some(&rider) {
        return forbidden();
    }
    order.status = status;
    Json(order.clone()).into_response()
}

async fn riders(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    backend.record("riders");
    match backend.user(&headers) {
        Ok(user) if user.role == Role::Admin => Json(backend.lock().riders.clone()).into_response(),
        Ok(_) => forbidden(),
        Err(response) => response,
    }
}

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Mock backend failed");
    });
    format!("http://{addr}")
}

/// A running shell wired to a mock backend.
pub struct TestContext {
    pub backend: MockBackend,
    pub shell_url: String,
}

impl TestContext {
    /// Start a mock backend and a shell in front of it.
    pub async fn start() -> Self {
        Self::start_with_backend_timeout(5).await
    }

    /// Like [`TestContext::start`], with the shell giving up on backend
    /// calls after `secs` seconds.
    pub async fn start_with_backend_timeout(secs: u64) -> Self {
        let backend = MockBackend::new();
        let backend_url = spawn(backend.router()).await;

        let vars: HashMap<&str, String> = HashMap::from([
            ("GAMEKART_BASE_URL", "http://127.0.0.1".to_string()),
            ("GAMEKART_BACKEND_URL", backend_url),
            ("GAMEKART_BACKEND_TIMEOUT_SECS", secs.to_string()),
        ]);
        let config = WebConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config");
        let catalog = Catalog::from_json(include_str!("../../web/catalog.json")).expect("catalog");
        let state = AppState::new(config, catalog).expect("app state");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind shell");
        let shell_url = format!("http://{}", listener.local_addr().expect("listener address"));
        tokio::spawn(async move {
            gamekart_web::serve(listener, state, std::future::pending())
                .await
                .expect("Shell failed");
        });

        Self { backend, shell_url }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.shell_url)
    }

    /// A browser holding the backend session `token`, or no session.
    ///
    /// Redirects are not followed so tests can assert on them.
    #[must_use]
    pub fn browser(&self, token: Option<&str>) -> Client {
        let jar = Jar::default();
        if let Some(token) = token {
            let url = Url::parse(&self.shell_url).expect("shell url");
            jar.add_cookie_str(&format!("{BACKEND_COOKIE}={token}; Path=/"), &url);
        }
        Client::builder()
            .cookie_provider(Arc::new(jar))
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }
}

/// A paid order placed by customer `c-1`, optionally already assigned.
#[must_use]
pub fn paid_order(id: &str) -> Order {
    serde_json::from_value(json!({
        "_id": id,
        "customerInfo": {"name": "Meera", "email": "c-1@gamekart.in", "phone": "9811111111"},
        "items": [{
            "productId": "nintendo-switch",
            "name": "Nintendo Switch OLED",
            "color": "Neon",
            "size": "OLED Model",
            "price": 34999.0,
            "quantity": 1
        }],
        "address": {
            "street": "7 Residency Road",
            "city": "Bengaluru",
            "state": "KA",
            "zip": "560025",
            "phone": "9811111111"
        },
        "subtotal": 34999.0,
        "shipping": 0.0,
        "tax": 0.0,
        "total": 34999.0,
        "status": "Paid",
        "createdAt": "2026-03-01T10:00:00Z"
    }))
    .expect("valid order document")
}

/// Like [`paid_order`] but shipped with `rider`.
#[must_use]
pub fn shipped_order(id: &str, rider: &str) -> Order {
    let mut order = paid_order(id);
    order.status = OrderStatus::Shipped;
    order.assigned_rider_id = Some(RiderId::new(rider));
    order
}
