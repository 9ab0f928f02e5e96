//! Integration tests for shipping and delivering orders.

use std::time::Duration;

use gamekart_core::OrderStatus;
use gamekart_integration_tests::{
    ADMIN_TOKEN, CUSTOMER_TOKEN, OTHER_RIDER_TOKEN, RIDER_TOKEN, TestContext, paid_order,
    shipped_order,
};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

async fn view(browser: &Client, ctx: &TestContext, path: &str) -> Value {
    let response = browser.get(ctx.url(path)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "{path}");
    response.json().await.unwrap()
}

async fn ship(browser: &Client, ctx: &TestContext, id: &str, body: Value) -> reqwest::Response {
    browser
        .post(ctx.url(&format!("/admin/orders/{id}/ship")))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn deliver(browser: &Client, ctx: &TestContext, id: &str, status: &str) -> reqwest::Response {
    browser
        .post(ctx.url(&format!("/rider/orders/{id}/deliver")))
        .json(&json!({ "status": status }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_paid_order_is_shipped_then_delivered() {
    let ctx = TestContext::start().await;
    ctx.backend.seed("c-1", paid_order("ord-1"));
    let admin = ctx.browser(Some(ADMIN_TOKEN));
    let rider = ctx.browser(Some(RIDER_TOKEN));

    let dashboard = view(&admin, &ctx, "/admin").await;
    assert_eq!(dashboard["stats"]["total"], 1);
    assert_eq!(dashboard["stats"]["paid"], 1);
    assert_eq!(dashboard["stats"]["riders"], 2);
    assert_eq!(dashboard["orders"][0]["actions"], json!(["Shipped"]));

    let response = ship(&admin, &ctx, "ord-1", json!({"riderId": "r-1"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let shipped: Value = response.json().await.unwrap();
    assert_eq!(shipped["status"], "Shipped");
    assert_eq!(shipped["assignedRiderId"], "r-1");
    assert_eq!(shipped["actions"], json!([]));

    let dashboard = view(&admin, &ctx, "/admin").await;
    assert_eq!(dashboard["stats"]["paid"], 0);
    assert_eq!(dashboard["stats"]["shipped"], 1);

    let rider_view = view(&rider, &ctx, "/rider").await;
    assert_eq!(rider_view["stats"]["pending"], 1);
    assert_eq!(rider_view["orders"][0]["actions"], json!(["Delivered", "Undelivered"]));

    let response = deliver(&rider, &ctx, "ord-1", "Delivered").await;
    assert_eq!(response.status(), StatusCode::OK);

    let rider_view = view(&rider, &ctx, "/rider").await;
    assert_eq!(rider_view["stats"]["pending"], 0);
    assert_eq!(rider_view["stats"]["completed"], 1);
    assert_eq!(rider_view["orders"][0]["status"], "Delivered");
    assert_eq!(rider_view["orders"][0]["actions"], json!([]));

    assert_eq!(ctx.backend.order("ord-1").unwrap().status, OrderStatus::Delivered);
}

#[tokio::test]
async fn test_ship_needs_a_known_rider() {
    let ctx = TestContext::start().await;
    ctx.backend.seed("c-1", paid_order("ord-1"));
    let admin = ctx.browser(Some(ADMIN_TOKEN));

    for body in [json!({}), json!({"riderId": ""}), json!({"riderId": "r-99"})] {
        let response = ship(&admin, &ctx, "ord-1", body.clone()).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        let error: Value = response.json().await.unwrap();
        assert_eq!(error["kind"], "transition_invalid");
    }

    assert_eq!(ctx.backend.calls("ship"), 0);
    assert_eq!(ctx.backend.order("ord-1").unwrap().status, OrderStatus::Paid);
}

#[tokio::test]
async fn test_rejected_transition_leaves_the_view_unchanged() {
    let ctx = TestContext::start().await;
    ctx.backend.seed("c-1", shipped_order("ord-1", "r-1"));
    ctx.backend.seed("c-1", shipped_order("ord-2", "r-1"));
    let rider = ctx.browser(Some(RIDER_TOKEN));

    let response = deliver(&rider, &ctx, "ord-1", "Undelivered").await;
    assert_eq!(response.status(), StatusCode::OK);
    let before = view(&rider, &ctx, "/rider").await;

    let response = deliver(&rider, &ctx, "ord-1", "Delivered").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let response = deliver(&rider, &ctx, "ord-2", "Paid").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let after = view(&rider, &ctx, "/rider").await;
    assert_eq!(before, after);
    assert_eq!(ctx.backend.calls("deliver"), 1);
}

#[tokio::test]
async fn test_rider_only_sees_and_updates_own_orders() {
    let ctx = TestContext::start().await;
    ctx.backend.seed("c-1", shipped_order("ord-1", "r-1"));
    let other = ctx.browser(Some(OTHER_RIDER_TOKEN));

    let view = view(&other, &ctx, "/rider").await;
    assert!(view["orders"].as_array().unwrap().is_empty());

    let response = deliver(&other, &ctx, "ord-1", "Delivered").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.backend.calls("deliver"), 0);
}

#[tokio::test]
async fn test_double_submit_sends_one_command() {
    let ctx = TestContext::start().await;
    ctx.backend.seed("c-1", paid_order("ord-1"));
    ctx.backend.set_mutation_delay(Duration::from_millis(300));
    let admin = ctx.browser(Some(ADMIN_TOKEN));

    // Warm the caches so both requests reach the backend call quickly.
    view(&admin, &ctx, "/admin").await;

    let body = json!({"riderId": "r-2"});
    let (first, second) = tokio::join!(
        ship(&admin, &ctx, "ord-1", body.clone()),
        ship(&admin, &ctx, "ord-1", body.clone()),
    );
    let mut statuses = [first.status(), second.status()];
    statuses.sort_by_key(StatusCode::as_u16);
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(ctx.backend.calls("ship"), 1);

    // Once the first has finished the order is Shipped and a retry is illegal.
    let response = ship(&admin, &ctx, "ord-1", body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_views_refetch_after_another_role_changes_an_order() {
    let ctx = TestContext::start().await;
    ctx.backend.seed("c-1", paid_order("ord-1"));
    let admin = ctx.browser(Some(ADMIN_TOKEN));
    let rider = ctx.browser(Some(RIDER_TOKEN));
    let customer = ctx.browser(Some(CUSTOMER_TOKEN));

    let rider_view = view(&rider, &ctx, "/rider").await;
    assert!(rider_view["orders"].as_array().unwrap().is_empty());
    let history = view(&customer, &ctx, "/home/my-orders").await;
    assert_eq!(history["orders"][0]["status"], "Paid");

    let response = ship(&admin, &ctx, "ord-1", json!({"riderId": "r-1"})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let rider_view = view(&rider, &ctx, "/rider").await;
    assert_eq!(rider_view["orders"][0]["_id"], "ord-1");
    assert_eq!(rider_view["orders"][0]["status"], "Shipped");
    let history = view(&customer, &ctx, "/home/my-orders").await;
    assert_eq!(history["orders"][0]["status"], "Shipped");

    let response = deliver(&rider, &ctx, "ord-1", "Delivered").await;
    assert_eq!(response.status(), StatusCode::OK);

    let dashboard = view(&admin, &ctx, "/admin").await;
    assert_eq!(dashboard["orders"][0]["status"], "Delivered");
    let history = view(&customer, &ctx, "/home/my-orders").await;
    assert_eq!(history["orders"][0]["status"], "Delivered");
}

#[tokio::test]
async fn test_stale_assignment_is_refetched_before_delivering() {
    let ctx = TestContext::start().await;
    ctx.backend.seed("c-1", paid_order("ord-1"));
    let admin = ctx.browser(Some(ADMIN_TOKEN));
    let rider = ctx.browser(Some(RIDER_TOKEN));

    // The rider's cached list predates the shipment.
    view(&rider, &ctx, "/rider").await;
    let response = ship(&admin, &ctx, "ord-1", json!({"riderId": "r-1"})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = deliver(&rider, &ctx, "ord-1", "Delivered").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ctx.backend.order("ord-1").unwrap().status, OrderStatus::Delivered);
}

#[tokio::test]
async fn test_backend_timeout_is_retryable_and_changes_nothing() {
    let ctx = TestContext::start_with_backend_timeout(1).await;
    ctx.backend.seed("c-1", shipped_order("ord-1", "r-1"));
    let rider = ctx.browser(Some(RIDER_TOKEN));
    let before = view(&rider, &ctx, "/rider").await;

    ctx.backend.set_mutation_delay(Duration::from_millis(1500));
    let response = deliver(&rider, &ctx, "ord-1", "Delivered").await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["kind"], "timeout");
    assert_eq!(error["retryable"], true);

    // The mock finishes the late call; put the order back to compare views.
    tokio::time::sleep(Duration::from_millis(700)).await;
    ctx.backend.set_status("ord-1", OrderStatus::Shipped);
    let after = view(&rider, &ctx, "/rider").await;
    assert_eq!(before, after);

    ctx.backend.set_mutation_delay(Duration::ZERO);
    let response = deliver(&rider, &ctx, "ord-1", "Delivered").await;
    assert_eq!(response.status(), StatusCode::OK);
}
