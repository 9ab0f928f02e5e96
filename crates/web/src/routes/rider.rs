//! Rider dashboard: assigned orders and the delivery outcome action.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use gamekart_core::{Order, OrderId, OrderStatus, Projection, available_transitions};

use super::views::OrderView;
use crate::error::Result;
use crate::middleware::RequireIdentity;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RiderStats {
    /// Out for delivery.
    pub pending: usize,
    pub completed: usize,
}

impl RiderStats {
    fn new(orders: &[Order]) -> Self {
        let count = |status| orders.iter().filter(|o| o.status == status).count();
        Self {
            pending: count(OrderStatus::Shipped),
            completed: count(OrderStatus::Delivered),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RiderView {
    pub view: &'static str,
    pub stats: RiderStats,
    pub orders: Vec<OrderView>,
}

#[derive(Debug, Deserialize)]
pub struct DeliverForm {
    pub status: OrderStatus,
}

pub async fn dashboard(
    State(state): State<AppState>,
    RequireIdentity(current): RequireIdentity,
) -> Result<Json<RiderView>> {
    let service = state.orders();
    let orders = service
        .load(&current.backend, &current.identity, Projection::AssignedOrders)
        .await?;
    let rider_id = current.identity.rider_id();

    let views = orders
        .iter()
        .map(|order| {
            let actions = available_transitions(order, current.identity.role, rider_id.as_ref());
            OrderView::new(order.clone(), actions, service.pricing())
        })
        .collect();

    Ok(Json(RiderView {
        view: "rider",
        stats: RiderStats::new(&orders),
        orders: views,
    }))
}

pub async fn deliver(
    State(state): State<AppState>,
    RequireIdentity(current): RequireIdentity,
    Path(id): Path<OrderId>,
    Json(form): Json<DeliverForm>,
) -> Result<Json<OrderView>> {
    let service = state.orders();
    let order = service
        .deliver(&current.backend, &current.identity, &id, form.status)
        .await?;
    let rider_id = current.identity.rider_id();
    let actions = available_transitions(&order, current.identity.role, rider_id.as_ref());
    Ok(Json(OrderView::new(order, actions, service.pricing())))
}
