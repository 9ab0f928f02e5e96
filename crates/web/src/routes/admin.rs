//! Admin dashboard: every order, the rider roster and the ship action.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use gamekart_core::{
    Order, OrderId, OrderStatus, Projection, Rider, RiderId, Role, available_transitions,
};

use super::views::OrderView;
use crate::error::Result;
use crate::middleware::RequireIdentity;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub total: usize,
    pub paid: usize,
    pub shipped: usize,
    pub riders: usize,
}

impl AdminStats {
    fn new(orders: &[Order], riders: &[Rider]) -> Self {
        let count = |status| orders.iter().filter(|o| o.status == status).count();
        Self {
            total: orders.len(),
            paid: count(OrderStatus::Paid),
            shipped: count(OrderStatus::Shipped),
            riders: riders.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminView {
    pub view: &'static str,
    pub stats: AdminStats,
    pub orders: Vec<OrderView>,
    pub riders: Vec<Rider>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipForm {
    pub rider_id: Option<RiderId>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    RequireIdentity(current): RequireIdentity,
) -> Result<Json<AdminView>> {
    let service = state.orders();
    let orders = service
        .load(&current.backend, &current.identity, Projection::AllOrders)
        .await?;
    let riders = service.riders(&current.backend).await?;

    let views = orders
        .iter()
        .map(|order| {
            let actions = available_transitions(order, Role::Admin, None);
            OrderView::new(order.clone(), actions, service.pricing())
        })
        .collect();

    Ok(Json(AdminView {
        view: "admin",
        stats: AdminStats::new(&orders, &riders),
        orders: views,
        riders,
    }))
}

pub async fn ship(
    State(state): State<AppState>,
    RequireIdentity(current): RequireIdentity,
    Path(id): Path<OrderId>,
    Json(form): Json<ShipForm>,
) -> Result<Json<OrderView>> {
    let service = state.orders();
    let order = service
        .ship(&current.backend, &current.identity, &id, form.rider_id)
        .await?;
    let actions = available_transitions(&order, Role::Admin, None);
    Ok(Json(OrderView::new(order, actions, service.pricing())))
}
