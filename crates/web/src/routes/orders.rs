//! Customer order history.

use axum::{Json, extract::State};
use serde::Serialize;

use gamekart_core::Projection;

use super::views::OrderView;
use crate::error::Result;
use crate::middleware::RequireIdentity;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MyOrdersView {
    pub view: &'static str,
    pub orders: Vec<OrderView>,
}

pub async fn my_orders(
    State(state): State<AppState>,
    RequireIdentity(current): RequireIdentity,
) -> Result<Json<MyOrdersView>> {
    let orders = state
        .orders()
        .load(&current.backend, &current.identity, Projection::MyOrders)
        .await?;
    let pricing = state.orders().pricing();

    Ok(Json(MyOrdersView {
        view: "my_orders",
        orders: orders
            .iter()
            .map(|order| OrderView::new(order.clone(), Vec::new(), pricing))
            .collect(),
    }))
}
