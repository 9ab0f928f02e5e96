//! Cart route handlers.
//!
//! The cart lives in the shell session; every mutation answers with the
//! updated cart view. Checkout sends the cart to the backend and takes the
//! ordered lines out only once the order exists.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use gamekart_core::{Address, CartKey, ProductId};

use super::views::{CartView, OrderView};
use crate::error::Result;
use crate::middleware::{RequireIdentity, load_cart, reload_cart, save_cart};
use crate::state::AppState;

/// Add to cart request.
///
/// Colour and size default to the product's first listed variant.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<u32>,
}

/// Identifies one cart line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineForm {
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
}

impl LineForm {
    fn key(self) -> CartKey {
        CartKey::new(self.product_id, self.color, self.size)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    #[serde(flatten)]
    pub line: LineForm,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub address: Address,
}

#[derive(Debug, Serialize)]
pub struct OrderPlacedView {
    pub view: &'static str,
    pub order: OrderView,
}

pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::new(&cart, state.orders().pricing())))
}

#[instrument(skip_all, fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<AddToCartForm>,
) -> Result<Json<CartView>> {
    let item = state.catalog().line_item(
        &form.product_id,
        form.color.as_deref(),
        form.size.as_deref(),
        form.quantity.unwrap_or(1),
    )?;

    let mut cart = load_cart(&session).await?;
    cart.add(item)?;
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::new(&cart, state.orders().pricing())))
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<UpdateCartForm>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.update_quantity(&form.line.key(), form.quantity)?;
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::new(&cart, state.orders().pricing())))
}

pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LineForm>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.remove(&form.key())?;
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::new(&cart, state.orders().pricing())))
}

pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::new(&cart, state.orders().pricing())))
}

pub async fn checkout(
    State(state): State<AppState>,
    RequireIdentity(current): RequireIdentity,
    session: Session,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<OrderPlacedView>)> {
    let ordered = load_cart(&session).await?;
    let order = state
        .orders()
        .checkout(&current.backend, &current.identity, &ordered, form.address)
        .await?;

    // The cart may have changed while the backend was placing the order.
    let mut cart = reload_cart(&session).await?;
    cart.remove_ordered(ordered.items());
    save_cart(&session, &cart).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderPlacedView {
            view: "order_placed",
            order: OrderView::new(order, Vec::new(), state.orders().pricing()),
        }),
    ))
}
