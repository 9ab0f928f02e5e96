//! Catalog and product detail handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tower_sessions::Session;

use gamekart_core::ProductId;

use super::views::money;
use crate::catalog::Product;
use crate::error::Result;
use crate::middleware::load_cart;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub image: String,
    pub price: String,
    pub original_price: Option<String>,
    pub in_stock: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub view: &'static str,
    pub products: Vec<ProductCard>,
    pub cart_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub view: &'static str,
    pub product: Product,
    pub price: String,
    pub original_price: Option<String>,
    /// Preselected variant: the first listed colour and size.
    pub selected_color: Option<String>,
    pub selected_size: Option<String>,
}

pub async fn catalog(State(state): State<AppState>, session: Session) -> Result<Json<CatalogView>> {
    let pricing = state.orders().pricing();
    let cart = load_cart(&session).await?;

    let products = state
        .catalog()
        .products()
        .iter()
        .map(|product| ProductCard {
            id: product.id.clone(),
            name: product.name.clone(),
            image: product.image.clone(),
            price: money(product.price, pricing),
            original_price: product.original_price.map(|price| money(price, pricing)),
            in_stock: product.in_stock,
        })
        .collect();

    Ok(Json(CatalogView {
        view: "catalog",
        products,
        cart_count: cart.item_count(),
    }))
}

pub async fn product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let pricing = state.orders().pricing();
    let product = state.catalog().get(&id)?.clone();

    Ok(Json(ProductView {
        view: "product",
        price: money(product.price, pricing),
        original_price: product.original_price.map(|price| money(price, pricing)),
        selected_color: product.variants.colors.first().cloned(),
        selected_size: product.variants.sizes.first().cloned(),
        product,
    }))
}
