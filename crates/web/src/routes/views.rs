//! JSON view models shared by the handlers.

use serde::Serialize;

use gamekart_core::{
    Cart, CurrencyCode, LineItem, Order, OrderStatus, OrderTotals, Price, PricingConfig, ProductId,
};

/// Format an amount in the configured currency.
pub fn money(amount: rust_decimal::Decimal, pricing: &PricingConfig) -> String {
    Price::new(amount, pricing.currency).display(pricing.precision)
}

/// An order as listed on a dashboard, with the actions the viewer may take.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub total_display: String,
    pub item_count: u32,
    pub actions: Vec<OrderStatus>,
}

impl OrderView {
    pub fn new(order: Order, actions: Vec<OrderStatus>, pricing: &PricingConfig) -> Self {
        Self {
            total_display: money(order.total, pricing),
            item_count: order.unit_count(),
            order,
            actions,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub color: String,
    pub size: String,
    pub quantity: u32,
    pub image: Option<String>,
    pub price: String,
    pub line_price: String,
}

impl CartLineView {
    fn new(item: &LineItem, pricing: &PricingConfig) -> Self {
        Self {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            color: item.color.clone(),
            size: item.size.clone(),
            quantity: item.quantity,
            image: item.image.clone(),
            price: money(item.unit_price, pricing),
            line_price: money(item.line_total(), pricing),
        }
    }
}

/// The cart with estimated totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub view: &'static str,
    pub items: Vec<CartLineView>,
    pub item_count: u32,
    pub currency: CurrencyCode,
    pub totals: OrderTotals,
    pub subtotal_display: String,
    pub shipping_display: String,
    pub tax_display: String,
    pub total_display: String,
}

impl CartView {
    pub fn new(cart: &Cart, pricing: &PricingConfig) -> Self {
        let totals = OrderTotals::compute(cart.items(), pricing).rounded(pricing.precision);
        Self {
            view: "cart",
            items: cart
                .items()
                .iter()
                .map(|item| CartLineView::new(item, pricing))
                .collect(),
            item_count: cart.item_count(),
            currency: pricing.currency,
            subtotal_display: money(totals.subtotal, pricing),
            shipping_display: money(totals.shipping, pricing),
            tax_display: money(totals.tax, pricing),
            total_display: money(totals.total, pricing),
            totals,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;

    fn line(product: &str, color: &str, price: &str, quantity: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new(product),
            name: product.to_string(),
            color: color.to_string(),
            size: "Standard".to_string(),
            unit_price: Decimal::from_str(price).unwrap(),
            quantity,
            image: None,
        }
    }

    #[test]
    fn test_cart_view_totals() {
        let mut cart = Cart::new();
        cart.add(line("gaming-headset", "Black", "199.99", 2)).unwrap();
        cart.add(line("gaming-headset", "Red", "399.99", 1)).unwrap();

        let view = CartView::new(&cart, &PricingConfig::default());
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal_display, "₹799.97");
        assert_eq!(view.shipping_display, "₹99.00");
        assert_eq!(view.tax_display, "₹143.99");
        assert_eq!(view.total_display, "₹1042.96");
        assert_eq!(view.items[0].line_price, "₹399.98");
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::new(&Cart::new(), &PricingConfig::default());
        assert!(view.items.is_empty());
        assert_eq!(view.total_display, "₹0.00");
    }
}
