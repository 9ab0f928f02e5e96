//! The pre-checkout cart.
//!
//! Owned entirely by the client until checkout. Lines are keyed by
//! product *and* variant, so two colours of the same controller are two lines.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::LineItem;
use crate::types::ProductId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("{0} is not in the cart")]
    NotInCart(CartKey),
}

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartKey {
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
}

impl CartKey {
    #[must_use]
    pub fn new(product_id: ProductId, color: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            product_id,
            color: color.into(),
            size: size.into(),
        }
    }

    #[must_use]
    pub fn of(item: &LineItem) -> Self {
        Self::new(item.product_id.clone(), &item.color, &item.size)
    }

    fn matches(&self, item: &LineItem) -> bool {
        self.product_id == item.product_id && self.color == item.color && self.size == item.size
    }
}

impl std::fmt::Display for CartKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.product_id, self.color, self.size)
    }
}

/// Ordered cart lines, at most one per [`CartKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add a line, or raise the quantity of the line with the same key.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity.
    pub fn add(&mut self, item: LineItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let key = CartKey::of(&item);
        match self.items.iter_mut().find(|line| key.matches(line)) {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => self.items.push(item),
        }
        Ok(())
    }

    /// Drop a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if no line has this key.
    pub fn remove(&mut self, key: &CartKey) -> Result<LineItem, CartError> {
        let index = self.position(key)?;
        Ok(self.items.remove(index))
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Zero is rejected rather than treated as removal; unknown keys are
    /// reported as [`CartError::NotInCart`].
    pub fn update_quantity(&mut self, key: &CartKey, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let index = self.position(key)?;
        self.items[index].quantity = quantity;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Take the units of `ordered` out of the cart.
    ///
    /// Lines added since the order was built stay, as do extra units of an
    /// ordered line. Lines that run out are dropped.
    pub fn remove_ordered(&mut self, ordered: &[LineItem]) {
        for item in ordered {
            let key = CartKey::of(item);
            if let Some(line) = self.items.iter_mut().find(|line| key.matches(line)) {
                line.quantity = line.quantity.saturating_sub(item.quantity);
            }
        }
        self.items.retain(|line| line.quantity > 0);
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, item| count.saturating_add(item.quantity))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, key: &CartKey) -> Result<usize, CartError> {
        self.items
            .iter()
            .position(|line| key.matches(line))
            .ok_or_else(|| CartError::NotInCart(key.clone()))
    }
}
