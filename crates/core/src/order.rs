//! Orders and the documents they are made of.
//!
//! All of these mirror the backend's JSON documents (camelCase, document ids
//! under `_id`, money as JSON numbers). The backend owns orders; the shell
//! only ever holds copies it received from it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Email, OrderId, OrderStatus, ProductId, RiderId};

/// One product variant and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub color: String,
    pub size: String,
    #[serde(rename = "price", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl LineItem {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Who placed the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A field of an [`Address`] that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address {0} is required")]
    MissingField(&'static str),
}

/// Delivery address. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
}

impl Address {
    /// Check that no field is blank.
    ///
    /// # Errors
    ///
    /// Returns the first blank field, in form order.
    pub fn validate(&self) -> Result<(), AddressError> {
        let fields = [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zip", &self.zip),
            ("phone", &self.phone),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(AddressError::MissingField(name)),
            None => Ok(()),
        }
    }
}

/// An order as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", alias = "id")]
    pub id: OrderId,
    pub customer_info: CustomerInfo,
    pub items: Vec<LineItem>,
    pub address: Address,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub status: OrderStatus,
    #[serde(default, alias = "assignedRider", skip_serializing_if = "Option::is_none")]
    pub assigned_rider_id: Option<RiderId>,
    pub created_at: DateTime<Utc>,
}

/// An order document that breaks one of the order invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderInvariantError {
    #[error("order {order} is {status} but has no assigned rider")]
    MissingRider { order: OrderId, status: OrderStatus },
    #[error("order {order} is {status} but already has a rider")]
    UnexpectedRider { order: OrderId, status: OrderStatus },
    #[error("order {order} is {status} with no items")]
    NoItems { order: OrderId, status: OrderStatus },
    #[error("order {order} has a negative amount")]
    NegativeAmount { order: OrderId },
    #[error("order {order} total does not equal subtotal + shipping + tax")]
    TotalMismatch { order: OrderId },
}

impl Order {
    /// Check the document against the order invariants.
    ///
    /// The backend is authoritative, so a violation is something to log, not
    /// something to correct locally.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), OrderInvariantError> {
        let order = self.id.clone();
        let status = self.status;

        match (status.has_rider(), &self.assigned_rider_id) {
            (true, None) => return Err(OrderInvariantError::MissingRider { order, status }),
            (false, Some(_)) => {
                return Err(OrderInvariantError::UnexpectedRider { order, status });
            }
            _ => {}
        }
        if status.is_paid() && self.items.is_empty() {
            return Err(OrderInvariantError::NoItems { order, status });
        }
        if [self.subtotal, self.shipping, self.tax, self.total]
            .iter()
            .any(Decimal::is_sign_negative)
        {
            return Err(OrderInvariantError::NegativeAmount { order });
        }
        if self.subtotal + self.shipping + self.tax != self.total {
            return Err(OrderInvariantError::TotalMismatch { order });
        }
        Ok(())
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// A rider that orders can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rider {
    #[serde(rename = "_id", alias = "id")]
    pub id: RiderId,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub phone: String,
}

/// Checkout payload for `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_info: CustomerInfo,
    pub items: Vec<LineItem>,
    pub address: Address,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}
