//! Order status enums.

use serde::{Deserialize, Serialize};

/// Order status as stored by the backend.
///
/// `Pending -> Paid -> Shipped -> {Delivered, Undelivered}`. See
/// [`crate::lifecycle`] for who may move an order between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Undelivered,
}

impl OrderStatus {
    /// Whether no further transition is offered from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Pending | Self::Delivered | Self::Undelivered)
    }

    /// Whether an order in this status must carry an assigned rider.
    #[must_use]
    pub const fn has_rider(self) -> bool {
        matches!(self, Self::Shipped | Self::Delivered | Self::Undelivered)
    }

    /// Whether the order has been paid for (and so must have line items).
    #[must_use]
    pub const fn is_paid(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl OrderStatus {
    /// Wire name, as the backend spells it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Undelivered => "Undelivered",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two ways a rider can close out a shipped order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    Delivered,
    Undelivered,
}

impl From<DeliveryOutcome> for OrderStatus {
    fn from(outcome: DeliveryOutcome) -> Self {
        match outcome {
            DeliveryOutcome::Delivered => Self::Delivered,
            DeliveryOutcome::Undelivered => Self::Undelivered,
        }
    }
}

impl TryFrom<OrderStatus> for DeliveryOutcome {
    type Error = OrderStatus;

    fn try_from(status: OrderStatus) -> Result<Self, Self::Error> {
        match status {
            OrderStatus::Delivered => Ok(Self::Delivered),
            OrderStatus::Undelivered => Ok(Self::Undelivered),
            other => Err(other),
        }
    }
}
