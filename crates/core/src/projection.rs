//! Role-scoped order lists and which of them a mutation touches.
//!
//! Each role sees the order collection through its own projection, cached and
//! invalidated independently. A mutation only affects the projections listed
//! in [`Mutation::cache_effects`]; others refresh on their next load.

use serde::{Deserialize, Serialize};

use crate::types::Role;

/// A role-scoped view of the order collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// Every order (admin dashboard).
    AllOrders,
    /// The signed-in customer's orders.
    MyOrders,
    /// Orders assigned to the signed-in rider.
    AssignedOrders,
}

impl Projection {
    pub const ALL: [Self; 3] = [Self::AllOrders, Self::MyOrders, Self::AssignedOrders];

    /// The projection a role's dashboard lists.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self::AllOrders,
            Role::Rider => Self::AssignedOrders,
            Role::Customer => Self::MyOrders,
        }
    }

    /// The only role allowed to read this projection.
    #[must_use]
    pub const fn viewer_role(self) -> Role {
        match self {
            Self::AllOrders => Role::Admin,
            Self::MyOrders => Role::Customer,
            Self::AssignedOrders => Role::Rider,
        }
    }

    /// Backend path serving this projection.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::AllOrders => "/api/orders",
            Self::MyOrders => "/api/orders/my",
            Self::AssignedOrders => "/api/orders/rider/orders",
        }
    }

    /// Whether the list is the same for every viewer.
    #[must_use]
    pub const fn is_shared(self) -> bool {
        matches!(self, Self::AllOrders)
    }
}

impl std::fmt::Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AllOrders => "all_orders",
            Self::MyOrders => "my_orders",
            Self::AssignedOrders => "assigned_orders",
        };
        f.write_str(s)
    }
}

/// A successful backend write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
    /// A customer placed an order.
    Checkout,
    /// An admin shipped an order.
    Ship,
    /// A rider closed out an order.
    Deliver,
}

/// What to do to a cached projection after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEffect {
    /// Drop the projection; the next load refetches it.
    Invalidate(Projection),
    /// Swap the affected order for the server echo, by id.
    ReplaceEntry(Projection),
}

impl CacheEffect {
    #[must_use]
    pub const fn projection(self) -> Projection {
        match self {
            Self::Invalidate(projection) | Self::ReplaceEntry(projection) => projection,
        }
    }
}

impl Mutation {
    /// Projections affected by this mutation.
    ///
    /// A ship does not touch the rider's assigned list; the rider sees the
    /// new order the next time that list is loaded.
    #[must_use]
    pub const fn cache_effects(self) -> &'static [CacheEffect] {
        match self {
            Self::Checkout => &[CacheEffect::Invalidate(Projection::MyOrders)],
            Self::Ship => &[CacheEffect::Invalidate(Projection::AllOrders)],
            Self::Deliver => &[CacheEffect::ReplaceEntry(Projection::AssignedOrders)],
        }
    }
}
