//! Identity roles.

use serde::{Deserialize, Serialize};

/// The closed set of roles an identity can hold.
///
/// Every route and every order transition is gated by one of these. Matching
/// on `Role` is exhaustive across the crate, so adding a role forces every
/// routing and permission decision to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Browses products, keeps a cart, places and tracks orders.
    #[default]
    Customer,
    /// Sees every order and ships paid orders to a rider.
    Admin,
    /// Delivers the orders assigned to them.
    Rider,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Self; 3] = [Self::Customer, Self::Admin, Self::Rider];

    /// Interpret the role claim on a backend user document.
    ///
    /// A missing or unrecognised claim is treated as [`Role::Customer`], the
    /// role with the least privilege.
    #[must_use]
    pub fn from_claim(claim: Option<&str>) -> Self {
        claim
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or_default()
    }

    /// Wire form of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
            Self::Rider => "rider",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            "rider" => Ok(Self::Rider),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}
