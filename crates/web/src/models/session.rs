//! Session-related types.

/// Session keys for shell-local state.
pub mod keys {
    /// Key for the customer's cart.
    pub const CART: &str = "cart";
}
