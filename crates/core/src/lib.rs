//! GameKart Core - order lifecycle and access control.
//!
//! This crate holds everything the GameKart web shell decides without touching
//! the network:
//! - who may see which part of the site (`access`)
//! - which order status changes are legal and who may make them (`lifecycle`)
//! - what a cart contains and what it costs (`cart`, `pricing`)
//! - which cached order lists a mutation affects (`projection`)
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. The REST backend stays the source of truth; this crate
//! only validates requests before they are sent.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, prices, roles and statuses
//! - [`identity`] - The authenticated principal and session resolution state
//! - [`access`] - Route guard decisions
//! - [`order`] - Orders, line items, addresses, riders
//! - [`cart`] - Client-local cart keyed by product variant
//! - [`pricing`] - Checkout-time totals estimate
//! - [`lifecycle`] - Order status transitions
//! - [`projection`] - Role-scoped order lists and their invalidation rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod cart;
pub mod identity;
pub mod lifecycle;
pub mod order;
pub mod pricing;
pub mod projection;
pub mod types;

pub use access::{Decision, RoutePolicy, authorize, guard, resolve_default_route};
pub use cart::{Cart, CartError, CartKey};
pub use identity::{Identity, SessionState};
pub use lifecycle::{
    TRANSITIONS, Transition, TransitionCommand, TransitionContext, TransitionError,
    available_transitions, request_transition,
};
pub use order::{
    Address, AddressError, CustomerInfo, LineItem, NewOrder, Order, OrderInvariantError, Rider,
};
pub use pricing::{OrderTotals, PricingConfig, PricingError};
pub use projection::{CacheEffect, Mutation, Projection};
pub use types::*;
