//! Services between the routes and the backend.
//!
//! # Services
//!
//! - `session` - Resolve the forwarded backend cookie to a
//!   [`SessionState`](gamekart_core::SessionState)
//! - `projections` - Cached role-scoped order lists with invalidation
//! - `in_flight` - Guard against submitting the same transition twice
//! - `orders` - Checkout and order transitions

pub mod in_flight;
pub mod orders;
pub mod projections;
pub mod session;

pub use in_flight::{InFlight, InFlightTicket};
pub use orders::OrderService;
pub use projections::{ProjectionCache, ProjectionKey};
pub use session::SessionService;
