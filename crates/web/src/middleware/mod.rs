//! HTTP middleware stack for the web shell.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span carrying `request_id` and `user_id`)
//! 3. Request ID (validate or generate, record on span and Sentry scope)
//! 4. Session layer (tower-sessions memory store holding the cart)
//! 5. Access guard (resolve identity, redirect or admit)

pub mod guard;
pub mod request_id;
pub mod session;

pub use guard::{CurrentIdentity, RequireIdentity, access_guard, backend_session_from_headers};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use session::{create_session_layer, load_cart, reload_cart, save_cart};
