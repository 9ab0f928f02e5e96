//! Types the shell keeps in its own session store.

pub mod session;

pub use session::keys as session_keys;
