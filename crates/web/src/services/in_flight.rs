//! Double-submission guard.
//!
//! The backend has no idempotency keys, so the shell refuses to start a
//! mutation while the same mutation on the same subject is still running.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use gamekart_core::Mutation;

use crate::error::AppError;

type Key = (String, Mutation);

/// Registry of running mutations.
#[derive(Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<Key>>>,
}

/// Held for the duration of a mutation; releases its slot on drop.
#[derive(Debug)]
pub struct InFlightTicket {
    active: Arc<Mutex<HashSet<Key>>>,
    key: Key,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `(subject, mutation)`.
    ///
    /// The subject is the order id for transitions and the customer id for
    /// checkout.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the pair is already claimed.
    pub fn try_begin(&self, subject: &str, mutation: Mutation) -> Result<InFlightTicket, AppError> {
        let key = (subject.to_string(), mutation);
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(key.clone()) {
            return Err(AppError::Conflict(format!(
                "{} for {subject} is already in progress",
                describe(mutation)
            )));
        }
        Ok(InFlightTicket {
            active: Arc::clone(&self.active),
            key,
        })
    }
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

const fn describe(mutation: Mutation) -> &'static str {
    match mutation {
        Mutation::Checkout => "Checkout",
        Mutation::Ship => "Shipping",
        Mutation::Deliver => "Delivery update",
    }
}
