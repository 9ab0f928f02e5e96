//! Order status transitions.
//!
//! The legal moves are data ([`TRANSITIONS`]); [`request_transition`] checks a
//! requested move against the table, the actor's role and the move's
//! preconditions, and returns the order as it would look afterwards. That
//! candidate is only used to decide which backend call to make: the cached
//! order is replaced by the backend's echo, never by the candidate.

use thiserror::Error;

use crate::order::{Order, Rider};
use crate::projection::Mutation;
use crate::types::{DeliveryOutcome, OrderId, OrderStatus, RiderId, Role};

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub actor: Role,
}

/// Every transition the client may request.
pub const TRANSITIONS: [Transition; 3] = [
    Transition {
        from: OrderStatus::Paid,
        to: OrderStatus::Shipped,
        actor: Role::Admin,
    },
    Transition {
        from: OrderStatus::Shipped,
        to: OrderStatus::Delivered,
        actor: Role::Rider,
    },
    Transition {
        from: OrderStatus::Shipped,
        to: OrderStatus::Undelivered,
        actor: Role::Rider,
    },
];

fn lookup(from: OrderStatus, to: OrderStatus) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| t.from == from && t.to == to)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("an order cannot move from {from} to {to}")]
    Invalid { from: OrderStatus, to: OrderStatus },
    #[error("a {actor} cannot move an order from {from} to {to}")]
    Forbidden {
        actor: Role,
        from: OrderStatus,
        to: OrderStatus,
    },
    #[error("select a rider before shipping")]
    MissingRider,
    #[error("rider {0} is not known")]
    UnknownRider(RiderId),
    #[error("order {0} is not assigned to this rider")]
    NotAssigned(OrderId),
}

/// Inputs a transition's preconditions need beyond the order itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionContext<'a> {
    /// Rider selected for a ship.
    pub rider_id: Option<&'a RiderId>,
    /// Riders a ship may assign to.
    pub known_riders: &'a [Rider],
    /// The rider performing a delivery.
    pub actor_id: Option<&'a RiderId>,
}

impl<'a> TransitionContext<'a> {
    #[must_use]
    pub const fn ship(rider_id: &'a RiderId, known_riders: &'a [Rider]) -> Self {
        Self {
            rider_id: Some(rider_id),
            known_riders,
            actor_id: None,
        }
    }

    #[must_use]
    pub const fn deliver(actor_id: &'a RiderId) -> Self {
        Self {
            rider_id: None,
            known_riders: &[],
            actor_id: Some(actor_id),
        }
    }
}

/// Validate moving `order` to `target` on behalf of `actor`.
///
/// Checks run in order: table entry, actor role, preconditions.
///
/// # Errors
///
/// - [`TransitionError::Invalid`] if `(order.status, target)` is not a table entry
/// - [`TransitionError::Forbidden`] if the entry belongs to another role
/// - [`TransitionError::MissingRider`] / [`TransitionError::UnknownRider`] when
///   shipping without a rider from the known set
/// - [`TransitionError::NotAssigned`] when a rider delivers an order that is
///   not assigned to them
pub fn request_transition(
    order: &Order,
    target: OrderStatus,
    actor: Role,
    ctx: &TransitionContext<'_>,
) -> Result<Order, TransitionError> {
    let from = order.status;
    let entry = lookup(from, target).ok_or(TransitionError::Invalid { from, to: target })?;
    if entry.actor != actor {
        return Err(TransitionError::Forbidden {
            actor,
            from,
            to: target,
        });
    }

    let mut candidate = order.clone();
    candidate.status = target;

    match target {
        OrderStatus::Shipped => {
            let rider_id = ctx
                .rider_id
                .filter(|id| !id.is_blank())
                .ok_or(TransitionError::MissingRider)?;
            if !ctx.known_riders.iter().any(|rider| &rider.id == rider_id) {
                return Err(TransitionError::UnknownRider(rider_id.clone()));
            }
            candidate.assigned_rider_id = Some(rider_id.clone());
        }
        OrderStatus::Delivered | OrderStatus::Undelivered => {
            let assigned = order.assigned_rider_id.as_ref();
            if assigned.is_none() || assigned != ctx.actor_id {
                return Err(TransitionError::NotAssigned(order.id.clone()));
            }
        }
        OrderStatus::Pending | OrderStatus::Paid => {}
    }

    Ok(candidate)
}

/// Targets `role` may move `order` to, for offering actions in a view.
///
/// Riders are only offered transitions on orders assigned to them.
#[must_use]
pub fn available_transitions(
    order: &Order,
    role: Role,
    actor_id: Option<&RiderId>,
) -> Vec<OrderStatus> {
    if role == Role::Rider
        && (actor_id.is_none() || order.assigned_rider_id.as_ref() != actor_id)
    {
        return Vec::new();
    }
    TRANSITIONS
        .iter()
        .filter(|t| t.from == order.status && t.actor == role)
        .map(|t| t.to)
        .collect()
}

/// The backend call a validated candidate order maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionCommand {
    /// `PATCH /api/orders/:id/ship` with `{riderId}`.
    Ship { rider_id: RiderId },
    /// `PATCH /api/orders/:id/deliver` with `{status}`.
    Deliver { outcome: DeliveryOutcome },
}

impl TransitionCommand {
    /// `None` for a candidate no backend call produces.
    #[must_use]
    pub fn for_candidate(candidate: &Order) -> Option<Self> {
        match candidate.status {
            OrderStatus::Shipped => candidate
                .assigned_rider_id
                .clone()
                .map(|rider_id| Self::Ship { rider_id }),
            status => DeliveryOutcome::try_from(status)
                .ok()
                .map(|outcome| Self::Deliver { outcome }),
        }
    }

    #[must_use]
    pub const fn mutation(&self) -> Mutation {
        match self {
            Self::Ship { .. } => Mutation::Ship,
            Self::Deliver { .. } => Mutation::Deliver,
        }
    }
}
