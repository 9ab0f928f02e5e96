//! Order projections and lifecycle mutations.
//!
//! Every mutation runs the same steps: claim an in-flight ticket, validate
//! the change locally with [`request_transition`], send the backend command,
//! then apply the mutation's cache effects using the order the backend
//! returned. Nothing touches the caches until the backend has answered with
//! success.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use gamekart_core::{
    Address, CacheEffect, Cart, CustomerInfo, Identity, Mutation, NewOrder, Order, OrderId,
    OrderStatus, OrderTotals, PricingConfig, Projection, Rider, RiderId, TransitionCommand,
    TransitionContext, request_transition,
};

use super::{InFlight, ProjectionCache, ProjectionKey};
use crate::backend::{ApiError, BackendClient, BackendSession};
use crate::error::{AppError, Result, add_breadcrumb};

/// Order reads and writes for one shell instance.
#[derive(Clone)]
pub struct OrderService {
    backend: BackendClient,
    cache: ProjectionCache,
    in_flight: InFlight,
    pricing: PricingConfig,
}

impl OrderService {
    #[must_use]
    pub fn new(backend: BackendClient, cache: ProjectionCache, pricing: PricingConfig) -> Self {
        Self {
            backend,
            cache,
            in_flight: InFlight::new(),
            pricing,
        }
    }

    #[must_use]
    pub const fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    /// The order list `viewer` sees through `projection`, fetched fresh.
    ///
    /// Every view load goes to the backend so a projection another role
    /// changed is never shown stale. The result is cached for mutations to
    /// look orders up in; a fetch that loses a race with a mutation is still
    /// returned to this caller but is not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the viewer's role cannot read the projection or
    /// the backend call fails.
    #[instrument(skip_all, fields(projection = %projection, viewer = %viewer.id))]
    pub async fn load(
        &self,
        session: &BackendSession,
        viewer: &Identity,
        projection: Projection,
    ) -> Result<Arc<Vec<Order>>> {
        if viewer.role != projection.viewer_role() {
            return Err(AppError::Backend(ApiError::Forbidden(format!(
                "{} cannot view {projection}",
                viewer.role
            ))));
        }

        let key = ProjectionKey::new(projection, &viewer.id);
        let generation = self.cache.generation(projection);
        let orders = self.backend.orders(session, projection).await?;
        for order in &orders {
            if let Err(e) = order.check_invariants() {
                warn!(error = %e, "Backend returned an inconsistent order");
            }
        }

        let orders = Arc::new(orders);
        self.cache.store(key, generation, Arc::clone(&orders)).await;
        Ok(orders)
    }

    /// Riders an admin can assign.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn riders(&self, session: &BackendSession) -> Result<Vec<Rider>> {
        Ok(self.backend.riders(session).await?)
    }

    /// Place an order for the cart contents.
    ///
    /// The cart is left alone; the caller clears it once this succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty cart, an incomplete address, a checkout
    /// already running for this customer, or a backend failure.
    #[instrument(skip_all, fields(customer = %customer.id, lines = cart.len()))]
    pub async fn checkout(
        &self,
        session: &BackendSession,
        customer: &Identity,
        cart: &Cart,
        address: Address,
    ) -> Result<Order> {
        if cart.is_empty() {
            return Err(AppError::Validation("Your cart is empty".to_string()));
        }
        address.validate()?;

        let _ticket = self
            .in_flight
            .try_begin(customer.id.as_str(), Mutation::Checkout)?;

        let totals =
            OrderTotals::compute(cart.items(), &self.pricing).rounded(self.pricing.precision);
        let new_order = NewOrder {
            customer_info: CustomerInfo {
                name: customer.display_name.clone(),
                email: customer.email.clone(),
                phone: Some(address.phone.clone()),
            },
            items: cart.items().to_vec(),
            address,
            subtotal: totals.subtotal,
            shipping: totals.shipping,
            tax: totals.tax,
            total: totals.total,
        };

        let order = self.backend.create_order(session, &new_order).await?;
        self.apply_effects(Mutation::Checkout, customer, &order).await;

        info!(order_id = %order.id, total = %order.total, "Order placed");
        add_breadcrumb("checkout", "Order placed", &[("order_id", order.id.as_str())]);
        Ok(order)
    }

    /// Ship a paid order with `rider_id` (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the order is unknown, the transition is illegal,
    /// the rider is missing or unknown, the order is already being shipped,
    /// or the backend call fails.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn ship(
        &self,
        session: &BackendSession,
        admin: &Identity,
        order_id: &OrderId,
        rider_id: Option<RiderId>,
    ) -> Result<Order> {
        let _ticket = self.in_flight.try_begin(order_id.as_str(), Mutation::Ship)?;

        let order = self
            .find(session, admin, Projection::AllOrders, order_id)
            .await?;
        let riders = self.riders(session).await?;
        let context = TransitionContext {
            rider_id: rider_id.as_ref(),
            known_riders: &riders,
            actor_id: None,
        };
        let candidate = request_transition(&order, OrderStatus::Shipped, admin.role, &context)?;

        self.commit(session, admin, &candidate).await
    }

    /// Record a delivery outcome for an assigned order (rider).
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not assigned to this rider, the
    /// target is not a legal outcome, an update is already running, or the
    /// backend call fails.
    #[instrument(skip_all, fields(order_id = %order_id, target = %target))]
    pub async fn deliver(
        &self,
        session: &BackendSession,
        rider: &Identity,
        order_id: &OrderId,
        target: OrderStatus,
    ) -> Result<Order> {
        let _ticket = self
            .in_flight
            .try_begin(order_id.as_str(), Mutation::Deliver)?;

        let order = self
            .find(session, rider, Projection::AssignedOrders, order_id)
            .await?;
        let actor_id = rider.rider_id();
        let context = TransitionContext {
            actor_id: actor_id.as_ref(),
            ..TransitionContext::default()
        };
        let candidate = request_transition(&order, target, rider.role, &context)?;

        self.commit(session, rider, &candidate).await
    }

    /// Look an order up in the cached projection, refetching on a miss.
    async fn find(
        &self,
        session: &BackendSession,
        viewer: &Identity,
        projection: Projection,
        order_id: &OrderId,
    ) -> Result<Order> {
        let key = ProjectionKey::new(projection, &viewer.id);
        if let Some(order) = self
            .cache
            .get(&key)
            .await
            .and_then(|orders| orders.iter().find(|order| &order.id == order_id).cloned())
        {
            return Ok(order);
        }

        self.load(session, viewer, projection)
            .await?
            .iter()
            .find(|order| &order.id == order_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))
    }

    async fn commit(
        &self,
        session: &BackendSession,
        actor: &Identity,
        candidate: &Order,
    ) -> Result<Order> {
        let Some(command) = TransitionCommand::for_candidate(candidate) else {
            return Err(AppError::Internal(format!(
                "no backend command moves an order to {}",
                candidate.status
            )));
        };

        let echo = match &command {
            TransitionCommand::Ship { rider_id } => {
                self.backend
                    .ship_order(session, &candidate.id, rider_id)
                    .await?
            }
            TransitionCommand::Deliver { outcome } => {
                self.backend
                    .deliver_order(session, &candidate.id, *outcome)
                    .await?
            }
        };

        if let Err(e) = echo.check_invariants() {
            warn!(error = %e, "Backend echoed an inconsistent order");
        }
        if echo.status != candidate.status {
            warn!(
                expected = %candidate.status,
                actual = %echo.status,
                "Backend echo disagrees with the requested status"
            );
        }

        self.apply_effects(command.mutation(), actor, &echo).await;
        info!(order_id = %echo.id, status = %echo.status, "Order updated");
        add_breadcrumb(
            "order",
            "Order status changed",
            &[("order_id", echo.id.as_str()), ("status", echo.status.as_str())],
        );
        Ok(echo)
    }

    async fn apply_effects(&self, mutation: Mutation, actor: &Identity, echo: &Order) {
        for effect in mutation.cache_effects() {
            let key = ProjectionKey::new(effect.projection(), &actor.id);
            match effect {
                CacheEffect::Invalidate(_) => self.cache.invalidate(&key).await,
                CacheEffect::ReplaceEntry(_) => {
                    self.cache.replace_order(&key, echo).await;
                }
            }
        }
    }
}
