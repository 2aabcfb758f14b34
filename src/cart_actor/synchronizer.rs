//! # Cart Synchronizer
//!
//! The [`Handler`] that owns the cart. Every operation runs inside the actor task,
//! one request at a time, so two operations on the same line never interleave.
//!
//! Mutations are optimistic: the local change is published on the `watch`
//! channel first, then the remote call is made, and a failed call restores the
//! lines captured before the change (see [`Transaction`]).

use crate::cart_actor::{CartError, CartRequest, MutationOutcome, RefreshOutcome};
use crate::framework::{Handler, Transaction};
use crate::model::{CartLine, CartState, LineId, OrderDetails, OrderReceipt, PendingOrder, ProductRef};
use crate::services::{CartCache, CartService, CredentialStore, Notice, Notifier, OrderService};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Fixed delays used while waiting for the server to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Wait between a created order and the reconciling refresh.
    pub order_settle_delay: Duration,
    /// Wait between emptying the cart and refetching it in a forced refresh.
    pub force_refresh_delay: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            order_settle_delay: Duration::from_millis(300),
            force_refresh_delay: Duration::from_millis(500),
        }
    }
}

impl SyncSettings {
    /// No delays at all. Handy in tests.
    pub fn immediate() -> Self {
        Self {
            order_settle_delay: Duration::ZERO,
            force_refresh_delay: Duration::ZERO,
        }
    }
}

/// Collaborators injected into the synchronizer when it starts running.
#[derive(Clone)]
pub struct CartContext {
    pub cart_service: Arc<dyn CartService>,
    pub order_service: Arc<dyn OrderService>,
    pub credentials: Arc<dyn CredentialStore>,
    pub cache: Arc<dyn CartCache>,
    pub notifier: Arc<dyn Notifier>,
    pub settings: SyncSettings,
}

impl CartContext {
    pub fn new(
        cart_service: Arc<dyn CartService>,
        order_service: Arc<dyn OrderService>,
        credentials: Arc<dyn CredentialStore>,
        cache: Arc<dyn CartCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            cart_service,
            order_service,
            credentials,
            cache,
            notifier,
            settings: SyncSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SyncSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Mirrors `lines` into the cache, removing the snapshot when there are none.
    fn mirror(&self, lines: &[CartLine]) {
        let result = if lines.is_empty() {
            self.cache.remove()
        } else {
            self.cache.store(lines)
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to update cart cache");
        }
    }

    fn forget(&self) {
        self.mirror(&[]);
    }
}

impl std::fmt::Debug for CartContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Sets the submitting flag for as long as it lives.
struct SubmittingGuard<'a> {
    state: &'a watch::Sender<CartState>,
}

impl<'a> SubmittingGuard<'a> {
    fn begin(state: &'a watch::Sender<CartState>) -> Self {
        state.send_modify(|s| s.submitting = true);
        Self { state }
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.submitting = false);
    }
}

/// Owns the cart and publishes it as [`CartState`].
pub struct CartSynchronizer {
    state: watch::Sender<CartState>,
    next_placeholder: u64,
    pending_refresh: Option<Instant>,
}

impl Default for CartSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CartSynchronizer {
    /// Creates a synchronizer with an empty cart.
    pub fn new() -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            state,
            next_placeholder: 1,
            pending_refresh: None,
        }
    }

    /// A new view of the published state.
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    fn placeholder(&mut self) -> LineId {
        let id = LineId::Pending(self.next_placeholder);
        self.next_placeholder += 1;
        id
    }

    fn clear_local(&self, ctx: &CartContext) {
        self.state.send_modify(|s| s.lines.clear());
        ctx.forget();
    }

    /// Replaces the cart with the server's, or empties it when that is not possible.
    #[instrument(skip(self, ctx))]
    async fn refresh(&self, ctx: &CartContext) -> RefreshOutcome {
        if ctx.credentials.token().is_none() {
            debug!("No credential, clearing cart");
            self.clear_local(ctx);
            return RefreshOutcome::SignedOut;
        }

        self.state.send_modify(|s| s.loading = true);
        let outcome = match ctx.cart_service.get_cart().await {
            Ok(items) => {
                let lines: Vec<CartLine> = items.iter().filter_map(CartLine::from_wire).collect();
                let dropped = items.len() - lines.len();
                if dropped > 0 {
                    warn!(dropped, "Skipped unusable cart items");
                }
                ctx.mirror(&lines);
                let count = lines.len();
                self.state.send_modify(|s| s.lines = lines);
                info!(lines = count, "Cart refreshed");
                RefreshOutcome::Synced { lines: count }
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch cart");
                self.clear_local(ctx);
                RefreshOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        self.state.send_modify(|s| s.loading = false);
        outcome
    }

    #[instrument(skip(self, ctx), fields(product_id = %product.id))]
    async fn add(
        &mut self,
        product: ProductRef,
        quantity: u32,
        ctx: &CartContext,
    ) -> Result<MutationOutcome, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let existing = self
            .state
            .borrow()
            .line_for_product(&product.id)
            .map(|line| line.id.clone());
        if let Some(line_id) = existing {
            debug!(%line_id, "Product already in cart, changing quantity");
            return self
                .change_quantity(line_id, i64::from(quantity), ctx)
                .await;
        }

        let placeholder = self.placeholder();
        let line = CartLine {
            id: placeholder.clone(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image,
            quantity,
        };
        let tx = Transaction::begin(&self.state, |s| s.lines.push(line));
        ctx.notifier.notify(
            Notice::info("Added to cart").with_description(format!("{} has been added.", product.name)),
        );

        match tx.run(ctx.cart_service.add_item(&product.id, quantity)).await {
            Ok(server_id) => {
                debug!(%placeholder, %server_id, "Add confirmed");
                self.state.send_modify(|s| {
                    if let Some(line) = s.lines.iter_mut().find(|l| l.id == placeholder) {
                        line.id = server_id;
                    }
                });
                Ok(MutationOutcome::Committed)
            }
            Err(e) => {
                warn!(error = %e, "Add failed, rolled back");
                ctx.notifier.notify(Notice::error("Could not add item to cart."));
                Ok(MutationOutcome::RolledBack {
                    reason: e.to_string(),
                })
            }
        }
    }

    #[instrument(skip(self, ctx))]
    async fn change_quantity(
        &self,
        line_id: LineId,
        delta: i64,
        ctx: &CartContext,
    ) -> Result<MutationOutcome, CartError> {
        let current = self.state.borrow().line(&line_id).map(|line| line.quantity);
        let Some(current) = current else {
            return Err(CartError::LineNotFound(line_id));
        };
        let new_quantity = i64::from(current).saturating_add(delta);

        if new_quantity <= 0 {
            let tx = Transaction::begin(&self.state, |s| s.lines.retain(|l| l.id != line_id));
            return match tx.run(ctx.cart_service.remove_item(&line_id)).await {
                Ok(()) => {
                    ctx.notifier.notify(Notice::info("Item removed"));
                    Ok(MutationOutcome::Committed)
                }
                Err(e) => {
                    warn!(error = %e, "Remove failed, rolled back");
                    ctx.notifier.notify(Notice::error("Could not remove item from cart."));
                    Ok(MutationOutcome::RolledBack {
                        reason: e.to_string(),
                    })
                }
            };
        }

        let quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);
        let tx = Transaction::begin(&self.state, |s| {
            if let Some(line) = s.lines.iter_mut().find(|l| l.id == line_id) {
                line.quantity = quantity;
            }
        });
        match tx.run(ctx.cart_service.update_item(&line_id, quantity)).await {
            Ok(()) => Ok(MutationOutcome::Committed),
            Err(e) => {
                warn!(error = %e, "Quantity update failed, rolled back");
                ctx.notifier.notify(Notice::error("Could not update item quantity."));
                Ok(MutationOutcome::RolledBack {
                    reason: e.to_string(),
                })
            }
        }
    }

    #[instrument(skip(self, ctx))]
    async fn remove_line(
        &self,
        line_id: LineId,
        ctx: &CartContext,
    ) -> Result<MutationOutcome, CartError> {
        if self.state.borrow().line(&line_id).is_none() {
            return Err(CartError::LineNotFound(line_id));
        }

        let tx = Transaction::begin(&self.state, |s| s.lines.retain(|l| l.id != line_id));
        ctx.notifier.notify(Notice::info("Item removed"));

        match tx.run(ctx.cart_service.remove_item(&line_id)).await {
            Ok(()) => Ok(MutationOutcome::Committed),
            Err(e) => {
                warn!(error = %e, "Remove failed, rolled back");
                ctx.notifier.notify(Notice::error("Could not remove item from cart."));
                Ok(MutationOutcome::RolledBack {
                    reason: e.to_string(),
                })
            }
        }
    }

    #[instrument(skip(self, ctx))]
    async fn clear(&self, ctx: &CartContext) -> Result<MutationOutcome, CartError> {
        let tx = Transaction::begin(&self.state, |s| s.lines.clear());

        match tx.run(ctx.cart_service.clear_cart()).await {
            Ok(()) => {
                info!("Cart cleared");
                Ok(MutationOutcome::Committed)
            }
            Err(e) => {
                warn!(error = %e, "Clear failed, rolled back");
                ctx.notifier.notify(Notice::error("Could not clear the cart."));
                Ok(MutationOutcome::RolledBack {
                    reason: e.to_string(),
                })
            }
        }
    }

    #[instrument(skip(self, ctx, details))]
    async fn submit_order(
        &self,
        details: OrderDetails,
        ctx: &CartContext,
    ) -> Result<OrderReceipt, CartError> {
        if self.state.borrow().is_empty() {
            return Err(CartError::EmptyCart);
        }
        let Some(user) = ctx.credentials.user() else {
            return Err(CartError::NotLoggedIn);
        };

        let _submitting = SubmittingGuard::begin(&self.state);
        let order = PendingOrder::new(user.id, details, &self.state.borrow().lines);

        let receipt = ctx.order_service.create_order(&order).await.map_err(|e| {
            error!(error = %e, "Order creation failed");
            e
        })?;
        info!(
            order_id = receipt.order_id().unwrap_or("unknown"),
            items = order.items.len(),
            "Order created, clearing cart"
        );

        self.clear_local(ctx);
        tokio::time::sleep(ctx.settings.order_settle_delay).await;
        self.refresh(ctx).await;

        Ok(receipt)
    }

    #[instrument(skip(self, ctx))]
    async fn force_refresh(&mut self, ctx: &CartContext) -> RefreshOutcome {
        if self.pending_refresh.take().is_some() {
            debug!("Cancelled scheduled refresh");
        }
        self.clear_local(ctx);
        tokio::time::sleep(ctx.settings.force_refresh_delay).await;

        let outcome = self.refresh(ctx).await;
        if let RefreshOutcome::Failed { reason } = &outcome {
            warn!(%reason, "Force refresh could not reach the cart service");
        }
        outcome
    }

    fn logout(&mut self, ctx: &CartContext) {
        ctx.credentials.clear();
        self.pending_refresh = None;
        self.clear_local(ctx);
        info!("Logged out, cart cleared");
    }
}

#[async_trait]
impl Handler for CartSynchronizer {
    type Request = CartRequest;
    type Context = CartContext;

    async fn handle(&mut self, request: CartRequest, ctx: &CartContext) {
        match request {
            CartRequest::Refresh { respond_to } => {
                let _ = respond_to.send(self.refresh(ctx).await);
            }
            CartRequest::Add {
                product,
                quantity,
                respond_to,
            } => {
                let _ = respond_to.send(self.add(product, quantity, ctx).await);
            }
            CartRequest::ChangeQuantity {
                line_id,
                delta,
                respond_to,
            } => {
                let _ = respond_to.send(self.change_quantity(line_id, delta, ctx).await);
            }
            CartRequest::RemoveLine {
                line_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.remove_line(line_id, ctx).await);
            }
            CartRequest::Clear { respond_to } => {
                let _ = respond_to.send(self.clear(ctx).await);
            }
            CartRequest::SubmitOrder {
                details,
                respond_to,
            } => {
                let _ = respond_to.send(self.submit_order(details, ctx).await);
            }
            CartRequest::ForceRefresh { respond_to } => {
                let _ = respond_to.send(self.force_refresh(ctx).await);
            }
            CartRequest::ScheduleRefresh { after } => {
                debug!(?after, "Refresh scheduled");
                self.pending_refresh = Some(Instant::now() + after);
            }
            CartRequest::Logout { respond_to } => {
                self.logout(ctx);
                let _ = respond_to.send(());
            }
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.pending_refresh
    }

    async fn on_deadline(&mut self, ctx: &CartContext) {
        self.pending_refresh = None;
        self.refresh(ctx).await;
    }

    async fn on_shutdown(&mut self, _ctx: &CartContext) {
        if self.pending_refresh.take().is_some() {
            debug!("Dropped scheduled refresh on shutdown");
        }
    }
}
