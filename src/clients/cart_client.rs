use crate::cart_actor::{CartError, CartRequest, MutationOutcome, RefreshOutcome};
use crate::framework::Mailbox;
use crate::model::{CartState, LineId, OrderDetails, OrderReceipt, ProductRef};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, instrument};

/// Client for interacting with the cart actor.
///
/// Operations resolve once the request has fully settled on the actor, including
/// the remote call and any rollback. The optimistic state is visible earlier
/// through [`CartClient::state`] or [`CartClient::subscribe`].
#[derive(Debug, Clone)]
pub struct CartClient {
    mailbox: Mailbox<CartRequest>,
    view: watch::Receiver<CartState>,
}

impl CartClient {
    pub fn new(mailbox: Mailbox<CartRequest>, view: watch::Receiver<CartState>) -> Self {
        Self { mailbox, view }
    }

    /// Refetches the cart. Never fails on the service side; the outcome says what happened.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<RefreshOutcome, CartError> {
        Ok(self
            .mailbox
            .call(|respond_to| CartRequest::Refresh { respond_to })
            .await?)
    }

    /// Adds `quantity` of `product`, or bumps the existing line for it.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(
        &self,
        product: ProductRef,
        quantity: u32,
    ) -> Result<MutationOutcome, CartError> {
        debug!(?product, "add called");
        self.mailbox
            .call(|respond_to| CartRequest::Add {
                product,
                quantity,
                respond_to,
            })
            .await?
    }

    /// Changes a line's quantity by `delta`. Lines that reach zero are removed.
    #[instrument(skip(self))]
    pub async fn change_quantity(
        &self,
        line_id: LineId,
        delta: i64,
    ) -> Result<MutationOutcome, CartError> {
        self.mailbox
            .call(|respond_to| CartRequest::ChangeQuantity {
                line_id,
                delta,
                respond_to,
            })
            .await?
    }

    #[instrument(skip(self))]
    pub async fn remove_line(&self, line_id: LineId) -> Result<MutationOutcome, CartError> {
        self.mailbox
            .call(|respond_to| CartRequest::RemoveLine {
                line_id,
                respond_to,
            })
            .await?
    }

    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<MutationOutcome, CartError> {
        self.mailbox
            .call(|respond_to| CartRequest::Clear { respond_to })
            .await?
    }

    /// Submits the current cart as an order.
    ///
    /// Fails with [`CartError::EmptyCart`] or [`CartError::NotLoggedIn`] before any
    /// network call. On success the cart is emptied and refetched before this returns.
    #[instrument(skip(self, details))]
    pub async fn submit_order(&self, details: OrderDetails) -> Result<OrderReceipt, CartError> {
        self.mailbox
            .call(|respond_to| CartRequest::SubmitOrder {
                details,
                respond_to,
            })
            .await?
    }

    /// Empties the cart, waits for the server to settle, then refetches.
    #[instrument(skip(self))]
    pub async fn force_refresh(&self) -> Result<RefreshOutcome, CartError> {
        Ok(self
            .mailbox
            .call(|respond_to| CartRequest::ForceRefresh { respond_to })
            .await?)
    }

    /// Arms a refresh after `after`, replacing any refresh already scheduled.
    pub async fn schedule_refresh(&self, after: Duration) -> Result<(), CartError> {
        Ok(self.mailbox.send(CartRequest::ScheduleRefresh { after }).await?)
    }

    /// Signs out and forgets the local cart.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), CartError> {
        Ok(self
            .mailbox
            .call(|respond_to| CartRequest::Logout { respond_to })
            .await?)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CartState {
        self.view.borrow().clone()
    }

    /// A receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.view.clone()
    }

    pub fn subtotal(&self) -> Decimal {
        self.view.borrow().subtotal()
    }

    pub fn item_count(&self) -> u64 {
        self.view.borrow().item_count()
    }

    pub fn is_loading(&self) -> bool {
        self.view.borrow().loading
    }

    pub fn is_submitting(&self) -> bool {
        self.view.borrow().submitting
    }
}
