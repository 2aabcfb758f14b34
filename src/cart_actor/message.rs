//! Requests accepted by the cart synchronizer.

use crate::cart_actor::{CartError, MutationOutcome, RefreshOutcome};
use crate::framework::Response;
use crate::model::{LineId, OrderDetails, OrderReceipt, ProductRef};
use std::time::Duration;

/// Reply to an optimistic mutation.
pub type MutationResponse = Response<Result<MutationOutcome, CartError>>;

/// Messages sent to the [`CartSynchronizer`](crate::cart_actor::CartSynchronizer).
///
/// Every request except [`CartRequest::ScheduleRefresh`] carries a `respond_to`
/// channel that is answered once the request has fully settled.
#[derive(Debug)]
pub enum CartRequest {
    Refresh {
        respond_to: Response<RefreshOutcome>,
    },
    Add {
        product: ProductRef,
        quantity: u32,
        respond_to: MutationResponse,
    },
    ChangeQuantity {
        line_id: LineId,
        delta: i64,
        respond_to: MutationResponse,
    },
    RemoveLine {
        line_id: LineId,
        respond_to: MutationResponse,
    },
    Clear {
        respond_to: MutationResponse,
    },
    SubmitOrder {
        details: OrderDetails,
        respond_to: Response<Result<OrderReceipt, CartError>>,
    },
    ForceRefresh {
        respond_to: Response<RefreshOutcome>,
    },
    /// Arms the single pending refresh timer, replacing any earlier one.
    ScheduleRefresh {
        after: Duration,
    },
    Logout {
        respond_to: Response<()>,
    },
}
