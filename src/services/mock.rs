//! # Mock Services
//!
//! Test doubles for the remote cart and order services.
//!
//! Two styles are available:
//!
//! - **Channel-driven** ([`create_mock_cart_service`]): every call arrives on a
//!   receiver as a [`CartCall`] and waits until the test answers through its
//!   `respond_to` sender. Use it to inspect state while a request is in flight.
//! - **Scripted** ([`ScriptedCartService`], [`ScriptedOrderService`]): queue
//!   responses up front with the fluent `expect_*().return_ok(..)` API, run the
//!   code under test, then call `verify()`.
//!
//! ```rust
//! use cart_sync::model::LineId;
//! use cart_sync::services::mock::ScriptedCartService;
//! use cart_sync::services::CartService;
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = ScriptedCartService::new();
//!     service.expect_add_item().return_ok(LineId::from("line-1"));
//!
//!     let id = service.add_item(&"P1".into(), 1).await.unwrap();
//!     assert_eq!(id, LineId::from("line-1"));
//!     service.verify();
//! }
//! ```

use crate::framework::mock::{create_mock_mailbox, expect_request};
use crate::framework::{Mailbox, Response};
use crate::model::{LineId, OrderReceipt, PendingOrder, ProductId};
use crate::services::{CartService, OrderService, ServiceError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::mpsc;

// =============================================================================
// CHANNEL-DRIVEN MOCK
// =============================================================================

/// A call made against [`MockCartService`], waiting for the test to answer.
#[derive(Debug)]
pub enum CartCall {
    GetCart {
        respond_to: Response<Result<Vec<Value>, ServiceError>>,
    },
    AddItem {
        product_id: ProductId,
        quantity: u32,
        respond_to: Response<Result<LineId, ServiceError>>,
    },
    UpdateItem {
        line_id: LineId,
        quantity: u32,
        respond_to: Response<Result<(), ServiceError>>,
    },
    RemoveItem {
        line_id: LineId,
        respond_to: Response<Result<(), ServiceError>>,
    },
    ClearCart {
        respond_to: Response<Result<(), ServiceError>>,
    },
}

/// Cart service whose calls are answered by the test.
#[derive(Debug, Clone)]
pub struct MockCartService {
    mailbox: Mailbox<CartCall>,
}

/// Creates a mock cart service and the receiver its calls arrive on.
///
/// If the receiver is dropped, every call fails with [`ServiceError::Unavailable`].
pub fn create_mock_cart_service(buffer_size: usize) -> (MockCartService, mpsc::Receiver<CartCall>) {
    let (mailbox, receiver) = create_mock_mailbox(buffer_size);
    (MockCartService { mailbox }, receiver)
}

impl MockCartService {
    async fn call<T>(
        &self,
        make: impl FnOnce(Response<Result<T, ServiceError>>) -> CartCall,
    ) -> Result<T, ServiceError> {
        self.mailbox
            .call(make)
            .await
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?
    }
}

#[async_trait]
impl CartService for MockCartService {
    async fn get_cart(&self) -> Result<Vec<Value>, ServiceError> {
        self.call(|respond_to| CartCall::GetCart { respond_to }).await
    }

    async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<LineId, ServiceError> {
        let product_id = product_id.clone();
        self.call(|respond_to| CartCall::AddItem {
            product_id,
            quantity,
            respond_to,
        })
        .await
    }

    async fn update_item(&self, line_id: &LineId, quantity: u32) -> Result<(), ServiceError> {
        let line_id = line_id.clone();
        self.call(|respond_to| CartCall::UpdateItem {
            line_id,
            quantity,
            respond_to,
        })
        .await
    }

    async fn remove_item(&self, line_id: &LineId) -> Result<(), ServiceError> {
        let line_id = line_id.clone();
        self.call(|respond_to| CartCall::RemoveItem { line_id, respond_to })
            .await
    }

    async fn clear_cart(&self) -> Result<(), ServiceError> {
        self.call(|respond_to| CartCall::ClearCart { respond_to }).await
    }
}

/// Helper to verify that the next call is `get_cart`.
pub async fn expect_get_cart(
    receiver: &mut mpsc::Receiver<CartCall>,
) -> Option<Response<Result<Vec<Value>, ServiceError>>> {
    match expect_request(receiver).await {
        Some(CartCall::GetCart { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next call is `add_item`.
pub async fn expect_add_item(
    receiver: &mut mpsc::Receiver<CartCall>,
) -> Option<(ProductId, u32, Response<Result<LineId, ServiceError>>)> {
    match expect_request(receiver).await {
        Some(CartCall::AddItem {
            product_id,
            quantity,
            respond_to,
        }) => Some((product_id, quantity, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is `update_item`.
pub async fn expect_update_item(
    receiver: &mut mpsc::Receiver<CartCall>,
) -> Option<(LineId, u32, Response<Result<(), ServiceError>>)> {
    match expect_request(receiver).await {
        Some(CartCall::UpdateItem {
            line_id,
            quantity,
            respond_to,
        }) => Some((line_id, quantity, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is `remove_item`.
pub async fn expect_remove_item(
    receiver: &mut mpsc::Receiver<CartCall>,
) -> Option<(LineId, Response<Result<(), ServiceError>>)> {
    match expect_request(receiver).await {
        Some(CartCall::RemoveItem {
            line_id,
            respond_to,
        }) => Some((line_id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is `clear_cart`.
pub async fn expect_clear_cart(
    receiver: &mut mpsc::Receiver<CartCall>,
) -> Option<Response<Result<(), ServiceError>>> {
    match expect_request(receiver).await {
        Some(CartCall::ClearCart { respond_to }) => Some(respond_to),
        _ => None,
    }
}

// =============================================================================
// SCRIPTED MOCKS
// =============================================================================

/// A call recorded by [`ScriptedCartService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    GetCart,
    AddItem { product_id: ProductId, quantity: u32 },
    UpdateItem { line_id: LineId, quantity: u32 },
    RemoveItem { line_id: LineId },
    ClearCart,
}

enum CartExpectation {
    GetCart(Result<Vec<Value>, ServiceError>),
    AddItem(Result<LineId, ServiceError>),
    UpdateItem(Result<(), ServiceError>),
    RemoveItem(Result<(), ServiceError>),
    ClearCart(Result<(), ServiceError>),
}

/// Cart service that answers from a queue of expected calls.
///
/// A call that does not match the head of the queue fails with
/// [`ServiceError::Unavailable`] and is reported by [`ScriptedCartService::verify`].
#[derive(Default)]
pub struct ScriptedCartService {
    expectations: Mutex<VecDeque<CartExpectation>>,
    calls: Mutex<Vec<RecordedCall>>,
    unexpected: Mutex<Vec<RecordedCall>>,
}

/// Builder for one queued response.
pub struct ExpectationBuilder<'a, T> {
    queue: &'a Mutex<VecDeque<CartExpectation>>,
    wrap: fn(Result<T, ServiceError>) -> CartExpectation,
}

impl<T> ExpectationBuilder<'_, T> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: T) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: ServiceError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<T, ServiceError>) {
        self.queue.lock().unwrap().push_back((self.wrap)(response));
    }
}

impl ScriptedCartService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_get_cart(&self) -> ExpectationBuilder<'_, Vec<Value>> {
        ExpectationBuilder {
            queue: &self.expectations,
            wrap: CartExpectation::GetCart,
        }
    }

    pub fn expect_add_item(&self) -> ExpectationBuilder<'_, LineId> {
        ExpectationBuilder {
            queue: &self.expectations,
            wrap: CartExpectation::AddItem,
        }
    }

    pub fn expect_update_item(&self) -> ExpectationBuilder<'_, ()> {
        ExpectationBuilder {
            queue: &self.expectations,
            wrap: CartExpectation::UpdateItem,
        }
    }

    pub fn expect_remove_item(&self) -> ExpectationBuilder<'_, ()> {
        ExpectationBuilder {
            queue: &self.expectations,
            wrap: CartExpectation::RemoveItem,
        }
    }

    pub fn expect_clear_cart(&self) -> ExpectationBuilder<'_, ()> {
        ExpectationBuilder {
            queue: &self.expectations,
            wrap: CartExpectation::ClearCart,
        }
    }

    /// Every call received so far, in order, including unexpected ones.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met and nothing unexpected was called.
    pub fn verify(&self) {
        let unexpected = self.unexpected.lock().unwrap();
        if !unexpected.is_empty() {
            panic!("Unexpected calls: {:?}", *unexpected);
        }
        let remaining = self.expectations.lock().unwrap().len();
        if remaining != 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }

    fn next(&self, call: RecordedCall) -> Option<CartExpectation> {
        self.calls.lock().unwrap().push(call);
        self.expectations.lock().unwrap().pop_front()
    }

    fn mismatch<T>(&self, call: RecordedCall) -> Result<T, ServiceError> {
        let message = format!("unexpected call {:?}", call);
        self.unexpected.lock().unwrap().push(call);
        Err(ServiceError::Unavailable(message))
    }
}

#[async_trait]
impl CartService for ScriptedCartService {
    async fn get_cart(&self) -> Result<Vec<Value>, ServiceError> {
        match self.next(RecordedCall::GetCart) {
            Some(CartExpectation::GetCart(response)) => response,
            _ => self.mismatch(RecordedCall::GetCart),
        }
    }

    async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<LineId, ServiceError> {
        let call = RecordedCall::AddItem {
            product_id: product_id.clone(),
            quantity,
        };
        match self.next(call.clone()) {
            Some(CartExpectation::AddItem(response)) => response,
            _ => self.mismatch(call),
        }
    }

    async fn update_item(&self, line_id: &LineId, quantity: u32) -> Result<(), ServiceError> {
        let call = RecordedCall::UpdateItem {
            line_id: line_id.clone(),
            quantity,
        };
        match self.next(call.clone()) {
            Some(CartExpectation::UpdateItem(response)) => response,
            _ => self.mismatch(call),
        }
    }

    async fn remove_item(&self, line_id: &LineId) -> Result<(), ServiceError> {
        let call = RecordedCall::RemoveItem {
            line_id: line_id.clone(),
        };
        match self.next(call.clone()) {
            Some(CartExpectation::RemoveItem(response)) => response,
            _ => self.mismatch(call),
        }
    }

    async fn clear_cart(&self) -> Result<(), ServiceError> {
        match self.next(RecordedCall::ClearCart) {
            Some(CartExpectation::ClearCart(response)) => response,
            _ => self.mismatch(RecordedCall::ClearCart),
        }
    }
}

/// Order service that answers from a queue and records every submitted order.
#[derive(Default)]
pub struct ScriptedOrderService {
    responses: Mutex<VecDeque<Result<Value, ServiceError>>>,
    orders: Mutex<Vec<PendingOrder>>,
}

pub struct OrderExpectationBuilder<'a> {
    queue: &'a Mutex<VecDeque<Result<Value, ServiceError>>>,
}

impl OrderExpectationBuilder<'_> {
    /// Sets the expectation to return `body` as the created order.
    pub fn return_ok(self, body: Value) {
        self.queue.lock().unwrap().push_back(Ok(body));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: ServiceError) {
        self.queue.lock().unwrap().push_back(Err(error));
    }
}

impl ScriptedOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_create_order(&self) -> OrderExpectationBuilder<'_> {
        OrderExpectationBuilder {
            queue: &self.responses,
        }
    }

    /// Orders received so far.
    pub fn orders(&self) -> Vec<PendingOrder> {
        self.orders.lock().unwrap().clone()
    }

    pub fn verify(&self) {
        let remaining = self.responses.lock().unwrap().len();
        if remaining != 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

#[async_trait]
impl OrderService for ScriptedOrderService {
    async fn create_order(&self, order: &PendingOrder) -> Result<OrderReceipt, ServiceError> {
        self.orders.lock().unwrap().push(order.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(response) => response.map(OrderReceipt),
            None => Err(ServiceError::Unavailable(
                "unexpected create_order call".to_string(),
            )),
        }
    }
}
