use cart_sync::cart_actor::{CartContext, CartError, MutationOutcome, RefreshOutcome, SyncSettings};
use cart_sync::clients::CartClient;
use cart_sync::lifecycle::CartSystem;
use cart_sync::model::{CartState, LineId, OrderDetails, ProductId, ProductRef, UserIdentity};
use cart_sync::services::mock::{
    create_mock_cart_service, expect_add_item, expect_get_cart, expect_update_item, RecordedCall,
    ScriptedCartService, ScriptedOrderService,
};
use cart_sync::services::{
    CartCache, ChannelNotifier, CredentialStore, FileCartCache, MemoryCartCache,
    MemoryCredentialStore, Notice, NoticeKind, ServiceError,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

fn item(id: &str, product: &str, price: i64, quantity: u32) -> Value {
    json!({
        "_id": id,
        "quantity": quantity,
        "product": { "_id": product, "name": format!("Product {}", product), "price": price }
    })
}

fn details() -> OrderDetails {
    OrderDetails {
        recipient_name: "Nguyen Van A".to_string(),
        phone: "0901234567".to_string(),
        shipping_address: "12 Le Loi, District 1".to_string(),
        note: "Leave at the door".to_string(),
        payment_method: Some("cod".to_string()),
    }
}

fn server_error() -> ServiceError {
    ServiceError::Status {
        status: 500,
        body: "internal error".to_string(),
    }
}

fn drain(notices: &mut UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        out.push(notice);
    }
    out
}

struct Harness {
    system: CartSystem,
    cart: Arc<ScriptedCartService>,
    orders: Arc<ScriptedOrderService>,
    credentials: Arc<MemoryCredentialStore>,
    cache: Arc<MemoryCartCache>,
    notices: UnboundedReceiver<Notice>,
}

impl Harness {
    fn start(credentials: MemoryCredentialStore) -> Self {
        let cart = Arc::new(ScriptedCartService::new());
        let orders = Arc::new(ScriptedOrderService::new());
        let credentials = Arc::new(credentials);
        let cache = Arc::new(MemoryCartCache::new());
        let (notifier, notices) = ChannelNotifier::new();

        let context = CartContext::new(
            cart.clone(),
            orders.clone(),
            credentials.clone(),
            cache.clone(),
            Arc::new(notifier),
        )
        .with_settings(SyncSettings::immediate());

        Self {
            system: CartSystem::start(context, 16),
            cart,
            orders,
            credentials,
            cache,
            notices,
        }
    }

    fn signed_in() -> Self {
        Self::start(MemoryCredentialStore::signed_in("token-1", UserIdentity::new("u1")))
    }

    /// Signed in with the given server cart already loaded.
    async fn with_cart(items: Vec<Value>) -> Self {
        let harness = Self::signed_in();
        harness.cart.expect_get_cart().return_ok(items);
        harness.client().refresh().await.unwrap();
        harness
    }

    fn client(&self) -> &CartClient {
        &self.system.cart_client
    }

    fn state(&self) -> CartState {
        self.client().state()
    }
}

// =============================================================================
// REFRESH
// =============================================================================

#[tokio::test]
async fn test_refresh_maps_items_and_mirrors_cache() {
    let h = Harness::signed_in();
    h.cart.expect_get_cart().return_ok(vec![
        item("l1", "P1", 10, 2),
        json!({ "_id": "broken", "quantity": 1 }),
        item("l2", "P2", 3, 5),
    ]);

    let outcome = h.client().refresh().await.unwrap();

    assert_eq!(outcome, RefreshOutcome::Synced { lines: 2 });
    let state = h.state();
    assert_eq!(state.lines.len(), 2);
    assert_eq!(state.lines[0].name, "Product P1");
    assert_eq!(state.subtotal(), Decimal::from(35));
    assert_eq!(state.item_count(), 7);
    assert!(!state.loading);
    assert_eq!(h.cache.load().unwrap(), Some(state.lines));
    h.cart.verify();
}

#[tokio::test]
async fn test_refresh_with_empty_server_cart_removes_snapshot() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 2)]).await;
    assert!(h.cache.load().unwrap().is_some());

    h.cart.expect_get_cart().return_ok(vec![]);
    h.client().refresh().await.unwrap();

    assert!(h.state().is_empty());
    assert_eq!(h.cache.load().unwrap(), None);
}

#[tokio::test]
async fn test_refresh_without_credential_clears_without_network() {
    let h = Harness::start(MemoryCredentialStore::new());
    h.cache.store(&[]).unwrap();

    let outcome = h.client().refresh().await.unwrap();

    assert_eq!(outcome, RefreshOutcome::SignedOut);
    assert!(h.state().is_empty());
    assert!(h.cart.calls().is_empty());
    assert_eq!(h.cache.load().unwrap(), None);
}

#[tokio::test]
async fn test_refresh_failure_empties_cart() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 2)]).await;
    h.cart.expect_get_cart().return_err(server_error());

    let outcome = h.client().refresh().await.unwrap();

    assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
    let state = h.state();
    assert!(state.is_empty());
    assert!(!state.loading);
    assert_eq!(h.cache.load().unwrap(), None);
}

// =============================================================================
// CHANGE QUANTITY
// =============================================================================

#[tokio::test]
async fn test_change_quantity_sends_absolute_quantity() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 2)]).await;
    h.cart.expect_update_item().return_ok(());

    let outcome = h
        .client()
        .change_quantity(LineId::from("l1"), 3)
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Committed);
    assert_eq!(h.state().lines[0].quantity, 5);
    assert_eq!(h.client().subtotal(), Decimal::from(50));
    assert_eq!(
        h.cart.calls().last(),
        Some(&RecordedCall::UpdateItem {
            line_id: LineId::from("l1"),
            quantity: 5
        })
    );
    h.cart.verify();
}

#[tokio::test]
async fn test_change_quantity_failure_restores_previous_cart() {
    let mut h = Harness::with_cart(vec![item("l1", "P1", 10, 2), item("l2", "P2", 4, 1)]).await;
    let before = h.state();
    h.cart.expect_update_item().return_err(server_error());

    let outcome = h
        .client()
        .change_quantity(LineId::from("l1"), 3)
        .await
        .unwrap();

    assert!(matches!(outcome, MutationOutcome::RolledBack { .. }));
    assert_eq!(h.state(), before);
    assert_eq!(h.state().lines[0].quantity, 2);

    let notices = drain(&mut h.notices);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Error);
    assert_eq!(
        notices[0].description.as_deref(),
        Some("Could not update item quantity.")
    );
}

#[tokio::test]
async fn test_reducing_to_zero_removes_line_with_removal_call() {
    let mut h = Harness::with_cart(vec![item("l1", "P1", 10, 2), item("l2", "P2", 4, 1)]).await;
    h.cart.expect_remove_item().return_ok(());

    let outcome = h
        .client()
        .change_quantity(LineId::from("l1"), -5)
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Committed);
    let state = h.state();
    assert_eq!(state.lines.len(), 1);
    assert!(state.line(&LineId::from("l1")).is_none());
    assert!(!h
        .cart
        .calls()
        .iter()
        .any(|c| matches!(c, RecordedCall::UpdateItem { .. })));
    assert_eq!(
        h.cart.calls().last(),
        Some(&RecordedCall::RemoveItem {
            line_id: LineId::from("l1")
        })
    );

    let notices = drain(&mut h.notices);
    assert_eq!(notices, vec![Notice::info("Item removed")]);
}

#[tokio::test]
async fn test_failed_removal_by_quantity_restores_line() {
    let mut h = Harness::with_cart(vec![item("l1", "P1", 10, 1)]).await;
    let before = h.state();
    h.cart.expect_remove_item().return_err(server_error());

    let outcome = h
        .client()
        .change_quantity(LineId::from("l1"), -1)
        .await
        .unwrap();

    assert!(!outcome.is_committed());
    assert_eq!(h.state(), before);
    assert_eq!(
        drain(&mut h.notices),
        vec![Notice::error("Could not remove item from cart.")]
    );
}

#[tokio::test]
async fn test_huge_increase_saturates_and_actor_keeps_running() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 2)]).await;
    h.cart.expect_update_item().return_ok(());

    let outcome = h
        .client()
        .change_quantity(LineId::from("l1"), i64::MAX)
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Committed);
    assert_eq!(h.state().lines[0].quantity, u32::MAX);
    assert_eq!(
        h.cart.calls().last(),
        Some(&RecordedCall::UpdateItem {
            line_id: LineId::from("l1"),
            quantity: u32::MAX
        })
    );

    h.cart.expect_get_cart().return_ok(vec![item("l1", "P1", 10, 7)]);
    let refreshed = h.client().refresh().await.unwrap();
    assert_eq!(refreshed, RefreshOutcome::Synced { lines: 1 });
    assert_eq!(h.state().lines[0].quantity, 7);
    h.cart.verify();
}

#[tokio::test]
async fn test_huge_decrease_removes_line() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 2)]).await;
    h.cart.expect_remove_item().return_ok(());

    let outcome = h
        .client()
        .change_quantity(LineId::from("l1"), i64::MIN)
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Committed);
    assert!(h.state().is_empty());
    assert_eq!(
        h.cart.calls().last(),
        Some(&RecordedCall::RemoveItem {
            line_id: LineId::from("l1")
        })
    );
}

#[tokio::test]
async fn test_unknown_line_is_rejected_without_network() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 1)]).await;
    let calls_before = h.cart.calls().len();

    let change = h.client().change_quantity(LineId::from("nope"), 1).await;
    let remove = h.client().remove_line(LineId::from("nope")).await;

    assert!(matches!(change, Err(CartError::LineNotFound(_))));
    assert!(matches!(remove, Err(CartError::LineNotFound(_))));
    assert_eq!(h.cart.calls().len(), calls_before);
}

// =============================================================================
// ADD
// =============================================================================

#[tokio::test]
async fn test_add_new_product_swaps_placeholder_for_server_id() {
    let mut h = Harness::with_cart(vec![]).await;
    h.cart.expect_add_item().return_ok(LineId::from("srv-9"));
    let product = ProductRef::new("P7", "Aspirin", Decimal::new(1250, 2), "/img/aspirin.png");

    let outcome = h.client().add(product, 2).await.unwrap();

    assert_eq!(outcome, MutationOutcome::Committed);
    let state = h.state();
    assert_eq!(state.lines.len(), 1);
    let line = &state.lines[0];
    assert_eq!(line.id, LineId::from("srv-9"));
    assert_eq!(line.product_id, ProductId::from("P7"));
    assert_eq!(line.name, "Aspirin");
    assert_eq!(line.price, Decimal::new(1250, 2));
    assert_eq!(line.image, "/img/aspirin.png");
    assert_eq!(line.quantity, 2);
    assert_eq!(
        h.cart.calls().last(),
        Some(&RecordedCall::AddItem {
            product_id: ProductId::from("P7"),
            quantity: 2
        })
    );
    assert_eq!(
        drain(&mut h.notices),
        vec![Notice::info("Added to cart").with_description("Aspirin has been added.")]
    );
}

#[tokio::test]
async fn test_adding_same_product_twice_increments_existing_line() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 2)]).await;
    h.cart.expect_update_item().return_ok(());
    let product = ProductRef::new("P1", "Product P1", Decimal::from(10), "");

    h.client().add(product, 1).await.unwrap();

    let state = h.state();
    assert_eq!(state.lines.len(), 1);
    assert_eq!(state.lines[0].quantity, 3);
    assert_eq!(
        h.cart.calls().last(),
        Some(&RecordedCall::UpdateItem {
            line_id: LineId::from("l1"),
            quantity: 3
        })
    );
    h.cart.verify();
}

#[tokio::test]
async fn test_add_failure_rolls_back_and_notifies() {
    let mut h = Harness::with_cart(vec![item("l1", "P1", 10, 2)]).await;
    let before = h.state();
    h.cart.expect_add_item().return_err(server_error());

    let outcome = h
        .client()
        .add(ProductRef::new("P2", "Vitamin C", Decimal::from(3), ""), 1)
        .await
        .unwrap();

    assert!(matches!(outcome, MutationOutcome::RolledBack { .. }));
    assert_eq!(h.state(), before);

    let notices = drain(&mut h.notices);
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].title, "Added to cart");
    assert_eq!(notices[1], Notice::error("Could not add item to cart."));
}

#[tokio::test]
async fn test_add_zero_quantity_is_rejected() {
    let h = Harness::with_cart(vec![]).await;
    let calls_before = h.cart.calls().len();

    let result = h
        .client()
        .add(ProductRef::new("P1", "Aspirin", Decimal::from(1), ""), 0)
        .await;

    assert!(matches!(result, Err(CartError::InvalidQuantity(0))));
    assert!(h.state().is_empty());
    assert_eq!(h.cart.calls().len(), calls_before);
}

// =============================================================================
// REMOVE & CLEAR
// =============================================================================

#[tokio::test]
async fn test_remove_line_notifies_before_call_and_rolls_back_on_failure() {
    let mut h = Harness::with_cart(vec![item("l1", "P1", 10, 2), item("l2", "P2", 4, 1)]).await;
    let before = h.state();
    h.cart.expect_remove_item().return_err(server_error());

    let outcome = h.client().remove_line(LineId::from("l2")).await.unwrap();

    assert!(!outcome.is_committed());
    assert_eq!(h.state(), before);
    assert_eq!(
        drain(&mut h.notices),
        vec![
            Notice::info("Item removed"),
            Notice::error("Could not remove item from cart.")
        ]
    );
}

#[tokio::test]
async fn test_remove_line_success() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 2), item("l2", "P2", 4, 1)]).await;
    h.cart.expect_remove_item().return_ok(());

    h.client().remove_line(LineId::from("l2")).await.unwrap();

    assert_eq!(h.state().lines.len(), 1);
    assert_eq!(h.client().subtotal(), Decimal::from(20));
}

#[tokio::test]
async fn test_clear_success_and_failure() {
    let mut h = Harness::with_cart(vec![item("l1", "P1", 10, 2)]).await;
    let before = h.state();

    h.cart.expect_clear_cart().return_err(server_error());
    let failed = h.client().clear().await.unwrap();
    assert!(!failed.is_committed());
    assert_eq!(h.state(), before);
    assert_eq!(
        drain(&mut h.notices),
        vec![Notice::error("Could not clear the cart.")]
    );

    h.cart.expect_clear_cart().return_ok(());
    let cleared = h.client().clear().await.unwrap();
    assert!(cleared.is_committed());
    assert!(h.state().is_empty());
    h.cart.verify();
}

#[tokio::test]
async fn test_successful_sequence_keeps_subtotal_consistent() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 2)]).await;
    h.cart.expect_add_item().return_ok(LineId::from("l2"));
    h.cart.expect_update_item().return_ok(());
    h.cart.expect_update_item().return_ok(());
    h.cart.expect_remove_item().return_ok(());

    let client = h.client();
    client
        .add(ProductRef::new("P2", "Zinc", Decimal::new(250, 2), ""), 4)
        .await
        .unwrap();
    client.change_quantity(LineId::from("l1"), 1).await.unwrap();
    client
        .add(ProductRef::new("P2", "Zinc", Decimal::new(250, 2), ""), 2)
        .await
        .unwrap();
    client.change_quantity(LineId::from("l1"), -3).await.unwrap();

    let state = h.state();
    let expected: Decimal = state
        .lines
        .iter()
        .map(|l| l.price * Decimal::from(l.quantity))
        .sum();
    assert_eq!(state.subtotal(), expected);
    assert_eq!(state.subtotal(), Decimal::from(15));
    assert_eq!(state.item_count(), 6);
    h.cart.verify();
}

// =============================================================================
// SUBMIT ORDER
// =============================================================================

#[tokio::test]
async fn test_submit_on_empty_cart_fails_before_network() {
    let h = Harness::with_cart(vec![]).await;
    let calls_before = h.cart.calls().len();

    let result = h.client().submit_order(details()).await;

    assert!(matches!(result, Err(CartError::EmptyCart)));
    assert!(h.orders.orders().is_empty());
    assert_eq!(h.cart.calls().len(), calls_before);
    assert!(!h.client().is_submitting());
}

/// Has a token but no user record.
struct TokenOnly;

impl CredentialStore for TokenOnly {
    fn token(&self) -> Option<SecretString> {
        Some(SecretString::from("token-1".to_string()))
    }

    fn user(&self) -> Option<UserIdentity> {
        None
    }

    fn clear(&self) {}
}

#[tokio::test]
async fn test_submit_without_identity_fails_before_network() {
    let cart = Arc::new(ScriptedCartService::new());
    let orders = Arc::new(ScriptedOrderService::new());
    let (notifier, _notices) = ChannelNotifier::new();
    let context = CartContext::new(
        cart.clone(),
        orders.clone(),
        Arc::new(TokenOnly),
        Arc::new(MemoryCartCache::new()),
        Arc::new(notifier),
    )
    .with_settings(SyncSettings::immediate());
    let system = CartSystem::start(context, 8);

    cart.expect_get_cart().return_ok(vec![item("l1", "P1", 10, 2)]);
    system.cart_client.refresh().await.unwrap();
    let before = system.cart_client.state();

    let result = system.cart_client.submit_order(details()).await;

    assert!(matches!(result, Err(CartError::NotLoggedIn)));
    assert!(orders.orders().is_empty());
    assert_eq!(system.cart_client.state(), before);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_submit_order_clears_cart_and_refreshes() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 2), item("l2", "P2", 4, 1)]).await;
    h.orders
        .expect_create_order()
        .return_ok(json!({ "order": { "_id": "order-42" } }));
    // Server still reports a line the order did not consume
    h.cart.expect_get_cart().return_ok(vec![item("l9", "P9", 6, 1)]);

    let receipt = h.client().submit_order(details()).await.unwrap();

    assert_eq!(receipt.order_id(), Some("order-42"));
    let state = h.state();
    assert_eq!(state.lines.len(), 1);
    assert_eq!(state.lines[0].id, LineId::from("l9"));
    assert_eq!(state.subtotal(), Decimal::from(6));
    assert!(!h.client().is_submitting());
    assert_eq!(h.cache.load().unwrap(), Some(state.lines));
    // Initial load plus the reconciling refresh
    assert_eq!(
        h.cart
            .calls()
            .iter()
            .filter(|c| **c == RecordedCall::GetCart)
            .count(),
        2
    );

    let orders = h.orders.orders();
    assert_eq!(orders.len(), 1);
    let payload = serde_json::to_value(&orders[0]).unwrap();
    assert_eq!(payload["customerId"], "u1");
    assert_eq!(payload["recipientName"], "Nguyen Van A");
    assert_eq!(payload["paymentMethod"], "cod");
    assert_eq!(
        payload["items"],
        json!([
            { "productId": "P1", "quantity": 2, "unitPrice": 10.0 },
            { "productId": "P2", "quantity": 1, "unitPrice": 4.0 }
        ])
    );
    h.cart.verify();
    h.orders.verify();
}

#[tokio::test]
async fn test_failed_submit_leaves_cart_untouched() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 2)]).await;
    let before = h.state();
    h.orders.expect_create_order().return_err(server_error());

    let result = h.client().submit_order(details()).await;

    assert!(matches!(result, Err(CartError::Service(_))));
    assert_eq!(h.state(), before);
    assert!(!h.client().is_submitting());
    assert!(h.cache.load().unwrap().is_some());
}

// =============================================================================
// FORCE / SCHEDULED REFRESH & LOGOUT
// =============================================================================

#[tokio::test]
async fn test_force_refresh_cancels_scheduled_refresh() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 2)]).await;
    h.cart.expect_get_cart().return_ok(vec![item("l1", "P1", 10, 3)]);

    h.client()
        .schedule_refresh(Duration::from_millis(50))
        .await
        .unwrap();
    let outcome = h.client().force_refresh().await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Synced { lines: 1 });
    assert_eq!(h.state().lines[0].quantity, 3);

    tokio::time::sleep(Duration::from_millis(150)).await;

    // Only the initial load and the forced refresh reached the service
    assert_eq!(h.cart.calls().len(), 2);
    h.cart.verify();
}

#[tokio::test]
async fn test_force_refresh_swallows_failure() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 2)]).await;
    h.cart.expect_get_cart().return_err(server_error());

    let outcome = h.client().force_refresh().await.unwrap();

    assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
    assert!(h.state().is_empty());
}

#[tokio::test]
async fn test_scheduled_refresh_fires() {
    let h = Harness::signed_in();
    h.cart.expect_get_cart().return_ok(vec![item("l1", "P1", 10, 2)]);
    let mut view = h.client().subscribe();

    h.client()
        .schedule_refresh(Duration::from_millis(10))
        .await
        .unwrap();

    tokio::time::timeout(
        Duration::from_secs(1),
        view.wait_for(|state| !state.lines.is_empty()),
    )
    .await
    .expect("scheduled refresh did not run")
    .unwrap();
    h.cart.verify();
}

#[tokio::test]
async fn test_logout_forgets_everything_without_network() {
    let h = Harness::with_cart(vec![item("l1", "P1", 10, 2)]).await;
    let calls_before = h.cart.calls().len();

    h.client().logout().await.unwrap();

    assert!(h.state().is_empty());
    assert!(h.credentials.token().is_none());
    assert!(h.credentials.user().is_none());
    assert_eq!(h.cache.load().unwrap(), None);
    assert_eq!(h.cart.calls().len(), calls_before);

    // Signed out now, so a refresh stays local
    assert_eq!(
        h.client().refresh().await.unwrap(),
        RefreshOutcome::SignedOut
    );
}

// =============================================================================
// IN-FLIGHT STATE
// =============================================================================

#[tokio::test]
async fn test_optimistic_state_is_visible_while_request_is_in_flight() {
    let (cart, mut calls) = create_mock_cart_service(8);
    let (notifier, _notices) = ChannelNotifier::new();
    let context = CartContext::new(
        Arc::new(cart),
        Arc::new(ScriptedOrderService::new()),
        Arc::new(MemoryCredentialStore::signed_in("t", UserIdentity::new("u1"))),
        Arc::new(MemoryCartCache::new()),
        Arc::new(notifier),
    )
    .with_settings(SyncSettings::immediate());
    let system = CartSystem::start(context, 8);
    let client = system.cart_client.clone();

    // Loading flag while the fetch is pending
    let refresh = tokio::spawn({
        let client = client.clone();
        async move { client.refresh().await }
    });
    let respond_to = expect_get_cart(&mut calls).await.unwrap();
    assert!(client.is_loading());
    respond_to.send(Ok(vec![item("l1", "P1", 10, 2)])).unwrap();
    refresh.await.unwrap().unwrap();
    assert!(!client.is_loading());

    // Optimistic quantity before the server answers, then rollback
    let change = tokio::spawn({
        let client = client.clone();
        async move { client.change_quantity(LineId::from("l1"), 3).await }
    });
    let (line_id, quantity, respond_to) = expect_update_item(&mut calls).await.unwrap();
    assert_eq!(line_id, LineId::from("l1"));
    assert_eq!(quantity, 5);
    assert_eq!(client.state().lines[0].quantity, 5);
    respond_to.send(Err(server_error())).unwrap();

    let outcome = change.await.unwrap().unwrap();
    assert!(matches!(outcome, MutationOutcome::RolledBack { .. }));
    assert_eq!(client.state().lines[0].quantity, 2);

    // Placeholder line is visible while the add is pending
    let add = tokio::spawn({
        let client = client.clone();
        async move {
            client
                .add(ProductRef::new("P2", "Zinc", Decimal::from(2), ""), 1)
                .await
        }
    });
    let (product_id, _, respond_to) = expect_add_item(&mut calls).await.unwrap();
    assert_eq!(product_id, ProductId::from("P2"));
    let pending = client.state();
    assert_eq!(pending.lines.len(), 2);
    assert!(pending.lines[1].id.is_pending());
    respond_to.send(Ok(LineId::from("l2"))).unwrap();
    add.await.unwrap().unwrap();
    assert_eq!(client.state().lines[1].id, LineId::from("l2"));

    drop(client);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_cart_is_empty_before_post_order_refresh_answers() {
    let (cart, mut calls) = create_mock_cart_service(8);
    let orders = Arc::new(ScriptedOrderService::new());
    let cache = Arc::new(MemoryCartCache::new());
    let (notifier, _notices) = ChannelNotifier::new();
    let context = CartContext::new(
        Arc::new(cart),
        orders.clone(),
        Arc::new(MemoryCredentialStore::signed_in("t", UserIdentity::new("u1"))),
        cache.clone(),
        Arc::new(notifier),
    )
    .with_settings(SyncSettings::immediate());
    let system = CartSystem::start(context, 8);
    let client = system.cart_client.clone();

    let refresh = tokio::spawn({
        let client = client.clone();
        async move { client.refresh().await }
    });
    let respond_to = expect_get_cart(&mut calls).await.unwrap();
    respond_to
        .send(Ok(vec![item("l1", "P1", 10, 2), item("l2", "P2", 4, 1)]))
        .unwrap();
    refresh.await.unwrap().unwrap();
    assert!(cache.load().unwrap().is_some());

    orders
        .expect_create_order()
        .return_ok(json!({ "_id": "order-7" }));
    let submit = tokio::spawn({
        let client = client.clone();
        async move { client.submit_order(details()).await }
    });

    // Order accepted, reconciling fetch not answered yet
    let respond_to = expect_get_cart(&mut calls).await.unwrap();
    assert!(client.state().lines.is_empty());
    assert_eq!(client.subtotal(), Decimal::ZERO);
    assert_eq!(cache.load().unwrap(), None);
    assert!(client.is_submitting());

    respond_to.send(Ok(vec![item("l5", "P5", 3, 4)])).unwrap();
    let receipt = submit.await.unwrap().unwrap();

    assert_eq!(receipt.order_id(), Some("order-7"));
    let state = client.state();
    assert_eq!(state.lines.len(), 1);
    assert_eq!(state.lines[0].id, LineId::from("l5"));
    assert_eq!(state.lines[0].quantity, 4);
    assert!(!client.is_submitting());
    assert_eq!(orders.orders().len(), 1);

    drop(client);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_file_cache_follows_cart_from_actor_task() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.json");
    let cart = Arc::new(ScriptedCartService::new());
    let cache = Arc::new(FileCartCache::new(&path));
    let (notifier, _notices) = ChannelNotifier::new();
    let context = CartContext::new(
        cart.clone(),
        Arc::new(ScriptedOrderService::new()),
        Arc::new(MemoryCredentialStore::signed_in("t", UserIdentity::new("u1"))),
        cache.clone(),
        Arc::new(notifier),
    )
    .with_settings(SyncSettings::immediate());
    let system = CartSystem::start(context, 8);

    cart.expect_get_cart().return_ok(vec![item("l1", "P1", 10, 2)]);
    system.cart_client.refresh().await.unwrap();
    assert!(path.exists());
    assert_eq!(cache.load().unwrap(), Some(system.cart_client.state().lines));

    system.cart_client.logout().await.unwrap();
    assert!(!path.exists());
    assert_eq!(cache.load().unwrap(), None);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_completes() {
    let h = Harness::signed_in();
    h.system.shutdown().await.unwrap();
}
