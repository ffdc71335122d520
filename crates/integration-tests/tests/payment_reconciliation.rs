//! Payment reconciliation: the payment-first workflow, its irreversible
//! gateway call, best-effort tail, idempotency, and concurrency.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal_macros::dec;

use tamarind_checkout::models::ShippingAddress;
use tamarind_checkout::models::inputs::ConfirmPaymentInput;
use tamarind_checkout::services::{CheckoutError, PaymentService, UserLocks};
use tamarind_checkout::stores::{CartStore, MemoryStore, OrderStore};
use tamarind_core::{OrderStatus, PaymentReference, UserId};
use tamarind_integration_tests::{
    FailingCartStore, FailingInventoryStore, FailingOrderStore, Harness, MockGateway,
    confirm_input,
};

#[tokio::test]
async fn test_approved_payment_confirms_order_decrements_stock_clears_cart() {
    // Scenario: cart total 20000, claimed amount 20000, gateway approves.
    let harness = Harness::new();
    let user = UserId::new("user-1");
    let mug = harness
        .store
        .insert_product("Mug", dec!(10000), 5, true)
        .await;
    harness.store.add_line(&user, mug.id, 2).await.unwrap();

    let receipt = harness
        .payments
        .confirm_payment(&user, confirm_input("pay_1", dec!(20000)))
        .await
        .unwrap();

    assert_eq!(receipt.total, dec!(20000));
    assert_eq!(harness.gateway.call_count(), 1);

    let order = harness.store.get_order(receipt.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(
        order.payment_reference,
        Some(PaymentReference::new("pay_1"))
    );
    assert_eq!(harness.store.product_stock(mug.id).await, Some(3));
    assert!(harness.store.lines(&user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_amount_mismatch_never_reaches_gateway() {
    // Scenario: cart total 20000, claimed amount 19999.
    let harness = Harness::new();
    let user = UserId::new("user-1");
    let mug = harness
        .store
        .insert_product("Mug", dec!(10000), 5, true)
        .await;
    harness.store.add_line(&user, mug.id, 2).await.unwrap();

    let err = harness
        .payments
        .confirm_payment(&user, confirm_input("pay_1", dec!(19999)))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::AmountMismatch { .. }));
    assert_eq!(harness.gateway.call_count(), 0);
    assert_eq!(harness.store.order_count().await, 0);
    assert_eq!(harness.store.product_stock(mug.id).await, Some(5));
}

#[tokio::test]
async fn test_invalid_cart_never_reaches_gateway() {
    let harness = Harness::new();
    let user = UserId::new("user-1");
    let mug = harness
        .store
        .insert_product("Mug", dec!(10000), 1, true)
        .await;
    harness.store.add_line(&user, mug.id, 2).await.unwrap();

    let err = harness
        .payments
        .confirm_payment(&user, confirm_input("pay_1", dec!(20000)))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
    assert_eq!(harness.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_empty_cart_never_reaches_gateway() {
    let harness = Harness::new();
    let user = UserId::new("user-1");

    let err = harness
        .payments
        .confirm_payment(&user, confirm_input("pay_1", dec!(20000)))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(harness.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_input_never_reaches_gateway() {
    let harness = Harness::new();
    let user = UserId::new("user-1");

    let err = harness
        .payments
        .confirm_payment(&user, confirm_input("", dec!(20000)))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::InvalidInput(_)));
    assert_eq!(harness.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_declined_payment_mutates_nothing() {
    let harness = Harness::with_gateway(MockGateway::with_status("CANCELED"));
    let user = UserId::new("user-1");
    let mug = harness
        .store
        .insert_product("Mug", dec!(10000), 5, true)
        .await;
    harness.store.add_line(&user, mug.id, 2).await.unwrap();

    let err = harness
        .payments
        .confirm_payment(&user, confirm_input("pay_1", dec!(20000)))
        .await
        .unwrap_err();

    match err {
        CheckoutError::PaymentNotApproved { status } => assert_eq!(status, "CANCELED"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(harness.gateway.call_count(), 1);
    assert_eq!(harness.store.order_count().await, 0);
    assert_eq!(harness.store.product_stock(mug.id).await, Some(5));
    assert_eq!(harness.store.lines(&user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_address_falls_back_to_placeholder() {
    let harness = Harness::new();
    let user = UserId::new("user-1");
    let mug = harness
        .store
        .insert_product("Mug", dec!(10000), 5, true)
        .await;
    harness.store.add_line(&user, mug.id, 1).await.unwrap();

    let input = ConfirmPaymentInput {
        shipping: None,
        ..confirm_input("pay_1", dec!(10000))
    };
    let receipt = harness.payments.confirm_payment(&user, input).await.unwrap();

    // Payment success must not be stranded by a missing address.
    let order = harness.store.get_order(receipt.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.shipping, ShippingAddress::placeholder());
}

#[tokio::test]
async fn test_order_survives_stock_decrement_failure() {
    let store = Arc::new(MemoryStore::new());
    let gateway = MockGateway::approving();
    let payments = PaymentService::new(
        FailingInventoryStore::new(store.clone()),
        store.clone(),
        store.clone(),
        gateway.clone(),
        UserLocks::new(),
    );
    let user = UserId::new("user-1");
    let mug = store.insert_product("Mug", dec!(10000), 5, true).await;
    store.add_line(&user, mug.id, 2).await.unwrap();

    let receipt = payments
        .confirm_payment(&user, confirm_input("pay_1", dec!(20000)))
        .await
        .unwrap();

    // The charge succeeded, so the order stands; inventory drift is an
    // operational alert, not a transaction abort.
    let order = store.get_order(receipt.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(store.product_stock(mug.id).await, Some(5));
    assert!(store.lines(&user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_order_survives_cart_clear_failure() {
    let store = Arc::new(MemoryStore::new());
    let gateway = MockGateway::approving();
    let payments = PaymentService::new(
        store.clone(),
        FailingCartStore::new(store.clone()),
        store.clone(),
        gateway.clone(),
        UserLocks::new(),
    );
    let user = UserId::new("user-1");
    let mug = store.insert_product("Mug", dec!(10000), 5, true).await;
    store.add_line(&user, mug.id, 2).await.unwrap();

    let receipt = payments
        .confirm_payment(&user, confirm_input("pay_1", dec!(20000)))
        .await
        .unwrap();

    let order = store.get_order(receipt.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    // Stock was still decremented even though the cart lingered.
    assert_eq!(store.product_stock(mug.id).await, Some(3));
}

#[tokio::test]
async fn test_persistence_failure_after_approval_is_reconciliation_error() {
    let store = Arc::new(MemoryStore::new());
    let failing_orders = FailingOrderStore::new(store.clone());
    let gateway = MockGateway::approving();
    let payments = PaymentService::new(
        store.clone(),
        store.clone(),
        failing_orders.clone(),
        gateway.clone(),
        UserLocks::new(),
    );
    let user = UserId::new("user-1");
    let mug = store.insert_product("Mug", dec!(10000), 5, true).await;
    store.add_line(&user, mug.id, 2).await.unwrap();

    failing_orders.fail_next_creates();
    let err = payments
        .confirm_payment(&user, confirm_input("pay_1", dec!(20000)))
        .await
        .unwrap_err();

    // The charge happened; the error category must say so.
    match err {
        CheckoutError::OrderPersistenceFailed {
            payment_reference, ..
        } => assert_eq!(payment_reference, PaymentReference::new("pay_1")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(gateway.call_count(), 1);
    // No stock was consumed and the cart is intact for manual follow-up.
    assert_eq!(store.product_stock(mug.id).await, Some(5));
    assert_eq!(store.lines(&user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_callback_is_idempotent() {
    let harness = Harness::new();
    let user = UserId::new("user-1");
    let mug = harness
        .store
        .insert_product("Mug", dec!(10000), 5, true)
        .await;
    harness.store.add_line(&user, mug.id, 2).await.unwrap();

    let first = harness
        .payments
        .confirm_payment(&user, confirm_input("pay_1", dec!(20000)))
        .await
        .unwrap();
    let second = harness
        .payments
        .confirm_payment(&user, confirm_input("pay_1", dec!(20000)))
        .await
        .unwrap();

    assert_eq!(first.order_id, second.order_id);
    assert_eq!(harness.store.order_count().await, 1);
    // The gateway is only ever confirmed once per payment reference.
    assert_eq!(harness.gateway.call_count(), 1);
    // Stock was decremented exactly once.
    assert_eq!(harness.store.product_stock(mug.id).await, Some(3));
}

#[tokio::test]
async fn test_concurrent_duplicate_callbacks_produce_one_order() {
    let harness = Harness::new();
    let user = UserId::new("user-1");
    let mug = harness
        .store
        .insert_product("Mug", dec!(10000), 5, true)
        .await;
    harness.store.add_line(&user, mug.id, 2).await.unwrap();

    let (a, b) = tokio::join!(
        harness
            .payments
            .confirm_payment(&user, confirm_input("pay_1", dec!(20000))),
        harness
            .payments
            .confirm_payment(&user, confirm_input("pay_1", dec!(20000))),
    );

    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.order_id, b.order_id);
    assert_eq!(harness.store.order_count().await, 1);
    assert_eq!(harness.gateway.call_count(), 1);
    assert_eq!(harness.store.product_stock(mug.id).await, Some(3));
}

#[tokio::test]
async fn test_concurrent_distinct_submissions_for_one_cart() {
    // Two different payment references racing for the same cart: the
    // per-user lock serializes them, and the loser finds the cart already
    // cleared.
    let harness = Harness::new();
    let user = UserId::new("user-1");
    let mug = harness
        .store
        .insert_product("Mug", dec!(10000), 5, true)
        .await;
    harness.store.add_line(&user, mug.id, 2).await.unwrap();

    let (a, b) = tokio::join!(
        harness
            .payments
            .confirm_payment(&user, confirm_input("pay_a", dec!(20000))),
        harness
            .payments
            .confirm_payment(&user, confirm_input("pay_b", dec!(20000))),
    );

    let outcomes = [a, b];
    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one submission may win the cart");
    assert!(
        outcomes
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, CheckoutError::EmptyCart)),
        "the loser must fail cart validation, not reach the gateway"
    );
    assert_eq!(harness.store.order_count().await, 1);
    assert_eq!(harness.gateway.call_count(), 1);
    assert_eq!(harness.store.product_stock(mug.id).await, Some(3));
}

#[tokio::test]
async fn test_transport_failure_leaves_no_local_writes() {
    // Unknown outcome: the request may or may not have settled. This
    // service writes nothing and surfaces the gateway error; resolution
    // requires an out-of-band reconciliation sweep.
    let harness = Harness::new();
    harness.gateway.fail_transport();
    let user = UserId::new("user-1");
    let mug = harness
        .store
        .insert_product("Mug", dec!(10000), 5, true)
        .await;
    harness.store.add_line(&user, mug.id, 2).await.unwrap();

    let err = harness
        .payments
        .confirm_payment(&user, confirm_input("pay_1", dec!(20000)))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Gateway(_)));
    assert_eq!(harness.store.order_count().await, 0);
    assert_eq!(harness.store.product_stock(mug.id).await, Some(5));
    assert_eq!(harness.store.lines(&user).await.unwrap().len(), 1);
}
