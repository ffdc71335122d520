//! Shared cart validation properties.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tamarind_checkout::services::{CheckoutError, validate_cart};
use tamarind_checkout::stores::CartStore;
use tamarind_core::UserId;
use tamarind_integration_tests::Harness;

#[tokio::test]
async fn test_total_is_exact_for_a_thousand_lines() {
    let harness = Harness::new();
    let user = UserId::new("user-1");

    // Fractional prices in cents; any binary floating point along the way
    // would drift across a sum this long.
    let mut expected = Decimal::ZERO;
    for i in 1..=1000_i64 {
        let price = Decimal::new(i, 2);
        let quantity = i32::try_from(i % 7).unwrap() + 1;
        let product = harness
            .store
            .insert_product(&format!("Product {i}"), price, 1000, true)
            .await;
        harness
            .store
            .add_line(&user, product.id, quantity)
            .await
            .unwrap();
        expected += price * Decimal::from(quantity);
    }

    let validated = validate_cart(harness.store.as_ref(), harness.store.as_ref(), &user)
        .await
        .unwrap();

    assert_eq!(validated.lines.len(), 1000);
    assert_eq!(validated.total, expected);
}

#[tokio::test]
async fn test_lines_snapshot_current_name_and_price() {
    let harness = Harness::new();
    let user = UserId::new("user-1");
    let product = harness
        .store
        .insert_product("Ceramic Mug", dec!(10000), 5, true)
        .await;
    harness.store.add_line(&user, product.id, 2).await.unwrap();

    let validated = validate_cart(harness.store.as_ref(), harness.store.as_ref(), &user)
        .await
        .unwrap();

    let line = &validated.lines[0];
    assert_eq!(line.product_id, product.id);
    assert_eq!(line.name, "Ceramic Mug");
    assert_eq!(line.quantity, 2);
    assert_eq!(line.unit_price, dec!(10000));
    assert_eq!(validated.total, dec!(20000));
}

#[tokio::test]
async fn test_validation_failure_makes_no_writes() {
    let harness = Harness::new();
    let user = UserId::new("user-1");
    let scarce = harness
        .store
        .insert_product("Scarce", dec!(5000), 1, true)
        .await;
    harness.store.add_line(&user, scarce.id, 3).await.unwrap();

    let err = validate_cart(harness.store.as_ref(), harness.store.as_ref(), &user)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
    assert_eq!(harness.store.product_stock(scarce.id).await, Some(1));
    assert_eq!(harness.store.lines(&user).await.unwrap().len(), 1);
    assert_eq!(harness.store.order_count().await, 0);
}

#[tokio::test]
async fn test_zero_stock_is_out_of_stock() {
    let harness = Harness::new();
    let user = UserId::new("user-1");
    let gone = harness
        .store
        .insert_product("Gone", dec!(5000), 0, true)
        .await;
    harness.store.add_line(&user, gone.id, 1).await.unwrap();

    let err = validate_cart(harness.store.as_ref(), harness.store.as_ref(), &user)
        .await
        .unwrap_err();

    // Distinct from InsufficientStock: the item should be removed, not
    // reduced.
    assert!(matches!(err, CheckoutError::OutOfStock { .. }));
}

#[tokio::test]
async fn test_insufficient_stock_reports_both_counts() {
    let harness = Harness::new();
    let user = UserId::new("user-1");
    let scarce = harness
        .store
        .insert_product("Scarce", dec!(5000), 2, true)
        .await;
    harness.store.add_line(&user, scarce.id, 5).await.unwrap();

    let err = validate_cart(harness.store.as_ref(), harness.store.as_ref(), &user)
        .await
        .unwrap_err();

    match err {
        CheckoutError::InsufficientStock {
            requested,
            available,
            ..
        } => {
            assert_eq!(requested, 5);
            assert_eq!(available, 2);
            // Callers render this message directly.
            let message = CheckoutError::InsufficientStock {
                product_id: scarce.id,
                name: "Scarce".to_owned(),
                requested,
                available,
            }
            .to_string();
            assert!(message.contains('2'));
            assert!(message.contains('5'));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_empty_cart_rejected_before_any_lookup() {
    let harness = Harness::new();
    let user = UserId::new("user-with-no-cart");

    let err = validate_cart(harness.store.as_ref(), harness.store.as_ref(), &user)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
}
