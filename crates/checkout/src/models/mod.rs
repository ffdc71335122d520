//! Domain models for the checkout core.
//!
//! `Product` is the mutable source of truth for current price and stock,
//! consulted at validation time. `Order` + `OrderLine` are the append-mostly
//! system of record: order lines freeze the product name and unit price at
//! capture time, so later catalog changes never alter historical orders.
//! `CartLine` is ephemeral working state, owned exclusively by its user.

pub mod inputs;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tamarind_core::{OrderId, OrderStatus, PaymentReference, ProductId, UserId};

/// A catalog product.
///
/// Stock is only ever mutated by the post-payment decrement (clamped at
/// zero); cart and order read paths never write it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub stock: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One (user, product, quantity) row representing intent to purchase.
///
/// Unique per (user, product); quantity is always >= 1.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartLine {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shipping address snapshot captured at order-creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShippingAddress {
    pub recipient: String,
    pub address_line: String,
    pub postal_code: String,
    pub address_detail: Option<String>,
    pub phone: String,
}

impl ShippingAddress {
    /// Placeholder snapshot used when a settled payment arrives without an
    /// address. Payment success must not be stranded by a missing address;
    /// the real address is collected out of band.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            recipient: "(address pending)".to_owned(),
            address_line: "(address pending)".to_owned(),
            postal_code: "00000".to_owned(),
            address_detail: None,
            phone: "(phone pending)".to_owned(),
        }
    }
}

/// An immutable-after-creation purchase record.
///
/// `total` is always server-computed, never client-supplied.
/// `payment_reference` is present on reconciled (payment-first) orders and
/// unique across all orders; it is the idempotency key for duplicate
/// gateway callbacks.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Decimal,
    pub status: OrderStatus,
    #[sqlx(flatten)]
    pub shipping: ShippingAddress,
    pub note: Option<String>,
    pub payment_reference: Option<PaymentReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A frozen snapshot of one purchased product at order time.
///
/// Written once, atomically with its order; never shared across orders.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderLine {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl OrderLine {
    /// Line subtotal: unit price at capture time times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
