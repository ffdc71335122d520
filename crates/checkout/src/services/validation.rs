//! Shared cart validation.
//!
//! Both order-producing workflows run this routine: order creation once, and
//! payment reconciliation again independently, because stock may have
//! changed between checkout initiation and payment completion. It performs
//! no writes.

use rust_decimal::Decimal;
use serde::Serialize;

use tamarind_core::{ProductId, UserId};

use crate::stores::{CartStore, InventoryStore};

use super::CheckoutError;

/// One purchasable line with the product state frozen at validation time.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl ValidatedLine {
    /// Line subtotal at the validated unit price.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A validated cart: ordered line snapshots and the authoritative total.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedCart {
    pub lines: Vec<ValidatedLine>,
    /// Exact decimal sum of `unit_price * quantity` over all lines.
    pub total: Decimal,
}

/// Validate a user's cart against current product state.
///
/// Checks, in order per line: the product exists, is active, has non-zero
/// stock, and has at least the requested quantity. An empty cart fails
/// before any product lookup.
///
/// # Errors
///
/// - `CheckoutError::EmptyCart` when the cart has no lines
/// - `CheckoutError::InactiveProduct` when a product is deactivated
/// - `CheckoutError::OutOfStock` when current stock is exactly zero
/// - `CheckoutError::InsufficientStock` when stock is short of the request
/// - `CheckoutError::Repository` on store failure
pub async fn validate_cart(
    inventory: &dyn InventoryStore,
    cart: &dyn CartStore,
    user_id: &UserId,
) -> Result<ValidatedCart, CheckoutError> {
    let cart_lines = cart.lines(user_id).await?;

    if cart_lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut lines = Vec::with_capacity(cart_lines.len());
    let mut total = Decimal::ZERO;

    for cart_line in cart_lines {
        // A cart line pointing at a deleted product is treated the same as
        // a deactivated one: the item can no longer be purchased.
        let product = match inventory.get_product(cart_line.product_id).await? {
            Some(product) if product.active => product,
            Some(product) => {
                return Err(CheckoutError::InactiveProduct {
                    product_id: product.id,
                    name: product.name,
                });
            }
            None => {
                return Err(CheckoutError::InactiveProduct {
                    product_id: cart_line.product_id,
                    name: format!("product {}", cart_line.product_id),
                });
            }
        };

        if product.stock == 0 {
            return Err(CheckoutError::OutOfStock {
                product_id: product.id,
                name: product.name,
            });
        }
        if cart_line.quantity > product.stock {
            return Err(CheckoutError::InsufficientStock {
                product_id: product.id,
                name: product.name,
                requested: cart_line.quantity,
                available: product.stock,
            });
        }

        let line = ValidatedLine {
            product_id: product.id,
            name: product.name,
            quantity: cart_line.quantity,
            unit_price: product.unit_price,
        };
        total += line.subtotal();
        lines.push(line);
    }

    tracing::debug!(
        user_id = %user_id,
        line_count = lines.len(),
        total = %total,
        "cart validated"
    );

    Ok(ValidatedCart { lines, total })
}
