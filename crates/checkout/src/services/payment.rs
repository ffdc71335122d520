//! Payment reconciliation: turning an externally-confirmed payment into
//! durable local order and inventory state.
//!
//! The gateway confirmation in the middle of this sequence is irreversible.
//! Everything before it is a clean rejection; everything after it may only
//! retry persistence or surface a degraded state, never undo the charge.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use tamarind_core::{OrderId, OrderStatus, PaymentReference, UserId, amounts_match};

use crate::db::RepositoryError;
use crate::gateway::{ConfirmationRequest, PaymentGateway};
use crate::models::ShippingAddress;
use crate::models::inputs::ConfirmPaymentInput;
use crate::stores::{CartStore, InventoryStore, NewOrder, NewOrderLine, OrderStore};

use super::{CheckoutError, UserLocks, validate_cart};

/// Successful reconciliation result.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub order_id: OrderId,
    pub payment_reference: PaymentReference,
    pub total: Decimal,
}

/// Payment reconciliation service (payment-first path).
#[derive(Clone)]
pub struct PaymentService {
    inventory: Arc<dyn InventoryStore>,
    cart: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
    locks: UserLocks,
}

impl PaymentService {
    #[must_use]
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        cart: Arc<dyn CartStore>,
        orders: Arc<dyn OrderStore>,
        gateway: Arc<dyn PaymentGateway>,
        locks: UserLocks,
    ) -> Self {
        Self {
            inventory,
            cart,
            orders,
            gateway,
            locks,
        }
    }

    /// Reconcile a payment-provider callback into a confirmed order.
    ///
    /// Sequence: input validation, idempotency lookup, cart re-validation,
    /// amount check, gateway confirmation (the point of no return), atomic
    /// order+lines insert, best-effort stock decrement, best-effort cart
    /// clear. The caller's lock is held from re-validation through cart
    /// clear so two submissions for the same cart cannot interleave.
    ///
    /// At-most-once per payment reference: a reference that already has an
    /// order short-circuits with that order's receipt and never reaches the
    /// gateway; the unique constraint on the reference backstops races.
    ///
    /// # Errors
    ///
    /// Everything up to the gateway call rejects cleanly with no local
    /// writes. After approval the only surfaced failure is
    /// `CheckoutError::OrderPersistenceFailed`; stock and cart tail
    /// failures are logged, not returned.
    pub async fn confirm_payment(
        &self,
        user_id: &UserId,
        input: ConfirmPaymentInput,
    ) -> Result<PaymentReceipt, CheckoutError> {
        input.validate()?;

        let _guard = self.locks.acquire(user_id).await;

        // Duplicate callback for an already-reconciled payment.
        if let Some(existing) = self
            .orders
            .find_by_payment_reference(&input.payment_reference)
            .await?
        {
            tracing::info!(
                user_id = %user_id,
                order_id = %existing.id,
                payment_reference = %input.payment_reference,
                "payment already reconciled, returning existing order"
            );
            return Ok(PaymentReceipt {
                order_id: existing.id,
                payment_reference: input.payment_reference,
                total: existing.total,
            });
        }

        // The gateway must never be called for a cart that is already
        // known-invalid.
        let validated = validate_cart(self.inventory.as_ref(), self.cart.as_ref(), user_id).await?;

        if !amounts_match(validated.total, input.amount) {
            tracing::info!(
                user_id = %user_id,
                expected = %validated.total,
                claimed = %input.amount,
                payment_reference = %input.payment_reference,
                "payment rejected before gateway, claimed amount is stale"
            );
            return Err(CheckoutError::AmountMismatch {
                expected: validated.total,
                claimed: input.amount,
            });
        }

        // Point of no return. On approval, money has moved.
        let outcome = self
            .gateway
            .confirm(&ConfirmationRequest {
                payment_reference: input.payment_reference.clone(),
                order_reference: input.order_reference.clone(),
                amount: validated.total,
            })
            .await?;

        if !outcome.is_approved() {
            tracing::info!(
                user_id = %user_id,
                payment_reference = %input.payment_reference,
                gateway_status = %outcome.status,
                "gateway did not approve payment"
            );
            return Err(CheckoutError::PaymentNotApproved {
                status: outcome.status,
            });
        }

        tracing::info!(
            user_id = %user_id,
            payment_reference = %input.payment_reference,
            amount = %validated.total,
            approved_at = ?outcome.approved_at,
            "payment approved by gateway"
        );

        let shipping = input
            .shipping
            .unwrap_or_else(ShippingAddress::placeholder);

        let new_order = NewOrder {
            user_id: user_id.clone(),
            total: validated.total,
            status: OrderStatus::Confirmed,
            shipping,
            note: input.note,
            payment_reference: Some(input.payment_reference.clone()),
            lines: validated
                .lines
                .iter()
                .map(|line| NewOrderLine {
                    product_id: line.product_id,
                    product_name: line.name.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
                .collect(),
        };

        let order = match self.orders.create_order(new_order).await {
            Ok(order) => order,
            // A concurrent callback won the unique constraint on the
            // payment reference; its order is the authoritative one.
            Err(RepositoryError::Conflict(_)) => {
                let existing = self
                    .orders
                    .find_by_payment_reference(&input.payment_reference)
                    .await?
                    .ok_or(CheckoutError::NotFound)?;
                return Ok(PaymentReceipt {
                    order_id: existing.id,
                    payment_reference: input.payment_reference,
                    total: existing.total,
                });
            }
            Err(source) => {
                // The charge stands. Logged for manual reconciliation, and
                // surfaced as its own category so the caller tells the user
                // they were charged.
                tracing::error!(
                    user_id = %user_id,
                    payment_reference = %input.payment_reference,
                    amount = %validated.total,
                    error = %source,
                    "RECONCILIATION REQUIRED: payment approved but order could not be recorded"
                );
                return Err(CheckoutError::OrderPersistenceFailed {
                    payment_reference: input.payment_reference,
                    source,
                });
            }
        };

        // Best-effort tail: the order is confirmed and charged, so from
        // here inventory drift and a lingering cart are operational alerts,
        // not transaction aborts.
        for line in &validated.lines {
            match self
                .inventory
                .decrement_stock(line.product_id, line.quantity)
                .await
            {
                Ok(result) if result.clamped => {
                    tracing::warn!(
                        order_id = %order.id,
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        new_stock = result.new_stock,
                        "stock decrement clamped at zero, inventory drifted"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        order_id = %order.id,
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        error = %e,
                        "stock decrement failed, skipping line"
                    );
                }
            }
        }

        if let Err(e) = self.cart.clear(user_id).await {
            tracing::warn!(
                order_id = %order.id,
                user_id = %user_id,
                error = %e,
                "cart clear failed after confirmed order"
            );
        }

        tracing::info!(
            user_id = %user_id,
            order_id = %order.id,
            payment_reference = %input.payment_reference,
            total = %order.total,
            "payment reconciled"
        );

        Ok(PaymentReceipt {
            order_id: order.id,
            payment_reference: input.payment_reference,
            total: order.total,
        })
    }
}
