//! Order creation (pre-payment path) and order cancellation.

use std::sync::Arc;

use tamarind_core::{OrderId, OrderStatus, UserId, amounts_match};

use crate::models::inputs::CreateOrderInput;
use crate::models::{Order, OrderLine};
use crate::stores::{CartStore, InventoryStore, NewOrder, NewOrderLine, OrderStore};

use super::{CheckoutError, UserLocks, validate_cart};

/// Order creation and lifecycle service.
///
/// Creates `Pending` orders for the pay-with-widget-after-order path.
/// Inventory is untouched here: stock is only decremented once payment is
/// actually confirmed, so abandoned pending orders never hold stock hostage.
#[derive(Clone)]
pub struct OrderService {
    inventory: Arc<dyn InventoryStore>,
    cart: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
    locks: UserLocks,
}

impl OrderService {
    #[must_use]
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        cart: Arc<dyn CartStore>,
        orders: Arc<dyn OrderStore>,
        locks: UserLocks,
    ) -> Self {
        Self {
            inventory,
            cart,
            orders,
            locks,
        }
    }

    /// Convert a validated cart into a pending order.
    ///
    /// Runs shared cart validation, cross-checks any client-claimed total
    /// against the freshly computed one, then writes the order header and
    /// its full line snapshot atomically.
    ///
    /// # Errors
    ///
    /// Any validation failure (`EmptyCart`, `InactiveProduct`, stock
    /// errors, `AmountMismatch`, `InvalidInput`) short-circuits with no
    /// writes. A store failure during the atomic insert leaves no partial
    /// order behind.
    pub async fn create_order(
        &self,
        user_id: &UserId,
        input: CreateOrderInput,
    ) -> Result<Order, CheckoutError> {
        input.validate()?;

        let _guard = self.locks.acquire(user_id).await;

        let validated = validate_cart(self.inventory.as_ref(), self.cart.as_ref(), user_id).await?;

        if let Some(claimed) = input.claimed_total
            && !amounts_match(validated.total, claimed)
        {
            tracing::info!(
                user_id = %user_id,
                expected = %validated.total,
                claimed = %claimed,
                "order rejected, client total is stale"
            );
            return Err(CheckoutError::AmountMismatch {
                expected: validated.total,
                claimed,
            });
        }

        let order = self
            .orders
            .create_order(NewOrder {
                user_id: user_id.clone(),
                total: validated.total,
                status: OrderStatus::Pending,
                shipping: input.shipping,
                note: input.note,
                payment_reference: None,
                lines: validated
                    .lines
                    .into_iter()
                    .map(|line| NewOrderLine {
                        product_id: line.product_id,
                        product_name: line.name,
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                    })
                    .collect(),
            })
            .await?;

        tracing::info!(
            user_id = %user_id,
            order_id = %order.id,
            total = %order.total,
            "pending order created"
        );

        Ok(order)
    }

    /// Cancel a pending order owned by the caller.
    ///
    /// No inventory or payment reversal occurs: nothing was decremented or
    /// charged for a pending order.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::NotFound` if the order does not exist
    /// - `CheckoutError::Unauthorized` if the caller does not own it
    /// - `CheckoutError::InvalidState` if it is not `Pending`
    pub async fn cancel_order(
        &self,
        user_id: &UserId,
        order_id: OrderId,
    ) -> Result<Order, CheckoutError> {
        let order = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or(CheckoutError::NotFound)?;

        if &order.user_id != user_id {
            return Err(CheckoutError::Unauthorized);
        }
        if !order.status.is_cancellable() {
            return Err(CheckoutError::InvalidState {
                status: order.status,
            });
        }

        // Compare-and-set so a concurrent confirmation wins over the cancel.
        let transitioned = self
            .orders
            .set_status_if(order_id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await?;
        if !transitioned {
            let current = self
                .orders
                .get_order(order_id)
                .await?
                .ok_or(CheckoutError::NotFound)?;
            return Err(CheckoutError::InvalidState {
                status: current.status,
            });
        }

        tracing::info!(user_id = %user_id, order_id = %order_id, "order cancelled");

        self.orders
            .get_order(order_id)
            .await?
            .ok_or(CheckoutError::NotFound)
    }

    /// All orders for the caller, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` on store failure.
    pub async fn list_orders(&self, user_id: &UserId) -> Result<Vec<Order>, CheckoutError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }

    /// One order with its line snapshots, owner-checked.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::NotFound` if the order does not exist
    /// - `CheckoutError::Unauthorized` if the caller does not own it
    pub async fn order_detail(
        &self,
        user_id: &UserId,
        order_id: OrderId,
    ) -> Result<(Order, Vec<OrderLine>), CheckoutError> {
        let order = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or(CheckoutError::NotFound)?;
        if &order.user_id != user_id {
            return Err(CheckoutError::Unauthorized);
        }
        let lines = self.orders.get_order_lines(order_id).await?;
        Ok((order, lines))
    }
}
