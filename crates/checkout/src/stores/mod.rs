//! Persistence seams for inventory, cart, and orders.
//!
//! The services talk to these traits only; `PgStore` backs production and
//! `MemoryStore` backs tests and local development. Order header + lines are
//! written through one atomic [`OrderStore::create_order`] so the
//! "order row with no lines" state is unrepresentable.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;

use tamarind_core::{OrderId, OrderStatus, PaymentReference, ProductId, UserId};

use crate::db::RepositoryError;
use crate::models::{CartLine, Order, OrderLine, Product, ShippingAddress};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Outcome of a stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDecrement {
    /// Stock remaining after the decrement.
    pub new_stock: i32,
    /// True when the requested quantity exceeded the stock on hand and the
    /// decrement was clamped at zero instead of going negative.
    pub clamped: bool,
}

/// Read/write access to product records.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Point lookup of a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Decrement a product's stock by `quantity`, clamped at zero.
    ///
    /// Must be a read-then-write on the current row value under a row lock,
    /// never a blind subtraction from a stale read; concurrent purchases of
    /// the same product must not lose updates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<StockDecrement, RepositoryError>;
}

/// Per-user cart rows. Single-writer: only the owning user's requests
/// touch a cart, so no cross-user locking is needed here.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// All cart lines for a user, oldest first.
    async fn lines(&self, user_id: &UserId) -> Result<Vec<CartLine>, RepositoryError>;

    /// Insert a line, or increment the quantity of an existing
    /// (user, product) line.
    async fn add_line(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError>;

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist.
    async fn set_quantity(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError>;

    /// Delete one line. Returns `true` if a row was deleted.
    async fn remove_line(
        &self,
        user_id: &UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError>;

    /// Delete every line for a user. Returns the number of rows deleted.
    async fn clear(&self, user_id: &UserId) -> Result<u64, RepositoryError>;
}

/// A new order line to be written with its order.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// A new order header plus its full line snapshot.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total: Decimal,
    pub status: OrderStatus,
    pub shipping: ShippingAddress,
    pub note: Option<String>,
    pub payment_reference: Option<PaymentReference>,
    pub lines: Vec<NewOrderLine>,
}

/// Append-mostly order records.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order header and all of its lines atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the payment reference is
    /// already taken by an existing order.
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    /// Point lookup of an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Lines belonging to an order.
    async fn get_order_lines(&self, id: OrderId) -> Result<Vec<OrderLine>, RepositoryError>;

    /// Look up the order reconciled against a payment reference, if any.
    /// This is the idempotency check for duplicate gateway callbacks.
    async fn find_by_payment_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, RepositoryError>;

    /// All orders for a user, newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError>;

    /// Compare-and-set the status of an order.
    ///
    /// Returns `true` if the order was in `from` and is now in `to`;
    /// `false` if it was in any other status (no write occurs).
    async fn set_status_if(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError>;
}
