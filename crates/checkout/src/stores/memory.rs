//! In-memory store for tests and local development.
//!
//! One `RwLock` over the whole dataset keeps every multi-row mutation
//! atomic from the point of view of concurrent tasks, which is exactly the
//! guarantee the Postgres store provides with transactions and row locks.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use tamarind_core::{OrderId, OrderStatus, PaymentReference, ProductId, UserId};

use crate::db::RepositoryError;
use crate::models::{CartLine, Order, OrderLine, Product};

use super::{CartStore, InventoryStore, NewOrder, OrderStore, StockDecrement};

#[derive(Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, Vec<CartLine>>,
    orders: BTreeMap<OrderId, Order>,
    order_lines: HashMap<OrderId, Vec<OrderLine>>,
    next_product_id: i32,
    next_order_id: i32,
}

/// In-memory implementation of all three store traits.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a product. Test/dev helper, not part of the store traits.
    pub async fn insert_product(
        &self,
        name: &str,
        unit_price: Decimal,
        stock: i32,
        active: bool,
    ) -> Product {
        let mut inner = self.inner.write().await;
        inner.next_product_id += 1;
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(inner.next_product_id),
            name: name.to_owned(),
            unit_price,
            stock,
            active,
            created_at: now,
            updated_at: now,
        };
        inner.products.insert(product.id, product.clone());
        product
    }

    /// Current stock for a product, if it exists. Test/dev helper.
    pub async fn product_stock(&self, id: ProductId) -> Option<i32> {
        self.inner.read().await.products.get(&id).map(|p| p.stock)
    }

    /// Number of orders in the store. Test/dev helper.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<StockDecrement, RepositoryError> {
        let mut inner = self.inner.write().await;
        let product = inner.products.get_mut(&id).ok_or(RepositoryError::NotFound)?;

        let clamped = quantity > product.stock;
        product.stock = (product.stock - quantity).max(0);
        product.updated_at = Utc::now();

        Ok(StockDecrement {
            new_stock: product.stock,
            clamped,
        })
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn lines(&self, user_id: &UserId) -> Result<Vec<CartLine>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .carts
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_line(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let lines = inner.carts.entry(user_id.clone()).or_default();

        if let Some(line) = lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity += quantity;
            line.updated_at = now;
            return Ok(line.clone());
        }

        let line = CartLine {
            user_id: user_id.clone(),
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        };
        lines.push(line.clone());
        Ok(line)
    }

    async fn set_quantity(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError> {
        let mut inner = self.inner.write().await;
        let lines = inner
            .carts
            .get_mut(user_id)
            .ok_or(RepositoryError::NotFound)?;
        let line = lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(RepositoryError::NotFound)?;

        line.quantity = quantity;
        line.updated_at = Utc::now();
        Ok(line.clone())
    }

    async fn remove_line(
        &self,
        user_id: &UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(lines) = inner.carts.get_mut(user_id) else {
            return Ok(false);
        };
        let before = lines.len();
        lines.retain(|l| l.product_id != product_id);
        Ok(lines.len() < before)
    }

    async fn clear(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.write().await;
        let removed = inner.carts.remove(user_id).map_or(0, |lines| lines.len());
        Ok(removed as u64)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut inner = self.inner.write().await;

        // Same guarantee as the unique index on orders.payment_reference.
        if let Some(reference) = &order.payment_reference
            && inner
                .orders
                .values()
                .any(|o| o.payment_reference.as_ref() == Some(reference))
        {
            return Err(RepositoryError::Conflict(
                "payment reference already reconciled".to_owned(),
            ));
        }

        inner.next_order_id += 1;
        let id = OrderId::new(inner.next_order_id);
        let now = Utc::now();

        let header = Order {
            id,
            user_id: order.user_id,
            total: order.total,
            status: order.status,
            shipping: order.shipping,
            note: order.note,
            payment_reference: order.payment_reference,
            created_at: now,
            updated_at: now,
        };
        let lines: Vec<OrderLine> = order
            .lines
            .into_iter()
            .map(|l| OrderLine {
                order_id: id,
                product_id: l.product_id,
                product_name: l.product_name,
                quantity: l.quantity,
                unit_price: l.unit_price,
            })
            .collect();

        inner.orders.insert(id, header.clone());
        inner.order_lines.insert(id, lines);
        Ok(header)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn get_order_lines(&self, id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .order_lines
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_by_payment_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .orders
            .values()
            .find(|o| o.payment_reference.as_ref() == Some(reference))
            .cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect();
        orders.reverse();
        Ok(orders)
    }

    async fn set_status_if(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(order) = inner.orders.get_mut(&id) else {
            return Ok(false);
        };
        if order.status != from {
            return Ok(false);
        }
        order.status = to;
        order.updated_at = Utc::now();
        Ok(true)
    }
}
