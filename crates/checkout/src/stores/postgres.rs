//! `PostgreSQL` store implementation.
//!
//! Order header + lines are written in one transaction. The stock decrement
//! reads the current row under `FOR UPDATE` and writes the clamped value
//! inside the same transaction, so concurrent purchases of the same product
//! cannot lose updates.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::Row;

use tamarind_core::{OrderId, OrderStatus, PaymentReference, ProductId, UserId};

use crate::db::RepositoryError;
use crate::models::{CartLine, Order, OrderLine, Product};

use super::{CartStore, InventoryStore, NewOrder, OrderStore, StockDecrement};

/// Store implementation backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, unit_price, stock, active, created_at, updated_at
            FROM product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<StockDecrement, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r"
            SELECT stock FROM product
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let current: i32 = row.try_get("stock")?;
        let clamped = quantity > current;
        let new_stock = (current - quantity).max(0);

        sqlx::query(
            r"
            UPDATE product
            SET stock = $1, updated_at = NOW()
            WHERE id = $2
            ",
        )
        .bind(new_stock)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(StockDecrement { new_stock, clamped })
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn lines(&self, user_id: &UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT user_id, product_id, quantity, created_at, updated_at
            FROM cart_line
            WHERE user_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn add_line(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError> {
        let line = sqlx::query_as::<_, CartLine>(
            r"
            INSERT INTO cart_line (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_line.quantity + EXCLUDED.quantity,
                          updated_at = NOW()
            RETURNING user_id, product_id, quantity, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(line)
    }

    async fn set_quantity(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError> {
        let line = sqlx::query_as::<_, CartLine>(
            r"
            UPDATE cart_line
            SET quantity = $1, updated_at = NOW()
            WHERE user_id = $2 AND product_id = $3
            RETURNING user_id, product_id, quantity, created_at, updated_at
            ",
        )
        .bind(quantity)
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(line)
    }

    async fn remove_line(
        &self,
        user_id: &UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_line
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_line
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders
                (user_id, total, status, recipient, address_line, postal_code,
                 address_detail, phone, note, payment_reference)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, user_id, total, status, recipient, address_line,
                      postal_code, address_detail, phone, note,
                      payment_reference, created_at, updated_at
            ",
        )
        .bind(&order.user_id)
        .bind(order.total)
        .bind(order.status)
        .bind(&order.shipping.recipient)
        .bind(&order.shipping.address_line)
        .bind(&order.shipping.postal_code)
        .bind(&order.shipping.address_detail)
        .bind(&order.shipping.phone)
        .bind(&order.note)
        .bind(&order.payment_reference)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "payment reference already reconciled"))?;

        for line in &order.lines {
            sqlx::query(
                r"
                INSERT INTO order_line
                    (order_id, product_id, product_name, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(header.id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(header)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT id, user_id, total, status, recipient, address_line,
                   postal_code, address_detail, phone, note,
                   payment_reference, created_at, updated_at
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn get_order_lines(&self, id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r"
            SELECT order_id, product_id, product_name, quantity, unit_price
            FROM order_line
            WHERE order_id = $1
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn find_by_payment_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT id, user_id, total, status, recipient, address_line,
                   postal_code, address_detail, phone, note,
                   payment_reference, created_at, updated_at
            FROM orders
            WHERE payment_reference = $1
            ",
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, user_id, total, status, recipient, address_line,
                   postal_code, address_detail, phone, note,
                   payment_reference, created_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn set_status_if(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3
            ",
        )
        .bind(to)
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
