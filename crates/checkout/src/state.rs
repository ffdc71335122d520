//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::CheckoutConfig;
use crate::gateway::{GatewayError, HttpPaymentGateway, PaymentGateway};
use crate::services::{OrderService, PaymentService, UserLocks};
use crate::stores::{CartStore, InventoryStore, PgStore};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CheckoutConfig,
    pool: PgPool,
    inventory: Arc<dyn InventoryStore>,
    cart: Arc<dyn CartStore>,
    orders: OrderService,
    payments: PaymentService,
}

impl AppState {
    /// Wire the Postgres store, gateway client, and services together.
    ///
    /// Both services share one `UserLocks` map so order creation and
    /// payment reconciliation for the same user exclude each other.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the gateway HTTP client cannot be built.
    pub fn new(config: CheckoutConfig, pool: PgPool) -> Result<Self, GatewayError> {
        let store = Arc::new(PgStore::new(pool.clone()));
        let gateway: Arc<dyn PaymentGateway> =
            Arc::new(HttpPaymentGateway::new(&config.gateway)?);
        let locks = UserLocks::new();

        let orders = OrderService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            locks.clone(),
        );
        let payments = PaymentService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            gateway,
            locks,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                inventory: store.clone(),
                cart: store,
                orders,
                payments,
            }),
        })
    }

    /// Get a reference to the checkout configuration.
    #[must_use]
    pub fn config(&self) -> &CheckoutConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the inventory store.
    #[must_use]
    pub fn inventory(&self) -> &dyn InventoryStore {
        self.inner.inventory.as_ref()
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &dyn CartStore {
        self.inner.cart.as_ref()
    }

    /// Get a reference to the order service.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    /// Get a reference to the payment reconciliation service.
    #[must_use]
    pub fn payments(&self) -> &PaymentService {
        &self.inner.payments
    }
}
