//! Workflow tests for the Tamarind checkout core.
//!
//! Tests run the real services against the in-memory store, a recording
//! mock gateway, and failure-injecting store wrappers. No database or
//! network is required.
//!
//! # Test Categories
//!
//! - `cart_validation` - Shared cart validation properties
//! - `order_creation` - Pre-payment order flow and cancellation
//! - `payment_reconciliation` - Payment-first flow, tail failures,
//!   idempotency, and concurrency

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use tamarind_checkout::db::RepositoryError;
use tamarind_checkout::gateway::{
    ConfirmationOutcome, ConfirmationRequest, GatewayError, PaymentGateway,
};
use tamarind_checkout::models::inputs::ConfirmPaymentInput;
use tamarind_checkout::models::{Order, OrderLine, ShippingAddress};
use tamarind_checkout::services::{OrderService, PaymentService, UserLocks};
use tamarind_checkout::stores::{
    CartStore, InventoryStore, MemoryStore, NewOrder, OrderStore, StockDecrement,
};
use tamarind_core::{OrderId, OrderStatus, PaymentReference, ProductId, UserId};

use rust_decimal::Decimal;

// =============================================================================
// Mock gateway
// =============================================================================

/// Recording gateway double. Counts confirmation calls and answers with a
/// configured provider status.
pub struct MockGateway {
    status: String,
    calls: AtomicUsize,
    fail_transport: AtomicBool,
}

impl MockGateway {
    /// Gateway that approves every confirmation.
    #[must_use]
    pub fn approving() -> Arc<Self> {
        Arc::new(Self {
            status: "DONE".to_owned(),
            calls: AtomicUsize::new(0),
            fail_transport: AtomicBool::new(false),
        })
    }

    /// Gateway that answers every confirmation with the given status.
    #[must_use]
    pub fn with_status(status: &str) -> Arc<Self> {
        Arc::new(Self {
            status: status.to_owned(),
            calls: AtomicUsize::new(0),
            fail_transport: AtomicBool::new(false),
        })
    }

    /// Make subsequent confirmations fail at the transport level.
    pub fn fail_transport(&self) {
        self.fail_transport.store(true, Ordering::SeqCst);
    }

    /// How many times `confirm` has been invoked.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn confirm(
        &self,
        request: &ConfirmationRequest,
    ) -> Result<ConfirmationOutcome, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(GatewayError::InvalidResponse(
                "simulated transport failure".to_owned(),
            ));
        }

        Ok(ConfirmationOutcome {
            status: self.status.clone(),
            approved_at: Some(Utc::now()),
            raw: serde_json::json!({
                "paymentKey": request.payment_reference.as_str(),
                "orderId": request.order_reference,
                "status": self.status,
                "totalAmount": request.amount,
            }),
        })
    }
}

// =============================================================================
// Failure-injecting store wrappers
// =============================================================================

fn injected_failure() -> RepositoryError {
    RepositoryError::Unavailable("injected failure".to_owned())
}

/// Order store whose `create_order` can be made to fail while every read
/// still hits the wrapped store.
pub struct FailingOrderStore {
    inner: Arc<MemoryStore>,
    fail_create: AtomicBool,
}

impl FailingOrderStore {
    #[must_use]
    pub fn new(inner: Arc<MemoryStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_create: AtomicBool::new(false),
        })
    }

    pub fn fail_next_creates(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderStore for FailingOrderStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        self.inner.create_order(order).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.inner.get_order(id).await
    }

    async fn get_order_lines(&self, id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        self.inner.get_order_lines(id).await
    }

    async fn find_by_payment_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, RepositoryError> {
        self.inner.find_by_payment_reference(reference).await
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError> {
        self.inner.list_for_user(user_id).await
    }

    async fn set_status_if(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        self.inner.set_status_if(id, from, to).await
    }
}

/// Inventory store whose `decrement_stock` always fails; reads delegate.
pub struct FailingInventoryStore {
    inner: Arc<MemoryStore>,
}

impl FailingInventoryStore {
    #[must_use]
    pub fn new(inner: Arc<MemoryStore>) -> Arc<Self> {
        Arc::new(Self { inner })
    }
}

#[async_trait]
impl InventoryStore for FailingInventoryStore {
    async fn get_product(
        &self,
        id: ProductId,
    ) -> Result<Option<tamarind_checkout::models::Product>, RepositoryError> {
        self.inner.get_product(id).await
    }

    async fn decrement_stock(
        &self,
        _id: ProductId,
        _quantity: i32,
    ) -> Result<StockDecrement, RepositoryError> {
        Err(injected_failure())
    }
}

/// Cart store whose `clear` always fails; everything else delegates.
pub struct FailingCartStore {
    inner: Arc<MemoryStore>,
}

impl FailingCartStore {
    #[must_use]
    pub fn new(inner: Arc<MemoryStore>) -> Arc<Self> {
        Arc::new(Self { inner })
    }
}

#[async_trait]
impl CartStore for FailingCartStore {
    async fn lines(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<tamarind_checkout::models::CartLine>, RepositoryError> {
        self.inner.lines(user_id).await
    }

    async fn add_line(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<tamarind_checkout::models::CartLine, RepositoryError> {
        self.inner.add_line(user_id, product_id, quantity).await
    }

    async fn set_quantity(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<tamarind_checkout::models::CartLine, RepositoryError> {
        self.inner.set_quantity(user_id, product_id, quantity).await
    }

    async fn remove_line(
        &self,
        user_id: &UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        self.inner.remove_line(user_id, product_id).await
    }

    async fn clear(&self, _user_id: &UserId) -> Result<u64, RepositoryError> {
        Err(injected_failure())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A fully wired test fixture: one in-memory store backing all three store
/// seams, a recording gateway, and both services sharing one lock map.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<MockGateway>,
    pub orders: OrderService,
    pub payments: PaymentService,
}

impl Harness {
    /// Harness with an approving gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::with_gateway(MockGateway::approving())
    }

    /// Harness with a specific gateway double.
    #[must_use]
    pub fn with_gateway(gateway: Arc<MockGateway>) -> Self {
        let store = Arc::new(MemoryStore::new());
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
            gateway.clone(),
            locks,
        );
        Self {
            store,
            gateway,
            orders,
            payments,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// A plausible shipping snapshot.
#[must_use]
pub fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        recipient: "Jamie Park".to_owned(),
        address_line: "12 Orchard Road".to_owned(),
        postal_code: "04524".to_owned(),
        address_detail: Some("Apt 3B".to_owned()),
        phone: "010-1234-5678".to_owned(),
    }
}

/// Confirmation input with the given reference and claimed amount.
#[must_use]
pub fn confirm_input(payment_key: &str, amount: Decimal) -> ConfirmPaymentInput {
    ConfirmPaymentInput {
        payment_reference: PaymentReference::new(payment_key),
        order_reference: format!("ord_{payment_key}"),
        amount,
        shipping: Some(shipping_address()),
        note: None,
    }
}
