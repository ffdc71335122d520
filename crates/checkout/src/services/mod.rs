//! Checkout workflows: cart validation, order creation, payment
//! reconciliation, and order cancellation.

pub mod locks;
pub mod orders;
pub mod payment;
pub mod validation;

use rust_decimal::Decimal;
use thiserror::Error;

use tamarind_core::{OrderStatus, PaymentReference, ProductId};

use crate::db::RepositoryError;
use crate::gateway::GatewayError;
use crate::models::inputs::InputError;

pub use locks::UserLocks;
pub use orders::OrderService;
pub use payment::{PaymentReceipt, PaymentService};
pub use validation::{ValidatedCart, ValidatedLine, validate_cart};

/// Workflow error taxonomy.
///
/// Every variant up to `InvalidInput` carries a human-readable reason that
/// is safe to surface verbatim; none of them mutate state.
/// `OrderPersistenceFailed` is the one asymmetric case: the charge already
/// succeeded, so it must be communicated as "you were charged but we could
/// not record your order," never as an ordinary purchase failure.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,

    #[error("{name} is no longer available")]
    InactiveProduct { product_id: ProductId, name: String },

    /// Stock is exactly zero: the line should be removed, not reduced.
    #[error("{name} is out of stock")]
    OutOfStock { product_id: ProductId, name: String },

    /// Message carries current stock and the requested quantity so callers
    /// can render a precise correction.
    #[error("only {available} of {name} in stock (requested {requested})")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        requested: i32,
        available: i32,
    },

    /// The client's view of the cart is stale. Hard rejection, never a
    /// recompute-and-proceed.
    #[error("order total has changed, please refresh and try again")]
    AmountMismatch { expected: Decimal, claimed: Decimal },

    /// Gateway reported anything other than its settled status. No local
    /// state was mutated, so this rejection is clean.
    #[error("payment was not approved (gateway status: {status})")]
    PaymentNotApproved { status: String },

    /// Payment settled but the order could not be recorded. Requires
    /// out-of-band reconciliation against the payment reference.
    #[error("payment succeeded but the order could not be recorded")]
    OrderPersistenceFailed {
        payment_reference: PaymentReference,
        #[source]
        source: RepositoryError,
    },

    /// Acting on an order or cart row not owned by the caller.
    #[error("you are not allowed to act on this order")]
    Unauthorized,

    /// Transition not permitted from the order's current status.
    #[error("order cannot be changed while {status}")]
    InvalidState { status: OrderStatus },

    #[error("order not found")]
    NotFound,

    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("payment gateway error: {0}")]
    Gateway(#[from] GatewayError),
}
