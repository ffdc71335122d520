//! HTTP route handlers for the checkout service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (verifies database)
//!
//! # Cart (requires X-User-Id)
//! GET    /cart                 - List cart lines
//! POST   /cart/add             - Add a product (or increment its line)
//! POST   /cart/update          - Set a line's quantity
//! POST   /cart/remove          - Remove a line
//!
//! # Orders (requires X-User-Id)
//! POST /orders                 - Create a pending order from the cart
//! GET  /orders                 - List the caller's orders
//! GET  /orders/{id}            - Order detail with line snapshots
//! POST /orders/{id}/cancel     - Cancel a pending order
//!
//! # Payment (requires X-User-Id)
//! GET  /payments/confirm       - Gateway redirect callback
//!                                (query: paymentKey, orderId, amount)
//! POST /payments/confirm       - Widget callback with shipping snapshot
//! ```

pub mod cart;
pub mod orders;
pub mod payment;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::list))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create).get(orders::list))
        .route("/{id}", get(orders::detail))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new().route(
        "/confirm",
        get(payment::confirm_redirect).post(payment::confirm),
    )
}

/// Assemble all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/payments", payment_routes())
}
