//! Tamarind Checkout - order creation and payment reconciliation.
//!
//! This crate owns the one part of the storefront with real invariants: the
//! workflow that turns a mutable cart into an immutable, paid order while
//! keeping inventory, pricing, and payment-provider state consistent.
//!
//! # Components
//!
//! - [`stores`] - Inventory, cart, and order persistence behind traits, with
//!   `PostgreSQL` and in-memory implementations
//! - [`gateway`] - Payment gateway client (the irreversible external call)
//! - [`services`] - Cart validation, order creation, payment reconciliation,
//!   and order cancellation
//! - [`routes`] - Thin JSON handlers over the services
//!
//! # Security
//!
//! Authentication lives in the fronting identity proxy; this service receives
//! a stable opaque user identifier and trusts it. The payment gateway secret
//! is server-held and never reaches the browser.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod stores;
