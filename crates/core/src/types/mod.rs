//! Core types for Tamarind.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod status;

pub use id::*;
pub use money::{AMOUNT_EPSILON, amounts_match};
pub use status::OrderStatus;
