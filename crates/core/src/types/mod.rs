//! Core types for Emporium.
//!
//! Type-safe wrappers for the identifiers and values that cross the API.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{DisplayPrice, discounted_price, format_currency, format_price};
pub use status::{OrderStatus, OrderStatusError, TransitionPolicy};
