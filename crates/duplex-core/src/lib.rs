//! # duplex-core
//!
//! Core types and utilities for the duplex matching engine.
//!
//! This crate provides:
//! - Domain types: `Price`, `Quantity`, `Side`, `OrderId`, `Timestamp`
//! - Cache-line sized `Order` and `Trade` records
//! - The shared error type for the workspace
//!
//! ## Example
//!
//! ```rust
//! use duplex_core::types::{Order, OrderId, Price, Quantity, Side};
//!
//! let order = Order::new_limit(
//!     OrderId::new(1),
//!     42,                        // symbol id
//!     Side::Buy,
//!     Price::from_raw(100_000_000), // $100.000000
//!     Quantity::new(10),
//! );
//! assert_eq!(order.remaining_quantity(), Quantity::new(10));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{Error, Result};
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::constants::*;
    pub use crate::error::{Error, Result};
    pub use crate::types::*;
}
