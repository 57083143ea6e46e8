//! # duplex-engine
//!
//! The matching engine coordinator: a symbol registry of order books, a
//! lock-free request queue, and one worker thread that serializes every
//! book mutation so the books themselves need no internal locking.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use duplex_core::types::{Order, OrderId, Price, Quantity, Side};
//! use duplex_engine::MatchingEngine;
//!
//! let engine = Arc::new(MatchingEngine::new());
//! engine.register_symbol(1);
//! engine.start().unwrap();
//!
//! let order = Order::new_limit(OrderId::new(1), 1, Side::Buy, Price::from_units(100), Quantity::new(10));
//! engine.submit_order(order).unwrap();
//!
//! engine.stop();
//! assert_eq!(engine.get_stats().total_orders, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod request;
pub mod stats;

pub use engine::{MatchingEngine, OrderCallback, TradeCallback};
pub use request::OrderRequest;
pub use stats::{EngineStats, EngineStatsSnapshot};

/// Create a new matching engine.
///
/// Convenience factory matching the library surface; equivalent to
/// [`MatchingEngine::new`].
#[must_use]
pub fn create_matching_engine() -> MatchingEngine {
    MatchingEngine::new()
}
