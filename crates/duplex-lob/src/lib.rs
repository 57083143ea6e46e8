//! # duplex-lob
//!
//! Price-time priority limit order book.
//!
//! A book keeps two price-indexed sides (bids descending, asks ascending),
//! each price holding a FIFO [`PriceLevel`] of resting orders, plus an
//! order-id index for cancel and modify. Incoming limit orders match against
//! the opposite side top-down at the passive order's price; residual
//! quantity rests in the book.
//!
//! ## Example
//!
//! ```rust
//! use duplex_core::types::{Order, OrderId, Price, Quantity, Side};
//! use duplex_lob::OrderBook;
//!
//! let mut book = OrderBook::new(1);
//! let sell = Order::new_limit(OrderId::new(1), 1, Side::Sell, Price::from_units(100), Quantity::new(10));
//! let buy = Order::new_limit(OrderId::new(2), 1, Side::Buy, Price::from_units(100), Quantity::new(10));
//!
//! assert!(book.add_order(sell).is_empty());
//! let trades = book.add_order(buy);
//! assert_eq!(trades.len(), 1);
//! assert_eq!(trades[0].quantity, Quantity::new(10));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod book;
pub mod level;

pub use book::{BookSnapshot, LevelInfo, OrderBook};
pub use level::PriceLevel;

/// Create a new order book for a symbol.
///
/// Convenience factory matching the library surface; equivalent to
/// [`OrderBook::new`].
#[must_use]
pub fn create_order_book(symbol_id: u64) -> OrderBook {
    OrderBook::new(symbol_id)
}
