//! Order requests shuttled from submitters to the engine worker.

use duplex_core::types::{Order, OrderId, Price, Quantity};

/// A request enqueued to the engine's worker.
#[derive(Debug, Clone, Copy)]
pub enum OrderRequest {
    /// Submit a new order for matching
    New(Order),
    /// Cancel a resting order
    Cancel {
        /// Symbol the order rests on
        symbol_id: u64,
        /// Order to cancel
        order_id: OrderId,
    },
    /// Replace a resting order's price and quantity
    Modify {
        /// Symbol the order rests on
        symbol_id: u64,
        /// Order to replace
        order_id: OrderId,
        /// Replacement price
        new_price: Price,
        /// Replacement quantity
        new_quantity: Quantity,
    },
}
