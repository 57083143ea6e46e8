//! Core domain types for the matching engine.

mod order;
mod price;
mod quantity;
mod side;
mod timestamp;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use order::{Order, OrderId, OrderStatus, OrderType, TimeInForce};
pub use price::Price;
pub use quantity::Quantity;
pub use side::Side;
pub use timestamp::Timestamp;

/// Trade execution record, laid out to occupy exactly one cache line.
///
/// Immutable once created by the book. Trade ids are monotonic per book.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C, align(64))]
pub struct Trade {
    /// Monotonically assigned trade identifier
    pub id: u64,
    /// Buy-side order id
    pub buy_order_id: OrderId,
    /// Sell-side order id
    pub sell_order_id: OrderId,
    /// Symbol the trade executed on
    pub symbol_id: u64,
    /// Execution price (the passive order's price)
    pub price: Price,
    /// Executed quantity
    pub quantity: Quantity,
    _pad0: u32,
    /// Execution timestamp
    pub timestamp: Timestamp,
    _pad1: u64,
}

const _: () = assert!(std::mem::size_of::<Trade>() == 64);
const _: () = assert!(std::mem::align_of::<Trade>() == 64);

impl Trade {
    /// Create a trade between an aggressor and a passive order.
    ///
    /// The buy/sell order ids are assigned from the two orders' sides;
    /// `price` is the execution price (passive side).
    #[must_use]
    pub fn new(
        id: u64,
        aggressor: &Order,
        passive: &Order,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        let (buy_order_id, sell_order_id) = if aggressor.is_buy() {
            (aggressor.id, passive.id)
        } else {
            (passive.id, aggressor.id)
        };
        Self {
            id,
            buy_order_id,
            sell_order_id,
            symbol_id: aggressor.symbol_id,
            price,
            quantity,
            _pad0: 0,
            timestamp: Timestamp::now(),
            _pad1: 0,
        }
    }
}

impl fmt::Debug for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trade")
            .field("id", &self.id)
            .field("buy", &self.buy_order_id)
            .field("sell", &self.sell_order_id)
            .field("symbol_id", &self.symbol_id)
            .field("price", &self.price)
            .field("qty", &self.quantity)
            .finish()
    }
}
