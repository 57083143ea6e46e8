//! Order types and the cache-line sized order record.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Price, Quantity, Side, Timestamp};

/// Unique order identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Create a new order ID
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderId({})", self.0)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<OrderId> for u64 {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

/// Order type
///
/// Only `Limit` orders are matched by the book; the other variants are
/// declared for upstream gateways.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum OrderType {
    /// Market order - execute at best available price
    Market = 0,
    /// Limit order - specify price and quantity
    #[default]
    Limit = 1,
    /// Stop order - trigger at stop price, then execute as market
    Stop = 2,
    /// Stop-limit order - trigger at stop price, then place limit order
    StopLimit = 3,
}

/// Order status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum OrderStatus {
    /// Order has been created but not yet rested or filled
    #[default]
    New = 0,
    /// Order is partially filled
    PartiallyFilled = 1,
    /// Order is completely filled
    Filled = 2,
    /// Order has been cancelled
    Cancelled = 3,
    /// Order was rejected
    Rejected = 4,
}

impl OrderStatus {
    /// Check if the order is in a terminal state
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// Time in force
///
/// Carried on every order but the core applies no policy branches on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum TimeInForce {
    /// Day order (expires at end of trading session)
    #[default]
    Day = 0,
    /// Good till cancelled
    Gtc = 1,
    /// Immediate or cancel (partial fills allowed)
    Ioc = 2,
    /// Fill or kill (no partial fills)
    Fok = 3,
    /// Good till date
    Gtd = 4,
}

/// A trading order, laid out to occupy exactly one cache line.
///
/// Identity (`id`, `symbol_id`, `side`, `client_id`, `created_at`) is fixed
/// at construction; `price`, quantities, and `status` mutate as the order
/// moves through the book.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C, align(64))]
pub struct Order {
    /// Unique order identifier
    pub id: OrderId,
    /// Symbol this order trades
    pub symbol_id: u64,
    /// Limit price, fixed-point with six implied decimals
    pub price: Price,
    /// Original quantity
    pub quantity: Quantity,
    /// Executed quantity
    pub executed_quantity: Quantity,
    /// Submission timestamp
    pub created_at: Timestamp,
    /// Submitting client identifier
    pub client_id: u64,
    /// Gateway sequence number
    pub sequence: u32,
    /// Order side (buy/sell)
    pub side: Side,
    /// Order type
    pub order_type: OrderType,
    /// Order status
    pub status: OrderStatus,
    /// Time in force
    pub tif: TimeInForce,
    _pad: [u8; 8],
}

const _: () = assert!(std::mem::size_of::<Order>() == 64);
const _: () = assert!(std::mem::align_of::<Order>() == 64);

impl Order {
    /// Create a new limit order stamped with the current time
    #[must_use]
    pub fn new_limit(
        id: OrderId,
        symbol_id: u64,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            id,
            symbol_id,
            price,
            quantity,
            executed_quantity: Quantity::ZERO,
            created_at: Timestamp::now(),
            client_id: 0,
            sequence: 0,
            side,
            order_type: OrderType::Limit,
            status: OrderStatus::New,
            tif: TimeInForce::Day,
            _pad: [0; 8],
        }
    }

    /// Set the submitting client id
    #[must_use]
    pub const fn with_client_id(mut self, client_id: u64) -> Self {
        self.client_id = client_id;
        self
    }

    /// Set the time in force
    #[must_use]
    pub const fn with_tif(mut self, tif: TimeInForce) -> Self {
        self.tif = tif;
        self
    }

    /// Check if the order is buy side
    #[inline]
    #[must_use]
    pub const fn is_buy(&self) -> bool {
        self.side.is_buy()
    }

    /// Check if the order is sell side
    #[inline]
    #[must_use]
    pub const fn is_sell(&self) -> bool {
        self.side.is_sell()
    }

    /// Get remaining (unexecuted) quantity
    #[inline]
    #[must_use]
    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity.saturating_sub(self.executed_quantity)
    }

    /// Check if the order is completely filled
    #[inline]
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.executed_quantity >= self.quantity
    }

    /// Check whether this order is eligible to match another.
    ///
    /// Requires the same symbol, opposite sides, and crossing prices: a buy
    /// matches when its price is at or above the sell's, and vice versa.
    #[must_use]
    pub fn can_match(&self, other: &Order) -> bool {
        if self.symbol_id != other.symbol_id {
            return false;
        }
        if self.side == other.side {
            return false;
        }
        if self.is_buy() {
            self.price >= other.price
        } else {
            self.price <= other.price
        }
    }

    /// Apply a fill, updating executed quantity and status
    pub fn execute(&mut self, fill_quantity: Quantity) {
        self.executed_quantity = self.executed_quantity.saturating_add(fill_quantity);
        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }
}

impl fmt::Debug for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Order")
            .field("id", &self.id)
            .field("symbol_id", &self.symbol_id)
            .field("side", &self.side)
            .field("type", &self.order_type)
            .field("status", &self.status)
            .field("price", &self.price)
            .field("qty", &self.quantity)
            .field("executed", &self.executed_quantity)
            .finish()
    }
}
