//! Market-data message types shared by the feed layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use duplex_core::types::{Price, Quantity, Side, Timestamp};

/// Identifier of one of the two redundant feeds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedId {
    /// Primary feed
    A,
    /// Backup feed
    B,
}

impl FeedId {
    /// The other feed
    #[inline]
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            FeedId::A => FeedId::B,
            FeedId::B => FeedId::A,
        }
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedId::A => write!(f, "A"),
            FeedId::B => write!(f, "B"),
        }
    }
}

/// Level 1 quote published by one feed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol the quote describes
    pub symbol_id: u64,
    /// Best bid price
    pub bid_price: Price,
    /// Best ask price
    pub ask_price: Price,
    /// Size at the best bid
    pub bid_size: Quantity,
    /// Size at the best ask
    pub ask_size: Quantity,
    /// Publish timestamp
    pub timestamp: Timestamp,
    /// Per-feed sequence number
    pub sequence: u64,
    /// Publishing feed
    pub feed_id: FeedId,
}

impl Quote {
    /// Create a quote stamped with the current time and a zero sequence;
    /// the simulator assigns the real sequence on publish.
    #[must_use]
    pub fn new(
        symbol_id: u64,
        bid_price: Price,
        ask_price: Price,
        bid_size: Quantity,
        ask_size: Quantity,
        feed_id: FeedId,
    ) -> Self {
        Self {
            symbol_id,
            bid_price,
            ask_price,
            bid_size,
            ask_size,
            timestamp: Timestamp::now(),
            sequence: 0,
            feed_id,
        }
    }
}

/// Trade print published by one feed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeTick {
    /// Symbol the trade executed on
    pub symbol_id: u64,
    /// Execution price
    pub price: Price,
    /// Executed quantity
    pub quantity: Quantity,
    /// Publish timestamp
    pub timestamp: Timestamp,
    /// Per-feed sequence number
    pub sequence: u64,
    /// Publishing feed
    pub feed_id: FeedId,
    /// Aggressor side of the trade
    pub aggressor_side: Side,
}

impl TradeTick {
    /// Create a trade tick stamped with the current time and a zero
    /// sequence; the simulator assigns the real sequence on publish.
    #[must_use]
    pub fn new(
        symbol_id: u64,
        price: Price,
        quantity: Quantity,
        feed_id: FeedId,
        is_buy: bool,
    ) -> Self {
        Self {
            symbol_id,
            price,
            quantity,
            timestamp: Timestamp::now(),
            sequence: 0,
            feed_id,
            aggressor_side: Side::from_is_buy(is_buy),
        }
    }
}

/// A tagged market-data update: quote or trade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MarketDataUpdate {
    /// Best bid/offer update
    Quote(Quote),
    /// Trade print
    Trade(TradeTick),
}

impl MarketDataUpdate {
    /// Symbol the update refers to
    #[must_use]
    pub const fn symbol_id(&self) -> u64 {
        match self {
            MarketDataUpdate::Quote(q) => q.symbol_id,
            MarketDataUpdate::Trade(t) => t.symbol_id,
        }
    }

    /// Publish timestamp
    #[must_use]
    pub const fn timestamp(&self) -> Timestamp {
        match self {
            MarketDataUpdate::Quote(q) => q.timestamp,
            MarketDataUpdate::Trade(t) => t.timestamp,
        }
    }

    /// Per-feed sequence number
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        match self {
            MarketDataUpdate::Quote(q) => q.sequence,
            MarketDataUpdate::Trade(t) => t.sequence,
        }
    }

    /// Publishing feed
    #[must_use]
    pub const fn feed_id(&self) -> FeedId {
        match self {
            MarketDataUpdate::Quote(q) => q.feed_id,
            MarketDataUpdate::Trade(t) => t.feed_id,
        }
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        match self {
            MarketDataUpdate::Quote(q) => q.sequence = sequence,
            MarketDataUpdate::Trade(t) => t.sequence = sequence,
        }
    }
}
