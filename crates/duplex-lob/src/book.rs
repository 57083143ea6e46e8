//! Per-symbol limit order book with price-time priority matching.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use duplex_core::types::{Order, OrderId, OrderStatus, Price, Quantity, Side, Timestamp, Trade};

use crate::level::PriceLevel;

/// Aggregate view of one price level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    /// Level price
    pub price: Price,
    /// Total remaining quantity at the level
    pub total_volume: u64,
    /// Number of orders at the level
    pub order_count: usize,
}

/// Top-of-book snapshot for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Symbol this snapshot describes
    pub symbol_id: u64,
    /// Best bid price, if any bids rest
    pub best_bid: Option<Price>,
    /// Best ask price, if any asks rest
    pub best_ask: Option<Price>,
    /// Volume at the best bid
    pub bid_volume: u64,
    /// Volume at the best ask
    pub ask_volume: u64,
    /// Orders at the best bid
    pub bid_orders: usize,
    /// Orders at the best ask
    pub ask_orders: usize,
    /// Snapshot timestamp
    pub timestamp: Timestamp,
}

/// A limit order book for a single symbol.
///
/// Bids and asks are price-indexed maps of FIFO [`PriceLevel`]s; an
/// order-id index locates each resting order's side and price so cancels
/// touch only one level. All mutation goes through a single owner (the
/// matching engine's worker); the book itself holds no locks.
pub struct OrderBook {
    symbol_id: u64,
    /// Buy side; best bid is the highest key
    bids: BTreeMap<i64, PriceLevel>,
    /// Sell side; best ask is the lowest key
    asks: BTreeMap<i64, PriceLevel>,
    /// Resting order id -> (side, level price)
    index: HashMap<OrderId, (Side, i64)>,
    next_trade_id: u64,
}

impl OrderBook {
    /// Create an empty book for a symbol
    #[must_use]
    pub fn new(symbol_id: u64) -> Self {
        Self {
            symbol_id,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
            next_trade_id: 1,
        }
    }

    /// The symbol this book trades
    #[must_use]
    pub const fn symbol_id(&self) -> u64 {
        self.symbol_id
    }

    /// Add an order: match against the opposite side, rest any residual.
    ///
    /// Returns the trades generated, in execution order. Zero quantity,
    /// non-positive price, or a duplicate order id leave the book unchanged
    /// and return no trades.
    pub fn add_order(&mut self, order: Order) -> Vec<Trade> {
        if order.quantity.is_zero() || !order.price.is_positive() {
            return Vec::new();
        }
        if self.index.contains_key(&order.id) {
            return Vec::new();
        }

        let mut order = order;
        let trades = match order.side {
            Side::Buy => self.match_buy(&mut order),
            Side::Sell => self.match_sell(&mut order),
        };

        if !order.remaining_quantity().is_zero() {
            self.rest_order(order);
        }

        trades
    }

    /// Cancel a resting order. Returns false when the id is unknown.
    pub fn cancel_order(&mut self, order_id: OrderId) -> bool {
        let Some((side, price)) = self.index.remove(&order_id) else {
            return false;
        };

        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(level) = levels.get_mut(&price) {
            level.remove(order_id);
            if level.is_empty() {
                levels.remove(&price);
            }
        }
        true
    }

    /// Replace a resting order's price and quantity.
    ///
    /// Semantically cancel + add with the same id and a refreshed
    /// submission timestamp, so the order loses time priority and the
    /// replacement may itself trade. Returns the replacement order as
    /// submitted together with any trades it generated, or `None` when the
    /// id is unknown.
    pub fn modify_order(
        &mut self,
        order_id: OrderId,
        new_price: Price,
        new_quantity: Quantity,
    ) -> Option<(Order, Vec<Trade>)> {
        let &(side, price) = self.index.get(&order_id)?;

        let levels = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        let old = *levels
            .get(&price)?
            .iter()
            .find(|o| o.id == order_id)?;

        if !self.cancel_order(order_id) {
            return None;
        }

        let mut replacement = old;
        replacement.price = new_price;
        replacement.quantity = new_quantity;
        replacement.executed_quantity = Quantity::ZERO;
        replacement.status = OrderStatus::New;
        replacement.created_at = Timestamp::now();

        let trades = self.add_order(replacement);
        Some((replacement, trades))
    }

    /// Best (highest) bid price
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.last_key_value().map(|(&p, _)| Price::from_raw(p))
    }

    /// Best (lowest) ask price
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first_key_value().map(|(&p, _)| Price::from_raw(p))
    }

    /// Total remaining quantity at a price level
    #[must_use]
    pub fn volume_at_price(&self, price: Price, side: Side) -> u64 {
        self.side_levels(side)
            .get(&price.raw())
            .map_or(0, PriceLevel::total_volume)
    }

    /// Number of orders at a price level
    #[must_use]
    pub fn order_count_at_price(&self, price: Price, side: Side) -> usize {
        self.side_levels(side)
            .get(&price.raw())
            .map_or(0, PriceLevel::order_count)
    }

    /// Number of resting orders across both sides
    #[must_use]
    pub fn total_orders(&self) -> usize {
        self.index.len()
    }

    /// Remove every order and level
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.index.clear();
    }

    /// Top-of-book snapshot
    #[must_use]
    pub fn snapshot(&self) -> BookSnapshot {
        let best_bid = self.best_bid();
        let best_ask = self.best_ask();
        BookSnapshot {
            symbol_id: self.symbol_id,
            best_bid,
            best_ask,
            bid_volume: best_bid.map_or(0, |p| self.volume_at_price(p, Side::Buy)),
            ask_volume: best_ask.map_or(0, |p| self.volume_at_price(p, Side::Sell)),
            bid_orders: best_bid.map_or(0, |p| self.order_count_at_price(p, Side::Buy)),
            ask_orders: best_ask.map_or(0, |p| self.order_count_at_price(p, Side::Sell)),
            timestamp: Timestamp::now(),
        }
    }

    /// Top-N levels per side: bids best-first (descending), asks best-first
    /// (ascending).
    #[must_use]
    pub fn depth(&self, levels: usize) -> (Vec<LevelInfo>, Vec<LevelInfo>) {
        let bids = self
            .bids
            .values()
            .rev()
            .take(levels)
            .map(Self::level_info)
            .collect();
        let asks = self
            .asks
            .values()
            .take(levels)
            .map(Self::level_info)
            .collect();
        (bids, asks)
    }

    fn level_info(level: &PriceLevel) -> LevelInfo {
        LevelInfo {
            price: level.price(),
            total_volume: level.total_volume(),
            order_count: level.order_count(),
        }
    }

    fn side_levels(&self, side: Side) -> &BTreeMap<i64, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Match an incoming buy against the asks, best price first.
    fn match_buy(&mut self, order: &mut Order) -> Vec<Trade> {
        let mut trades = Vec::new();

        while !order.remaining_quantity().is_zero() {
            let Some((&best_price, _)) = self.asks.first_key_value() else {
                break;
            };
            if order.price.raw() < best_price {
                break; // no cross
            }
            self.fill_at_level(order, Side::Sell, best_price, &mut trades);
        }

        trades
    }

    /// Match an incoming sell against the bids, best price first.
    fn match_sell(&mut self, order: &mut Order) -> Vec<Trade> {
        let mut trades = Vec::new();

        while !order.remaining_quantity().is_zero() {
            let Some((&best_price, _)) = self.bids.last_key_value() else {
                break;
            };
            if order.price.raw() > best_price {
                break; // no cross
            }
            self.fill_at_level(order, Side::Buy, best_price, &mut trades);
        }

        trades
    }

    /// Execute the incoming order against the front of one resting level.
    ///
    /// Trades price at the passive level; the resting side's aggregates and
    /// the id index stay consistent with the fill.
    fn fill_at_level(
        &mut self,
        order: &mut Order,
        resting_side: Side,
        level_price: i64,
        trades: &mut Vec<Trade>,
    ) {
        let levels = match resting_side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let Some(level) = levels.get_mut(&level_price) else {
            return;
        };
        let Some(resting) = level.front_mut() else {
            levels.remove(&level_price);
            return;
        };

        let fill = order.remaining_quantity().min(resting.remaining_quantity());
        let trade = Trade::new(
            self.next_trade_id,
            order,
            resting,
            Price::from_raw(level_price),
            fill,
        );
        self.next_trade_id += 1;

        order.execute(fill);
        resting.execute(fill);
        let resting_id = resting.id;
        let resting_filled = resting.is_filled();
        level.partial_fill(fill);

        if resting_filled {
            level.pop_front();
            let level_empty = level.is_empty();
            if level_empty {
                levels.remove(&level_price);
            }
            self.index.remove(&resting_id);
        }

        trades.push(trade);
    }

    /// Rest residual quantity at its price level and index it.
    fn rest_order(&mut self, order: Order) {
        let levels = match order.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        levels
            .entry(order.price.raw())
            .or_insert_with(|| PriceLevel::new(order.price))
            .add(order);
        self.index.insert(order.id, (order.side, order.price.raw()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: u64, side: Side, price: i64, qty: u32) -> Order {
        Order::new_limit(
            OrderId::new(id),
            1,
            side,
            Price::from_raw(price),
            Quantity::new(qty),
        )
    }

    fn buy(id: u64, price: i64, qty: u32) -> Order {
        order(id, Side::Buy, price, qty)
    }

    fn sell(id: u64, price: i64, qty: u32) -> Order {
        order(id, Side::Sell, price, qty)
    }

    /// Observable book state for equivalence checks
    fn observe(book: &OrderBook, prices: &[i64]) -> Vec<(u64, usize, u64, usize)> {
        prices
            .iter()
            .map(|&p| {
                (
                    book.volume_at_price(Price::from_raw(p), Side::Buy),
                    book.order_count_at_price(Price::from_raw(p), Side::Buy),
                    book.volume_at_price(Price::from_raw(p), Side::Sell),
                    book.order_count_at_price(Price::from_raw(p), Side::Sell),
                )
            })
            .collect()
    }

    #[test]
    fn test_exact_match() {
        let mut book = OrderBook::new(1);
        assert!(book.add_order(sell(1, 100, 10)).is_empty());

        let trades = book.add_order(buy(2, 100, 10));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].buy_order_id, OrderId::new(2));
        assert_eq!(trades[0].sell_order_id, OrderId::new(1));
        assert_eq!(trades[0].price, Price::from_raw(100));
        assert_eq!(trades[0].quantity, Quantity::new(10));
        assert_eq!(book.total_orders(), 0);
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn test_partial_match() {
        let mut book = OrderBook::new(1);
        book.add_order(sell(1, 100, 20));

        let trades = book.add_order(buy(2, 100, 15));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, Quantity::new(15));
        assert_eq!(book.volume_at_price(Price::from_raw(100), Side::Sell), 5);
        assert_eq!(book.total_orders(), 1);
    }

    #[test]
    fn test_multi_level_sweep() {
        let mut book = OrderBook::new(1);
        book.add_order(sell(1, 100, 10));
        book.add_order(sell(2, 100, 15));
        book.add_order(sell(3, 101, 20));

        let trades = book.add_order(buy(4, 101, 30));
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[0].sell_order_id, OrderId::new(1));
        assert_eq!(trades[0].price, Price::from_raw(100));
        assert_eq!(trades[0].quantity, Quantity::new(10));
        assert_eq!(trades[1].sell_order_id, OrderId::new(2));
        assert_eq!(trades[1].price, Price::from_raw(100));
        assert_eq!(trades[1].quantity, Quantity::new(15));
        assert_eq!(trades[2].sell_order_id, OrderId::new(3));
        assert_eq!(trades[2].price, Price::from_raw(101));
        assert_eq!(trades[2].quantity, Quantity::new(5));

        // residual ask quantity remains at 101
        assert_eq!(book.volume_at_price(Price::from_raw(101), Side::Sell), 15);
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn test_sweep_residual_rests() {
        let mut book = OrderBook::new(1);
        book.add_order(sell(1, 100, 10));
        book.add_order(sell(2, 100, 15));

        let trades = book.add_order(buy(4, 101, 30));
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].quantity, Quantity::new(10));
        assert_eq!(trades[1].quantity, Quantity::new(15));

        // 5 remaining rests on the bid side at 101
        assert_eq!(book.best_bid(), Some(Price::from_raw(101)));
        assert_eq!(book.volume_at_price(Price::from_raw(101), Side::Buy), 5);
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn test_price_improvement() {
        let mut book = OrderBook::new(1);
        book.add_order(sell(1, 100, 10));

        let trades = book.add_order(buy(2, 105, 10));
        assert_eq!(trades.len(), 1);
        // aggressor improves: trade prices at the passive order
        assert_eq!(trades[0].price, Price::from_raw(100));
    }

    #[test]
    fn test_fifo_at_level() {
        let mut book = OrderBook::new(1);
        book.add_order(sell(1, 100, 10));
        book.add_order(sell(2, 100, 10));
        book.add_order(sell(3, 100, 10));

        let trades = book.add_order(buy(4, 100, 10));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].sell_order_id, OrderId::new(1));

        // orders 2 and 3 remain, in that order
        assert_eq!(book.order_count_at_price(Price::from_raw(100), Side::Sell), 2);
        let next = book.add_order(buy(5, 100, 10));
        assert_eq!(next[0].sell_order_id, OrderId::new(2));
        let last = book.add_order(buy(6, 100, 10));
        assert_eq!(last[0].sell_order_id, OrderId::new(3));
    }

    #[test]
    fn test_cancel_middle() {
        let mut book = OrderBook::new(1);
        book.add_order(buy(1, 100, 10));
        book.add_order(buy(2, 100, 20));
        book.add_order(buy(3, 100, 30));

        assert!(book.cancel_order(OrderId::new(2)));
        assert_eq!(book.volume_at_price(Price::from_raw(100), Side::Buy), 40);
        assert_eq!(book.order_count_at_price(Price::from_raw(100), Side::Buy), 2);
    }

    #[test]
    fn test_cancel_unknown() {
        let mut book = OrderBook::new(1);
        assert!(!book.cancel_order(OrderId::new(42)));
    }

    #[test]
    fn test_cancel_removes_empty_level() {
        let mut book = OrderBook::new(1);
        book.add_order(buy(1, 100, 10));
        assert!(book.cancel_order(OrderId::new(1)));
        assert!(book.best_bid().is_none());
        assert_eq!(book.total_orders(), 0);
    }

    #[test]
    fn test_add_then_cancel_restores_state() {
        let mut book = OrderBook::new(1);
        book.add_order(buy(1, 99, 10));
        book.add_order(sell(2, 101, 10));

        let probes = [98, 99, 100, 101, 102];
        let before = observe(&book, &probes);
        let orders_before = book.total_orders();

        book.add_order(buy(3, 100, 25));
        assert!(book.cancel_order(OrderId::new(3)));

        assert_eq!(observe(&book, &probes), before);
        assert_eq!(book.total_orders(), orders_before);
        assert_eq!(book.best_bid(), Some(Price::from_raw(99)));
        assert_eq!(book.best_ask(), Some(Price::from_raw(101)));
    }

    #[test]
    fn test_no_match_accumulates_orders() {
        let mut book = OrderBook::new(1);
        for id in 1u64..=5 {
            book.add_order(buy(id, 90 + id as i64, 10));
        }
        for id in 6u64..=10 {
            book.add_order(sell(id, 200 + id as i64, 10));
        }
        assert_eq!(book.total_orders(), 10);
    }

    #[test]
    fn test_best_bid_below_best_ask() {
        let mut book = OrderBook::new(1);
        book.add_order(buy(1, 95, 10));
        book.add_order(buy(2, 99, 10));
        book.add_order(sell(3, 101, 10));
        book.add_order(sell(4, 105, 10));

        // crossing order consumes rather than crossing the book
        book.add_order(buy(5, 103, 10));

        let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) else {
            panic!("both sides should be populated");
        };
        assert!(bid < ask);
    }

    #[test]
    fn test_trades_priced_within_aggressor_limit() {
        let mut book = OrderBook::new(1);
        book.add_order(sell(1, 100, 10));
        book.add_order(sell(2, 102, 10));
        book.add_order(sell(3, 104, 10));

        let limit = 103;
        let trades = book.add_order(buy(4, limit, 40));

        let total: u32 = trades.iter().map(|t| t.quantity.value()).sum();
        assert!(total <= 40);
        // all executions at or below the buy limit, non-decreasing
        let mut last = i64::MIN;
        for trade in &trades {
            assert!(trade.price.raw() <= limit);
            assert!(trade.price.raw() >= last);
            last = trade.price.raw();
        }
    }

    #[test]
    fn test_duplicate_order_id_rejected() {
        let mut book = OrderBook::new(1);
        book.add_order(buy(1, 100, 10));

        let trades = book.add_order(order(1, Side::Sell, 100, 5));
        assert!(trades.is_empty());
        // book unchanged: the original bid is still there
        assert_eq!(book.volume_at_price(Price::from_raw(100), Side::Buy), 10);
        assert_eq!(book.total_orders(), 1);
    }

    #[test]
    fn test_invalid_orders_silently_rejected() {
        let mut book = OrderBook::new(1);
        assert!(book.add_order(buy(1, 100, 0)).is_empty());
        assert!(book.add_order(buy(2, 0, 10)).is_empty());
        assert!(book.add_order(buy(3, -5, 10)).is_empty());
        assert_eq!(book.total_orders(), 0);
    }

    #[test]
    fn test_modify_equals_cancel_plus_add() {
        let build = || {
            let mut book = OrderBook::new(1);
            book.add_order(buy(1, 100, 10));
            book.add_order(buy(2, 100, 20));
            book.add_order(sell(3, 110, 10));
            book
        };

        let mut modified = build();
        let (replacement, trades) = modified
            .modify_order(OrderId::new(1), Price::from_raw(105), Quantity::new(15))
            .unwrap();
        assert!(trades.is_empty());
        assert_eq!(replacement.price, Price::from_raw(105));
        assert_eq!(replacement.quantity, Quantity::new(15));

        let mut reference = build();
        assert!(reference.cancel_order(OrderId::new(1)));
        reference.add_order(buy(1, 105, 15));

        let probes = [100, 105, 110];
        assert_eq!(observe(&modified, &probes), observe(&reference, &probes));
        assert_eq!(modified.total_orders(), reference.total_orders());
        assert_eq!(modified.best_bid(), reference.best_bid());
        assert_eq!(modified.best_ask(), reference.best_ask());
    }

    #[test]
    fn test_modify_loses_time_priority() {
        let mut book = OrderBook::new(1);
        book.add_order(sell(1, 100, 10));
        book.add_order(sell(2, 100, 10));

        // resize order 1; it requeues behind order 2
        book.modify_order(OrderId::new(1), Price::from_raw(100), Quantity::new(5))
            .unwrap();

        let trades = book.add_order(buy(3, 100, 10));
        assert_eq!(trades[0].sell_order_id, OrderId::new(2));
    }

    #[test]
    fn test_modify_can_generate_trades() {
        let mut book = OrderBook::new(1);
        book.add_order(buy(1, 95, 10));
        book.add_order(sell(2, 105, 10));

        // reprice the bid through the ask
        let (_, trades) = book
            .modify_order(OrderId::new(1), Price::from_raw(105), Quantity::new(10))
            .unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, Price::from_raw(105));
        assert_eq!(book.total_orders(), 0);
    }

    #[test]
    fn test_modify_unknown_order() {
        let mut book = OrderBook::new(1);
        assert!(book
            .modify_order(OrderId::new(9), Price::from_raw(100), Quantity::new(1))
            .is_none());
    }

    #[test]
    fn test_trade_ids_monotonic() {
        let mut book = OrderBook::new(1);
        book.add_order(sell(1, 100, 10));
        book.add_order(sell(2, 100, 10));
        let first = book.add_order(buy(3, 100, 10));
        let second = book.add_order(buy(4, 100, 10));
        assert!(second[0].id > first[0].id);
    }

    #[test]
    fn test_level_volume_matches_indexed_remaining() {
        let mut book = OrderBook::new(1);
        book.add_order(buy(1, 100, 10));
        book.add_order(buy(2, 100, 20));
        book.add_order(buy(3, 99, 5));
        book.add_order(sell(4, 101, 7));

        // partially consume the 100 level
        book.add_order(sell(5, 100, 12));

        let level_total = book.volume_at_price(Price::from_raw(100), Side::Buy)
            + book.volume_at_price(Price::from_raw(99), Side::Buy)
            + book.volume_at_price(Price::from_raw(101), Side::Sell);
        // 30 - 12 at 100, 5 at 99, 7 at 101
        assert_eq!(level_total, 18 + 5 + 7);
        assert_eq!(book.total_orders(), 4);
    }

    #[test]
    fn test_clear() {
        let mut book = OrderBook::new(1);
        book.add_order(buy(1, 100, 10));
        book.add_order(sell(2, 110, 10));
        book.clear();
        assert_eq!(book.total_orders(), 0);
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn test_snapshot_and_depth() {
        let mut book = OrderBook::new(7);
        book.add_order(buy(1, 100, 10));
        book.add_order(buy(2, 99, 20));
        book.add_order(sell(3, 102, 5));
        book.add_order(sell(4, 103, 15));

        let snap = book.snapshot();
        assert_eq!(snap.symbol_id, 7);
        assert_eq!(snap.best_bid, Some(Price::from_raw(100)));
        assert_eq!(snap.best_ask, Some(Price::from_raw(102)));
        assert_eq!(snap.bid_volume, 10);
        assert_eq!(snap.ask_volume, 5);
        assert_eq!(snap.bid_orders, 1);
        assert_eq!(snap.ask_orders, 1);

        let (bids, asks) = book.depth(10);
        assert_eq!(bids.len(), 2);
        assert_eq!(bids[0].price, Price::from_raw(100));
        assert_eq!(bids[1].price, Price::from_raw(99));
        assert_eq!(asks[0].price, Price::from_raw(102));
        assert_eq!(asks[1].price, Price::from_raw(103));
    }
}
