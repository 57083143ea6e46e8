//! Cross-feed arbitrage detection.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use duplex_core::constants::{MAX_RECENT_OPPORTUNITIES, MISSED_OPPORTUNITY_GAP_NS};
use duplex_core::types::{Price, Timestamp};
use duplex_feed::{FeedId, MarketDataUpdate, Quote};

/// An arbitrage opportunity observed between the two feeds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    /// Symbol the opportunity was observed on
    pub symbol_id: u64,
    /// Feed whose quote carried the earlier timestamp
    pub fast_feed: FeedId,
    /// Feed whose quote carried the later timestamp
    pub slow_feed: FeedId,
    /// Largest same-side price gap between the feeds
    pub price_difference: Price,
    /// Absolute gap between the two quote timestamps
    pub latency_difference_ns: u64,
    /// Detection timestamp
    pub timestamp: Timestamp,
    /// Feed A best bid at detection
    pub feed_a_bid: Price,
    /// Feed A best ask at detection
    pub feed_a_ask: Price,
    /// Feed B best bid at detection
    pub feed_b_bid: Price,
    /// Feed B best ask at detection
    pub feed_b_ask: Price,
}

impl ArbitrageOpportunity {
    /// Potential profit in basis points for a crossed book.
    ///
    /// Buying the cheaper feed's ask and selling the richer feed's bid:
    /// `(sell_bid - buy_ask) / buy_ask * 10_000`. Zero when the feeds are
    /// merely disparate but not crossed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn profit_basis_points(&self) -> f64 {
        if self.feed_a_ask.is_positive()
            && self.feed_b_bid.is_positive()
            && self.feed_b_bid > self.feed_a_ask
        {
            // buy on A, sell on B
            (self.feed_b_bid.raw() - self.feed_a_ask.raw()) as f64 / self.feed_a_ask.raw() as f64
                * 10_000.0
        } else if self.feed_b_ask.is_positive()
            && self.feed_a_bid.is_positive()
            && self.feed_a_bid > self.feed_b_ask
        {
            // buy on B, sell on A
            (self.feed_a_bid.raw() - self.feed_b_ask.raw()) as f64 / self.feed_b_ask.raw() as f64
                * 10_000.0
        } else {
            0.0
        }
    }

    /// Whether the crossed book yields positive profit
    #[must_use]
    pub fn is_profitable(&self) -> bool {
        self.profit_basis_points() > 0.0
    }

    /// The (buy, sell) feeds of a crossed book, or `None` when the feeds
    /// are disparate but not crossed.
    #[must_use]
    pub fn crossed_direction(&self) -> Option<(FeedId, FeedId)> {
        if self.feed_a_ask.is_positive()
            && self.feed_b_bid.is_positive()
            && self.feed_b_bid > self.feed_a_ask
        {
            Some((FeedId::A, FeedId::B))
        } else if self.feed_b_ask.is_positive()
            && self.feed_a_bid.is_positive()
            && self.feed_a_bid > self.feed_b_ask
        {
            Some((FeedId::B, FeedId::A))
        } else {
            None
        }
    }
}

/// Aggregate detector counters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArbitrageStats {
    /// Opportunities recorded (crossed or disparate)
    pub opportunities_detected: u64,
    /// Opportunities with positive profit
    pub profitable_opportunities: u64,
    /// Trade reports whose cross-feed gap exceeded the miss threshold
    pub missed_opportunities: u64,
    /// Cumulative profit over profitable opportunities, in basis points
    pub total_profit_bps: f64,
    /// Smallest quote-timestamp gap seen
    pub latency_diff_min_ns: u64,
    /// Largest quote-timestamp gap seen
    pub latency_diff_max_ns: u64,
    /// Sum of quote-timestamp gaps
    pub latency_diff_sum_ns: u64,
}

impl Default for ArbitrageStats {
    fn default() -> Self {
        Self {
            opportunities_detected: 0,
            profitable_opportunities: 0,
            missed_opportunities: 0,
            total_profit_bps: 0.0,
            latency_diff_min_ns: u64::MAX,
            latency_diff_max_ns: 0,
            latency_diff_sum_ns: 0,
        }
    }
}

impl ArbitrageStats {
    fn record_opportunity(&mut self, opportunity: &ArbitrageOpportunity) {
        self.opportunities_detected += 1;
        if opportunity.is_profitable() {
            self.profitable_opportunities += 1;
            self.total_profit_bps += opportunity.profit_basis_points();
        }
        self.latency_diff_min_ns = self
            .latency_diff_min_ns
            .min(opportunity.latency_difference_ns);
        self.latency_diff_max_ns = self
            .latency_diff_max_ns
            .max(opportunity.latency_difference_ns);
        self.latency_diff_sum_ns += opportunity.latency_difference_ns;
    }

    /// Average profit over profitable opportunities, in basis points
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_profit_bps(&self) -> f64 {
        if self.profitable_opportunities == 0 {
            0.0
        } else {
            self.total_profit_bps / self.profitable_opportunities as f64
        }
    }

    /// Average quote-timestamp gap over all opportunities, in microseconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_latency_diff_us(&self) -> f64 {
        if self.opportunities_detected == 0 {
            0.0
        } else {
            self.latency_diff_sum_ns as f64 / self.opportunities_detected as f64 / 1_000.0
        }
    }
}

/// Callback invoked for each recorded opportunity, while the detector lock
/// is held. The callee must not re-enter the detector.
pub type ArbitrageCallback = Box<dyn Fn(&ArbitrageOpportunity) + Send + 'static>;

#[derive(Default, Clone, Copy)]
struct SymbolState {
    feed_a: Option<Quote>,
    feed_b: Option<Quote>,
}

#[derive(Default, Clone, Copy)]
struct TradeTimes {
    feed_a: Option<Timestamp>,
    feed_b: Option<Timestamp>,
}

#[derive(Default)]
struct DetectorState {
    symbols: HashMap<u64, SymbolState>,
    trade_times: HashMap<u64, TradeTimes>,
    recent: VecDeque<ArbitrageOpportunity>,
    stats: ArbitrageStats,
    callback: Option<ArbitrageCallback>,
}

/// Detects arbitrage opportunities between the A and B feeds.
///
/// All state sits under one mutex: the detector serves concurrent feed
/// callbacks and multiple reader queries.
#[derive(Default)]
pub struct ArbitrageDetector {
    state: Mutex<DetectorState>,
}

impl ArbitrageDetector {
    /// Create an empty detector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one update observed on a feed.
    ///
    /// Quotes refresh the feed's per-symbol memory and trigger the
    /// arbitrage check once both feeds have reported. Trades feed the
    /// cross-feed trade-report gap accounting.
    pub fn on_feed_update(&self, feed_id: FeedId, update: &MarketDataUpdate) {
        let mut state = self.state.lock();
        match update {
            MarketDataUpdate::Quote(quote) => Self::process_quote(&mut state, feed_id, *quote),
            MarketDataUpdate::Trade(tick) => {
                Self::process_trade(&mut state, feed_id, tick.symbol_id, tick.timestamp);
            }
        }
    }

    /// Set the opportunity callback. Replaces any previous callback.
    pub fn set_callback(&self, callback: ArbitrageCallback) {
        self.state.lock().callback = Some(callback);
    }

    /// Snapshot of the detector counters
    #[must_use]
    pub fn get_stats(&self) -> ArbitrageStats {
        self.state.lock().stats
    }

    /// The most recent `count` opportunities, oldest first
    #[must_use]
    pub fn get_recent_opportunities(&self, count: usize) -> Vec<ArbitrageOpportunity> {
        let state = self.state.lock();
        let skip = state.recent.len().saturating_sub(count);
        state.recent.iter().skip(skip).copied().collect()
    }

    fn process_quote(state: &mut DetectorState, feed_id: FeedId, quote: Quote) {
        let entry = state.symbols.entry(quote.symbol_id).or_default();
        match feed_id {
            FeedId::A => entry.feed_a = Some(quote),
            FeedId::B => entry.feed_b = Some(quote),
        }
        let (Some(a), Some(b)) = (entry.feed_a, entry.feed_b) else {
            return;
        };
        Self::check_arbitrage(state, quote.symbol_id, &a, &b);
    }

    fn process_trade(
        state: &mut DetectorState,
        feed_id: FeedId,
        symbol_id: u64,
        timestamp: Timestamp,
    ) {
        let times = state.trade_times.entry(symbol_id).or_default();
        match feed_id {
            FeedId::A => times.feed_a = Some(timestamp),
            FeedId::B => times.feed_b = Some(timestamp),
        }
        if let (Some(t_a), Some(t_b)) = (times.feed_a, times.feed_b) {
            if t_a.abs_gap_ns(t_b) > MISSED_OPPORTUNITY_GAP_NS {
                state.stats.missed_opportunities += 1;
            }
        }
    }

    fn check_arbitrage(state: &mut DetectorState, symbol_id: u64, a: &Quote, b: &Quote) {
        let crossed_ab = a.ask_price.is_positive()
            && b.bid_price.is_positive()
            && b.bid_price > a.ask_price;
        let crossed_ba = b.ask_price.is_positive()
            && a.bid_price.is_positive()
            && a.bid_price > b.ask_price;

        let bid_diff = (a.bid_price - b.bid_price).abs();
        let ask_diff = (a.ask_price - b.ask_price).abs();

        if !crossed_ab && !crossed_ba && bid_diff.is_zero() && ask_diff.is_zero() {
            return;
        }

        let (fast_feed, slow_feed) = if a.timestamp < b.timestamp {
            (FeedId::A, FeedId::B)
        } else {
            (FeedId::B, FeedId::A)
        };

        let opportunity = ArbitrageOpportunity {
            symbol_id,
            fast_feed,
            slow_feed,
            price_difference: bid_diff.max(ask_diff),
            latency_difference_ns: a.timestamp.abs_gap_ns(b.timestamp),
            timestamp: Timestamp::now(),
            feed_a_bid: a.bid_price,
            feed_a_ask: a.ask_price,
            feed_b_bid: b.bid_price,
            feed_b_ask: b.ask_price,
        };

        state.stats.record_opportunity(&opportunity);
        state.recent.push_back(opportunity);
        if state.recent.len() > MAX_RECENT_OPPORTUNITIES {
            state.recent.pop_front();
        }
        if let Some(cb) = state.callback.as_ref() {
            cb(&opportunity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duplex_core::types::Quantity;

    fn quote(symbol: u64, feed: FeedId, bid: i64, ask: i64, ts_ns: i64) -> MarketDataUpdate {
        MarketDataUpdate::Quote(Quote {
            symbol_id: symbol,
            bid_price: Price::from_raw(bid),
            ask_price: Price::from_raw(ask),
            bid_size: Quantity::new(10),
            ask_size: Quantity::new(10),
            timestamp: Timestamp::from_nanos(ts_ns),
            sequence: 0,
            feed_id: feed,
        })
    }

    fn trade(symbol: u64, feed: FeedId, ts_ns: i64) -> MarketDataUpdate {
        MarketDataUpdate::Trade(duplex_feed::TradeTick {
            symbol_id: symbol,
            price: Price::from_raw(10_000),
            quantity: Quantity::new(1),
            timestamp: Timestamp::from_nanos(ts_ns),
            sequence: 0,
            feed_id: feed,
            aggressor_side: duplex_core::types::Side::Buy,
        })
    }

    #[test]
    fn test_crossed_book_is_profitable() {
        let detector = ArbitrageDetector::new();
        detector.on_feed_update(FeedId::A, &quote(1, FeedId::A, 10_000, 10_010, 100));
        detector.on_feed_update(FeedId::B, &quote(1, FeedId::B, 10_020, 10_030, 200));

        let stats = detector.get_stats();
        assert_eq!(stats.opportunities_detected, 1);
        assert_eq!(stats.profitable_opportunities, 1);

        let recent = detector.get_recent_opportunities(10);
        assert_eq!(recent.len(), 1);
        let opp = &recent[0];
        assert!(opp.profit_basis_points() > 0.0);
        assert!(opp.is_profitable());
        // buy where it is cheap (A's ask), sell where it is rich (B's bid)
        assert_eq!(opp.crossed_direction(), Some((FeedId::A, FeedId::B)));
        assert_eq!(opp.fast_feed, FeedId::A);
        assert_eq!(opp.latency_difference_ns, 100);
    }

    #[test]
    fn test_disparity_without_cross_has_zero_profit() {
        let detector = ArbitrageDetector::new();
        detector.on_feed_update(FeedId::A, &quote(1, FeedId::A, 10_000, 10_010, 100));
        detector.on_feed_update(FeedId::B, &quote(1, FeedId::B, 9_990, 10_005, 200));

        let stats = detector.get_stats();
        assert_eq!(stats.opportunities_detected, 1);
        assert_eq!(stats.profitable_opportunities, 0);

        let opp = detector.get_recent_opportunities(1)[0];
        assert_eq!(opp.profit_basis_points(), 0.0);
        assert!(!opp.is_profitable());
        assert!(opp.crossed_direction().is_none());
        // largest same-side gap: bid differs by 10, ask by 5
        assert_eq!(opp.price_difference, Price::from_raw(10));
    }

    #[test]
    fn test_identical_quotes_record_nothing() {
        let detector = ArbitrageDetector::new();
        detector.on_feed_update(FeedId::A, &quote(1, FeedId::A, 10_000, 10_010, 100));
        detector.on_feed_update(FeedId::B, &quote(1, FeedId::B, 10_000, 10_010, 200));
        assert_eq!(detector.get_stats().opportunities_detected, 0);
        assert!(detector.get_recent_opportunities(10).is_empty());
    }

    #[test]
    fn test_single_feed_never_triggers() {
        let detector = ArbitrageDetector::new();
        for ts in 0..10 {
            detector.on_feed_update(FeedId::A, &quote(1, FeedId::A, 10_000 + ts, 10_010 + ts, ts));
        }
        assert_eq!(detector.get_stats().opportunities_detected, 0);
    }

    #[test]
    fn test_reverse_cross_direction() {
        let detector = ArbitrageDetector::new();
        // A's bid above B's ask: buy on B, sell on A
        detector.on_feed_update(FeedId::A, &quote(1, FeedId::A, 10_050, 10_060, 500));
        detector.on_feed_update(FeedId::B, &quote(1, FeedId::B, 10_000, 10_010, 100));

        let opp = detector.get_recent_opportunities(1)[0];
        assert_eq!(opp.crossed_direction(), Some((FeedId::B, FeedId::A)));
        assert!(opp.is_profitable());
        // B's quote is older, so B counts as the fast feed
        assert_eq!(opp.fast_feed, FeedId::B);
        assert_eq!(opp.latency_difference_ns, 400);
    }

    #[test]
    fn test_symbols_tracked_independently() {
        let detector = ArbitrageDetector::new();
        detector.on_feed_update(FeedId::A, &quote(1, FeedId::A, 10_000, 10_010, 100));
        detector.on_feed_update(FeedId::B, &quote(2, FeedId::B, 10_020, 10_030, 200));
        // different symbols: neither has both feeds yet
        assert_eq!(detector.get_stats().opportunities_detected, 0);

        detector.on_feed_update(FeedId::B, &quote(1, FeedId::B, 10_020, 10_030, 300));
        assert_eq!(detector.get_stats().opportunities_detected, 1);
    }

    #[test]
    fn test_missed_opportunity_on_trade_gap() {
        let detector = ArbitrageDetector::new();
        detector.on_feed_update(FeedId::A, &trade(1, FeedId::A, 0));
        // 0.5ms apart: inside the threshold
        detector.on_feed_update(FeedId::B, &trade(1, FeedId::B, 500_000));
        assert_eq!(detector.get_stats().missed_opportunities, 0);

        // 2ms apart: missed
        detector.on_feed_update(FeedId::A, &trade(1, FeedId::A, 2_500_000));
        assert_eq!(detector.get_stats().missed_opportunities, 1);
    }

    #[test]
    fn test_callback_fires_per_opportunity() {
        use std::sync::mpsc;
        let detector = ArbitrageDetector::new();
        let (tx, rx) = mpsc::channel();
        detector.set_callback(Box::new(move |opp| {
            tx.send(opp.symbol_id).ok();
        }));

        detector.on_feed_update(FeedId::A, &quote(7, FeedId::A, 10_000, 10_010, 100));
        detector.on_feed_update(FeedId::B, &quote(7, FeedId::B, 10_020, 10_030, 200));

        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_recent_ring_caps_at_limit() {
        let detector = ArbitrageDetector::new();
        detector.on_feed_update(FeedId::A, &quote(1, FeedId::A, 10_000, 10_010, 0));
        for i in 0..(MAX_RECENT_OPPORTUNITIES as i64 + 5) {
            // every B refresh differs from A, recording one opportunity
            detector.on_feed_update(FeedId::B, &quote(1, FeedId::B, 9_000 + i, 9_010 + i, i));
        }

        let recent = detector.get_recent_opportunities(usize::MAX);
        assert_eq!(recent.len(), MAX_RECENT_OPPORTUNITIES);
        // oldest entries were discarded
        assert_eq!(recent[0].feed_b_bid, Price::from_raw(9_005));

        let last_two = detector.get_recent_opportunities(2);
        assert_eq!(last_two.len(), 2);
        assert_eq!(
            last_two[1].feed_b_bid,
            Price::from_raw(9_000 + MAX_RECENT_OPPORTUNITIES as i64 + 4)
        );
    }

    #[test]
    fn test_stats_latency_accounting() {
        let detector = ArbitrageDetector::new();
        detector.on_feed_update(FeedId::A, &quote(1, FeedId::A, 10_000, 10_010, 1_000));
        detector.on_feed_update(FeedId::B, &quote(1, FeedId::B, 10_020, 10_030, 3_000));
        detector.on_feed_update(FeedId::B, &quote(1, FeedId::B, 10_040, 10_050, 1_500));

        let stats = detector.get_stats();
        assert_eq!(stats.opportunities_detected, 2);
        assert_eq!(stats.latency_diff_min_ns, 500);
        assert_eq!(stats.latency_diff_max_ns, 2_000);
        assert_eq!(stats.latency_diff_sum_ns, 2_500);
        assert!(stats.average_latency_diff_us() > 0.0);
        assert!(stats.average_profit_bps() > 0.0);
    }
}
