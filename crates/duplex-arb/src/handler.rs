//! Bridge wiring two feed simulators, the detector, and the engine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use duplex_core::constants::SYNTHETIC_ORDER_ID_BASE;
use duplex_core::types::{Order, OrderId, Price, Quantity, Side};
use duplex_engine::{EngineStatsSnapshot, MatchingEngine};
use duplex_feed::{FeedConfig, FeedId, FeedSimulator, FeedStats, MarketDataUpdate, Quote};

use crate::detector::{ArbitrageDetector, ArbitrageOpportunity, ArbitrageStats};

/// Profit threshold above which an opportunity is logged
const SIGNIFICANT_PROFIT_BPS: f64 = 1.0;

/// Configurations for the two feeds
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FeedHandlerConfig {
    /// Feed A (primary, fast)
    pub feed_a: FeedConfig,
    /// Feed B (backup, slow)
    pub feed_b: FeedConfig,
}

impl Default for FeedHandlerConfig {
    fn default() -> Self {
        Self {
            feed_a: FeedConfig::primary(),
            feed_b: FeedConfig::backup(),
        }
    }
}

/// The A/B feed handler.
///
/// Owns two feed simulators and an [`ArbitrageDetector`], and bridges them
/// to a shared [`MatchingEngine`]: every delivered update reaches the
/// detector, and feed A quotes additionally synthesize maker bid/ask
/// orders into the engine. Feed B exists for cross-checking only; feed A is
/// the primary source for order synthesis.
pub struct FeedHandler {
    engine: Arc<MatchingEngine>,
    feed_a: Arc<FeedSimulator>,
    feed_b: Arc<FeedSimulator>,
    detector: Arc<ArbitrageDetector>,
}

impl FeedHandler {
    /// Create a handler with the default primary/backup feed configs
    #[must_use]
    pub fn new(engine: Arc<MatchingEngine>) -> Self {
        Self::with_config(engine, FeedHandlerConfig::default())
    }

    /// Create a handler with explicit feed configs
    #[must_use]
    pub fn with_config(engine: Arc<MatchingEngine>, config: FeedHandlerConfig) -> Self {
        let feed_a = Arc::new(FeedSimulator::new(FeedId::A, config.feed_a));
        let feed_b = Arc::new(FeedSimulator::new(FeedId::B, config.feed_b));
        let detector = Arc::new(ArbitrageDetector::new());
        // Handler-owned id sequence for synthesized maker orders, seeded
        // high to stay clear of client order ids.
        let next_order_id = Arc::new(AtomicU64::new(SYNTHETIC_ORDER_ID_BASE));

        {
            let detector = Arc::clone(&detector);
            let engine = Arc::clone(&engine);
            let next_order_id = Arc::clone(&next_order_id);
            feed_a.set_callback(Box::new(move |update, _stats| {
                detector.on_feed_update(FeedId::A, update);
                if let MarketDataUpdate::Quote(quote) = update {
                    synthesize_maker_orders(&engine, &next_order_id, quote);
                }
            }));
        }
        {
            let detector = Arc::clone(&detector);
            feed_b.set_callback(Box::new(move |update, _stats| {
                detector.on_feed_update(FeedId::B, update);
            }));
        }
        detector.set_callback(Box::new(on_opportunity));

        Self {
            engine,
            feed_a,
            feed_b,
            detector,
        }
    }

    /// Start both feeds. The engine's lifecycle belongs to its owner.
    pub fn start(&self) {
        self.feed_a.start();
        self.feed_b.start();
        info!("feed handler started with A/B feeds");
    }

    /// Stop both feeds
    pub fn stop(&self) {
        self.feed_a.stop();
        self.feed_b.stop();
        info!("feed handler stopped");
    }

    /// Publish a quote to both feeds
    pub fn publish_quote(
        &self,
        symbol_id: u64,
        bid_price: Price,
        ask_price: Price,
        bid_size: Quantity,
        ask_size: Quantity,
    ) {
        self.feed_a
            .publish_quote(symbol_id, bid_price, ask_price, bid_size, ask_size);
        self.feed_b
            .publish_quote(symbol_id, bid_price, ask_price, bid_size, ask_size);
    }

    /// Publish a trade print to both feeds
    pub fn publish_trade(&self, symbol_id: u64, price: Price, quantity: Quantity, is_buy: bool) {
        self.feed_a.publish_trade(symbol_id, price, quantity, is_buy);
        self.feed_b.publish_trade(symbol_id, price, quantity, is_buy);
    }

    /// Toggle volatile-market jitter on both feeds
    pub fn set_volatile_market(&self, volatile_market: bool) {
        self.feed_a.set_volatile_market(volatile_market);
        self.feed_b.set_volatile_market(volatile_market);
        if volatile_market {
            info!("market volatility: jitter scaled up on both feeds");
        } else {
            info!("market conditions: normal");
        }
    }

    /// The arbitrage detector
    #[must_use]
    pub fn detector(&self) -> &Arc<ArbitrageDetector> {
        &self.detector
    }

    /// Statistics of both feeds, `(A, B)`
    #[must_use]
    pub fn feed_stats(&self) -> (FeedStats, FeedStats) {
        (self.feed_a.get_stats(), self.feed_b.get_stats())
    }

    /// Detector statistics
    #[must_use]
    pub fn arbitrage_stats(&self) -> ArbitrageStats {
        self.detector.get_stats()
    }

    /// Engine statistics
    #[must_use]
    pub fn engine_stats(&self) -> EngineStatsSnapshot {
        self.engine.get_stats()
    }

    /// The most recent arbitrage opportunities, oldest first
    #[must_use]
    pub fn recent_arbitrage(&self, count: usize) -> Vec<ArbitrageOpportunity> {
        self.detector.get_recent_opportunities(count)
    }
}

impl Drop for FeedHandler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Convert a feed A quote into resting maker orders on both sides.
fn synthesize_maker_orders(
    engine: &MatchingEngine,
    next_order_id: &AtomicU64,
    quote: &Quote,
) {
    if quote.bid_price.is_positive() && !quote.bid_size.is_zero() {
        let bid = Order::new_limit(
            OrderId::new(next_order_id.fetch_add(1, Ordering::Relaxed)),
            quote.symbol_id,
            Side::Buy,
            quote.bid_price,
            quote.bid_size,
        );
        if let Err(e) = engine.submit_order(bid) {
            warn!(symbol_id = quote.symbol_id, error = %e, "maker bid dropped");
        }
    }

    if quote.ask_price.is_positive() && !quote.ask_size.is_zero() {
        let ask = Order::new_limit(
            OrderId::new(next_order_id.fetch_add(1, Ordering::Relaxed)),
            quote.symbol_id,
            Side::Sell,
            quote.ask_price,
            quote.ask_size,
        );
        if let Err(e) = engine.submit_order(ask) {
            warn!(symbol_id = quote.symbol_id, error = %e, "maker ask dropped");
        }
    }
}

fn on_opportunity(opportunity: &ArbitrageOpportunity) {
    let profit_bps = opportunity.profit_basis_points();
    if profit_bps > SIGNIFICANT_PROFIT_BPS {
        #[allow(clippy::cast_precision_loss)]
        let latency_us = opportunity.latency_difference_ns as f64 / 1_000.0;
        info!(
            symbol_id = opportunity.symbol_id,
            profit_bps,
            latency_us,
            fast_feed = %opportunity.fast_feed,
            "arbitrage opportunity"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        done()
    }

    fn instant_config() -> FeedHandlerConfig {
        FeedHandlerConfig {
            feed_a: FeedConfig::instant(),
            feed_b: FeedConfig::instant(),
        }
    }

    #[test]
    fn test_feed_a_quotes_synthesize_maker_orders() {
        let engine = Arc::new(MatchingEngine::new());
        engine.register_symbol(1);
        engine.start().unwrap();

        let handler = FeedHandler::with_config(Arc::clone(&engine), instant_config());
        handler.start();
        handler.publish_quote(
            1,
            Price::from_raw(10_000),
            Price::from_raw(10_010),
            Quantity::new(5),
            Quantity::new(5),
        );

        // one bid and one ask from feed A; feed B synthesizes nothing
        assert!(wait_until(Duration::from_secs(2), || {
            engine.get_stats().total_orders >= 2
        }));
        handler.stop();
        engine.stop();

        let stats = engine.get_stats();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.rejected_orders, 0);

        let snapshot = engine.book_snapshot(1).unwrap();
        assert_eq!(snapshot.best_bid, Some(Price::from_raw(10_000)));
        assert_eq!(snapshot.best_ask, Some(Price::from_raw(10_010)));
    }

    #[test]
    fn test_synthesized_order_ids_are_namespaced() {
        let engine = Arc::new(MatchingEngine::new());
        engine.register_symbol(1);

        let (tx, rx) = std::sync::mpsc::channel();
        engine.set_order_callback(Box::new(move |order, _| {
            tx.send(order.id.value()).ok();
        }));
        engine.start().unwrap();

        let handler = FeedHandler::with_config(Arc::clone(&engine), instant_config());
        handler.start();
        handler.publish_quote(
            1,
            Price::from_raw(10_000),
            Price::from_raw(10_010),
            Quantity::new(5),
            Quantity::new(5),
        );

        assert!(wait_until(Duration::from_secs(2), || {
            engine.get_stats().total_orders >= 2
        }));
        handler.stop();
        engine.stop();

        let ids: Vec<u64> = rx.try_iter().collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(|&id| id >= SYNTHETIC_ORDER_ID_BASE));
        assert!(ids[1] > ids[0]);
    }

    #[test]
    fn test_stale_backup_quote_is_detected_as_disparity() {
        let engine = Arc::new(MatchingEngine::new());
        engine.register_symbol(1);
        engine.start().unwrap();

        // feed B delivers ~20ms late, so the detector compares A's fresh
        // quote against B's stale one
        let config = FeedHandlerConfig {
            feed_a: FeedConfig::instant(),
            feed_b: FeedConfig {
                base_latency_ns: 20_000_000,
                ..FeedConfig::instant()
            },
        };
        let handler = FeedHandler::with_config(Arc::clone(&engine), config);
        handler.start();

        handler.publish_quote(
            1,
            Price::from_raw(10_000),
            Price::from_raw(10_010),
            Quantity::new(5),
            Quantity::new(5),
        );
        // a second, different quote while B still carries the first
        handler.publish_quote(
            1,
            Price::from_raw(10_100),
            Price::from_raw(10_110),
            Quantity::new(5),
            Quantity::new(5),
        );

        assert!(wait_until(Duration::from_secs(3), || {
            handler.arbitrage_stats().opportunities_detected >= 1
        }));
        handler.stop();
        engine.stop();

        let (stats_a, stats_b) = handler.feed_stats();
        assert_eq!(stats_a.messages_received, 2);
        assert!(stats_b.messages_received >= 1);
        assert!(handler.arbitrage_stats().opportunities_detected >= 1);
        assert!(!handler.recent_arbitrage(10).is_empty());
    }

    #[test]
    fn test_trades_reach_detector_only() {
        let engine = Arc::new(MatchingEngine::new());
        engine.register_symbol(1);
        engine.start().unwrap();

        let handler = FeedHandler::with_config(Arc::clone(&engine), instant_config());
        handler.start();
        handler.publish_trade(1, Price::from_raw(10_000), Quantity::new(3), true);

        assert!(wait_until(Duration::from_secs(2), || {
            let (a, b) = handler.feed_stats();
            a.messages_received == 1 && b.messages_received == 1
        }));
        handler.stop();
        engine.stop();

        // trades never synthesize orders
        assert_eq!(engine.get_stats().total_orders, 0);
    }
}
