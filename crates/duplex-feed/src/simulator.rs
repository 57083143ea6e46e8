//! Feed simulator: one redundant feed with injected latency.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use duplex_core::constants::BACKUP_FEED_PENALTY_NS;
use duplex_core::types::{Price, Quantity};
use duplex_queue::spsc;

use crate::config::FeedConfig;
use crate::messages::{FeedId, MarketDataUpdate, Quote, TradeTick};
use crate::stats::{FeedStats, SharedFeedStats};

/// Callback invoked from the feed worker for each delivered message,
/// together with a snapshot of the feed's statistics.
pub type FeedCallback = Box<dyn Fn(&MarketDataUpdate, &FeedStats) + Send + 'static>;

/// Worker sleep when the pending queue is empty.
const IDLE_SLEEP: Duration = Duration::from_micros(1);

/// A producer of market-data updates on behalf of one feed identifier.
///
/// Published messages are stamped with a strictly monotonic per-feed
/// sequence and queued; the worker thread delivers each after the
/// configured latency (or drops it), updating [`FeedStats`] along the way.
/// Messages enqueued but not yet delivered when the feed stops are
/// discarded.
pub struct FeedSimulator {
    feed_id: FeedId,
    config: FeedConfig,
    volatile_market: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    sequence: AtomicU64,
    producer: Mutex<spsc::Producer<MarketDataUpdate>>,
    /// Present until the first `start`; later starts build a fresh queue.
    consumer: Mutex<Option<spsc::Consumer<MarketDataUpdate>>>,
    stats: Arc<SharedFeedStats>,
    callback: Arc<Mutex<Option<FeedCallback>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl FeedSimulator {
    /// Create a stopped simulator for the given feed
    #[must_use]
    pub fn new(feed_id: FeedId, config: FeedConfig) -> Self {
        let (producer, consumer) = spsc::channel();
        let volatile_market = Arc::new(AtomicBool::new(config.volatile_market));
        Self {
            feed_id,
            volatile_market,
            running: Arc::new(AtomicBool::new(false)),
            sequence: AtomicU64::new(config.sequence_start),
            producer: Mutex::new(producer),
            consumer: Mutex::new(Some(consumer)),
            stats: Arc::new(SharedFeedStats::new()),
            callback: Arc::new(Mutex::new(None)),
            worker: Mutex::new(None),
            config,
        }
    }

    /// The feed this simulator publishes as
    #[must_use]
    pub const fn feed_id(&self) -> FeedId {
        self.feed_id
    }

    /// Queue a quote for delivery
    pub fn publish_quote(
        &self,
        symbol_id: u64,
        bid_price: Price,
        ask_price: Price,
        bid_size: Quantity,
        ask_size: Quantity,
    ) {
        let quote = Quote::new(symbol_id, bid_price, ask_price, bid_size, ask_size, self.feed_id);
        self.publish(MarketDataUpdate::Quote(quote));
    }

    /// Queue a trade print for delivery
    pub fn publish_trade(&self, symbol_id: u64, price: Price, quantity: Quantity, is_buy: bool) {
        let tick = TradeTick::new(symbol_id, price, quantity, self.feed_id, is_buy);
        self.publish(MarketDataUpdate::Trade(tick));
    }

    fn publish(&self, mut update: MarketDataUpdate) {
        update.set_sequence(self.sequence.fetch_add(1, Ordering::Relaxed));
        self.producer.lock().push(update);
    }

    /// Set the delivery callback. Replaces any previous callback.
    pub fn set_callback(&self, callback: FeedCallback) {
        *self.callback.lock() = Some(callback);
    }

    /// Toggle volatile-market mode, which replaces spike logic with scaled
    /// uniform jitter on every message.
    pub fn set_volatile_market(&self, volatile_market: bool) {
        self.volatile_market.store(volatile_market, Ordering::Relaxed);
        debug!(feed = %self.feed_id, volatile_market, "volatility changed");
    }

    /// Snapshot of the feed's statistics
    #[must_use]
    pub fn get_stats(&self) -> FeedStats {
        self.stats.snapshot()
    }

    /// Start the delivery worker. No-op when already running.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }

        let consumer = match self.consumer.lock().take() {
            Some(consumer) => consumer,
            None => {
                // Restart: messages left over from the previous run were
                // discarded with the old queue.
                let (producer, consumer) = spsc::channel();
                *self.producer.lock() = producer;
                consumer
            }
        };

        let worker = DeliveryWorker {
            consumer,
            config: self.config.clone(),
            volatile_market: Arc::clone(&self.volatile_market),
            running: Arc::clone(&self.running),
            stats: Arc::clone(&self.stats),
            callback: Arc::clone(&self.callback),
            rng: match self.config.rng_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
        };
        let name = format!("duplex-feed-{}", self.feed_id);
        if let Ok(handle) = thread::Builder::new().name(name).spawn(move || worker.run()) {
            *self.worker.lock() = Some(handle);
            info!(feed = %self.feed_id, "feed started");
        } else {
            self.running.store(false, Ordering::Release);
        }
    }

    /// Stop the delivery worker and discard undelivered messages.
    /// No-op when already stopped.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
        info!(feed = %self.feed_id, "feed stopped");
    }
}

impl Drop for FeedSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The worker side of a simulator: sleeps the computed latency, rolls the
/// drop dice, updates stats, and delivers to the callback.
struct DeliveryWorker {
    consumer: spsc::Consumer<MarketDataUpdate>,
    config: FeedConfig,
    volatile_market: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    stats: Arc<SharedFeedStats>,
    callback: Arc<Mutex<Option<FeedCallback>>>,
    rng: StdRng,
}

impl DeliveryWorker {
    fn run(mut self) {
        let mut last_delivery: Option<Instant> = None;

        while self.running.load(Ordering::Acquire) {
            let Some(update) = self.consumer.pop() else {
                thread::sleep(IDLE_SLEEP);
                continue;
            };

            let latency_ns = self.draw_latency();
            if latency_ns > 0 {
                thread::sleep(Duration::from_nanos(latency_ns));
            }

            if self.rng.gen::<f64>() < self.config.drop_probability {
                self.stats.record_drop();
                continue;
            }

            let now = Instant::now();
            #[allow(clippy::cast_possible_truncation)]
            let inter_arrival = last_delivery.map(|t| now.duration_since(t).as_nanos() as u64);
            last_delivery = Some(now);
            self.stats.record_delivery(inter_arrival, update.sequence());

            let snapshot = self.stats.snapshot();
            if let Some(cb) = self.callback.lock().as_ref() {
                cb(&update, &snapshot);
            }
        }
    }

    /// Total injected delay for the next message.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn draw_latency(&mut self) -> u64 {
        let mut latency_ns = self.config.base_latency_ns;

        if self.volatile_market.load(Ordering::Relaxed) {
            let jitter = self.config.jitter_normal_ns * self.config.volatile_jitter_multiplier;
            latency_ns += (self.rng.gen::<f64>() * jitter as f64) as u64;
        } else if self.rng.gen::<f64>() < self.config.spike_probability {
            latency_ns += self.config.jitter_spike_ns;
        } else {
            latency_ns += (self.rng.gen::<f64>() * self.config.jitter_normal_ns as f64) as u64;
        }

        if !self.config.is_primary_feed {
            latency_ns += BACKUP_FEED_PENALTY_NS;
        }
        latency_ns
    }
}
