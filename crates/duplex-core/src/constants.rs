//! Constants used throughout the duplex matching engine.

/// Number of implied decimal places in fixed-point prices
pub const PRICE_DECIMALS: u32 = 6;

/// Fixed-point scale factor (one whole currency unit in raw ticks)
pub const PRICE_SCALE: i64 = 1_000_000;

/// Nanoseconds per microsecond
pub const NS_PER_US: u64 = 1_000;

/// Nanoseconds per millisecond
pub const NS_PER_MS: u64 = 1_000_000;

/// Nanoseconds per second
pub const NS_PER_SEC: u64 = 1_000_000_000;

/// Cache line size assumed for hot-path record layout
pub const CACHE_LINE_SIZE: usize = 64;

/// Additional fixed delivery delay applied by non-primary feeds (500 us)
pub const BACKUP_FEED_PENALTY_NS: u64 = 500_000;

/// Trade-report gap between feeds above which an opportunity counts as missed (1 ms)
pub const MISSED_OPPORTUNITY_GAP_NS: u64 = 1_000_000;

/// Number of delivered messages required before jitter events are counted
pub const JITTER_WARMUP_MESSAGES: u64 = 100;

/// Inter-arrival latency multiple over the running average that counts as a jitter event
pub const JITTER_EVENT_MULTIPLE: u64 = 10;

/// Maximum number of recent arbitrage opportunities retained by the detector
pub const MAX_RECENT_OPPORTUNITIES: usize = 1000;

/// First order id used for feed-synthesized maker orders
pub const SYNTHETIC_ORDER_ID_BASE: u64 = 1_000_000;
