//! Feed simulator configuration.

use serde::{Deserialize, Serialize};

/// Configuration of one simulated feed's latency behavior.
///
/// All latencies are in nanoseconds. Jitter draws are uniform in
/// `[0, bound)`; spikes add a fixed delay with the configured probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Always-applied delay on each delivered message
    pub base_latency_ns: u64,
    /// Upper bound of uniform jitter added to each non-spike message
    pub jitter_normal_ns: u64,
    /// Additional delay added when a spike is drawn
    pub jitter_spike_ns: u64,
    /// Per-message probability of a spike (non-volatile mode only)
    pub spike_probability: f64,
    /// Per-message probability of the message being dropped after delay
    pub drop_probability: f64,
    /// Backup feeds pay a fixed extra delivery delay
    pub is_primary_feed: bool,
    /// Initial sequence number
    pub sequence_start: u64,
    /// When set, spike logic is replaced by scaled uniform jitter
    pub volatile_market: bool,
    /// Scale applied to normal jitter in volatile mode
    pub volatile_jitter_multiplier: u64,
    /// Seed for the latency RNG; `None` seeds from entropy
    pub rng_seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_latency_ns: 5_000,    // 5us
            jitter_normal_ns: 1_000,   // 1us
            jitter_spike_ns: 500_000,  // 500us
            spike_probability: 0.001,  // 0.1%
            drop_probability: 0.0001,  // 0.01%
            is_primary_feed: true,
            sequence_start: 1,
            volatile_market: false,
            volatile_jitter_multiplier: 100,
            rng_seed: None,
        }
    }
}

impl FeedConfig {
    /// Configuration for the primary (fast) feed
    #[must_use]
    pub fn primary() -> Self {
        Self::default()
    }

    /// Configuration for the backup (slow) feed
    #[must_use]
    pub fn backup() -> Self {
        Self {
            base_latency_ns: 10_000,    // 10us
            jitter_normal_ns: 2_000,    // 2us
            jitter_spike_ns: 1_000_000, // 1ms
            spike_probability: 0.002,   // 0.2%
            is_primary_feed: false,
            ..Self::default()
        }
    }

    /// Zero-latency, lossless configuration for deterministic tests
    #[must_use]
    pub fn instant() -> Self {
        Self {
            base_latency_ns: 0,
            jitter_normal_ns: 0,
            jitter_spike_ns: 0,
            spike_probability: 0.0,
            drop_probability: 0.0,
            ..Self::default()
        }
    }

    /// Set the RNG seed for deterministic latency draws
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}
