//! Per-feed delivery statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use duplex_core::constants::{JITTER_EVENT_MULTIPLE, JITTER_WARMUP_MESSAGES};

/// Plain-value snapshot of one feed's counters.
///
/// Latency fields describe inter-arrival gaps between delivered messages;
/// `latency_min_ns` is `u64::MAX` until two messages have been delivered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeedStats {
    /// Messages delivered to the callback
    pub messages_received: u64,
    /// Messages intentionally dropped
    pub messages_dropped: u64,
    /// Sum of inter-arrival latencies
    pub latency_sum_ns: u64,
    /// Minimum inter-arrival latency
    pub latency_min_ns: u64,
    /// Maximum inter-arrival latency
    pub latency_max_ns: u64,
    /// Deliveries whose latency exceeded 10x the running average
    pub jitter_events: u64,
    /// Sequence number of the last delivered message
    pub last_sequence: u64,
}

impl Default for FeedStats {
    fn default() -> Self {
        Self {
            messages_received: 0,
            messages_dropped: 0,
            latency_sum_ns: 0,
            latency_min_ns: u64::MAX,
            latency_max_ns: 0,
            jitter_events: 0,
            last_sequence: 0,
        }
    }
}

impl FeedStats {
    /// Number of recorded inter-arrival samples
    #[must_use]
    pub fn latency_samples(&self) -> u64 {
        self.messages_received.saturating_sub(1)
    }

    /// Average inter-arrival latency in nanoseconds
    #[must_use]
    pub fn average_latency_ns(&self) -> u64 {
        let samples = self.latency_samples();
        if samples == 0 {
            0
        } else {
            self.latency_sum_ns / samples
        }
    }

    /// Average inter-arrival latency in microseconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_latency_us(&self) -> f64 {
        self.average_latency_ns() as f64 / 1_000.0
    }
}

/// Live counters mutated by the simulator worker and read by monitoring
/// threads. All loads and stores are relaxed; snapshots may be torn, which
/// is acceptable for monitoring.
#[derive(Debug, Default)]
pub(crate) struct SharedFeedStats {
    messages_received: AtomicU64,
    messages_dropped: AtomicU64,
    latency_sum_ns: AtomicU64,
    latency_min_ns: AtomicU64,
    latency_max_ns: AtomicU64,
    jitter_events: AtomicU64,
    last_sequence: AtomicU64,
}

impl SharedFeedStats {
    pub(crate) fn new() -> Self {
        let stats = Self::default();
        stats.latency_min_ns.store(u64::MAX, Ordering::Relaxed);
        stats
    }

    /// Record one delivered message; `inter_arrival_ns` is `None` for the
    /// first delivery. Counts a jitter event when the gap exceeds the
    /// configured multiple of the running average, after warmup.
    pub(crate) fn record_delivery(&self, inter_arrival_ns: Option<u64>, sequence: u64) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.last_sequence.store(sequence, Ordering::Relaxed);

        let Some(latency_ns) = inter_arrival_ns else {
            return;
        };
        self.latency_sum_ns.fetch_add(latency_ns, Ordering::Relaxed);
        self.latency_min_ns.fetch_min(latency_ns, Ordering::Relaxed);
        self.latency_max_ns.fetch_max(latency_ns, Ordering::Relaxed);

        let received = self.messages_received.load(Ordering::Relaxed);
        if received > JITTER_WARMUP_MESSAGES {
            let samples = received - 1;
            let average = self.latency_sum_ns.load(Ordering::Relaxed) / samples;
            if latency_ns > average.saturating_mul(JITTER_EVENT_MULTIPLE) {
                self.jitter_events.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub(crate) fn record_drop(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> FeedStats {
        FeedStats {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            latency_sum_ns: self.latency_sum_ns.load(Ordering::Relaxed),
            latency_min_ns: self.latency_min_ns.load(Ordering::Relaxed),
            latency_max_ns: self.latency_max_ns.load(Ordering::Relaxed),
            jitter_events: self.jitter_events.load(Ordering::Relaxed),
            last_sequence: self.last_sequence.load(Ordering::Relaxed),
        }
    }
}
