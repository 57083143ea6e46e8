//! Engine counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Live engine counters, updated with relaxed atomics by the worker.
///
/// Counters are independent; no cross-counter atomicity is implied by a
/// snapshot.
#[derive(Debug, Default)]
pub struct EngineStats {
    /// Orders submitted (accepted or rejected)
    pub total_orders: AtomicU64,
    /// Trades generated
    pub total_trades: AtomicU64,
    /// Quantity traded
    pub total_volume: AtomicU64,
    /// Submissions to unregistered symbols
    pub rejected_orders: AtomicU64,
    /// Successful cancels
    pub cancelled_orders: AtomicU64,
    /// Successful modifies
    pub modified_orders: AtomicU64,
}

impl EngineStats {
    /// Take a relaxed snapshot of all counters
    #[must_use]
    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            total_orders: self.total_orders.load(Ordering::Relaxed),
            total_trades: self.total_trades.load(Ordering::Relaxed),
            total_volume: self.total_volume.load(Ordering::Relaxed),
            rejected_orders: self.rejected_orders.load(Ordering::Relaxed),
            cancelled_orders: self.cancelled_orders.load(Ordering::Relaxed),
            modified_orders: self.modified_orders.load(Ordering::Relaxed),
        }
    }

    /// Reset every counter to zero
    pub fn reset(&self) {
        self.total_orders.store(0, Ordering::Relaxed);
        self.total_trades.store(0, Ordering::Relaxed);
        self.total_volume.store(0, Ordering::Relaxed);
        self.rejected_orders.store(0, Ordering::Relaxed);
        self.cancelled_orders.store(0, Ordering::Relaxed);
        self.modified_orders.store(0, Ordering::Relaxed);
    }
}

/// Plain-value snapshot of [`EngineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatsSnapshot {
    /// Orders submitted (accepted or rejected)
    pub total_orders: u64,
    /// Trades generated
    pub total_trades: u64,
    /// Quantity traded
    pub total_volume: u64,
    /// Submissions to unregistered symbols
    pub rejected_orders: u64,
    /// Successful cancels
    pub cancelled_orders: u64,
    /// Successful modifies
    pub modified_orders: u64,
}
