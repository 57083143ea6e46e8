//! # duplex-arb
//!
//! Cross-feed arbitrage detection over the redundant A/B market-data feeds,
//! and the [`FeedHandler`] bridge that wires two feed simulators, the
//! detector, and the matching engine together.
//!
//! The [`ArbitrageDetector`] remembers the latest quote per symbol from
//! each feed. Whenever both feeds have reported, it flags crossed books
//! (one feed's bid above the other's ask) and same-side price disparities,
//! quantifying profit in basis points and the feed-relative latency gap.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod detector;
pub mod handler;

pub use detector::{
    ArbitrageCallback, ArbitrageDetector, ArbitrageOpportunity, ArbitrageStats,
};
pub use handler::{FeedHandler, FeedHandlerConfig};
