//! # duplex-feed
//!
//! Market-data message types and the A/B feed simulator.
//!
//! A [`FeedSimulator`] plays the role of one redundant feed (`A` or `B`):
//! published quotes and trades are stamped with a strictly monotonic
//! per-feed sequence, queued, and delivered by a worker thread after an
//! injected latency (base + jitter + probabilistic spikes, scaled further
//! in volatile-market mode), with probabilistic drops and per-feed
//! statistics.
//!
//! ## Example
//!
//! ```rust,no_run
//! use duplex_core::types::{Price, Quantity};
//! use duplex_feed::{FeedConfig, FeedId, FeedSimulator};
//!
//! let feed = FeedSimulator::new(FeedId::A, FeedConfig::primary());
//! feed.set_callback(Box::new(|update, stats| {
//!     println!("seq {} after {} messages", update.sequence(), stats.messages_received);
//! }));
//! feed.start();
//! feed.publish_quote(1, Price::from_units(100), Price::from_units(101), Quantity::new(10), Quantity::new(10));
//! feed.stop();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod messages;
pub mod simulator;
pub mod stats;

pub use config::FeedConfig;
pub use messages::{FeedId, MarketDataUpdate, Quote, TradeTick};
pub use simulator::{FeedCallback, FeedSimulator};
pub use stats::FeedStats;
