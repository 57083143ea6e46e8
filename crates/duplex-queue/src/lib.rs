//! # duplex-queue
//!
//! Lock-free inter-thread queues for the duplex matching engine.
//!
//! This crate provides the two queue shapes the engine and feed layer are
//! built on:
//!
//! - [`spsc`]: an unbounded single-producer/single-consumer linked queue,
//!   split into [`spsc::Producer`] and [`spsc::Consumer`] handles so the
//!   one-producer/one-consumer contract is enforced by the type system.
//! - [`mpmc`]: a bounded multi-producer/multi-consumer ring over
//!   sequence-stamped cells.
//!
//! Producer- and consumer-side hot state lives on separate cache lines
//! (`crossbeam_utils::CachePadded`) to avoid false sharing.
//!
//! ## Example
//!
//! ```rust
//! let (mut tx, mut rx) = duplex_queue::spsc::channel::<u64>();
//! tx.push(1);
//! tx.push(2);
//! assert_eq!(rx.pop(), Some(1));
//! assert_eq!(rx.pop(), Some(2));
//! assert_eq!(rx.pop(), None);
//! ```

#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod mpmc;
pub mod spsc;

pub use mpmc::MpmcQueue;
pub use spsc::{channel, Consumer, Producer};
