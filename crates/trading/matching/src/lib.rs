//! Price-time-priority matching core
//!
//! A single-venue central limit order book and the per-symbol engine around
//! it. The book is organized as two sorted maps of price levels (bids
//! descending, asks ascending); within each level, orders queue FIFO
//! through an intrusive doubly-linked list threaded through the order
//! records themselves, which the slab-backed pool owns. An id index gives
//! O(1) cancel and amend.
//!
//! The core is a single-threaded cooperative pipeline: one event at a time
//! is dispatched against one book, and every operation completes without
//! yielding. Subscribers observe book events synchronously; a callback must
//! not re-enter the book, and the borrow system makes that unrepresentable.
//!
//! Invariants maintained after every observable operation:
//! - the book is never crossed (best bid < best ask when both sides exist);
//! - sequences within any level are strictly increasing head to tail;
//! - identical input streams produce identical trade streams and post-state;
//! - total filled quantity equals twice total traded quantity.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod book;
pub mod engine;
pub mod level;
pub mod order;
pub mod pool;

pub use book::{Bbo, BookEvent, LevelView, OrderBook, SubscriptionId};
pub use engine::{EngineStats, MatchingEngine, SubmitError};
pub use level::PriceLevel;
pub use order::Order;
pub use pool::{OrderHandle, OrderPool};
