//! Market-data feed
//!
//! Transforms book events into a standardized record stream, the way an
//! ITCH-style venue feed does: typed fixed-size records with a monotonic
//! sequence, an in-memory log for dump and replay, an optional subscriber,
//! and an optional SPSC ring for a downstream consumer thread.
//!
//! ```text
//! [OrderBook] → events → [FeedPublisher] → ring / log / callback
//! ```

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod publisher;
pub mod record;
pub mod replay;

pub use publisher::{FeedConsumer, FeedProducer, FeedPublisher, FeedStats, RING_CAPACITY};
pub use record::{FeedRecord, FeedRecordType, RecordError, RECORD_SIZE};
pub use replay::FeedReplayer;
