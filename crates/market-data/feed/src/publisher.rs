//! Feed publisher: book events in, sequenced records out
//!
//! The publisher owns sequence assignment (monotonic from 1), keeps the
//! in-memory record log that dump/replay works from, and optionally
//! forwards each record to a single callback and to an SPSC ring for an
//! off-thread consumer. Attaching to a book appends a subscriber to the
//! book's fan-out list; other subscribers are untouched.

use crate::record::{FeedRecord, FeedRecordType};
use bus::{Consumer, Producer};
use common::{Px, SeqNum, Symbol};
use matching::{Bbo, BookEvent, OrderBook, SubscriptionId};
use std::cell::RefCell;
use std::rc::Rc;

/// Ring capacity used for feed transport.
pub const RING_CAPACITY: usize = 1 << 16;

/// Producer half of the feed ring.
pub type FeedProducer = Producer<FeedRecord, RING_CAPACITY>;
/// Consumer half of the feed ring.
pub type FeedConsumer = Consumer<FeedRecord, RING_CAPACITY>;

/// Record counts by type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Records published in total.
    pub total_records: u64,
    /// Add records.
    pub add_count: u64,
    /// Trade records.
    pub trade_count: u64,
    /// Delete records.
    pub delete_count: u64,
    /// Snapshot records.
    pub snapshot_count: u64,
    /// Quote records.
    pub quote_count: u64,
    /// Records dropped on a full ring.
    pub ring_dropped: u64,
}

/// Publishes incremental book updates and snapshots.
pub struct FeedPublisher {
    next_seq: SeqNum,
    log: Vec<FeedRecord>,
    callback: Option<Box<dyn FnMut(&FeedRecord)>>,
    ring: Option<FeedProducer>,
    ring_dropped: u64,
}

impl FeedPublisher {
    /// Publisher with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_seq: 1,
            log: Vec::new(),
            callback: None,
            ring: None,
            ring_dropped: 0,
        }
    }

    /// Install the single subscriber callback.
    pub fn set_callback(&mut self, callback: impl FnMut(&FeedRecord) + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Forward every published record to an SPSC ring. Records that do not
    /// fit are counted as dropped; the log always keeps them.
    pub fn with_ring(&mut self, producer: FeedProducer) {
        self.ring = Some(producer);
    }

    /// Wire this publisher to a book. Returns the subscription token so
    /// the caller can detach later.
    pub fn attach(this: &Rc<RefCell<Self>>, book: &mut OrderBook) -> SubscriptionId {
        let publisher = Rc::clone(this);
        book.subscribe(Box::new(move |event| {
            publisher.borrow_mut().on_event(event);
        }))
    }

    fn on_event(&mut self, event: &BookEvent<'_>) {
        match event {
            BookEvent::Trade { trade, bbo } => {
                let seq = self.next_seq();
                self.emit(FeedRecord::make_trade(seq, trade));
                self.publish_quote(trade.symbol, *bbo);
            }
            BookEvent::Rested { order, bbo } | BookEvent::Amended { order, bbo } => {
                let seq = self.next_seq();
                self.emit(FeedRecord::make_add(seq, order));
                self.publish_quote(order.symbol, *bbo);
            }
            BookEvent::Cancelled { order, bbo } => {
                let seq = self.next_seq();
                self.emit(FeedRecord::make_delete(seq, order));
                self.publish_quote(order.symbol, *bbo);
            }
            BookEvent::Fill { order, bbo } => {
                // The trade record already carries the execution.
                self.publish_quote(order.symbol, *bbo);
            }
        }
    }

    /// Emit a snapshot of the book's current state.
    pub fn generate_snapshot(&mut self, book: &OrderBook) -> FeedRecord {
        let seq = self.next_seq();
        let record = FeedRecord::make_snapshot(
            seq,
            book.symbol(),
            book.best_bid().unwrap_or(Px::from_ticks(0)),
            book.best_ask().unwrap_or(Px::from_ticks(0)),
            book.bid_depth(0),
            book.ask_depth(0),
        );
        self.emit(record);
        record
    }

    fn publish_quote(&mut self, symbol: Symbol, bbo: Bbo) {
        // Quotes need both sides; a one-sided book publishes none.
        if let (Some((bid_price, bid_size)), Some((ask_price, ask_size))) = (bbo.bid, bbo.ask) {
            let seq = self.next_seq();
            self.emit(FeedRecord::make_quote(
                seq, symbol, bid_price, bid_size, ask_price, ask_size,
            ));
        }
    }

    fn emit(&mut self, record: FeedRecord) {
        if let Some(callback) = &mut self.callback {
            callback(&record);
        }
        if let Some(ring) = &mut self.ring {
            if ring.push(record).is_err() {
                self.ring_dropped += 1;
            }
        }
        self.log.push(record);
    }

    fn next_seq(&mut self) -> SeqNum {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// The record log, in publication order.
    #[must_use]
    pub fn records(&self) -> &[FeedRecord] {
        &self.log
    }

    /// Next sequence number to be assigned.
    #[must_use]
    pub fn sequence(&self) -> SeqNum {
        self.next_seq
    }

    /// Record counts by type.
    #[must_use]
    pub fn stats(&self) -> FeedStats {
        let mut stats = FeedStats {
            total_records: self.log.len() as u64,
            ring_dropped: self.ring_dropped,
            ..FeedStats::default()
        };
        for record in &self.log {
            match record.kind {
                FeedRecordType::AddOrder => stats.add_count += 1,
                FeedRecordType::Trade => stats.trade_count += 1,
                FeedRecordType::DeleteOrder => stats.delete_count += 1,
                FeedRecordType::Snapshot => stats.snapshot_count += 1,
                FeedRecordType::QuoteUpdate => stats.quote_count += 1,
                _ => {}
            }
        }
        stats
    }
}

impl Default for FeedPublisher {
    fn default() -> Self {
        Self::new()
    }
}
