//! Per-symbol engine facade
//!
//! Routes submissions, cancels, and amends to the owning book, keeps
//! venue-wide statistics, and fans trades out to global subscribers. The
//! engine is single-threaded like the books it owns; scaling across
//! symbols is per-book sharding with no cross-book operations.

use crate::book::{BookEvent, OrderBook};
use crate::pool::OrderHandle;
use ahash::AHashMap;
use common::{AmendRequest, CancelRequest, NewOrderRequest, OrderId, Symbol, Trade};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace};

/// Submission failure. Both variants leave the engine unchanged apart from
/// the reject counter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The symbol was never registered.
    #[error("symbol {0} is not registered")]
    UnknownSymbol(Symbol),
    /// The id is already active on this book.
    #[error("order id {0} is already active")]
    DuplicateId(OrderId),
}

/// Venue-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Accepted submissions.
    pub total_orders: u64,
    /// Successful cancels.
    pub total_cancels: u64,
    /// Successful amends.
    pub total_amends: u64,
    /// Executions across all books.
    pub total_trades: u64,
    /// Traded quantity across all books.
    pub total_volume: u64,
    /// Rejected submissions.
    pub total_rejects: u64,
    /// Currently active orders across all books.
    pub active_orders: u64,
    /// Registered symbols.
    pub symbols_active: u64,
}

type TradeSubscriber = Box<dyn FnMut(&Trade)>;

/// State updated from inside book callbacks: trade totals and the global
/// trade fan-out list.
#[derive(Default)]
struct EngineShared {
    total_trades: u64,
    total_volume: u64,
    subscribers: Vec<TradeSubscriber>,
}

impl EngineShared {
    fn on_trade(&mut self, trade: &Trade) {
        self.total_trades += 1;
        self.total_volume += trade.quantity.raw();
        for subscriber in &mut self.subscribers {
            subscriber(trade);
        }
    }
}

/// Multi-symbol matching engine.
pub struct MatchingEngine {
    books: AHashMap<Symbol, OrderBook>,
    shared: Rc<RefCell<EngineShared>>,
    total_orders: u64,
    total_cancels: u64,
    total_amends: u64,
    total_rejects: u64,
}

impl MatchingEngine {
    /// Engine with no symbols registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            books: AHashMap::new(),
            shared: Rc::new(RefCell::new(EngineShared::default())),
            total_orders: 0,
            total_cancels: 0,
            total_amends: 0,
            total_rejects: 0,
        }
    }

    /// Register a tradeable symbol. Must be called before any orders for
    /// it; registering twice returns the existing book.
    pub fn add_symbol(&mut self, symbol: Symbol) -> &mut OrderBook {
        let shared = Rc::clone(&self.shared);
        self.books.entry(symbol).or_insert_with(|| {
            debug!(%symbol, "registering book");
            let mut book = OrderBook::new(symbol);
            book.subscribe(Box::new(move |event| {
                if let BookEvent::Trade { trade, .. } = event {
                    shared.borrow_mut().on_trade(trade);
                }
            }));
            book
        })
    }

    /// The book for `symbol`, if registered.
    #[must_use]
    pub fn book(&self, symbol: Symbol) -> Option<&OrderBook> {
        self.books.get(&symbol)
    }

    /// The book for `symbol`, mutably, if registered.
    pub fn book_mut(&mut self, symbol: Symbol) -> Option<&mut OrderBook> {
        self.books.get_mut(&symbol)
    }

    /// Route a submission to its book.
    pub fn submit_order(&mut self, req: &NewOrderRequest) -> Result<OrderHandle, SubmitError> {
        let Some(book) = self.books.get_mut(&req.symbol) else {
            self.total_rejects += 1;
            trace!(symbol = %req.symbol, id = req.id, "reject: unknown symbol");
            return Err(SubmitError::UnknownSymbol(req.symbol));
        };
        match book.submit(req) {
            Some(handle) => {
                self.total_orders += 1;
                Ok(handle)
            }
            None => {
                self.total_rejects += 1;
                trace!(symbol = %req.symbol, id = req.id, "reject: duplicate id");
                Err(SubmitError::DuplicateId(req.id))
            }
        }
    }

    /// Route a cancel; false if the symbol, id, or order state does not
    /// permit it.
    pub fn cancel_order(&mut self, req: &CancelRequest) -> bool {
        let Some(book) = self.books.get_mut(&req.symbol) else {
            return false;
        };
        let ok = book.cancel(req.order_id);
        if ok {
            self.total_cancels += 1;
        }
        ok
    }

    /// Route an amend; false if the symbol, id, or order state does not
    /// permit it.
    pub fn amend_order(&mut self, req: &AmendRequest) -> bool {
        let Some(book) = self.books.get_mut(&req.symbol) else {
            return false;
        };
        let ok = book.amend(req);
        if ok {
            self.total_amends += 1;
        }
        ok
    }

    /// Add a global trade subscriber. Appends; never replaces.
    pub fn subscribe_trades(&mut self, subscriber: impl FnMut(&Trade) + 'static) {
        self.shared
            .borrow_mut()
            .subscribers
            .push(Box::new(subscriber));
    }

    /// Snapshot of venue-wide counters.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        let shared = self.shared.borrow();
        EngineStats {
            total_orders: self.total_orders,
            total_cancels: self.total_cancels,
            total_amends: self.total_amends,
            total_trades: shared.total_trades,
            total_volume: shared.total_volume,
            total_rejects: self.total_rejects,
            active_orders: self
                .books
                .values()
                .map(|book| book.active_orders() as u64)
                .sum(),
            symbols_active: self.books.len() as u64,
        }
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}
