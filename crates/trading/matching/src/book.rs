//! Central limit order book with price-time priority
//!
//! Two sorted maps of price levels (bids descending, asks ascending) plus a
//! hash index from order id to pool handle for O(1) cancel and amend. An
//! incoming order scans the opposite side from the best price inward,
//! filling FIFO within each level; any remainder rests or is cancelled
//! according to the order type.
//!
//! Observable events fan out to an append-only subscriber list. Each event
//! carries the post-event best bid/offer by value, so subscribers never
//! need to read the book from inside a callback.

use crate::level::PriceLevel;
use crate::order::Order;
use crate::pool::{OrderHandle, OrderPool};
use ahash::AHashMap;
use common::{
    AmendRequest, NewOrderRequest, OrderId, OrderStatus, OrderType, Px, Qty, SeqNum, Symbol, Trade,
    Ts,
};
use std::collections::BTreeMap;
use tracing::trace;

/// Best bid and offer, each with the size at the best level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bbo {
    /// Highest bid price and its level size, if any bids rest.
    pub bid: Option<(Px, Qty)>,
    /// Lowest ask price and its level size, if any asks rest.
    pub ask: Option<(Px, Qty)>,
}

/// Observable book event, delivered synchronously in program order.
///
/// The attached [`Bbo`] reflects the book immediately after the event.
/// Within one submission, `Trade` fires before the `Fill` for the resting
/// order it consumed, and a `Cancelled` for an aggressor's remainder fires
/// after all of that submission's trades.
#[derive(Debug)]
pub enum BookEvent<'a> {
    /// An execution occurred.
    Trade {
        /// The execution report.
        trade: &'a Trade,
        /// Post-trade best bid/offer.
        bbo: Bbo,
    },
    /// An order (or its remainder) entered the book.
    Rested {
        /// The resting order.
        order: &'a Order,
        /// Post-rest best bid/offer.
        bbo: Bbo,
    },
    /// A resting order was partially or fully filled.
    Fill {
        /// The resting order after the fill.
        order: &'a Order,
        /// Post-fill best bid/offer.
        bbo: Bbo,
    },
    /// An order was cancelled (explicitly, or as an unfilled remainder).
    Cancelled {
        /// The cancelled order.
        order: &'a Order,
        /// Post-cancel best bid/offer.
        bbo: Bbo,
    },
    /// An amend was applied. Fires before any re-match the amend triggers.
    Amended {
        /// The amended order.
        order: &'a Order,
        /// Best bid/offer after the amend was applied.
        bbo: Bbo,
    },
}

/// Opaque token identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&BookEvent<'_>)>;

#[derive(Default)]
struct Subscribers {
    next_token: u64,
    entries: Vec<(u64, Subscriber)>,
}

impl Subscribers {
    fn subscribe(&mut self, subscriber: Subscriber) -> SubscriptionId {
        let token = self.next_token;
        self.next_token += 1;
        self.entries.push((token, subscriber));
        SubscriptionId(token)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(token, _)| *token != id.0);
        self.entries.len() != before
    }

    fn dispatch(&mut self, event: &BookEvent<'_>) {
        for (_, subscriber) in &mut self.entries {
            subscriber(event);
        }
    }
}

/// Snapshot of one price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelView {
    /// Level price.
    pub price: Px,
    /// Aggregate remaining quantity.
    pub quantity: Qty,
    /// Number of queued orders.
    pub order_count: u32,
}

/// A single-instrument central limit order book.
pub struct OrderBook {
    symbol: Symbol,
    bids: BTreeMap<Px, PriceLevel>,
    asks: BTreeMap<Px, PriceLevel>,
    order_index: AHashMap<OrderId, OrderHandle>,
    pool: OrderPool,
    next_sequence: SeqNum,
    trade_count: u64,
    total_volume: u64,
    subscribers: Subscribers,
}

fn bbo_of(bids: &BTreeMap<Px, PriceLevel>, asks: &BTreeMap<Px, PriceLevel>) -> Bbo {
    Bbo {
        bid: bids
            .iter()
            .next_back()
            .map(|(&price, level)| (price, level.total_quantity())),
        ask: asks
            .iter()
            .next()
            .map(|(&price, level)| (price, level.total_quantity())),
    }
}

/// One fill against a resting order.
///
/// The level aggregate is decremented first, while it still reflects both
/// orders' pre-fill sizes; only then are the orders mutated. Reordering
/// these steps sends the aggregate through the clamp path.
fn execute_fill(
    level: &mut PriceLevel,
    pool: &mut OrderPool,
    incoming: OrderHandle,
    resting: OrderHandle,
    fill_qty: Qty,
    now: Ts,
) {
    level.reduce_quantity(fill_qty);
    pool.get_mut(incoming).fill(fill_qty, now);
    pool.get_mut(resting).fill(fill_qty, now);
}

impl OrderBook {
    /// Empty book for `symbol`.
    #[must_use]
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_index: AHashMap::new(),
            pool: OrderPool::new(),
            next_sequence: 1,
            trade_count: 0,
            total_volume: 0,
            subscribers: Subscribers::default(),
        }
    }

    /// Book with a caller-chosen pool capacity (tests, small sessions).
    #[must_use]
    pub fn with_pool_capacity(symbol: Symbol, capacity: usize) -> Self {
        let mut book = Self::new(symbol);
        book.pool = OrderPool::with_capacity(capacity);
        book
    }

    // ── Subscriptions ──

    /// Register an event subscriber. Never replaces existing subscribers;
    /// events are delivered in registration order.
    pub fn subscribe(&mut self, subscriber: Subscriber) -> SubscriptionId {
        self.subscribers.subscribe(subscriber)
    }

    /// Remove a subscriber by token. Returns false if unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // ── Order operations ──

    /// Submit a new order: allocate, initialize, index, match, then rest or
    /// cancel the remainder by type. Returns `None` (no side effects) for a
    /// duplicate id.
    pub fn submit(&mut self, req: &NewOrderRequest) -> Option<OrderHandle> {
        if self.order_index.contains_key(&req.id) {
            return None;
        }
        trace!(symbol = %self.symbol, id = req.id, "submit");

        let now = Ts::now();
        let handle = self.pool.allocate();
        let sequence = self.next_seq();
        self.pool.get_mut(handle).init(req, sequence, now);
        self.order_index.insert(req.id, handle);

        self.match_incoming(handle);

        if self.pool.get(handle).leaves_qty.is_zero() {
            // Fully filled on entry; the index holds active orders only.
            self.order_index.remove(&req.id);
        } else {
            match self.pool.get(handle).kind {
                OrderType::Limit => {
                    self.rest(handle);
                    let bbo = self.bbo();
                    let Self {
                        pool, subscribers, ..
                    } = self;
                    subscribers.dispatch(&BookEvent::Rested {
                        order: pool.get(handle),
                        bbo,
                    });
                }
                OrderType::Market | OrderType::Ioc | OrderType::Fok => {
                    self.pool.get_mut(handle).cancel(Ts::now());
                    self.order_index.remove(&req.id);
                    let bbo = self.bbo();
                    let Self {
                        pool, subscribers, ..
                    } = self;
                    subscribers.dispatch(&BookEvent::Cancelled {
                        order: pool.get(handle),
                        bbo,
                    });
                }
            }
        }

        Some(handle)
    }

    /// Cancel an active order. Returns false if the id is unknown or the
    /// order is no longer active; a second cancel of the same id is a
    /// no-op returning false.
    pub fn cancel(&mut self, id: OrderId) -> bool {
        let Some(&handle) = self.order_index.get(&id) else {
            return false;
        };
        if !self.pool.get(handle).is_active() {
            return false;
        }
        trace!(symbol = %self.symbol, id, "cancel");

        // Unlink while leaves_qty still holds the remainder, so the level
        // aggregate subtraction is exact.
        self.unrest(handle);
        self.pool.get_mut(handle).cancel(Ts::now());
        self.order_index.remove(&id);

        let bbo = self.bbo();
        let Self {
            pool, subscribers, ..
        } = self;
        subscribers.dispatch(&BookEvent::Cancelled {
            order: pool.get(handle),
            bbo,
        });
        true
    }

    /// Amend price and/or quantity. A price change or quantity increase
    /// loses queue priority (remove, re-match, re-rest); a pure reduction
    /// keeps it. Zero fields mean "unchanged"; a no-op amend returns true
    /// with no side effects.
    pub fn amend(&mut self, req: &AmendRequest) -> bool {
        let Some(&handle) = self.order_index.get(&req.order_id) else {
            return false;
        };
        if !self.pool.get(handle).is_active() {
            return false;
        }

        let (cur_price, cur_leaves, filled) = {
            let order = self.pool.get(handle);
            (order.price, order.leaves_qty, order.filled_qty)
        };
        let price_changed = req.new_price.ticks() != 0 && req.new_price != cur_price;
        let qty_increased = !req.new_quantity.is_zero() && req.new_quantity > cur_leaves;
        let qty_reduced = !req.new_quantity.is_zero() && req.new_quantity < cur_leaves;

        if price_changed || qty_increased {
            trace!(symbol = %self.symbol, id = req.order_id, "amend loses priority");
            self.unrest(handle);

            let sequence = self.next_seq();
            {
                let order = self.pool.get_mut(handle);
                if req.new_price.ticks() != 0 {
                    order.price = req.new_price;
                }
                if !req.new_quantity.is_zero() {
                    order.quantity = req.new_quantity;
                    order.leaves_qty = req.new_quantity.saturating_sub(filled);
                }
                order.sequence = sequence;
                order.status = OrderStatus::Amended;
                order.last_update = Ts::now();
            }

            // Event precedes the re-match so feed consumers can account
            // the re-match trades against the order's new price and size.
            let bbo = self.bbo();
            {
                let Self {
                    pool, subscribers, ..
                } = self;
                subscribers.dispatch(&BookEvent::Amended {
                    order: pool.get(handle),
                    bbo,
                });
            }

            self.match_incoming(handle);

            let (leaves, kind) = {
                let order = self.pool.get(handle);
                (order.leaves_qty, order.kind)
            };
            if !leaves.is_zero() && kind == OrderType::Limit {
                self.rest(handle);
                let bbo = self.bbo();
                let Self {
                    pool, subscribers, ..
                } = self;
                subscribers.dispatch(&BookEvent::Rested {
                    order: pool.get(handle),
                    bbo,
                });
            } else if leaves.is_zero() {
                self.order_index.remove(&req.order_id);
            }
            true
        } else if qty_reduced {
            trace!(symbol = %self.symbol, id = req.order_id, "amend reduces quantity");
            let reduction = cur_leaves - req.new_quantity;
            {
                let order = self.pool.get_mut(handle);
                order.leaves_qty = req.new_quantity;
                order.quantity = order.quantity.saturating_sub(reduction);
                order.status = OrderStatus::Amended;
                order.last_update = Ts::now();
            }

            let (is_buy, price) = {
                let order = self.pool.get(handle);
                (order.is_buy(), order.price)
            };
            let levels = if is_buy { &mut self.bids } else { &mut self.asks };
            if let Some(level) = levels.get_mut(&price) {
                level.reduce_quantity(reduction);
            }

            let bbo = self.bbo();
            let Self {
                pool, subscribers, ..
            } = self;
            subscribers.dispatch(&BookEvent::Amended {
                order: pool.get(handle),
                bbo,
            });
            true
        } else {
            true
        }
    }

    // ── Matching ──

    fn match_incoming(&mut self, incoming: OrderHandle) {
        if self.pool.get(incoming).kind == OrderType::Fok && !self.can_fill_completely(incoming) {
            return;
        }

        let Self {
            symbol,
            pool,
            bids,
            asks,
            order_index,
            subscribers,
            next_sequence,
            trade_count,
            total_volume,
            ..
        } = self;
        let symbol = *symbol;

        let (side, limit_px) = {
            let order = pool.get(incoming);
            (order.side, order.price)
        };
        let is_buy = side.is_buy();

        loop {
            if pool.get(incoming).leaves_qty.is_zero() {
                break;
            }

            let best = if is_buy {
                asks.keys().next().copied()
            } else {
                bids.keys().next_back().copied()
            };
            let Some(level_px) = best else { break };

            let acceptable = limit_px.is_market()
                || if is_buy {
                    limit_px >= level_px
                } else {
                    limit_px <= level_px
                };
            if !acceptable {
                break;
            }

            // One fill per pass: the level borrow ends before events are
            // dispatched, so subscribers see a consistent post-fill BBO.
            while !pool.get(incoming).leaves_qty.is_zero() {
                let contra = if is_buy { &mut *asks } else { &mut *bids };
                let Some(level) = contra.get_mut(&level_px) else {
                    break;
                };
                let Some(resting) = level.front() else {
                    contra.remove(&level_px);
                    break;
                };

                let now = Ts::now();
                let fill_qty = pool
                    .get(incoming)
                    .leaves_qty
                    .min(pool.get(resting).leaves_qty);

                let sequence = *next_sequence;
                *next_sequence += 1;

                let (buy_id, sell_id) = if is_buy {
                    (pool.get(incoming).id, pool.get(resting).id)
                } else {
                    (pool.get(resting).id, pool.get(incoming).id)
                };
                let trade = Trade {
                    sequence,
                    buy_order_id: buy_id,
                    sell_order_id: sell_id,
                    price: pool.get(resting).price,
                    quantity: fill_qty,
                    exec_time: now,
                    aggressor: side,
                    symbol,
                };

                execute_fill(level, pool, incoming, resting, fill_qty, now);

                *trade_count += 1;
                *total_volume += fill_qty.raw();

                if pool.get(resting).is_filled() {
                    level.pop_front(pool);
                    order_index.remove(&pool.get(resting).id);
                    // Not released: the pool retains filled orders until
                    // the book tears down.
                    if level.is_empty() {
                        contra.remove(&level_px);
                    }
                }

                let bbo = bbo_of(bids, asks);
                subscribers.dispatch(&BookEvent::Trade { trade: &trade, bbo });
                subscribers.dispatch(&BookEvent::Fill {
                    order: pool.get(resting),
                    bbo,
                });
            }
        }
    }

    /// FOK feasibility: walk the contra side best-price inward under the
    /// same acceptability rule as the matching loop, summing level
    /// aggregates until the needed quantity is reachable.
    fn can_fill_completely(&self, incoming: OrderHandle) -> bool {
        let order = self.pool.get(incoming);
        let mut needed = order.leaves_qty;

        if order.is_buy() {
            for (&price, level) in &self.asks {
                if !order.price.is_market() && order.price < price {
                    break;
                }
                needed = needed.saturating_sub(level.total_quantity());
                if needed.is_zero() {
                    return true;
                }
            }
        } else {
            for (&price, level) in self.bids.iter().rev() {
                if !order.price.is_market() && order.price > price {
                    break;
                }
                needed = needed.saturating_sub(level.total_quantity());
                if needed.is_zero() {
                    return true;
                }
            }
        }
        needed.is_zero()
    }

    fn rest(&mut self, handle: OrderHandle) {
        let (is_buy, price) = {
            let order = self.pool.get(handle);
            (order.is_buy(), order.price)
        };
        let levels = if is_buy { &mut self.bids } else { &mut self.asks };
        let level = levels.entry(price).or_insert_with(|| PriceLevel::new(price));
        level.push_back(&mut self.pool, handle);
    }

    fn unrest(&mut self, handle: OrderHandle) {
        let (is_buy, price) = {
            let order = self.pool.get(handle);
            (order.is_buy(), order.price)
        };
        let levels = if is_buy { &mut self.bids } else { &mut self.asks };
        if let Some(level) = levels.get_mut(&price) {
            level.remove(&mut self.pool, handle);
            if level.is_empty() {
                levels.remove(&price);
            }
        }
    }

    fn next_seq(&mut self) -> SeqNum {
        let seq = self.next_sequence;
        self.next_sequence += 1;
        seq
    }

    // ── Queries ──

    /// Highest bid price.
    #[must_use]
    pub fn best_bid(&self) -> Option<Px> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest ask price.
    #[must_use]
    pub fn best_ask(&self) -> Option<Px> {
        self.asks.keys().next().copied()
    }

    /// Best bid and offer with level sizes.
    #[must_use]
    pub fn bbo(&self) -> Bbo {
        bbo_of(&self.bids, &self.asks)
    }

    /// Integer midprice (truncating division); `None` if a side is empty.
    #[must_use]
    pub fn midprice(&self) -> Option<Px> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(Px::from_ticks((bid.ticks() + ask.ticks()) / 2)),
            _ => None,
        }
    }

    /// Spread in ticks; `None` if a side is empty.
    #[must_use]
    pub fn spread(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Top-n bid levels, highest price first.
    #[must_use]
    pub fn bid_levels(&self, max_levels: usize) -> Vec<LevelView> {
        self.bids
            .iter()
            .rev()
            .take(max_levels)
            .map(|(&price, level)| LevelView {
                price,
                quantity: level.total_quantity(),
                order_count: level.order_count(),
            })
            .collect()
    }

    /// Top-n ask levels, lowest price first.
    #[must_use]
    pub fn ask_levels(&self, max_levels: usize) -> Vec<LevelView> {
        self.asks
            .iter()
            .take(max_levels)
            .map(|(&price, level)| LevelView {
                price,
                quantity: level.total_quantity(),
                order_count: level.order_count(),
            })
            .collect()
    }

    /// Cumulative bid quantity over the top `max_levels` levels (all if 0).
    #[must_use]
    pub fn bid_depth(&self, max_levels: usize) -> Qty {
        Self::side_depth(self.bids.values().rev(), max_levels)
    }

    /// Cumulative ask quantity over the top `max_levels` levels (all if 0).
    #[must_use]
    pub fn ask_depth(&self, max_levels: usize) -> Qty {
        Self::side_depth(self.asks.values(), max_levels)
    }

    fn side_depth<'a>(levels: impl Iterator<Item = &'a PriceLevel>, max_levels: usize) -> Qty {
        let mut total = Qty::ZERO;
        for (count, level) in levels.enumerate() {
            if max_levels > 0 && count >= max_levels {
                break;
            }
            total += level.total_quantity();
        }
        total
    }

    /// Look up an active order's handle by id.
    #[must_use]
    pub fn find(&self, id: OrderId) -> Option<OrderHandle> {
        self.order_index.get(&id).copied()
    }

    /// Resolve any handle returned by this book.
    #[must_use]
    pub fn order(&self, handle: OrderHandle) -> &Order {
        self.pool.get(handle)
    }

    /// Instrument symbol.
    #[must_use]
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// Number of active (indexed) orders.
    #[must_use]
    pub fn active_orders(&self) -> usize {
        self.order_index.len()
    }

    /// Executions so far.
    #[must_use]
    pub fn trade_count(&self) -> u64 {
        self.trade_count
    }

    /// Total traded quantity.
    #[must_use]
    pub fn total_volume(&self) -> u64 {
        self.total_volume
    }

    /// Next sequence number to be assigned.
    #[must_use]
    pub fn sequence(&self) -> SeqNum {
        self.next_sequence
    }

    // ── Invariant checks ──

    /// True when either side is empty or best bid < best ask.
    #[must_use]
    pub fn check_no_crossed_book(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid < ask,
            _ => true,
        }
    }

    /// True when sequences within every level increase strictly head to
    /// tail.
    #[must_use]
    pub fn check_fifo_invariant(&self) -> bool {
        let check = |side: &BTreeMap<Px, PriceLevel>| {
            side.values().all(|level| {
                let mut prev_seq = 0;
                level.iter(&self.pool).all(|(_, order)| {
                    let ok = order.sequence > prev_seq;
                    prev_seq = order.sequence;
                    ok
                })
            })
        };
        check(&self.bids) && check(&self.asks)
    }

    /// CRC32 over the top-25 (price, quantity) pairs of both sides, for
    /// cheap post-state comparison in determinism tests.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for view in self.bid_levels(25).iter().chain(self.ask_levels(25).iter()) {
            hasher.update(&view.price.ticks().to_le_bytes());
            hasher.update(&view.quantity.raw().to_le_bytes());
        }
        hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Side, TimeInForce};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn limit(id: OrderId, side: Side, price: i64, qty: u64) -> NewOrderRequest {
        NewOrderRequest {
            id,
            side,
            kind: OrderType::Limit,
            tif: TimeInForce::Gtc,
            price: Px::from_ticks(price),
            quantity: Qty::new(qty),
            symbol: Symbol::new("TEST"),
        }
    }

    fn market(id: OrderId, side: Side, qty: u64) -> NewOrderRequest {
        NewOrderRequest {
            id,
            side,
            kind: OrderType::Market,
            tif: TimeInForce::Ioc,
            price: Px::MARKET,
            quantity: Qty::new(qty),
            symbol: Symbol::new("TEST"),
        }
    }

    fn book() -> OrderBook {
        OrderBook::with_pool_capacity(Symbol::new("TEST"), 256)
    }

    #[test]
    fn resting_orders_set_bbo() {
        let mut book = book();
        book.submit(&limit(1, Side::Buy, 9_995, 100));
        book.submit(&limit(2, Side::Sell, 10_005, 200));

        assert_eq!(book.best_bid(), Some(Px::from_ticks(9_995)));
        assert_eq!(book.best_ask(), Some(Px::from_ticks(10_005)));
        assert_eq!(book.midprice(), Some(Px::from_ticks(10_000)));
        assert_eq!(book.spread(), Some(10));
        assert_eq!(book.active_orders(), 2);
        assert!(book.check_no_crossed_book());
    }

    #[test]
    fn crossing_limit_trades_at_resting_price() {
        let mut book = book();
        book.submit(&limit(1, Side::Buy, 10_005, 100));

        let trades = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&trades);
        book.subscribe(Box::new(move |event| {
            if let BookEvent::Trade { trade, .. } = event {
                sink.borrow_mut().push(**trade);
            }
        }));

        let sell = book.submit(&limit(2, Side::Sell, 9_995, 100)).unwrap();

        let trades = trades.borrow();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, Px::from_ticks(10_005));
        assert_eq!(trades[0].quantity, Qty::new(100));
        assert_eq!(trades[0].buy_order_id, 1);
        assert_eq!(trades[0].sell_order_id, 2);
        assert_eq!(trades[0].aggressor, Side::Sell);

        assert_eq!(book.order(sell).status, OrderStatus::Filled);
        assert_eq!(book.active_orders(), 0);
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn partial_fill_rests_remainder() {
        let mut book = book();
        book.submit(&limit(1, Side::Sell, 10_010, 50));
        let buy = book.submit(&limit(2, Side::Buy, 10_010, 120)).unwrap();

        let order = book.order(buy);
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.filled_qty, Qty::new(50));
        assert_eq!(order.leaves_qty, Qty::new(70));
        assert_eq!(book.best_bid(), Some(Px::from_ticks(10_010)));
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn market_remainder_is_cancelled() {
        let mut book = book();
        book.submit(&limit(1, Side::Sell, 10_010, 50));
        let buy = book.submit(&market(2, Side::Buy, 120)).unwrap();

        let order = book.order(buy);
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.filled_qty, Qty::new(50));
        assert!(order.leaves_qty.is_zero());
        assert_eq!(book.active_orders(), 0);
    }

    #[test]
    fn ioc_takes_what_it_can() {
        let mut book = book();
        book.submit(&limit(1, Side::Sell, 10_000, 30));
        book.submit(&limit(2, Side::Sell, 10_001, 30));

        let mut req = limit(3, Side::Buy, 10_000, 100);
        req.kind = OrderType::Ioc;
        req.tif = TimeInForce::Ioc;
        let h = book.submit(&req).unwrap();

        // Fills 30 at 10000, cannot reach 10001, remainder cancelled.
        let order = book.order(h);
        assert_eq!(order.filled_qty, Qty::new(30));
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(book.best_ask(), Some(Px::from_ticks(10_001)));
    }

    #[test]
    fn duplicate_id_rejected_without_side_effects() {
        let mut book = book();
        assert!(book.submit(&limit(1, Side::Buy, 10_000, 100)).is_some());
        let checksum = book.checksum();
        assert!(book.submit(&limit(1, Side::Buy, 9_999, 50)).is_none());
        assert_eq!(book.checksum(), checksum);
        assert_eq!(book.active_orders(), 1);
    }

    #[test]
    fn cancel_removes_and_is_idempotent() {
        let mut book = book();
        book.submit(&limit(1, Side::Buy, 10_000, 100));
        assert!(book.cancel(1));
        assert!(book.best_bid().is_none());
        assert_eq!(book.active_orders(), 0);
        assert!(!book.cancel(1), "second cancel must fail");
        assert!(!book.cancel(42), "unknown id must fail");
    }

    #[test]
    fn cancelled_order_never_matches() {
        let mut book = book();
        book.submit(&limit(1, Side::Buy, 10_000, 500));
        assert!(book.cancel(1));

        let sell = book.submit(&market(2, Side::Sell, 500)).unwrap();
        assert_eq!(book.order(sell).filled_qty, Qty::ZERO);
        assert_eq!(book.trade_count(), 0);
    }

    #[test]
    fn amend_reduce_keeps_priority_and_aggregate() {
        let mut book = book();
        let first = book.submit(&limit(1, Side::Buy, 10_000, 500)).unwrap();
        book.submit(&limit(2, Side::Buy, 10_000, 500));
        let seq_before = book.order(first).sequence;

        assert!(book.amend(&AmendRequest {
            order_id: 1,
            new_price: Px::from_ticks(0),
            new_quantity: Qty::new(200),
            symbol: Symbol::new("TEST"),
        }));

        assert_eq!(book.order(first).sequence, seq_before);
        assert_eq!(book.order(first).leaves_qty, Qty::new(200));
        assert_eq!(book.order(first).status, OrderStatus::Amended);
        let levels = book.bid_levels(1);
        assert_eq!(levels[0].quantity, Qty::new(700));
        assert_eq!(levels[0].order_count, 2);
    }

    #[test]
    fn amend_price_loses_priority_and_rematches() {
        let mut book = book();
        book.submit(&limit(1, Side::Sell, 10_010, 100));
        let buy = book.submit(&limit(2, Side::Buy, 10_000, 100)).unwrap();
        let seq_before = book.order(buy).sequence;

        // Move the bid up to cross; it must re-match against the ask.
        assert!(book.amend(&AmendRequest {
            order_id: 2,
            new_price: Px::from_ticks(10_010),
            new_quantity: Qty::ZERO,
            symbol: Symbol::new("TEST"),
        }));

        let order = book.order(buy);
        assert!(order.sequence > seq_before);
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(book.active_orders(), 0);
        assert_eq!(book.trade_count(), 1);
    }

    #[test]
    fn amend_noop_returns_true_without_events() {
        let mut book = book();
        book.submit(&limit(1, Side::Buy, 10_000, 100));

        let events = Rc::new(RefCell::new(0usize));
        let counter = Rc::clone(&events);
        book.subscribe(Box::new(move |_| *counter.borrow_mut() += 1));

        assert!(book.amend(&AmendRequest {
            order_id: 1,
            new_price: Px::from_ticks(0),
            new_quantity: Qty::ZERO,
            symbol: Symbol::new("TEST"),
        }));
        assert_eq!(*events.borrow(), 0);
    }

    #[test]
    fn fok_infeasible_leaves_book_untouched() {
        let mut book = book();
        book.submit(&limit(1, Side::Sell, 10_010, 50));
        book.submit(&limit(2, Side::Sell, 10_011, 50));
        let checksum = book.checksum();

        let mut req = limit(3, Side::Buy, 10_010, 80);
        req.kind = OrderType::Fok;
        req.tif = TimeInForce::Fok;
        let h = book.submit(&req).unwrap();

        assert_eq!(book.trade_count(), 0);
        assert_eq!(book.checksum(), checksum);
        assert_eq!(book.order(h).status, OrderStatus::Cancelled);
        assert!(book.order(h).leaves_qty.is_zero());
    }

    #[test]
    fn fok_feasible_fills_completely() {
        let mut book = book();
        book.submit(&limit(1, Side::Sell, 10_010, 50));
        book.submit(&limit(2, Side::Sell, 10_011, 50));

        let mut req = limit(4, Side::Buy, 10_011, 100);
        req.kind = OrderType::Fok;
        req.tif = TimeInForce::Fok;
        let h = book.submit(&req).unwrap();

        assert_eq!(book.order(h).status, OrderStatus::Filled);
        assert_eq!(book.trade_count(), 2);
        assert_eq!(book.total_volume(), 100);
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn depth_and_levels() {
        let mut book = book();
        book.submit(&limit(1, Side::Buy, 10_000, 100));
        book.submit(&limit(2, Side::Buy, 9_999, 200));
        book.submit(&limit(3, Side::Buy, 9_998, 300));
        book.submit(&limit(4, Side::Sell, 10_001, 150));

        assert_eq!(book.bid_depth(2), Qty::new(300));
        assert_eq!(book.bid_depth(0), Qty::new(600));
        assert_eq!(book.ask_depth(0), Qty::new(150));

        let bids = book.bid_levels(3);
        assert_eq!(bids[0].price, Px::from_ticks(10_000));
        assert_eq!(bids[2].price, Px::from_ticks(9_998));
    }

    #[test]
    fn subscriber_fan_out_appends_and_unsubscribes() {
        let mut book = book();

        let seen_a = Rc::new(RefCell::new(0usize));
        let seen_b = Rc::new(RefCell::new(0usize));
        let a = Rc::clone(&seen_a);
        let b = Rc::clone(&seen_b);
        let first = book.subscribe(Box::new(move |_| *a.borrow_mut() += 1));
        let _second = book.subscribe(Box::new(move |_| *b.borrow_mut() += 1));

        book.submit(&limit(1, Side::Buy, 10_000, 100));
        assert_eq!(*seen_a.borrow(), 1, "first subscriber still registered");
        assert_eq!(*seen_b.borrow(), 1, "second subscriber added, not replaced");

        assert!(book.unsubscribe(first));
        assert!(!book.unsubscribe(first));
        book.submit(&limit(2, Side::Buy, 9_999, 100));
        assert_eq!(*seen_a.borrow(), 1);
        assert_eq!(*seen_b.borrow(), 2);
    }

    #[test]
    fn event_order_trade_before_fill_before_cancel() {
        let mut book = book();
        book.submit(&limit(1, Side::Sell, 10_000, 50));

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        book.subscribe(Box::new(move |event| {
            sink.borrow_mut().push(match event {
                BookEvent::Trade { .. } => "trade",
                BookEvent::Fill { .. } => "fill",
                BookEvent::Rested { .. } => "rested",
                BookEvent::Cancelled { .. } => "cancelled",
                BookEvent::Amended { .. } => "amended",
            });
        }));

        book.submit(&market(2, Side::Buy, 80));
        assert_eq!(*log.borrow(), vec!["trade", "fill", "cancelled"]);
    }
}
