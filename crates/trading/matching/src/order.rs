//! The order record owned by the pool

use crate::pool::OrderHandle;
use common::{
    NewOrderRequest, OrderId, OrderStatus, OrderType, Px, Qty, SeqNum, Side, Symbol, TimeInForce,
    Ts,
};

/// A resting or in-flight order.
///
/// Storage is owned by the [`OrderPool`](crate::pool::OrderPool); price
/// levels and the id index hold non-owning handles. The `prev`/`next` link
/// handles make the record a node of its level's FIFO queue, so queue
/// append and arbitrary removal are O(1) without any per-order heap
/// allocation.
///
/// Identity fields (`id`, `side`, `kind`, `tif`, `entry_time`, `symbol`)
/// are immutable after initialization; everything else is mutated only by
/// the book.
#[derive(Debug, Clone)]
pub struct Order {
    /// Venue-unique order id, caller-assigned.
    pub id: OrderId,
    /// Book sequence; bumped when the order loses queue priority.
    pub sequence: SeqNum,
    /// Side.
    pub side: Side,
    /// Order type.
    pub kind: OrderType,
    /// Time in force.
    pub tif: TimeInForce,
    /// Limit price in ticks, or the market sentinel.
    pub price: Px,
    /// Current total quantity (may shrink via amend).
    pub quantity: Qty,
    /// Cumulative filled quantity; monotone increasing.
    pub filled_qty: Qty,
    /// Remaining quantity; monotone decreasing between amends.
    pub leaves_qty: Qty,
    /// Submission time.
    pub entry_time: Ts,
    /// Last state change.
    pub last_update: Ts,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Instrument.
    pub symbol: Symbol,
    pub(crate) prev: Option<OrderHandle>,
    pub(crate) next: Option<OrderHandle>,
}

impl Default for Order {
    fn default() -> Self {
        Self {
            id: 0,
            sequence: 0,
            side: Side::Buy,
            kind: OrderType::Limit,
            tif: TimeInForce::Gtc,
            price: Px::from_ticks(0),
            quantity: Qty::ZERO,
            filled_qty: Qty::ZERO,
            leaves_qty: Qty::ZERO,
            entry_time: Ts::from_nanos(0),
            last_update: Ts::from_nanos(0),
            status: OrderStatus::New,
            symbol: Symbol::new(""),
            prev: None,
            next: None,
        }
    }
}

impl Order {
    /// Reinitialize a pool slot for a fresh submission.
    pub(crate) fn init(&mut self, req: &NewOrderRequest, sequence: SeqNum, now: Ts) {
        self.id = req.id;
        self.sequence = sequence;
        self.side = req.side;
        self.kind = req.kind;
        self.tif = req.tif;
        self.price = req.price;
        self.quantity = req.quantity;
        self.filled_qty = Qty::ZERO;
        self.leaves_qty = req.quantity;
        self.entry_time = now;
        self.last_update = now;
        self.status = OrderStatus::New;
        self.symbol = req.symbol;
        self.prev = None;
        self.next = None;
    }

    /// Whether this is a buy order.
    #[inline]
    #[must_use]
    pub const fn is_buy(&self) -> bool {
        self.side.is_buy()
    }

    /// Whether the remaining quantity is zero.
    #[inline]
    #[must_use]
    pub const fn is_filled(&self) -> bool {
        self.leaves_qty.is_zero()
    }

    /// Whether the order is still live in the book.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Apply a fill of `qty` against the remaining quantity.
    pub(crate) fn fill(&mut self, qty: Qty, now: Ts) {
        self.filled_qty += qty;
        self.leaves_qty -= qty;
        self.last_update = now;
        self.status = if self.leaves_qty.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }

    /// Terminal cancel: zero the remainder.
    pub(crate) fn cancel(&mut self, now: Ts) {
        self.status = OrderStatus::Cancelled;
        self.leaves_qty = Qty::ZERO;
        self.last_update = now;
    }
}
