//! Order lifecycle enums, request messages, and the trade record

use crate::types::{Px, Qty, Symbol, Ts};
use serde::{Deserialize, Serialize};

/// Order identifier, monotonic within a venue.
pub type OrderId = u64;

/// Book-scoped sequence number. Incremented on every observable
/// state-changing event: a new rest, an amend that loses priority, a trade.
pub type SeqNum = u64;

/// Side of an order or trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bid).
    Buy = 0,
    /// Sell side (ask/offer).
    Sell = 1,
}

impl Side {
    /// Whether this is the buy side.
    #[inline]
    #[must_use]
    pub const fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }

    /// The opposite side.
    #[inline]
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

/// Order type.
///
/// `Ioc` is a limit order whose remainder is cancelled immediately;
/// `Market` implies `Ioc` plus the market-price sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderType {
    /// Limit order: rests if not fully matched.
    Limit = 0,
    /// Market order: match at any price, cancel the remainder.
    Market = 1,
    /// Immediate-or-cancel: match what is possible now, cancel the rest.
    Ioc = 2,
    /// Fill-or-kill: execute fully or not at all.
    Fok = 3,
}

/// Time in force. `Day` is carried but treated as `Gtc` for matching;
/// callers manage the day boundary externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TimeInForce {
    /// Good till cancelled.
    Gtc = 0,
    /// Immediate or cancel.
    Ioc = 1,
    /// Fill or kill.
    Fok = 2,
    /// Day order.
    Day = 3,
}

/// Order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderStatus {
    /// Accepted, no fills yet.
    New = 0,
    /// Some quantity filled, remainder live.
    PartiallyFilled = 1,
    /// Fully filled. Terminal.
    Filled = 2,
    /// Cancelled with zero remainder. Terminal.
    Cancelled = 3,
    /// Rejected at submission. Terminal.
    Rejected = 4,
    /// Amended; still live until filled or cancelled.
    Amended = 5,
}

impl OrderStatus {
    /// Whether an order in this state is still live in the book.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::New | Self::PartiallyFilled | Self::Amended)
    }
}

/// Execution report for a single fill.
///
/// The price is always the resting order's limit price: price improvement
/// accrues to the aggressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Book sequence at execution.
    pub sequence: SeqNum,
    /// Buying order.
    pub buy_order_id: OrderId,
    /// Selling order.
    pub sell_order_id: OrderId,
    /// Execution price in ticks.
    pub price: Px,
    /// Executed quantity.
    pub quantity: Qty,
    /// Execution timestamp.
    pub exec_time: Ts,
    /// Side that crossed the spread.
    pub aggressor: Side,
    /// Instrument.
    pub symbol: Symbol,
}

/// New order submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    /// Caller-assigned order id, unique per venue.
    pub id: OrderId,
    /// Side.
    pub side: Side,
    /// Order type.
    pub kind: OrderType,
    /// Time in force.
    pub tif: TimeInForce,
    /// Limit price in ticks, or [`Px::MARKET`].
    pub price: Px,
    /// Order quantity.
    pub quantity: Qty,
    /// Instrument.
    pub symbol: Symbol,
}

/// Cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRequest {
    /// Order to cancel.
    pub order_id: OrderId,
    /// Instrument.
    pub symbol: Symbol,
}

/// Amend request. A zero price or quantity means "unchanged for this field".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendRequest {
    /// Order to amend.
    pub order_id: OrderId,
    /// New limit price, or zero to keep the current price.
    pub new_price: Px,
    /// New remaining quantity, or zero to keep the current quantity.
    pub new_quantity: Qty,
    /// Instrument.
    pub symbol: Symbol,
}
