//! Shared domain types for the matching core
//!
//! Everything on the hot path is integer arithmetic: prices are `i64` tick
//! counts, quantities are `u64` lot multiples, timestamps are monotonic
//! nanosecond counters. Floating point appears only at the analytics
//! boundary via the `as_f64` accessors.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod order;
pub mod types;

pub use order::{
    AmendRequest, CancelRequest, NewOrderRequest, OrderId, OrderStatus, OrderType, SeqNum, Side,
    TimeInForce, Trade,
};
pub use types::{Px, Qty, Symbol, Ts};
