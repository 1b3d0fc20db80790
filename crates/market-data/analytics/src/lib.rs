//! Microstructure estimators over captured series
//!
//! All four estimators are pure functions: captured trade, quote, and
//! midprice series in, a result struct out. Floating point lives here and
//! only here; the matching core stays integer. Estimators that see inputs
//! below their minimum (fewer than 3 regression points, fewer than 20
//! return samples, no non-zero flow pairs) return zero-filled results;
//! callers detect this through the sample-count fields.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod imbalance;
pub mod impact;
pub mod spread;
pub mod stylized;

mod stats;

pub use imbalance::{order_flow_imbalance, BboObservation, OfiMetrics};
pub use impact::{kyle_lambda, KyleLambda};
pub use spread::{decompose_spread, SpreadMetrics, TradeObservation};
pub use stylized::{stylized_facts, FactCheck, StylizedFacts};

use common::{Px, Qty, Side};

/// A trade as captured from the feed, placed on a seconds timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeSample {
    /// Seconds since session start.
    pub timestamp: f64,
    /// Execution price.
    pub price: Px,
    /// Executed quantity.
    pub volume: Qty,
    /// Side that crossed the spread.
    pub aggressor: Side,
}
