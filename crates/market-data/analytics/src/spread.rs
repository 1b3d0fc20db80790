//! Spread decomposition following Huang & Stoll (1997)
//!
//! The quoted spread compensates market makers for order processing,
//! inventory risk, and adverse selection. Per trade, with d = +1 for a buy
//! aggressor and −1 for a sell:
//!
//! - effective spread  e = 2·d·(trade − mid_before)
//! - realized spread   r = 2·d·(trade − mid_after)
//! - price impact      e − r = 2·d·(mid_after − mid_before)
//!
//! The realized spread is the market maker's revenue after the mid has
//! drifted; the adverse-selection share is the impact's fraction of the
//! effective spread.

use crate::stats::percentile;
use common::{Px, Qty, Side};

/// One trade with the midpoints bracketing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeObservation {
    /// Execution price.
    pub trade_price: Px,
    /// Midpoint at trade time.
    pub mid_before: Px,
    /// Midpoint a fixed horizon later.
    pub mid_after: Px,
    /// Executed quantity.
    pub volume: Qty,
    /// Side that crossed the spread.
    pub aggressor: Side,
}

/// Spread decomposition results, in ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpreadMetrics {
    /// Mean quoted spread.
    pub avg_quoted_spread: f64,
    /// Mean |effective spread|.
    pub avg_effective_spread: f64,
    /// Mean realized spread (signed; negative means the maker lost).
    pub avg_realized_spread: f64,
    /// Mean |price impact|.
    pub avg_price_impact: f64,
    /// 100 · impact / effective.
    pub adverse_selection_pct: f64,
    /// Median of |effective spread|.
    pub median_effective_spread: f64,
    /// 95th percentile of |effective spread|.
    pub p95_effective_spread: f64,
    /// Volume-weighted |effective spread|.
    pub vwap_effective_spread: f64,
    /// Volume-weighted realized spread.
    pub vwap_realized_spread: f64,
    /// Trades observed.
    pub num_trades: usize,
}

/// Decompose the spread over a captured trade series.
#[must_use]
pub fn decompose_spread(trades: &[TradeObservation], quoted_spreads: &[i64]) -> SpreadMetrics {
    let mut result = SpreadMetrics::default();
    if trades.is_empty() {
        return result;
    }
    result.num_trades = trades.len();

    if !quoted_spreads.is_empty() {
        let sum: f64 = quoted_spreads.iter().map(|&s| s as f64).sum();
        result.avg_quoted_spread = sum / quoted_spreads.len() as f64;
    }

    let mut effective_spreads = Vec::with_capacity(trades.len());
    let mut sum_effective = 0.0;
    let mut sum_realized = 0.0;
    let mut sum_impact = 0.0;
    let mut vw_effective = 0.0;
    let mut vw_realized = 0.0;
    let mut total_volume = 0.0;

    for trade in trades {
        let d = if trade.aggressor == Side::Buy { 1.0 } else { -1.0 };
        let effective = 2.0 * d * (trade.trade_price - trade.mid_before) as f64;
        let realized = 2.0 * d * (trade.trade_price - trade.mid_after) as f64;
        let impact = effective - realized;

        sum_effective += effective.abs();
        sum_realized += realized;
        sum_impact += impact.abs();
        effective_spreads.push(effective.abs());

        let volume = trade.volume.as_f64();
        vw_effective += effective.abs() * volume;
        vw_realized += realized * volume;
        total_volume += volume;
    }

    let n = trades.len() as f64;
    result.avg_effective_spread = sum_effective / n;
    result.avg_realized_spread = sum_realized / n;
    result.avg_price_impact = sum_impact / n;

    if result.avg_effective_spread > 0.0 {
        result.adverse_selection_pct =
            result.avg_price_impact / result.avg_effective_spread * 100.0;
    }

    if total_volume > 0.0 {
        result.vwap_effective_spread = vw_effective / total_volume;
        result.vwap_realized_spread = vw_realized / total_volume;
    }

    effective_spreads.sort_by(f64::total_cmp);
    result.median_effective_spread = percentile(&effective_spreads, 0.5);
    result.p95_effective_spread = percentile(&effective_spreads, 0.95);

    result
}
