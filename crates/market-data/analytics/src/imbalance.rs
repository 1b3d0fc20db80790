//! Order flow imbalance and short-horizon return prediction
//!
//! Cont, Kukanov & Stoikov (2014): changes in the best bid/ask queue carry
//! directional pressure. For each consecutive BBO pair,
//!
//! - Δbid = size change if the bid price held, +new size if the bid rose,
//!   −old size if it fell;
//! - Δask = size change if the ask price held, −new size if the ask fell,
//!   +old size if it rose;
//! - the OFI contribution Δbid − Δask accumulates into the interval bucket
//!   of the current snapshot's timestamp.
//!
//! Returns over the next interval are regressed on the current interval's
//! OFI.

use crate::stats::ols;
use crate::TradeSample;
use common::{Px, Qty, Side};

/// One top-of-book snapshot on a seconds timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BboObservation {
    /// Seconds since session start.
    pub timestamp: f64,
    /// Best bid price.
    pub bid_price: Px,
    /// Size at the best bid.
    pub bid_size: Qty,
    /// Best ask price.
    pub ask_price: Px,
    /// Size at the best ask.
    pub ask_size: Qty,
}

/// OFI metrics and the return-prediction regression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfiMetrics {
    /// Slope of returns[i+1] on OFI[i].
    pub beta: f64,
    /// Explanatory power of the regression.
    pub r_squared: f64,
    /// t-statistic of the slope.
    pub t_statistic: f64,
    /// Mean per-interval volume imbalance.
    pub avg_volume_imbalance: f64,
    /// Mean per-interval depth imbalance at the best.
    pub avg_depth_imbalance: f64,
    /// Volume imbalance with the largest magnitude.
    pub max_volume_imbalance: f64,
    /// OFI per interval.
    pub ofi: Vec<f64>,
    /// Midprice return per interval, basis points.
    pub returns_bps: Vec<f64>,
    /// Pairs used in the regression.
    pub num_intervals: usize,
}

/// Midprice (truncating) at the first snapshot not before `t`, clamped to
/// the series ends.
fn mid_at(snapshots: &[BboObservation], t: f64) -> i64 {
    let idx = snapshots.partition_point(|s| s.timestamp < t);
    let snap = if idx == snapshots.len() {
        &snapshots[snapshots.len() - 1]
    } else {
        &snapshots[idx]
    };
    (snap.bid_price.ticks() + snap.ask_price.ticks()) / 2
}

/// Compute OFI metrics over `interval_sec` buckets.
#[must_use]
pub fn order_flow_imbalance(
    snapshots: &[BboObservation],
    trades: &[TradeSample],
    interval_sec: f64,
) -> OfiMetrics {
    let mut result = OfiMetrics::default();
    if snapshots.len() < 2 || interval_sec <= 0.0 {
        return result;
    }

    let max_time = snapshots[snapshots.len() - 1].timestamp;
    let num_intervals = (max_time / interval_sec) as usize + 1;

    let bucket_of = |t: f64| ((t / interval_sec) as usize).min(num_intervals - 1);

    // Signed trade volume per bucket.
    let mut buy_vol = vec![0.0f64; num_intervals];
    let mut sell_vol = vec![0.0f64; num_intervals];
    for trade in trades {
        let bucket = bucket_of(trade.timestamp);
        match trade.aggressor {
            Side::Buy => buy_vol[bucket] += trade.volume.as_f64(),
            Side::Sell => sell_vol[bucket] += trade.volume.as_f64(),
        }
    }

    // OFI contributions from consecutive BBO pairs, plus per-bucket depth
    // imbalance at the best.
    let mut ofi = vec![0.0f64; num_intervals];
    let mut depth_sum = vec![0.0f64; num_intervals];
    let mut depth_count = vec![0usize; num_intervals];

    for pair in snapshots.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let bucket = bucket_of(curr.timestamp);

        let delta_bid = if curr.bid_price == prev.bid_price {
            curr.bid_size.as_f64() - prev.bid_size.as_f64()
        } else if curr.bid_price > prev.bid_price {
            curr.bid_size.as_f64()
        } else {
            -prev.bid_size.as_f64()
        };

        let delta_ask = if curr.ask_price == prev.ask_price {
            curr.ask_size.as_f64() - prev.ask_size.as_f64()
        } else if curr.ask_price < prev.ask_price {
            -curr.ask_size.as_f64()
        } else {
            prev.ask_size.as_f64()
        };

        ofi[bucket] += delta_bid - delta_ask;

        let total = curr.bid_size.as_f64() + curr.ask_size.as_f64();
        if total > 0.0 {
            depth_sum[bucket] += (curr.bid_size.as_f64() - curr.ask_size.as_f64()) / total;
            depth_count[bucket] += 1;
        }
    }

    // Per-interval imbalances and midprice returns in bps.
    let mut returns = vec![0.0f64; num_intervals];
    let mut vol_imbalance = vec![0.0f64; num_intervals];
    for i in 0..num_intervals {
        let t_start = i as f64 * interval_sec;
        let t_end = (i + 1) as f64 * interval_sec;
        let mid_start = mid_at(snapshots, t_start);
        let mid_end = mid_at(snapshots, t_end);
        if mid_start > 0 {
            returns[i] = (mid_end - mid_start) as f64 / mid_start as f64 * 10_000.0;
        }

        let total = buy_vol[i] + sell_vol[i];
        if total > 0.0 {
            vol_imbalance[i] = (buy_vol[i] - sell_vol[i]) / total;
        }
    }

    // Predictive regression: OFI[i] against returns[i+1], over pairs where
    // either term is non-zero.
    let mut x = Vec::new();
    let mut y = Vec::new();
    for i in 0..num_intervals.saturating_sub(1) {
        if ofi[i] != 0.0 || returns[i + 1] != 0.0 {
            x.push(ofi[i]);
            y.push(returns[i + 1]);
        }
    }
    let fit = ols(&x, &y);
    result.beta = fit.slope;
    result.r_squared = fit.r_squared;
    result.t_statistic = fit.t_statistic;
    result.num_intervals = fit.n;

    result.avg_volume_imbalance =
        vol_imbalance.iter().sum::<f64>() / vol_imbalance.len() as f64;
    result.max_volume_imbalance = vol_imbalance
        .iter()
        .copied()
        .fold(0.0, |max, v| if v.abs() > max.abs() { v } else { max });

    let mut depth_means = Vec::new();
    for i in 0..num_intervals {
        if depth_count[i] > 0 {
            depth_means.push(depth_sum[i] / depth_count[i] as f64);
        }
    }
    if !depth_means.is_empty() {
        result.avg_depth_imbalance = depth_means.iter().sum::<f64>() / depth_means.len() as f64;
    }

    result.ofi = ofi;
    result.returns_bps = returns;
    result
}
