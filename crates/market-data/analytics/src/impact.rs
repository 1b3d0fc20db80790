//! Kyle's lambda: price impact per unit of signed order flow
//!
//! Kyle (1985): ΔP = α + λ·ΔX + ε, estimated by OLS over time buckets.
//! Trades are bucketed by TIMESTAMP (bucket i covers
//! [i·interval, (i+1)·interval)); ΔX is the signed volume in the bucket
//! and ΔP the midprice change across the bucket's boundaries, looked up by
//! nearest timestamp in the midprice series. Bucket 0 and buckets with no
//! flow are dropped.

use crate::stats::ols;
use crate::TradeSample;
use common::{Px, Side};

/// Kyle's lambda regression output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KyleLambda {
    /// Price impact coefficient (ticks per unit flow).
    pub lambda: f64,
    /// Regression intercept.
    pub alpha: f64,
    /// Goodness of fit.
    pub r_squared: f64,
    /// Standard error of lambda.
    pub std_error: f64,
    /// t-statistic of lambda.
    pub t_statistic: f64,
    /// Buckets used in the regression.
    pub num_intervals: usize,
}

/// Nearest-timestamp lookup into an ascending midprice series.
fn nearest_mid(midprices: &[(f64, Px)], t: f64) -> Px {
    let idx = midprices.partition_point(|(ts, _)| *ts < t);
    if idx == midprices.len() {
        return midprices[midprices.len() - 1].1;
    }
    if idx == 0 {
        return midprices[0].1;
    }
    let (prev_t, prev_px) = midprices[idx - 1];
    let (next_t, next_px) = midprices[idx];
    if t - prev_t < next_t - t {
        prev_px
    } else {
        next_px
    }
}

/// Estimate Kyle's lambda over `interval_sec` buckets.
///
/// Returns zeros when there are fewer than 3 usable buckets or the flow
/// series has no variance.
#[must_use]
pub fn kyle_lambda(
    trades: &[TradeSample],
    midprices: &[(f64, Px)],
    interval_sec: f64,
) -> KyleLambda {
    if trades.is_empty() || midprices.is_empty() || interval_sec <= 0.0 {
        return KyleLambda::default();
    }

    let max_time = trades[trades.len() - 1].timestamp;
    let num_intervals = (max_time / interval_sec) as usize + 1;

    let mut delta_x = vec![0.0f64; num_intervals];
    for trade in trades {
        let mut bucket = (trade.timestamp / interval_sec) as usize;
        if bucket >= num_intervals {
            bucket = num_intervals - 1;
        }
        let signed = match trade.aggressor {
            Side::Buy => trade.volume.as_f64(),
            Side::Sell => -trade.volume.as_f64(),
        };
        delta_x[bucket] += signed;
    }

    // Bucket 0 has no prior mid; buckets without flow carry no signal.
    let mut x = Vec::new();
    let mut y = Vec::new();
    for (i, &flow) in delta_x.iter().enumerate().skip(1) {
        if flow == 0.0 {
            continue;
        }
        let t_start = i as f64 * interval_sec;
        let t_end = (i + 1) as f64 * interval_sec;
        let p_start = nearest_mid(midprices, t_start);
        let p_end = nearest_mid(midprices, t_end);
        x.push(flow);
        y.push((p_end - p_start) as f64);
    }

    let fit = ols(&x, &y);
    KyleLambda {
        lambda: fit.slope,
        alpha: fit.intercept,
        r_squared: fit.r_squared,
        std_error: fit.std_error,
        t_statistic: fit.t_statistic,
        num_intervals: fit.n,
    }
}
