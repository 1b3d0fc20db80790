//! Stylized-fact statistics of simulated midprice series
//!
//! Statistical regularities observed across real markets (Cont, 2001):
//! fat-tailed returns, volatility clustering, volume-volatility and
//! spread-volatility correlation. The estimator reports each metric and a
//! reproduced/not-reproduced flag against its empirical benchmark; it never
//! tunes anything to hit one.

use crate::stats::{autocorrelation, correlation};
use common::{Px, Qty};

/// One benchmark comparison for the report.
#[derive(Debug, Clone, PartialEq)]
pub struct FactCheck {
    /// Metric name as printed.
    pub name: String,
    /// Whether the benchmark comparison holds.
    pub reproduced: bool,
    /// Measured value.
    pub value: f64,
    /// Benchmark description as printed.
    pub benchmark: String,
}

/// Stylized-fact metrics. Zero-filled (with `num_returns` set) when fewer
/// than 20 return samples exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StylizedFacts {
    /// Sample skewness of simple returns.
    pub skewness: f64,
    /// Excess kurtosis (normal = 0).
    pub excess_kurtosis: f64,
    /// Jarque–Bera statistic.
    pub jarque_bera: f64,
    /// Autocorrelation of |r| at lag 1.
    pub abs_return_ac_lag1: f64,
    /// Autocorrelation of |r| at lag 5.
    pub abs_return_ac_lag5: f64,
    /// Autocorrelation of |r| at lag 10.
    pub abs_return_ac_lag10: f64,
    /// Autocorrelation of r² at lag 1.
    pub squared_return_ac_lag1: f64,
    /// Correlation of (|r|, volume).
    pub volume_volatility_corr: f64,
    /// Correlation of (|r|, spread).
    pub spread_volatility_corr: f64,
    /// Correlation of (|imbalance|, spread).
    pub spread_imbalance_corr: f64,
    /// Benchmark comparisons for the report.
    pub checks: Vec<FactCheck>,
    /// Return samples observed.
    pub num_returns: usize,
}

/// Compute stylized-fact metrics from a midprice series and optional
/// per-interval volumes, spreads, and imbalances (pass empty slices to
/// skip those correlations).
#[must_use]
pub fn stylized_facts(
    midprices: &[Px],
    volumes: &[Qty],
    spreads: &[i64],
    imbalances: &[f64],
) -> StylizedFacts {
    let mut result = StylizedFacts::default();

    let mut returns = Vec::new();
    for pair in midprices.windows(2) {
        if pair[0].ticks() > 0 {
            returns.push((pair[1] - pair[0]) as f64 / pair[0].ticks() as f64);
        }
    }
    result.num_returns = returns.len();
    if returns.len() < 20 {
        return result;
    }

    // Sample moments (population normalization, as is conventional for
    // the Jarque–Bera statistic).
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let mut var = 0.0;
    let mut m3 = 0.0;
    let mut m4 = 0.0;
    for &r in &returns {
        let d = r - mean;
        var += d * d;
        m3 += d * d * d;
        m4 += d * d * d * d;
    }
    var /= n;
    m3 /= n;
    m4 /= n;

    let std_dev = var.sqrt();
    if std_dev > 0.0 {
        result.skewness = m3 / (std_dev * std_dev * std_dev);
        result.excess_kurtosis = m4 / (var * var) - 3.0;
    }
    result.jarque_bera = (n / 6.0)
        * (result.skewness * result.skewness
            + 0.25 * result.excess_kurtosis * result.excess_kurtosis);

    let abs_returns: Vec<f64> = returns.iter().map(|r| r.abs()).collect();
    let sq_returns: Vec<f64> = returns.iter().map(|r| r * r).collect();
    result.abs_return_ac_lag1 = autocorrelation(&abs_returns, 1);
    result.abs_return_ac_lag5 = autocorrelation(&abs_returns, 5);
    result.abs_return_ac_lag10 = autocorrelation(&abs_returns, 10);
    result.squared_return_ac_lag1 = autocorrelation(&sq_returns, 1);

    if !volumes.is_empty() && volumes.len() >= returns.len() {
        let volume_f: Vec<f64> = volumes[..abs_returns.len().min(volumes.len())]
            .iter()
            .map(|v| v.as_f64())
            .collect();
        result.volume_volatility_corr = correlation(&volume_f, &abs_returns);
    }

    if !spreads.is_empty() && spreads.len() >= returns.len() {
        let spread_f: Vec<f64> = spreads[..abs_returns.len().min(spreads.len())]
            .iter()
            .map(|&s| s as f64)
            .collect();
        result.spread_volatility_corr = correlation(&spread_f, &abs_returns);
    }

    if !imbalances.is_empty() && imbalances.len() >= returns.len() && !spreads.is_empty() {
        let len = imbalances
            .len()
            .min(abs_returns.len())
            .min(spreads.len());
        let abs_imbalance: Vec<f64> = imbalances[..len].iter().map(|i| i.abs()).collect();
        let spread_f: Vec<f64> = spreads[..len].iter().map(|&s| s as f64).collect();
        result.spread_imbalance_corr = correlation(&spread_f, &abs_imbalance);
    }

    result.checks = vec![
        FactCheck {
            name: "Fat tails (excess kurtosis > 0)".to_string(),
            reproduced: result.excess_kurtosis > 0.0,
            value: result.excess_kurtosis,
            benchmark: "> 0 (excess kurtosis)".to_string(),
        },
        FactCheck {
            name: "Volatility clustering (AC|r| lag1 > 0.1)".to_string(),
            reproduced: result.abs_return_ac_lag1 > 0.1,
            value: result.abs_return_ac_lag1,
            benchmark: "0.15-0.40".to_string(),
        },
        FactCheck {
            name: "Slow AC decay (lag10 > 0)".to_string(),
            reproduced: result.abs_return_ac_lag10 > 0.0,
            value: result.abs_return_ac_lag10,
            benchmark: "> 0".to_string(),
        },
    ];
    if !volumes.is_empty() {
        result.checks.push(FactCheck {
            name: "Volume-volatility correlation > 0.1".to_string(),
            reproduced: result.volume_volatility_corr > 0.1,
            value: result.volume_volatility_corr,
            benchmark: "> 0.3 typical".to_string(),
        });
    }
    if !spreads.is_empty() {
        result.checks.push(FactCheck {
            name: "Spread widens with volatility".to_string(),
            reproduced: result.spread_volatility_corr > 0.0,
            value: result.spread_volatility_corr,
            benchmark: "> 0".to_string(),
        });
    }

    result
}
