//! Shared regression and moment helpers

/// Ordinary least squares fit of y = intercept + slope·x.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Ols {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub std_error: f64,
    pub t_statistic: f64,
    pub n: usize,
}

/// OLS with R², standard error of the slope, and its t-statistic.
/// Returns zeros when n < 3 or x has no variance.
pub(crate) fn ols(x: &[f64], y: &[f64]) -> Ols {
    let n = x.len().min(y.len());
    if n < 3 {
        return Ols::default();
    }

    let nf = n as f64;
    let mean_x = x[..n].iter().sum::<f64>() / nf;
    let mean_y = y[..n].iter().sum::<f64>() / nf;

    let mut ss_xy = 0.0;
    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        ss_xy += dx * dy;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
    }

    if ss_xx == 0.0 {
        return Ols::default();
    }

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if ss_yy > 0.0 {
        (ss_xy * ss_xy) / (ss_xx * ss_yy)
    } else {
        0.0
    };

    let mut sse = 0.0;
    for i in 0..n {
        let residual = y[i] - intercept - slope * x[i];
        sse += residual * residual;
    }
    let mse = sse / (nf - 2.0);
    let std_error = (mse / ss_xx).sqrt();
    let t_statistic = if std_error > 0.0 { slope / std_error } else { 0.0 };

    Ols {
        slope,
        intercept,
        r_squared,
        std_error,
        t_statistic,
        n,
    }
}

/// Autocorrelation of `x` at `lag`; zero when the series is too short or
/// has no variance.
pub(crate) fn autocorrelation(x: &[f64], lag: usize) -> f64 {
    if x.len() <= lag {
        return 0.0;
    }
    let n = x.len();
    let mean = x.iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for i in 0..n {
        denominator += (x[i] - mean) * (x[i] - mean);
        if i >= lag {
            numerator += (x[i] - mean) * (x[i - lag] - mean);
        }
    }

    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Pearson correlation over the common prefix of `x` and `y`; zero when
/// fewer than 3 pairs or either side has no variance.
pub(crate) fn correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 3 {
        return 0.0;
    }

    let nf = n as f64;
    let mean_x = x[..n].iter().sum::<f64>() / nf;
    let mean_y = y[..n].iter().sum::<f64>() / nf;

    let mut ss_xy = 0.0;
    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        ss_xy += dx * dy;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
    }

    let denom = (ss_xx * ss_yy).sqrt();
    if denom > 0.0 {
        ss_xy / denom
    } else {
        0.0
    }
}

/// Linear-interpolated percentile of an ascending-sorted slice.
pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = p * (sorted.len() - 1) as f64;
    let lo = idx as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = idx - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ols_recovers_exact_line() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();
        let fit = ols(&x, &y);
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(fit.n, 10);
    }

    #[test]
    fn ols_degenerate_inputs_are_zero() {
        assert_eq!(ols(&[1.0, 2.0], &[1.0, 2.0]), Ols::default());
        // No variance in x.
        assert_eq!(ols(&[5.0; 10], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]), Ols::default());
    }

    #[test]
    fn autocorrelation_of_alternating_series_is_negative() {
        let x: Vec<f64> = (0..50).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!(autocorrelation(&x, 1) < -0.9);
        assert!(autocorrelation(&x, 2) > 0.9);
        assert_eq!(autocorrelation(&x, 60), 0.0);
    }

    #[test]
    fn correlation_signs() {
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| -v).collect();
        assert!((correlation(&x, &x) - 1.0).abs() < 1e-12);
        assert!((correlation(&x, &y) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 1.0), 5.0);
        assert_eq!(percentile(&sorted, 0.5), 3.0);
        assert!((percentile(&sorted, 0.25) - 2.0).abs() < 1e-12);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }
}
