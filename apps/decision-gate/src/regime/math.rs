//! Statistical primitives for regime classification.
//!
//! All series math here is `f64` over validated price data. NaN is the
//! warm-up sentinel inside indicator pipelines, exactly as in the true
//! range / Wilder smoothing construction this follows:
//!
//! 1. Close-only true range: TR[t] = |close[t] - close[t-1]|
//! 2. +DM / -DM from the sign of the close change
//! 3. Wilder smoothing (EMA, alpha = 1/period) of TR, +DM, -DM
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI), then Wilder-smoothed

/// Trading days used to annualize daily volatility.
pub(crate) const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Arithmetic mean. `None` on an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1). `None` below two values.
pub(crate) fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg) * (v - avg)).sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Simple period-over-period returns of a price slice.
pub(crate) fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|pair| pair[1] / pair[0] - 1.0)
        .collect()
}

/// Annualized volatility of a price slice: stdev(returns) * sqrt(252).
///
/// Zero when fewer than three prices are available.
pub(crate) fn annualized_volatility(prices: &[f64]) -> f64 {
    let returns = simple_returns(prices);
    std_dev(&returns).map_or(0.0, |s| s * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Ordinary least squares slope of `ys` against `xs`.
///
/// `None` when the inputs are mismatched, shorter than two points, or
/// degenerate in x.
pub(crate) fn ols_slope(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let x_mean = mean(xs)?;
    let y_mean = mean(ys)?;
    let mut covariance = 0.0;
    let mut x_variance = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        covariance += (x - x_mean) * (y - y_mean);
        x_variance += (x - x_mean) * (x - x_mean);
    }
    if x_variance == 0.0 {
        return None;
    }
    Some(covariance / x_variance)
}

/// Hurst exponent via the dispersion-of-lagged-differences regression.
///
/// For each lag in 2..20 the dispersion is the standard deviation of
/// `p[t+lag] - p[t]`; the exponent is the OLS slope of log(dispersion)
/// against log(lag). Falls back to 0.5 (random walk) when fewer than two
/// lags produce a usable dispersion, which covers flat and very short
/// series.
pub(crate) fn hurst_exponent(prices: &[f64]) -> f64 {
    let mut log_lags = Vec::new();
    let mut log_dispersions = Vec::new();

    for lag in 2..20usize {
        if prices.len() < lag + 2 {
            break;
        }
        let diffs: Vec<f64> = prices[lag..]
            .iter()
            .zip(prices)
            .map(|(later, earlier)| later - earlier)
            .collect();
        match std_dev(&diffs) {
            Some(dispersion) if dispersion > 0.0 && dispersion.is_finite() => {
                log_lags.push((lag as f64).ln());
                log_dispersions.push(dispersion.ln());
            }
            _ => {}
        }
    }

    if log_lags.len() < 2 {
        return 0.5;
    }
    ols_slope(&log_lags, &log_dispersions).unwrap_or(0.5)
}

/// Close-only true range: absolute close change, NaN for the first bar.
pub(crate) fn close_true_range(closes: &[f64]) -> Vec<f64> {
    let mut tr = vec![f64::NAN; closes.len()];
    for i in 1..closes.len() {
        tr[i] = (closes[i] - closes[i - 1]).abs();
    }
    tr
}

/// Wilder smoothing: seed with the mean of the first `period` consecutive
/// valid values, then EMA with alpha = 1/period.
pub(crate) fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    // First index with `period` consecutive non-NaN values.
    let seed_start = (0..n).find(|&i| {
        i + period <= n && values[i..i + period].iter().all(|v| !v.is_nan())
    });
    let Some(seed_start) = seed_start else {
        return result;
    };

    let seed_end = seed_start + period;
    let seed = values[seed_start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 1.0 / period as f64;
    let mut prev = seed;
    for i in seed_end..n {
        if values[i].is_nan() {
            return result;
        }
        let smoothed = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = smoothed;
        prev = smoothed;
    }
    result
}

/// Wilder directional-movement strength of a close-only series.
///
/// The classic DMI construction with high and low collapsed onto the
/// close: up moves feed +DM, down moves feed -DM, true range degenerates
/// to the absolute close change. Returns the latest smoothed DX, clamped
/// to `[0, 100]`, or 0.0 when the series is too short to seed.
pub(crate) fn directional_strength(closes: &[f64], period: usize) -> f64 {
    let n = closes.len();
    if period == 0 || n < 2 {
        return 0.0;
    }

    let mut plus_dm = vec![f64::NAN; n];
    let mut minus_dm = vec![f64::NAN; n];
    for i in 1..n {
        let change = closes[i] - closes[i - 1];
        plus_dm[i] = if change > 0.0 { change } else { 0.0 };
        minus_dm[i] = if change < 0.0 { -change } else { 0.0 };
    }

    let tr = close_true_range(closes);
    let smooth_tr = wilder_smooth(&tr, period);
    let smooth_plus = wilder_smooth(&plus_dm, period);
    let smooth_minus = wilder_smooth(&minus_dm, period);

    let mut dx = vec![f64::NAN; n];
    for i in 0..n {
        if smooth_tr[i].is_nan()
            || smooth_plus[i].is_nan()
            || smooth_minus[i].is_nan()
            || smooth_tr[i] == 0.0
        {
            continue;
        }
        let plus_di = 100.0 * smooth_plus[i] / smooth_tr[i];
        let minus_di = 100.0 * smooth_minus[i] / smooth_tr[i];
        let di_sum = plus_di + minus_di;
        dx[i] = if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (plus_di - minus_di).abs() / di_sum
        };
    }

    let adx = wilder_smooth(&dx, period);
    adx.iter()
        .rev()
        .find(|v| !v.is_nan())
        .map_or(0.0, |v| v.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_mean_and_std_dev() {
        assert_eq!(mean(&[]), None);
        assert_approx(mean(&[10.0, 20.0, 30.0]).expect("mean"), 20.0);
        assert_eq!(std_dev(&[1.0]), None);
        // Sample std of [2, 4, 4, 4, 5, 5, 7, 9] is ~2.138.
        let s = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).expect("std");
        assert!((s - 2.138).abs() < 1e-3);
    }

    #[test]
    fn test_annualized_volatility() {
        // Returns +10% then ~-10%: sample std 0.1414 * sqrt(252) ~ 2.245.
        let vol = annualized_volatility(&[100.0, 110.0, 99.0]);
        let expected = std_dev(&[0.1, 99.0 / 110.0 - 1.0]).expect("std") * 252.0_f64.sqrt();
        assert_approx(vol, expected);
        // Constant prices have zero volatility.
        assert_approx(annualized_volatility(&[50.0, 50.0, 50.0, 50.0]), 0.0);
    }

    #[test]
    fn test_ols_slope_exact_line() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [3.0, 5.0, 7.0, 9.0];
        assert_approx(ols_slope(&xs, &ys).expect("slope"), 2.0);
        // Degenerate x has no slope.
        assert_eq!(ols_slope(&[2.0, 2.0], &[1.0, 5.0]), None);
    }

    #[test]
    fn test_wilder_smooth_seed_and_step() {
        // TR of closes [100, 107, 116, 121, 126] is [NaN, 7, 9, 5, 5].
        // Seed at index 3 = mean(7, 9, 5) = 7; next = 5/3 + 2/3 * 7 = 19/3.
        let tr = close_true_range(&[100.0, 107.0, 116.0, 121.0, 126.0]);
        let smoothed = wilder_smooth(&tr, 3);
        assert!(smoothed[0].is_nan());
        assert!(smoothed[1].is_nan());
        assert!(smoothed[2].is_nan());
        assert_approx(smoothed[3], 7.0);
        assert_approx(smoothed[4], 19.0 / 3.0);
    }

    #[test]
    fn test_wilder_smooth_too_short() {
        let smoothed = wilder_smooth(&[1.0, 2.0], 3);
        assert!(smoothed.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_directional_strength_monotonic_up_is_maximal() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + f64::from(i) * 1.5).collect();
        let strength = directional_strength(&closes, 14);
        assert_approx(strength, 100.0);
    }

    #[test]
    fn test_directional_strength_flat_is_zero() {
        let closes = vec![100.0; 40];
        assert_approx(directional_strength(&closes, 14), 0.0);
    }

    #[test]
    fn test_directional_strength_bounds() {
        // Choppy series stays inside [0, 100].
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + if i % 2 == 0 { 1.0 } else { -1.0 } * f64::from(i % 7))
            .collect();
        let strength = directional_strength(&closes, 14);
        assert!((0.0..=100.0).contains(&strength));
    }

    #[test]
    fn test_hurst_flat_series_falls_back() {
        assert_approx(hurst_exponent(&[100.0; 80]), 0.5);
    }

    #[test]
    fn test_hurst_persistent_series_is_high() {
        // Smooth accelerating trend: dispersion grows ~linearly with lag.
        let prices: Vec<f64> = (1..=90).map(|i| f64::from(i).powf(1.5)).collect();
        let h = hurst_exponent(&prices);
        assert!(h > 0.8, "expected persistent exponent, got {h}");
    }

    #[test]
    fn test_hurst_alternating_series_is_low() {
        // Oscillation: dispersion is flat across odd lags.
        let prices: Vec<f64> = (0..90)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let h = hurst_exponent(&prices);
        assert!(h < 0.1, "expected anti-persistent exponent, got {h}");
    }

    #[test]
    fn test_hurst_short_series_falls_back() {
        assert_approx(hurst_exponent(&[100.0, 101.0, 102.0]), 0.5);
    }
}
