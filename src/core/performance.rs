//! Performance metrics derived from a trailing daily price history.
use crate::core::record::{PerformanceMetric, round_to};
use std::collections::BTreeMap;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Derives the performance map from chronological daily closes, highs and
/// lows over a trailing window (usually one year).
///
/// An empty close series yields an empty map. Non-finite values are ignored.
/// Volatility needs at least two daily changes and the 52-week figures need
/// the matching high/low series.
pub fn derive_performance(
    closes: &[f64],
    highs: &[f64],
    lows: &[f64],
) -> BTreeMap<PerformanceMetric, f64> {
    let mut metrics = BTreeMap::new();

    let closes: Vec<f64> = closes.iter().copied().filter(|c| c.is_finite()).collect();
    let (Some(first_close), Some(last_close)) = (closes.first(), closes.last()) else {
        return metrics;
    };

    if *first_close != 0.0 {
        let one_year_return = (last_close - first_close) / first_close * 100.0;
        metrics.insert(PerformanceMetric::OneYearReturn, round_to(one_year_return, 2));
    }

    let daily_changes: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    if let Some(stdev) = sample_std_dev(&daily_changes) {
        let volatility = stdev * TRADING_DAYS_PER_YEAR.sqrt() * 100.0;
        metrics.insert(PerformanceMetric::Volatility, round_to(volatility, 2));
    }

    let high = highs
        .iter()
        .copied()
        .filter(|h| h.is_finite())
        .reduce(f64::max);
    let low = lows
        .iter()
        .copied()
        .filter(|l| l.is_finite())
        .reduce(f64::min);

    if let Some(high) = high {
        metrics.insert(PerformanceMetric::FiftyTwoWeekHigh, round_to(high, 2));
        if high != 0.0 {
            let from_high = (last_close - high) / high * 100.0;
            metrics.insert(PerformanceMetric::CurrentVs52wHigh, round_to(from_high, 2));
        }
    }
    if let Some(low) = low {
        metrics.insert(PerformanceMetric::FiftyTwoWeekLow, round_to(low, 2));
    }

    metrics
}

fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}
