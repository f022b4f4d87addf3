//! Indicator library.
//!
//! Indicators are pure functions: bar history in, numeric series out, one
//! value per bar. Warmup positions are `f64::NAN`. They are computed once per
//! instrument into an [`IndicatorSeries`] and queried by bar index during
//! evaluation; nothing is recomputed per day.
//!
//! The pipeline only calls the free functions (`macd_lines`, `kdj_lines`,
//! `bollinger_bands`, `rolling_ratio`, `sma_of_series`, `rsi_of_series`),
//! which compute every line of an indicator in one pass.
//!
//! The `Indicator` structs (`Sma`, `Macd`, `Kdj`, ...) wrap those same
//! functions, one instance per line. They are the surface for look-ahead
//! tests and for callers that want a single named series. Their
//! constructors panic on zero periods; a `ScanConfig` that passed
//! `validate()` never produces one.

pub mod bollinger;
pub mod ema;
pub mod kdj;
pub mod macd;
pub mod rsi;
pub mod series;
pub mod sma;
pub mod volume;

use crate::domain::PriceBar;

pub use bollinger::{bollinger_bands, Bollinger, BollingerBand, BollingerBands};
pub use ema::{ema_of_series, Ema};
pub use kdj::{kdj_lines, Kdj, KdjLine, KdjLines};
pub use macd::{macd_lines, Macd, MacdLine, MacdLines};
pub use rsi::{rsi_of_series, Rsi};
pub use series::IndicatorSeries;
pub use sma::{sma_of_series, Sma};
pub use volume::{rolling_ratio, RatioSource, RollingRatio, VolumeRatio};

/// Trait for indicators.
///
/// Indicators take a full bar series and produce an output series of the
/// same length. The first `lookback()` values are `f64::NAN`.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on bar t+1 or later. Every
/// indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "macd_dif_12_26_9").
    fn name(&self) -> &str;

    /// Number of leading bars that are warmup (NaN).
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Value at `index`, or `None` when out of range or still in warmup.
pub fn value_at(series: &[f64], index: usize) -> Option<f64> {
    series.get(index).copied().filter(|v| !v.is_nan())
}

pub(crate) fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
                amount: None,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
