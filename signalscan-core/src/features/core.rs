//! Core feature evaluation: trend momentum, volume surge, position below the
//! long moving average.

use serde::{Deserialize, Serialize};

use crate::config::{CoreThresholds, IndicatorParams};
use crate::domain::PriceBar;
use crate::indicators::IndicatorSeries;

/// Points contributed by each trend-momentum condition.
pub const MACD_WEIGHT_ABOVE_SIGNAL: u32 = 30;
pub const MACD_WEIGHT_ABOVE_ZERO: u32 = 20;
pub const MACD_WEIGHT_POSITIVE_HISTOGRAM: u32 = 15;
pub const MACD_WEIGHT_DIF_RISING: u32 = 20;
pub const MACD_WEIGHT_HISTOGRAM_RISING: u32 = 15;

/// Consecutive strict rises of DIF required for the rising bonus.
const DIF_RISING_DAYS: usize = 5;
/// Consecutive strict rises of the histogram required for its bonus.
const HISTOGRAM_RISING_DAYS: usize = 3;

/// Core feature values for one day.
///
/// `None` means the feature could not be computed (insufficient history).
/// An absent feature never counts toward `core_satisfied_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEvaluation {
    pub macd_score: Option<u32>,
    pub macd_satisfied: Option<bool>,
    pub volume_ratio: Option<f64>,
    pub volume_satisfied: Option<bool>,
    pub ma_distance_pct: Option<f64>,
    pub ma_period_used: Option<usize>,
    pub ma_satisfied: Option<bool>,
    pub core_satisfied_count: u8,
}

impl FeatureEvaluation {
    pub fn macd_ok(&self) -> bool {
        self.macd_satisfied == Some(true)
    }

    pub fn volume_ok(&self) -> bool {
        self.volume_satisfied == Some(true)
    }

    pub fn ma_ok(&self) -> bool {
        self.ma_satisfied == Some(true)
    }
}

/// Evaluate the three core features at `index`.
pub fn evaluate_core(
    bars: &[PriceBar],
    series: &IndicatorSeries,
    index: usize,
    params: &IndicatorParams,
    thresholds: &CoreThresholds,
) -> FeatureEvaluation {
    let macd_score = macd_score(series, index);
    let macd_satisfied = macd_score.map(|s| f64::from(s) >= thresholds.macd_score_threshold);

    let volume_ratio = IndicatorSeries::get(&series.volume_ratio, index);
    let volume_satisfied = volume_ratio.map(|r| r >= thresholds.volume_ratio_threshold);

    let (ma_distance_pct, ma_period_used) = match ma_distance(bars, series, index, params) {
        Some((distance, period)) => (Some(distance), Some(period)),
        None => (None, None),
    };
    let ma_satisfied = ma_distance_pct.map(|d| d <= thresholds.ma_distance_threshold);

    let core_satisfied_count = [macd_satisfied, volume_satisfied, ma_satisfied]
        .iter()
        .filter(|s| **s == Some(true))
        .count() as u8;

    FeatureEvaluation {
        macd_score,
        macd_satisfied,
        volume_ratio,
        volume_satisfied,
        ma_distance_pct,
        ma_period_used,
        ma_satisfied,
        core_satisfied_count,
    }
}

/// Additive trend-momentum score in 0..=100.
///
/// Absent until both DIF and DEA are valid. The two "rising" bonuses need
/// one more valid value than the number of rises they check; without it
/// they contribute nothing.
pub fn macd_score(series: &IndicatorSeries, index: usize) -> Option<u32> {
    let dif = IndicatorSeries::get(&series.dif, index)?;
    let dea = IndicatorSeries::get(&series.dea, index)?;
    let hist = IndicatorSeries::get(&series.histogram, index)?;

    let mut score = 0;
    if dif > dea {
        score += MACD_WEIGHT_ABOVE_SIGNAL;
    }
    if dif > 0.0 && dea > 0.0 {
        score += MACD_WEIGHT_ABOVE_ZERO;
    }
    if hist > 0.0 {
        score += MACD_WEIGHT_POSITIVE_HISTOGRAM;
    }
    if strictly_rising(&series.dif, index, DIF_RISING_DAYS) {
        score += MACD_WEIGHT_DIF_RISING;
    }
    if strictly_rising(&series.histogram, index, HISTOGRAM_RISING_DAYS) {
        score += MACD_WEIGHT_HISTOGRAM_RISING;
    }
    Some(score)
}

/// True when `values` rose on each of the `days` sessions ending at `index`.
fn strictly_rising(values: &[f64], index: usize, days: usize) -> bool {
    if index < days || index >= values.len() {
        return false;
    }
    let window = &values[index - days..=index];
    window.iter().all(|v| !v.is_nan()) && window.windows(2).all(|w| w[0] < w[1])
}

/// Distance of the day's high above the long average, in percent.
///
/// Uses the long average once it is valid for the day, otherwise the
/// fallback average. Returns the distance and the period used.
fn ma_distance(
    bars: &[PriceBar],
    series: &IndicatorSeries,
    index: usize,
    params: &IndicatorParams,
) -> Option<(f64, usize)> {
    let high = bars.get(index)?.high;
    let (ma, period) = match IndicatorSeries::get(&series.ma_long, index) {
        Some(ma) => (ma, params.ma_long),
        None => (
            IndicatorSeries::get(&series.ma_fallback, index)?,
            params.ma_fallback,
        ),
    };
    if ma <= 0.0 {
        return None;
    }
    Some(((high - ma) / ma * 100.0, period))
}
