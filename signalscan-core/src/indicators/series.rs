//! Precomputed per-instrument indicator series.

use super::{
    bollinger_bands, closes, kdj_lines, macd_lines, rolling_ratio, rsi_of_series, sma_of_series,
    value_at,
};
use crate::config::IndicatorParams;
use crate::domain::PriceBar;

/// Every indicator the evaluators read, aligned one-to-one with the bars.
///
/// Computed once per instrument. Warmup positions hold NaN; evaluators go
/// through [`IndicatorSeries::get`] so a missing value becomes `None`.
#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub dif: Vec<f64>,
    pub dea: Vec<f64>,
    pub histogram: Vec<f64>,
    pub rsi: Vec<f64>,
    pub kdj_k: Vec<f64>,
    pub kdj_d: Vec<f64>,
    pub kdj_j: Vec<f64>,
    pub boll_upper: Vec<f64>,
    pub boll_middle: Vec<f64>,
    pub boll_lower: Vec<f64>,
    pub boll_width: Vec<f64>,
    pub ma_short: Vec<f64>,
    pub ma_fallback: Vec<f64>,
    pub ma_long: Vec<f64>,
    pub volume_recent: Vec<f64>,
    pub volume_baseline: Vec<f64>,
    pub volume_ratio: Vec<f64>,
    pub turnover_ratio: Vec<f64>,
}

impl IndicatorSeries {
    pub fn compute(bars: &[PriceBar], params: &IndicatorParams) -> Self {
        let close = closes(bars);
        let volume: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        let turnover: Vec<f64> = bars.iter().map(PriceBar::turnover).collect();

        let macd = macd_lines(&close, params.macd_fast, params.macd_slow, params.macd_signal);
        let kdj = kdj_lines(
            bars,
            params.kdj_period,
            params.kdj_k_smooth,
            params.kdj_d_smooth,
        );
        let boll = bollinger_bands(&close, params.boll_period, params.boll_multiplier);
        let volume_stats = rolling_ratio(&volume, params.volume_recent, params.volume_baseline);
        let turnover_stats =
            rolling_ratio(&turnover, params.volume_recent, params.volume_baseline);

        Self {
            dif: macd.dif,
            dea: macd.dea,
            histogram: macd.histogram,
            rsi: rsi_of_series(&close, params.rsi_period),
            kdj_k: kdj.k,
            kdj_d: kdj.d,
            kdj_j: kdj.j,
            boll_upper: boll.upper,
            boll_middle: boll.middle,
            boll_lower: boll.lower,
            boll_width: boll.width,
            ma_short: sma_of_series(&close, params.ma_short),
            ma_fallback: sma_of_series(&close, params.ma_fallback),
            ma_long: sma_of_series(&close, params.ma_long),
            volume_recent: volume_stats.recent_mean,
            volume_baseline: volume_stats.baseline_mean,
            volume_ratio: volume_stats.ratio,
            turnover_ratio: turnover_stats.ratio,
        }
    }

    pub fn len(&self) -> usize {
        self.dif.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dif.is_empty()
    }

    /// Value of `series` at `index`; `None` during warmup.
    pub fn get(series: &[f64], index: usize) -> Option<f64> {
        value_at(series, index)
    }
}
