//! Supplemental scoring: five secondary signals summed into the enhanced score.

use serde::{Deserialize, Serialize};

use super::pattern::{PatternDetector, PatternKind};
use crate::config::SupplementalParams;
use crate::domain::PriceBar;
use crate::indicators::IndicatorSeries;

/// Points awarded per supplemental signal for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplementalEvaluation {
    pub rsi_points: u32,
    pub kdj_points: u32,
    pub boll_points: u32,
    pub pattern_points: u32,
    pub pattern: Option<PatternKind>,
    pub volume_price_points: u32,
    pub enhanced_score: u32,
}

pub fn evaluate_supplemental(
    bars: &[PriceBar],
    series: &IndicatorSeries,
    index: usize,
    params: &SupplementalParams,
    detector: &dyn PatternDetector,
) -> SupplementalEvaluation {
    let rsi_points = match IndicatorSeries::get(&series.rsi, index) {
        Some(rsi) if rsi > params.rsi_lower && rsi < params.rsi_upper => params.rsi_points,
        _ => 0,
    };

    let kdj_points = if kdj_golden_cross(series, index, params.kdj_j_max) {
        params.kdj_points
    } else {
        0
    };

    let boll_points = match IndicatorSeries::get(&series.boll_width, index) {
        Some(width) if width < params.boll_width_threshold => params.boll_points,
        _ => 0,
    };

    let pattern = detector.detect(bars, index);
    let pattern_points = if pattern.is_some() {
        params.pattern_points
    } else {
        0
    };

    let volume_price_points = if volume_price_rise(bars, series, index, params.volume_price_min_ratio)
    {
        params.volume_price_points
    } else {
        0
    };

    let enhanced_score = (rsi_points + kdj_points + boll_points + pattern_points + volume_price_points)
        .min(SupplementalParams::MAX_SCORE);

    SupplementalEvaluation {
        rsi_points,
        kdj_points,
        boll_points,
        pattern_points,
        pattern,
        volume_price_points,
        enhanced_score,
    }
}

/// K crossed above D today (from at-or-below yesterday) with J under `j_max`.
fn kdj_golden_cross(series: &IndicatorSeries, index: usize, j_max: f64) -> bool {
    if index == 0 {
        return false;
    }
    let values = (
        IndicatorSeries::get(&series.kdj_k, index - 1),
        IndicatorSeries::get(&series.kdj_d, index - 1),
        IndicatorSeries::get(&series.kdj_k, index),
        IndicatorSeries::get(&series.kdj_d, index),
        IndicatorSeries::get(&series.kdj_j, index),
    );
    match values {
        (Some(k_prev), Some(d_prev), Some(k), Some(d), Some(j)) => {
            k_prev <= d_prev && k > d && j < j_max
        }
        _ => false,
    }
}

/// Close rose versus the previous session on above-normal volume.
fn volume_price_rise(
    bars: &[PriceBar],
    series: &IndicatorSeries,
    index: usize,
    min_ratio: f64,
) -> bool {
    if index == 0 || index >= bars.len() {
        return false;
    }
    let rising = bars[index].close > bars[index - 1].close;
    match IndicatorSeries::get(&series.volume_ratio, index) {
        Some(ratio) => rising && ratio > min_ratio,
        None => false,
    }
}
