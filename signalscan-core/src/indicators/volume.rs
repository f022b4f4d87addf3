//! Rolling activity ratios.
//!
//! ratio[t] = mean(x over the `recent` bars ending at t)
//!          / mean(x over the `baseline` bars preceding those)
//!
//! Applied to volume for the volume-surge feature and to turnover amount
//! for the volume-without-movement risk rule.
//! Lookback: recent + baseline - 1. NaN when the baseline mean is zero.

use super::{sma_of_series, Indicator};
use crate::domain::PriceBar;

/// Which per-bar quantity the ratio is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioSource {
    Volume,
    /// Turnover amount, or volume x close where the amount is missing.
    Turnover,
}

#[derive(Debug, Clone)]
pub struct VolumeRatio {
    recent: usize,
    baseline: usize,
    source: RatioSource,
    name: String,
}

impl VolumeRatio {
    pub fn new(recent: usize, baseline: usize, source: RatioSource) -> Self {
        assert!(recent >= 1 && baseline >= 1, "ratio windows must be >= 1");
        let label = match source {
            RatioSource::Volume => "volume_ratio",
            RatioSource::Turnover => "turnover_ratio",
        };
        Self {
            recent,
            baseline,
            source,
            name: format!("{label}_{recent}_{baseline}"),
        }
    }
}

impl Indicator for VolumeRatio {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.recent + self.baseline - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let values: Vec<f64> = match self.source {
            RatioSource::Volume => bars.iter().map(|b| b.volume).collect(),
            RatioSource::Turnover => bars.iter().map(PriceBar::turnover).collect(),
        };
        rolling_ratio(&values, self.recent, self.baseline).ratio
    }
}

/// Recent mean, preceding baseline mean, and their ratio.
#[derive(Debug, Clone)]
pub struct RollingRatio {
    pub recent_mean: Vec<f64>,
    pub baseline_mean: Vec<f64>,
    pub ratio: Vec<f64>,
}

pub fn rolling_ratio(values: &[f64], recent: usize, baseline: usize) -> RollingRatio {
    let n = values.len();
    let recent_mean = sma_of_series(values, recent);
    let trailing = sma_of_series(values, baseline);

    // The baseline window ends `recent` bars before t.
    let mut baseline_mean = vec![f64::NAN; n];
    for i in recent..n {
        baseline_mean[i] = trailing[i - recent];
    }

    let ratio = recent_mean
        .iter()
        .zip(&baseline_mean)
        .map(|(&r, &b)| if b > 0.0 { r / b } else { f64::NAN })
        .collect();

    RollingRatio {
        recent_mean,
        baseline_mean,
        ratio,
    }
}
