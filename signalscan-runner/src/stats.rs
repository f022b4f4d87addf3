//! Run statistics: pure functions over the aggregated signal list.

use serde::{Deserialize, Serialize};

use signalscan_core::rating::Rating;
use signalscan_core::signal::Signal;

/// Forward-return statistics. Only produced when backtesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Signals that carry a forward outcome.
    pub labelled: usize,
    pub mean_return_pct: f64,
    pub median_return_pct: f64,
    /// Percentage of labelled signals whose forward return met the threshold.
    pub win_rate_pct: f64,
    pub max_return_pct: f64,
    pub min_return_pct: f64,
}

impl PerformanceStats {
    /// `None` when no signal carries a forward outcome.
    pub fn from_signals(signals: &[Signal]) -> Option<Self> {
        let outcomes: Vec<_> = signals.iter().filter_map(|s| s.forward).collect();
        if outcomes.is_empty() {
            return None;
        }
        let returns: Vec<f64> = outcomes.iter().map(|o| o.forward_return_pct).collect();
        let wins = outcomes.iter().filter(|o| o.satisfied).count();

        Some(Self {
            labelled: outcomes.len(),
            mean_return_pct: mean(&returns),
            median_return_pct: median(&returns),
            win_rate_pct: wins as f64 / outcomes.len() as f64 * 100.0,
            max_return_pct: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min_return_pct: returns.iter().copied().fold(f64::INFINITY, f64::min),
        })
    }
}

/// Signal count per rating tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDistribution {
    pub a: usize,
    pub b: usize,
    pub c: usize,
}

impl RatingDistribution {
    pub fn from_signals(signals: &[Signal]) -> Self {
        let mut dist = Self::default();
        for signal in signals {
            match signal.rating {
                Rating::A => dist.a += 1,
                Rating::B => dist.b += 1,
                Rating::C => dist.c += 1,
            }
        }
        dist
    }

    pub fn total(&self) -> usize {
        self.a + self.b + self.c
    }

    pub fn get(&self, rating: Rating) -> usize {
        match rating {
            Rating::A => self.a,
            Rating::B => self.b,
            Rating::C => self.c,
        }
    }
}

/// Mean feature values across all signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorAverages {
    /// Over signals with a MACD score.
    pub macd_score: Option<f64>,
    /// Over signals with a volume ratio.
    pub volume_ratio: Option<f64>,
    pub enhanced_score: f64,
}

impl IndicatorAverages {
    /// `None` for an empty signal list.
    pub fn from_signals(signals: &[Signal]) -> Option<Self> {
        if signals.is_empty() {
            return None;
        }
        let macd: Vec<f64> = signals
            .iter()
            .filter_map(|s| s.features.macd_score.map(f64::from))
            .collect();
        let volume: Vec<f64> = signals
            .iter()
            .filter_map(|s| s.features.volume_ratio)
            .collect();
        let enhanced: Vec<f64> = signals
            .iter()
            .map(|s| f64::from(s.enhanced_score()))
            .collect();

        Some(Self {
            macd_score: (!macd.is_empty()).then(|| mean(&macd)),
            volume_ratio: (!volume.is_empty()).then(|| mean(&volume)),
            enhanced_score: mean(&enhanced),
        })
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; the mean of the two middle values for even lengths.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
