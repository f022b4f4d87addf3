//! Relative Strength Index (RSI).
//!
//! Uses the simple rolling mean of gains and losses over the last `period`
//! close-to-close changes (no Wilder smoothing). This convention is used
//! everywhere in the crate.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → 100; both zero → 50.

use super::{closes, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        rsi_of_series(&closes(bars), self.period)
    }
}

/// RSI of an arbitrary price series.
pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return result;
    }

    for i in period..n {
        let mut gain = 0.0;
        let mut loss = 0.0;
        let mut tainted = false;
        for j in (i + 1 - period)..=i {
            let change = values[j] - values[j - 1];
            if change.is_nan() {
                tainted = true;
                break;
            }
            if change > 0.0 {
                gain += change;
            } else {
                loss -= change;
            }
        }
        if !tainted {
            result[i] = compute_rsi(gain / period as f64, loss / period as f64);
        }
    }

    result
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
