//! MACD: moving average convergence/divergence.
//!
//! - DIF = EMA(close, fast) - EMA(close, slow)
//! - DEA = EMA(DIF, signal), seeded from the first `signal` valid DIF values
//! - Histogram = DIF - DEA
//!
//! DIF lookback: slow - 1. DEA/histogram lookback: slow + signal - 2, so the
//! default (12, 26, 9) needs 34 bars.

use super::{closes, ema_of_series, Indicator};
use crate::domain::PriceBar;

/// Which MACD line to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Dif,
    Dea,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be below slow period");
        let label = match line {
            MacdLine::Dif => "dif",
            MacdLine::Dea => "dea",
            MacdLine::Histogram => "hist",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: format!("macd_{label}_{fast}_{slow}_{signal}"),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Dif => self.slow - 1,
            MacdLine::Dea | MacdLine::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let lines = macd_lines(&closes(bars), self.fast, self.slow, self.signal);
        match self.line {
            MacdLine::Dif => lines.dif,
            MacdLine::Dea => lines.dea,
            MacdLine::Histogram => lines.histogram,
        }
    }
}

/// DIF, DEA and histogram aligned to the input.
#[derive(Debug, Clone)]
pub struct MacdLines {
    pub dif: Vec<f64>,
    pub dea: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd_lines(values: &[f64], fast: usize, slow: usize, signal: usize) -> MacdLines {
    let fast_ema = ema_of_series(values, fast);
    let slow_ema = ema_of_series(values, slow);

    let dif: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let dea = ema_of_series(&dif, signal);
    let histogram = dif.iter().zip(&dea).map(|(d, e)| d - e).collect();

    MacdLines {
        dif,
        dea,
        histogram,
    }
}
