//! KDJ stochastic oscillator.
//!
//! RSV = (close - lowest low) / (highest high - lowest low) * 100 over
//! `period` bars, 50 when the range is zero. K and D are smoothed with
//! weights (m-1)/m and start from 50. J = 3K - 2D.
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdjLine {
    K,
    D,
    J,
}

#[derive(Debug, Clone)]
pub struct Kdj {
    period: usize,
    k_smooth: usize,
    d_smooth: usize,
    line: KdjLine,
    name: String,
}

impl Kdj {
    pub fn new(period: usize, k_smooth: usize, d_smooth: usize, line: KdjLine) -> Self {
        assert!(
            period >= 1 && k_smooth >= 1 && d_smooth >= 1,
            "KDJ periods must be >= 1"
        );
        let label = match line {
            KdjLine::K => "k",
            KdjLine::D => "d",
            KdjLine::J => "j",
        };
        Self {
            period,
            k_smooth,
            d_smooth,
            line,
            name: format!("kdj_{label}_{period}_{k_smooth}_{d_smooth}"),
        }
    }
}

impl Indicator for Kdj {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let lines = kdj_lines(bars, self.period, self.k_smooth, self.d_smooth);
        match self.line {
            KdjLine::K => lines.k,
            KdjLine::D => lines.d,
            KdjLine::J => lines.j,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KdjLines {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
    pub j: Vec<f64>,
}

pub fn kdj_lines(bars: &[PriceBar], period: usize, k_smooth: usize, d_smooth: usize) -> KdjLines {
    let n = bars.len();
    let mut lines = KdjLines {
        k: vec![f64::NAN; n],
        d: vec![f64::NAN; n],
        j: vec![f64::NAN; n],
    };

    if period == 0 || n < period {
        return lines;
    }

    let k_weight = k_smooth as f64;
    let d_weight = d_smooth as f64;
    let mut prev_k = 50.0;
    let mut prev_d = 50.0;

    for i in (period - 1)..n {
        let window = &bars[i + 1 - period..=i];
        let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let range = highest - lowest;
        let rsv = if range > 0.0 {
            (bars[i].close - lowest) / range * 100.0
        } else {
            50.0
        };

        let k = ((k_weight - 1.0) * prev_k + rsv) / k_weight;
        let d = ((d_weight - 1.0) * prev_d + k) / d_weight;
        lines.k[i] = k;
        lines.d[i] = d;
        lines.j[i] = 3.0 * k - 2.0 * d;
        prev_k = k;
        prev_d = d;
    }

    lines
}
