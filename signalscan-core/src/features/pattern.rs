//! Price pattern recognition.
//!
//! Pattern detection is a pluggable predicate over the bar history up to a
//! day. `ClassicPatterns` is the default heuristic; `NoPattern` disables the
//! supplemental pattern points entirely.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

/// A recognized price shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    PlatformBreakout,
    VReversal,
    PullbackStabilize,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::PlatformBreakout => "platform_breakout",
            PatternKind::VReversal => "v_reversal",
            PatternKind::PullbackStabilize => "pullback_stabilize",
        }
    }
}

/// Recognizes a pattern ending at `bars[index]`.
///
/// Implementations must only read `bars[..=index]`.
pub trait PatternDetector: Send + Sync {
    fn name(&self) -> &str;

    fn detect(&self, bars: &[PriceBar], index: usize) -> Option<PatternKind>;
}

/// Detector that never matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPattern;

impl PatternDetector for NoPattern {
    fn name(&self) -> &str {
        "none"
    }

    fn detect(&self, _bars: &[PriceBar], _index: usize) -> Option<PatternKind> {
        None
    }
}

/// Platform breakout, V reversal, pullback-and-stabilize; first match wins.
#[derive(Debug, Clone)]
pub struct ClassicPatterns {
    pub platform_window: usize,
    /// Maximum (high - low) / low of the platform.
    pub platform_max_amplitude: f64,
    /// Close must exceed this fraction of the platform high.
    pub platform_breakout_ratio: f64,
    pub v_window: usize,
    pub v_min_offset: usize,
    pub v_max_offset: usize,
    pub v_min_drop: f64,
    pub v_min_rise: f64,
    pub pullback_window: usize,
    pub pullback_min_drawdown: f64,
    pub pullback_max_drawdown: f64,
    pub stabilize_days: usize,
    pub stabilize_min_gain: f64,
}

impl Default for ClassicPatterns {
    fn default() -> Self {
        Self {
            platform_window: 20,
            platform_max_amplitude: 0.10,
            platform_breakout_ratio: 0.98,
            v_window: 10,
            v_min_offset: 3,
            v_max_offset: 7,
            v_min_drop: 0.05,
            v_min_rise: 0.03,
            pullback_window: 60,
            pullback_min_drawdown: 0.20,
            pullback_max_drawdown: 0.50,
            stabilize_days: 5,
            stabilize_min_gain: 0.02,
        }
    }
}

impl ClassicPatterns {
    fn platform_breakout(&self, bars: &[PriceBar], index: usize) -> bool {
        let Some(window) = trailing(bars, index, self.platform_window) else {
            return false;
        };
        let high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        if low <= 0.0 {
            return false;
        }
        (high - low) / low < self.platform_max_amplitude
            && bars[index].close > high * self.platform_breakout_ratio
    }

    fn v_reversal(&self, bars: &[PriceBar], index: usize) -> bool {
        let Some(window) = trailing(bars, index, self.v_window) else {
            return false;
        };
        // First occurrence of the minimum close.
        let (low_offset, low) = window
            .iter()
            .map(|b| b.close)
            .enumerate()
            .fold((0, f64::INFINITY), |acc, (i, c)| if c < acc.1 { (i, c) } else { acc });

        if low_offset < self.v_min_offset || low_offset > self.v_max_offset || low <= 0.0 {
            return false;
        }
        let first = window[0].close;
        let last = window[window.len() - 1].close;
        if first <= 0.0 {
            return false;
        }
        let left_drop = (first - low) / first;
        let right_rise = (last - low) / low;
        left_drop > self.v_min_drop && right_rise > self.v_min_rise
    }

    fn pullback_stabilize(&self, bars: &[PriceBar], index: usize) -> bool {
        let Some(window) = trailing(bars, index, self.pullback_window) else {
            return false;
        };
        if index < self.stabilize_days {
            return false;
        }
        let high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let close = bars[index].close;
        let base = bars[index - self.stabilize_days].close;
        if high <= 0.0 || base <= 0.0 {
            return false;
        }
        let drawdown = (high - close) / high;
        let gain = (close - base) / base;
        drawdown > self.pullback_min_drawdown
            && drawdown < self.pullback_max_drawdown
            && gain > self.stabilize_min_gain
    }
}

impl PatternDetector for ClassicPatterns {
    fn name(&self) -> &str {
        "classic"
    }

    fn detect(&self, bars: &[PriceBar], index: usize) -> Option<PatternKind> {
        if index >= bars.len() {
            return None;
        }
        if self.platform_breakout(bars, index) {
            Some(PatternKind::PlatformBreakout)
        } else if self.v_reversal(bars, index) {
            Some(PatternKind::VReversal)
        } else if self.pullback_stabilize(bars, index) {
            Some(PatternKind::PullbackStabilize)
        } else {
            None
        }
    }
}

/// The `len` bars ending at `index`, if that much history exists.
fn trailing(bars: &[PriceBar], index: usize, len: usize) -> Option<&[PriceBar]> {
    if len == 0 || index + 1 < len || index >= bars.len() {
        return None;
    }
    Some(&bars[index + 1 - len..=index])
}
