//! Forward-return labelling for historical evaluation.
//!
//! This is the only code in the crate that reads bars after the evaluated
//! day. It never feeds classification unless the label is configured as an
//! active feature.

use serde::{Deserialize, Serialize};

use crate::config::BacktestParams;
use crate::domain::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardOutcome {
    /// (max high over the next N sessions - close) / close, in percent.
    pub forward_return_pct: f64,
    pub satisfied: bool,
}

/// Forward outcome for `bars[index]`, or `None` when fewer than
/// `future_days` bars follow it.
pub fn forward_outcome(
    bars: &[PriceBar],
    index: usize,
    params: &BacktestParams,
) -> Option<ForwardOutcome> {
    let end = index.checked_add(params.future_days)?;
    if params.future_days == 0 || end >= bars.len() {
        return None;
    }
    let close = bars[index].close;
    if close <= 0.0 {
        return None;
    }
    let max_high = bars[index + 1..=end]
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let forward_return_pct = (max_high - close) / close * 100.0;
    Some(ForwardOutcome {
        forward_return_pct,
        satisfied: forward_return_pct >= params.min_future_return,
    })
}
