//! Risk exclusion rules.
//!
//! A day that triggers any rule is dropped before classification,
//! regardless of how strong its features are. Rules whose inputs are not
//! yet available never fire.

use serde::{Deserialize, Serialize};

use crate::config::RiskParams;
use crate::domain::{Board, PriceBar};
use crate::indicators::IndicatorSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskRule {
    /// Too many consecutive sessions closing at the daily limit.
    ConsecutiveLimitUp,
    /// Trailing cumulative return is too large.
    ShortTermSurge,
    /// Heavy turnover without a matching price move.
    VolumeWithoutGain,
    /// Close too far from the short moving average.
    Ma20Deviation,
}

/// Rules triggered on one day, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlags {
    pub rules: Vec<RiskRule>,
}

impl RiskFlags {
    pub fn is_clear(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn contains(&self, rule: RiskRule) -> bool {
        self.rules.contains(&rule)
    }
}

pub fn evaluate_risk(
    bars: &[PriceBar],
    series: &IndicatorSeries,
    index: usize,
    board: Board,
    params: &RiskParams,
) -> RiskFlags {
    let mut flags = RiskFlags::default();
    if index >= bars.len() {
        return flags;
    }

    if consecutive_limit_ups(bars, index, board, params.limit_tolerance_pct)
        >= params.max_consecutive_limit_up
    {
        flags.rules.push(RiskRule::ConsecutiveLimitUp);
    }

    if let Some(gain) = trailing_return_pct(bars, index, params.short_term_window) {
        if gain > params.max_short_term_gain_pct {
            flags.rules.push(RiskRule::ShortTermSurge);
        }
    }

    let day_change = index
        .checked_sub(1)
        .and_then(|prev| bars[index].change_pct(bars[prev].close));
    if let (Some(ratio), Some(change)) =
        (IndicatorSeries::get(&series.turnover_ratio, index), day_change)
    {
        if ratio >= params.volume_surge_no_gain_ratio && change < params.volume_surge_min_gain_pct {
            flags.rules.push(RiskRule::VolumeWithoutGain);
        }
    }

    if let Some(ma) = IndicatorSeries::get(&series.ma_short, index) {
        if ma > 0.0 {
            let deviation = (bars[index].close - ma).abs() / ma * 100.0;
            if deviation > params.max_ma20_deviation_pct {
                flags.rules.push(RiskRule::Ma20Deviation);
            }
        }
    }

    flags
}

/// Number of consecutive limit-up sessions ending at `index` (inclusive).
pub fn consecutive_limit_ups(
    bars: &[PriceBar],
    index: usize,
    board: Board,
    tolerance_pct: f64,
) -> usize {
    let hit_at = board.daily_limit_pct() - tolerance_pct;
    let mut count = 0;
    let mut i = index;
    while i >= 1 && i < bars.len() {
        match bars[i].change_pct(bars[i - 1].close) {
            Some(change) if change >= hit_at => count += 1,
            _ => break,
        }
        i -= 1;
    }
    count
}

/// Close-to-close return over the `window` sessions ending at `index`.
fn trailing_return_pct(bars: &[PriceBar], index: usize, window: usize) -> Option<f64> {
    let start = index.checked_sub(window)?;
    bars[index].change_pct(bars[start].close)
}
