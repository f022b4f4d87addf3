//! Scan configuration.
//!
//! `ScanConfig` is loaded once per run and passed by reference into every
//! evaluator. It is never mutated after validation; a tuning overlay is
//! merged by the loader before `validate()` is called.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Configuration validation failure. Fatal for the whole run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown filter mode '{0}' (expected strict, standard or loose)")]
    UnknownMode(String),

    #[error("{field} = {value} is out of range: {reason}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("{0}")]
    Inconsistent(String),
}

/// How many active features a day must satisfy to become a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Strict,
    #[default]
    Standard,
    Loose,
}

impl FilterMode {
    pub const ALL: [FilterMode; 3] = [FilterMode::Strict, FilterMode::Standard, FilterMode::Loose];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Strict => "strict",
            FilterMode::Standard => "standard",
            FilterMode::Loose => "loose",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FilterMode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for FilterMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(FilterMode::Strict),
            "standard" => Ok(FilterMode::Standard),
            "loose" => Ok(FilterMode::Loose),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

/// Indicator periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorParams {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub kdj_period: usize,
    pub kdj_k_smooth: usize,
    pub kdj_d_smooth: usize,
    pub boll_period: usize,
    pub boll_multiplier: f64,
    /// Short average used by the MA20 deviation risk rule.
    pub ma_short: usize,
    /// Preferred long average for the position feature.
    pub ma_long: usize,
    /// Used for the position feature while `ma_long` is still warming up.
    pub ma_fallback: usize,
    pub volume_recent: usize,
    pub volume_baseline: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            kdj_period: 9,
            kdj_k_smooth: 3,
            kdj_d_smooth: 3,
            boll_period: 20,
            boll_multiplier: 2.0,
            ma_short: 20,
            ma_long: 60,
            ma_fallback: 30,
            volume_recent: 3,
            volume_baseline: 20,
        }
    }
}

impl IndicatorParams {
    /// Bars needed before DEA (and so the trend feature) is valid.
    pub fn macd_min_bars(&self) -> usize {
        self.macd_slow + self.macd_signal - 1
    }

    /// Bars needed before the volume ratio is valid.
    pub fn volume_min_bars(&self) -> usize {
        self.volume_recent + self.volume_baseline
    }
}

/// Thresholds for the three core features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreThresholds {
    pub macd_score_threshold: f64,
    pub volume_ratio_threshold: f64,
    /// Maximum (high - MA) / MA in percent.
    pub ma_distance_threshold: f64,
}

impl Default for CoreThresholds {
    fn default() -> Self {
        Self {
            macd_score_threshold: 50.0,
            volume_ratio_threshold: 2.0,
            ma_distance_threshold: 0.5,
        }
    }
}

/// Supplemental point values and their trigger thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupplementalParams {
    pub rsi_lower: f64,
    pub rsi_upper: f64,
    pub rsi_points: u32,
    pub kdj_j_max: f64,
    pub kdj_points: u32,
    pub boll_width_threshold: f64,
    pub boll_points: u32,
    pub pattern_points: u32,
    pub volume_price_min_ratio: f64,
    pub volume_price_points: u32,
}

impl Default for SupplementalParams {
    fn default() -> Self {
        Self {
            rsi_lower: 40.0,
            rsi_upper: 70.0,
            rsi_points: 10,
            kdj_j_max: 80.0,
            kdj_points: 15,
            boll_width_threshold: 0.1,
            boll_points: 10,
            pattern_points: 15,
            volume_price_min_ratio: 1.5,
            volume_price_points: 10,
        }
    }
}

impl SupplementalParams {
    /// Upper bound of the enhanced score.
    pub const MAX_SCORE: u32 = 60;

    pub fn point_values(&self) -> [(&'static str, u32); 5] {
        [
            ("supplemental.rsi_points", self.rsi_points),
            ("supplemental.kdj_points", self.kdj_points),
            ("supplemental.boll_points", self.boll_points),
            ("supplemental.pattern_points", self.pattern_points),
            ("supplemental.volume_price_points", self.volume_price_points),
        ]
    }

    /// Sum of all point values, or `None` on overflow.
    pub fn total_points(&self) -> Option<u32> {
        self.point_values()
            .iter()
            .try_fold(0u32, |acc, &(_, points)| acc.checked_add(points))
    }
}

/// Risk exclusion rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskParams {
    pub max_consecutive_limit_up: usize,
    /// A session counts as limit-up when its change is within this many
    /// percentage points of the board limit.
    pub limit_tolerance_pct: f64,
    pub short_term_window: usize,
    pub max_short_term_gain_pct: f64,
    pub volume_surge_no_gain_ratio: f64,
    pub volume_surge_min_gain_pct: f64,
    pub max_ma20_deviation_pct: f64,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            max_consecutive_limit_up: 3,
            limit_tolerance_pct: 0.5,
            short_term_window: 10,
            max_short_term_gain_pct: 30.0,
            volume_surge_no_gain_ratio: 5.0,
            volume_surge_min_gain_pct: 3.0,
            max_ma20_deviation_pct: 30.0,
        }
    }
}

/// Forward-return labelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacktestParams {
    pub enabled: bool,
    pub future_days: usize,
    pub min_future_return: f64,
    /// Count the label as a fourth active feature during classification.
    pub as_core_feature: bool,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            enabled: false,
            future_days: 5,
            min_future_return: 2.0,
            as_core_feature: false,
        }
    }
}

/// Per-instrument eligibility screen applied before the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreFilterParams {
    pub enabled: bool,
    pub min_rows: usize,
    pub min_price: f64,
    pub max_price: f64,
    pub min_avg_amount: f64,
    pub amount_window: usize,
}

impl Default for PreFilterParams {
    fn default() -> Self {
        Self {
            enabled: false,
            min_rows: 60,
            min_price: 2.0,
            max_price: 300.0,
            min_avg_amount: 10_000_000.0,
            amount_window: 10,
        }
    }
}

/// Complete configuration for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub filter_mode: FilterMode,
    pub indicators: IndicatorParams,
    pub thresholds: CoreThresholds,
    pub supplemental: SupplementalParams,
    pub risk: RiskParams,
    pub backtest: BacktestParams,
    pub prefilter: PreFilterParams,
}

impl ScanConfig {
    /// Check every range constraint. The first violation is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ind = &self.indicators;
        for (field, value) in [
            ("indicators.macd_fast", ind.macd_fast),
            ("indicators.macd_signal", ind.macd_signal),
            ("indicators.rsi_period", ind.rsi_period),
            ("indicators.kdj_period", ind.kdj_period),
            ("indicators.kdj_k_smooth", ind.kdj_k_smooth),
            ("indicators.kdj_d_smooth", ind.kdj_d_smooth),
            ("indicators.boll_period", ind.boll_period),
            ("indicators.ma_short", ind.ma_short),
            ("indicators.ma_fallback", ind.ma_fallback),
            ("indicators.volume_recent", ind.volume_recent),
        ] {
            if value == 0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    value: 0.0,
                    reason: "period must be at least 1",
                });
            }
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(ConfigError::Inconsistent(format!(
                "indicators.macd_fast ({}) must be below macd_slow ({})",
                ind.macd_fast, ind.macd_slow
            )));
        }
        if ind.ma_fallback >= ind.ma_long {
            return Err(ConfigError::Inconsistent(format!(
                "indicators.ma_fallback ({}) must be below ma_long ({})",
                ind.ma_fallback, ind.ma_long
            )));
        }
        if ind.volume_recent >= ind.volume_baseline {
            return Err(ConfigError::Inconsistent(format!(
                "indicators.volume_recent ({}) must be below volume_baseline ({})",
                ind.volume_recent, ind.volume_baseline
            )));
        }
        non_negative("indicators.boll_multiplier", ind.boll_multiplier)?;

        let th = &self.thresholds;
        if !(0.0..=100.0).contains(&th.macd_score_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "thresholds.macd_score_threshold",
                value: th.macd_score_threshold,
                reason: "must be within 0..=100",
            });
        }
        non_negative("thresholds.volume_ratio_threshold", th.volume_ratio_threshold)?;
        finite("thresholds.ma_distance_threshold", th.ma_distance_threshold)?;

        let sup = &self.supplemental;
        finite("supplemental.rsi_lower", sup.rsi_lower)?;
        finite("supplemental.rsi_upper", sup.rsi_upper)?;
        if sup.rsi_lower >= sup.rsi_upper {
            return Err(ConfigError::Inconsistent(format!(
                "supplemental RSI band is inverted ({} >= {})",
                sup.rsi_lower, sup.rsi_upper
            )));
        }
        finite("supplemental.kdj_j_max", sup.kdj_j_max)?;
        non_negative("supplemental.boll_width_threshold", sup.boll_width_threshold)?;
        non_negative("supplemental.volume_price_min_ratio", sup.volume_price_min_ratio)?;
        for (field, points) in sup.point_values() {
            if points > SupplementalParams::MAX_SCORE {
                return Err(ConfigError::OutOfRange {
                    field,
                    value: f64::from(points),
                    reason: "must be at most 60",
                });
            }
        }
        match sup.total_points() {
            Some(total) if total <= SupplementalParams::MAX_SCORE => {}
            total => {
                return Err(ConfigError::OutOfRange {
                    field: "supplemental points",
                    value: total.map_or(f64::INFINITY, f64::from),
                    reason: "points must sum to at most 60",
                });
            }
        }

        let risk = &self.risk;
        if risk.max_consecutive_limit_up == 0 {
            return Err(ConfigError::OutOfRange {
                field: "risk.max_consecutive_limit_up",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        if risk.short_term_window == 0 {
            return Err(ConfigError::OutOfRange {
                field: "risk.short_term_window",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        non_negative("risk.limit_tolerance_pct", risk.limit_tolerance_pct)?;
        non_negative("risk.max_short_term_gain_pct", risk.max_short_term_gain_pct)?;
        non_negative("risk.volume_surge_no_gain_ratio", risk.volume_surge_no_gain_ratio)?;
        finite("risk.volume_surge_min_gain_pct", risk.volume_surge_min_gain_pct)?;
        non_negative("risk.max_ma20_deviation_pct", risk.max_ma20_deviation_pct)?;

        let bt = &self.backtest;
        if bt.future_days == 0 {
            return Err(ConfigError::OutOfRange {
                field: "backtest.future_days",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        finite("backtest.min_future_return", bt.min_future_return)?;

        let pf = &self.prefilter;
        non_negative("prefilter.min_price", pf.min_price)?;
        non_negative("prefilter.min_avg_amount", pf.min_avg_amount)?;
        if pf.min_price > pf.max_price {
            return Err(ConfigError::Inconsistent(format!(
                "prefilter price range is inverted ({} > {})",
                pf.min_price, pf.max_price
            )));
        }
        if pf.amount_window == 0 {
            return Err(ConfigError::OutOfRange {
                field: "prefilter.amount_window",
                value: 0.0,
                reason: "must be at least 1",
            });
        }

        Ok(())
    }

    /// Whether the forward-return label counts toward classification.
    pub fn backtest_is_core_feature(&self) -> bool {
        self.backtest.enabled && self.backtest.as_core_feature
    }

    /// BLAKE3 hex digest of the canonical JSON form.
    ///
    /// Struct fields serialize in declaration order, so the digest is stable
    /// for identical values.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("ScanConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            reason: "must be finite",
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            reason: "must not be negative",
        });
    }
    Ok(())
}
