//! Mode classification: how many active features must hold for a signal.

use serde::{Deserialize, Serialize};

use crate::config::{FilterMode, ScanConfig};
use crate::features::FeatureEvaluation;

/// Number of features participating in classification.
///
/// Three core features, plus the forward-return label when backtesting is
/// enabled and configured to count as a core feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFeatures(u8);

impl ActiveFeatures {
    pub const CORE_ONLY: ActiveFeatures = ActiveFeatures(3);
    pub const WITH_BACKTEST: ActiveFeatures = ActiveFeatures(4);

    pub fn from_config(config: &ScanConfig) -> Self {
        if config.backtest_is_core_feature() {
            Self::WITH_BACKTEST
        } else {
            Self::CORE_ONLY
        }
    }

    pub fn count(self) -> u8 {
        self.0
    }
}

/// Decides whether a day's satisfied-feature count passes the filter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeClassifier {
    pub mode: FilterMode,
    pub active: ActiveFeatures,
}

impl ModeClassifier {
    pub fn new(mode: FilterMode, active: ActiveFeatures) -> Self {
        Self { mode, active }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.filter_mode, ActiveFeatures::from_config(config))
    }

    /// Minimum number of satisfied features required by the mode.
    pub fn required(&self) -> u8 {
        match self.mode {
            FilterMode::Strict => self.active.count(),
            FilterMode::Standard => self.active.count() - 1,
            FilterMode::Loose => 2,
        }
    }

    /// `label_satisfied` is only consulted when the label is active.
    pub fn accepts(&self, features: &FeatureEvaluation, label_satisfied: Option<bool>) -> bool {
        let mut satisfied = features.core_satisfied_count;
        if self.active == ActiveFeatures::WITH_BACKTEST && label_satisfied == Some(true) {
            satisfied += 1;
        }
        if satisfied < self.required() {
            return false;
        }
        match self.mode {
            FilterMode::Loose => features.macd_ok(),
            FilterMode::Strict | FilterMode::Standard => true,
        }
    }
}
