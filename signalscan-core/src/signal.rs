//! Signal: one qualifying (instrument, day) pair.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::backtest::ForwardOutcome;
use crate::domain::Board;
use crate::features::{FeatureEvaluation, SupplementalEvaluation};
use crate::rating::Rating;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub name: String,
    pub board: Board,
    pub date: NaiveDate,
    /// Position of the day within the instrument's bar sequence.
    pub bar_index: usize,
    pub close: f64,
    pub features: FeatureEvaluation,
    pub supplemental: SupplementalEvaluation,
    pub rating: Rating,
    /// Present only when backtesting is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<ForwardOutcome>,
}

impl Signal {
    pub fn enhanced_score(&self) -> u32 {
        self.supplemental.enhanced_score
    }
}
