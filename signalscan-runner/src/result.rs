//! Aggregated outcome of one analysis run.

use serde::{Deserialize, Serialize};

use signalscan_core::config::FilterMode;
use signalscan_core::signal::Signal;

use crate::stats::{IndicatorAverages, PerformanceStats, RatingDistribution};

/// Current schema version for persisted run artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Category of a per-instrument failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentErrorKind {
    /// Bars violated an integrity rule.
    DataIntegrity,
    /// The source could not provide bars.
    Provider,
    /// Evaluation panicked.
    Panic,
}

/// One instrument that was skipped because of an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentError {
    pub symbol: String,
    pub name: String,
    pub kind: InstrumentErrorKind,
    pub message: String,
}

/// Instruments with at least one signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSignalCount {
    pub symbol: String,
    pub name: String,
    pub signals: usize,
}

/// How each instrument in the batch ended up.
///
/// `total == analyzed + filtered + failed + skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub total: usize,
    /// Ran through the pipeline.
    pub analyzed: usize,
    /// Analyzed and produced at least one signal.
    pub with_signals: usize,
    /// Screened out by the pre-filter.
    pub filtered: usize,
    pub failed: usize,
    /// Not started because the run was cancelled.
    pub skipped: usize,
    pub days_evaluated: usize,
    pub risk_excluded_days: usize,
}

/// Complete result of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRun {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub filter_mode: FilterMode,
    pub backtest_enabled: bool,
    /// BLAKE3 digest of the effective configuration.
    pub config_fingerprint: String,
    pub generated_at: String,
    pub elapsed_ms: u64,
    pub cancelled: bool,
    pub counts: RunCounts,
    pub rating_distribution: RatingDistribution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator_averages: Option<IndicatorAverages>,
    pub instrument_signal_counts: Vec<InstrumentSignalCount>,
    pub errors: Vec<InstrumentError>,
    /// Ordered by instrument input order, then by date.
    pub signals: Vec<Signal>,
}

fn default_schema_version() -> u32 {
    1
}

impl AnalysisRun {
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn failure_count(&self) -> usize {
        self.errors.len()
    }
}
