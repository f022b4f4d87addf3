//! SignalScan Runner: batch orchestration around `signalscan-core`.
//!
//! This crate provides:
//! - Config loading (TOML file, JSON tuning overlay, CLI overrides)
//! - Bar sources: CSV directory, synthetic, in-memory
//! - Optional pre-filter for thin or suspended instruments
//! - Parallel batch runner with failure isolation and cancellation
//! - Run statistics and JSON/CSV/Markdown export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod prefilter;
pub mod result;
pub mod runner;
pub mod stats;

pub use config::{load_config, CliOverrides, ConfigLoadError, OverlayError, TuningOverlay};
pub use data_loader::{BarSource, CsvDirectory, InMemorySource, LoadError, SyntheticSource};
pub use export::{export_run_json, export_signals_csv, generate_report, save_artifacts};
pub use prefilter::{FilterReason, PreFilter};
pub use result::{AnalysisRun, InstrumentError, InstrumentErrorKind, RunCounts};
pub use runner::{run_analysis, RunError, RunOptions};
pub use stats::{IndicatorAverages, PerformanceStats, RatingDistribution};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn sources_are_send_sync() {
        assert_send::<CsvDirectory>();
        assert_sync::<CsvDirectory>();
        assert_send::<SyntheticSource>();
        assert_sync::<SyntheticSource>();
        assert_send::<InMemorySource>();
        assert_sync::<InMemorySource>();
    }

    #[test]
    fn analysis_run_is_send_sync() {
        assert_send::<AnalysisRun>();
        assert_sync::<AnalysisRun>();
    }

    #[test]
    fn prefilter_is_send_sync() {
        assert_send::<PreFilter>();
        assert_sync::<PreFilter>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<ConfigLoadError>();
        assert_sync::<ConfigLoadError>();
    }
}
