//! Batch runner: loads each instrument, runs the core pipeline on a private
//! worker pool, and aggregates the outcomes into an [`AnalysisRun`].
//!
//! Per-instrument work is isolated: load errors, integrity violations and
//! panics become [`InstrumentError`] entries and the batch continues.
//! Cancellation is cooperative and checked before each instrument starts.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use signalscan_core::config::{ConfigError, ScanConfig};
use signalscan_core::domain::{validate_bars, Instrument};
use signalscan_core::features::PatternDetector;
use signalscan_core::pipeline::{scan_validated, InstrumentScan};

use crate::data_loader::{BarSource, LoadError};
use crate::prefilter::PreFilter;
use crate::result::{
    AnalysisRun, InstrumentError, InstrumentErrorKind, InstrumentSignalCount, RunCounts,
    SCHEMA_VERSION,
};
use crate::stats::{IndicatorAverages, PerformanceStats, RatingDistribution};

/// Errors that abort a run before any instrument is processed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("no instruments to analyze")]
    NoInstruments,
}

/// Batch-level knobs that do not affect per-instrument results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Worker threads; `None` uses the number of available cores.
    pub threads: Option<usize>,
    /// Process only the first N instruments.
    pub limit: Option<usize>,
    /// Log progress every N completed instruments; 0 disables it.
    pub progress_interval: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            threads: None,
            limit: None,
            progress_interval: 100,
        }
    }
}

impl RunOptions {
    fn thread_count(&self) -> usize {
        self.threads
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }
}

/// What happened to one instrument.
#[derive(Debug)]
enum InstrumentOutcome {
    Scanned(InstrumentScan),
    Filtered,
    Failed(InstrumentError),
    Skipped,
}

/// Analyze every instrument the source provides.
///
/// The config is validated first; an invalid config fails the whole run.
/// Signals come back in instrument input order regardless of thread count.
pub fn run_analysis(
    source: &dyn BarSource,
    config: &ScanConfig,
    detector: &dyn PatternDetector,
    options: &RunOptions,
    cancel: Option<&AtomicBool>,
) -> Result<AnalysisRun, RunError> {
    config.validate()?;

    let mut instruments = source.instruments();
    if let Some(limit) = options.limit {
        instruments.truncate(limit);
    }
    if instruments.is_empty() {
        return Err(RunError::NoInstruments);
    }

    let threads = options.thread_count();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;

    info!(
        mode = %config.filter_mode,
        backtest = config.backtest.enabled,
        instruments = instruments.len(),
        threads,
        detector = detector.name(),
        "analysis started"
    );

    let start = Instant::now();
    let prefilter = PreFilter::new(config.prefilter.clone());
    let completed = AtomicUsize::new(0);
    let total = instruments.len();

    let outcomes: Vec<InstrumentOutcome> = pool.install(|| {
        instruments
            .par_iter()
            .map(|instrument| {
                if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
                    return InstrumentOutcome::Skipped;
                }
                let outcome = process_instrument(source, instrument, config, &prefilter, detector);
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if options.progress_interval > 0 && done % options.progress_interval == 0 {
                    info!(done, total, "progress");
                }
                outcome
            })
            .collect()
    });

    let run = aggregate(outcomes, config, start.elapsed().as_millis() as u64);

    info!(
        analyzed = run.counts.analyzed,
        with_signals = run.counts.with_signals,
        filtered = run.counts.filtered,
        failed = run.counts.failed,
        skipped = run.counts.skipped,
        signals = run.signals.len(),
        elapsed_ms = run.elapsed_ms,
        "analysis finished"
    );

    Ok(run)
}

/// Load, validate, screen and scan one instrument. Never panics outward.
///
/// Integrity violations are failures even when the pre-filter would also
/// reject the instrument.
fn process_instrument(
    source: &dyn BarSource,
    instrument: &Instrument,
    config: &ScanConfig,
    prefilter: &PreFilter,
    detector: &dyn PatternDetector,
) -> InstrumentOutcome {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let bars = match source.load(instrument) {
            Ok(bars) => bars,
            Err(e) => {
                return InstrumentOutcome::Failed(instrument_error(
                    instrument,
                    InstrumentErrorKind::Provider,
                    e.to_string(),
                ))
            }
        };
        if let Err(e) = validate_bars(&bars) {
            return InstrumentOutcome::Failed(instrument_error(
                instrument,
                InstrumentErrorKind::DataIntegrity,
                e.to_string(),
            ));
        }
        if let Err(reason) = prefilter.check(&bars) {
            debug!(symbol = %instrument.symbol, %reason, "filtered");
            return InstrumentOutcome::Filtered;
        }
        InstrumentOutcome::Scanned(scan_validated(instrument, &bars, config, detector))
    }));

    let outcome = result.unwrap_or_else(|payload| {
        InstrumentOutcome::Failed(instrument_error(
            instrument,
            InstrumentErrorKind::Panic,
            panic_message(payload.as_ref()),
        ))
    });

    if let InstrumentOutcome::Failed(err) = &outcome {
        warn!(
            symbol = %err.symbol,
            kind = ?err.kind,
            error = %err.message,
            "instrument failed"
        );
    }
    outcome
}

fn instrument_error(
    instrument: &Instrument,
    kind: InstrumentErrorKind,
    message: String,
) -> InstrumentError {
    InstrumentError {
        symbol: instrument.symbol.clone(),
        name: instrument.name.clone(),
        kind,
        message,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Fold ordered outcomes into the run report.
fn aggregate(outcomes: Vec<InstrumentOutcome>, config: &ScanConfig, elapsed_ms: u64) -> AnalysisRun {
    let mut counts = RunCounts {
        total: outcomes.len(),
        ..RunCounts::default()
    };
    let mut signals = Vec::new();
    let mut errors = Vec::new();
    let mut instrument_signal_counts = Vec::new();

    for outcome in outcomes {
        match outcome {
            InstrumentOutcome::Scanned(scan) => {
                counts.analyzed += 1;
                counts.days_evaluated += scan.days_evaluated;
                counts.risk_excluded_days += scan.risk_excluded;
                if !scan.signals.is_empty() {
                    counts.with_signals += 1;
                    instrument_signal_counts.push(InstrumentSignalCount {
                        symbol: scan.instrument.symbol.clone(),
                        name: scan.instrument.name.clone(),
                        signals: scan.signals.len(),
                    });
                }
                signals.extend(scan.signals);
            }
            InstrumentOutcome::Filtered => counts.filtered += 1,
            InstrumentOutcome::Failed(err) => {
                counts.failed += 1;
                errors.push(err);
            }
            InstrumentOutcome::Skipped => counts.skipped += 1,
        }
    }

    let performance = if config.backtest.enabled {
        PerformanceStats::from_signals(&signals)
    } else {
        None
    };

    AnalysisRun {
        schema_version: SCHEMA_VERSION,
        filter_mode: config.filter_mode,
        backtest_enabled: config.backtest.enabled,
        config_fingerprint: config.fingerprint(),
        generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        elapsed_ms,
        cancelled: counts.skipped > 0,
        counts,
        rating_distribution: RatingDistribution::from_signals(&signals),
        performance,
        indicator_averages: IndicatorAverages::from_signals(&signals),
        instrument_signal_counts,
        errors,
        signals,
    }
}
