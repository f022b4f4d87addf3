//! Integration tests for the batch runner over CSV directories.
//!
//! The reference instrument is the 70-bar series used by the core pipeline
//! tests: exactly one signal on day 65 (index 64) in every mode.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use signalscan_core::config::{FilterMode, ScanConfig};
use signalscan_core::domain::{Instrument, PriceBar};
use signalscan_core::features::{ClassicPatterns, NoPattern};
use signalscan_core::indicators::{Indicator, Sma};
use signalscan_core::rating::Rating;
use signalscan_runner::config::{load_config, CliOverrides};
use signalscan_runner::data_loader::{BarSource, CsvDirectory, LoadError, SyntheticSource};
use signalscan_runner::result::InstrumentErrorKind;
use signalscan_runner::runner::{run_analysis, RunOptions};

const SIGNAL_DAY: usize = 64;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

fn reference_bars() -> Vec<PriceBar> {
    let mut closes: Vec<f64> = (0..62).map(|t| 30.0 - 0.002 * (t * t) as f64).collect();
    closes.extend([22.8, 23.1, 25.0, 32.0, 33.0, 34.0, 34.5, 35.0]);

    let mut bars: Vec<PriceBar> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base_date() + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 0.1,
                low: open.min(close) - 0.1,
                close,
                volume: if i == SIGNAL_DAY { 5500.0 } else { 1000.0 },
                amount: None,
            }
        })
        .collect();
    let ma60 = Sma::new(60).compute(&bars)[SIGNAL_DAY];
    bars[SIGNAL_DAY].high = ma60;
    bars
}

fn write_csv(dir: &Path, file_name: &str, bars: &[PriceBar]) {
    let mut body = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        body.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    std::fs::write(dir.join(file_name), body).unwrap();
}

/// Reference instrument plus one integrity failure and one unreadable file.
fn mixed_directory() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "sh.600519_reference_daily.csv", &reference_bars());

    let mut duplicated = reference_bars();
    duplicated[30].date = duplicated[29].date;
    write_csv(dir.path(), "sz.000001_duplicate_daily.csv", &duplicated);

    std::fs::write(
        dir.path().join("sz.000002_junk_daily.csv"),
        "date,open\nnot,numbers\n",
    )
    .unwrap();
    dir
}

fn run(dir: &Path, config: &ScanConfig) -> signalscan_runner::AnalysisRun {
    let source = CsvDirectory::open(dir).unwrap();
    run_analysis(
        &source,
        config,
        &ClassicPatterns::default(),
        &RunOptions::default(),
        None,
    )
    .unwrap()
}

#[test]
fn failures_are_recorded_and_the_batch_continues() {
    let dir = mixed_directory();
    let run = run(dir.path(), &ScanConfig::default());

    assert_eq!(run.counts.total, 3);
    assert_eq!(run.counts.analyzed, 1);
    assert_eq!(run.counts.failed, 2);
    assert_eq!(run.errors.len(), 2);
    assert_eq!(run.errors[0].symbol, "sz.000001");
    assert_eq!(run.errors[0].name, "duplicate");
    assert_eq!(run.errors[0].kind, InstrumentErrorKind::DataIntegrity);
    assert_eq!(run.errors[1].symbol, "sz.000002");
    assert_eq!(run.errors[1].kind, InstrumentErrorKind::Provider);

    assert_eq!(run.signals.len(), 1);
    let signal = &run.signals[0];
    assert_eq!(signal.symbol, "sh.600519");
    assert_eq!(signal.name, "reference");
    assert_eq!(signal.bar_index, SIGNAL_DAY);
    assert_eq!(
        signal.date,
        base_date() + chrono::Duration::days(SIGNAL_DAY as i64)
    );
    assert_eq!(signal.features.core_satisfied_count, 3);
    assert_eq!(run.counts.with_signals, 1);
    assert_eq!(run.instrument_signal_counts.len(), 1);
    assert_eq!(run.rating_distribution.total(), 1);
    assert_eq!(run.rating_distribution.get(signal.rating), 1);
}

#[test]
fn backtest_off_has_no_performance_stats() {
    let dir = mixed_directory();
    let run = run(dir.path(), &ScanConfig::default());
    assert!(!run.backtest_enabled);
    assert!(run.performance.is_none());
    assert!(run.signals.iter().all(|s| s.forward.is_none()));
}

#[test]
fn backtest_on_reports_forward_statistics() {
    let dir = mixed_directory();
    let mut config = ScanConfig::default();
    config.backtest.enabled = true;
    let run = run(dir.path(), &config);

    let perf = run.performance.expect("performance stats when backtesting");
    let expected = (35.1 - 25.0) / 25.0 * 100.0;
    assert_eq!(perf.labelled, 1);
    assert!((perf.mean_return_pct - expected).abs() < 1e-9);
    assert!((perf.median_return_pct - expected).abs() < 1e-9);
    assert!((perf.win_rate_pct - 100.0).abs() < 1e-9);
}

#[test]
fn overlay_is_merged_before_the_run() {
    let dir = mixed_directory();
    let overlay = dir.path().join("optimized_params.json");
    std::fs::write(
        &overlay,
        r#"{"FILTER_MODE": "strict", "VOLUME_RATIO_THRESHOLD": 3.0, "update_count": 4}"#,
    )
    .unwrap();

    let config = load_config(None, Some(&overlay), &CliOverrides::default()).unwrap();
    assert_eq!(config.filter_mode, FilterMode::Strict);
    let run = run(dir.path(), &config);
    assert!(run.signals.is_empty());
    assert_eq!(run.counts.analyzed, 1);
}

#[test]
fn prefilter_counts_illiquid_instruments_as_filtered() {
    let dir = mixed_directory();
    let mut config = ScanConfig::default();
    config.prefilter.enabled = true;
    let run = run(dir.path(), &config);

    // 1000 shares a day at ~35 is far below the turnover minimum.
    assert_eq!(run.counts.filtered, 1);
    assert_eq!(run.counts.analyzed, 0);
    assert_eq!(run.counts.failed, 2);
    assert!(run.signals.is_empty());
}

#[test]
fn signals_are_identical_across_thread_counts() {
    let source = SyntheticSource::new(24, 260, NaiveDate::from_ymd_opt(2022, 1, 3).unwrap());
    let mut config = ScanConfig::default();
    config.filter_mode = FilterMode::Loose;
    config.thresholds.volume_ratio_threshold = 1.2;
    config.thresholds.ma_distance_threshold = 10.0;
    let detector = ClassicPatterns::default();

    let single = RunOptions {
        threads: Some(1),
        ..RunOptions::default()
    };
    let many = RunOptions {
        threads: Some(4),
        ..RunOptions::default()
    };
    let a = run_analysis(&source, &config, &detector, &single, None).unwrap();
    let b = run_analysis(&source, &config, &detector, &many, None).unwrap();
    let c = run_analysis(&source, &config, &detector, &many, None).unwrap();

    assert_eq!(a.signals, b.signals);
    assert_eq!(b.signals, c.signals);
    assert_eq!(a.counts, b.counts);
    assert_eq!(a.config_fingerprint, b.config_fingerprint);

    // Input order first, then date.
    let symbols: Vec<String> = source.instruments().into_iter().map(|i| i.symbol).collect();
    let position = |symbol: &str| symbols.iter().position(|s| s == symbol).unwrap();
    for pair in a.signals.windows(2) {
        let (p0, p1) = (position(&pair[0].symbol), position(&pair[1].symbol));
        assert!(p0 < p1 || (p0 == p1 && pair[0].date < pair[1].date));
    }
}

/// Source that raises the cancel flag as soon as the first instrument loads.
struct CancellingSource<'a> {
    inner: SyntheticSource,
    cancel: &'a AtomicBool,
}

impl BarSource for CancellingSource<'_> {
    fn instruments(&self) -> Vec<Instrument> {
        self.inner.instruments()
    }

    fn load(&self, instrument: &Instrument) -> Result<Vec<PriceBar>, LoadError> {
        self.cancel.store(true, Ordering::Relaxed);
        self.inner.load(instrument)
    }
}

#[test]
fn cancellation_skips_remaining_instruments() {
    let cancel = AtomicBool::new(false);
    let source = CancellingSource {
        inner: SyntheticSource::new(6, 120, NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()),
        cancel: &cancel,
    };
    let options = RunOptions {
        threads: Some(1),
        ..RunOptions::default()
    };
    let run = run_analysis(
        &source,
        &ScanConfig::default(),
        &NoPattern,
        &options,
        Some(&cancel),
    )
    .unwrap();

    assert!(run.cancelled);
    assert_eq!(run.counts.failed, 0);
    assert!(run.counts.analyzed >= 1);
    assert!(run.counts.skipped >= 1);
    assert_eq!(run.counts.analyzed + run.counts.skipped, 6);
}

/// Source whose second instrument panics while loading.
struct PanickingSource {
    inner: SyntheticSource,
}

impl BarSource for PanickingSource {
    fn instruments(&self) -> Vec<Instrument> {
        self.inner.instruments()
    }

    fn load(&self, instrument: &Instrument) -> Result<Vec<PriceBar>, LoadError> {
        if instrument.name == "SYN0001" {
            panic!("corrupt cache entry");
        }
        self.inner.load(instrument)
    }
}

#[test]
fn panics_are_isolated_to_one_instrument() {
    let source = PanickingSource {
        inner: SyntheticSource::new(3, 120, NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()),
    };
    let run = run_analysis(
        &source,
        &ScanConfig::default(),
        &NoPattern,
        &RunOptions::default(),
        None,
    )
    .unwrap();

    assert_eq!(run.counts.analyzed, 2);
    assert_eq!(run.counts.failed, 1);
    assert_eq!(run.errors[0].kind, InstrumentErrorKind::Panic);
    assert!(run.errors[0].message.contains("corrupt cache entry"));
}

#[test]
fn ratings_follow_enhanced_scores() {
    let source = SyntheticSource::new(12, 300, NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
    let mut config = ScanConfig::default();
    config.filter_mode = FilterMode::Loose;
    config.thresholds.volume_ratio_threshold = 1.2;
    config.thresholds.ma_distance_threshold = 10.0;
    let run = run_analysis(
        &source,
        &config,
        &ClassicPatterns::default(),
        &RunOptions::default(),
        None,
    )
    .unwrap();

    for signal in &run.signals {
        assert_eq!(signal.rating, Rating::from_score(signal.enhanced_score()));
        assert!(signal.enhanced_score() <= 60);
    }
    assert_eq!(run.rating_distribution.total(), run.signals.len());
}
