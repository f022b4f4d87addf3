//! Run export: JSON, CSV and Markdown artifacts.
//!
//! - **JSON**: the full `AnalysisRun` with schema versioning
//! - **CSV**: one row per signal for spreadsheets and downstream tools
//! - **Markdown**: a short human-readable summary
//!
//! Forward-return columns and performance sections only appear when the
//! run was backtested.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use signalscan_core::signal::Signal;

use crate::result::{AnalysisRun, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_run_json(run: &AnalysisRun) -> Result<String> {
    serde_json::to_string_pretty(run).context("failed to serialize AnalysisRun to JSON")
}

/// Deserialize an `AnalysisRun`, rejecting newer schema versions.
pub fn import_run_json(json: &str) -> Result<AnalysisRun> {
    let run: AnalysisRun =
        serde_json::from_str(json).context("failed to deserialize AnalysisRun from JSON")?;
    if run.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            run.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(run)
}

// ─── CSV export ─────────────────────────────────────────────────────

const BASE_COLUMNS: [&str; 21] = [
    "symbol",
    "name",
    "board",
    "date",
    "close",
    "rating",
    "enhanced_score",
    "core_satisfied",
    "macd_score",
    "macd_ok",
    "volume_ratio",
    "volume_ok",
    "ma_distance_pct",
    "ma_period",
    "ma_ok",
    "rsi_points",
    "kdj_points",
    "boll_points",
    "pattern",
    "pattern_points",
    "volume_price_points",
];

const FORWARD_COLUMNS: [&str; 2] = ["forward_return_pct", "forward_satisfied"];

/// One row per signal. Absent feature values are empty cells.
pub fn export_signals_csv(signals: &[Signal], include_forward: bool) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
    if include_forward {
        header.extend(FORWARD_COLUMNS);
    }
    wtr.write_record(&header)?;

    for s in signals {
        let f = &s.features;
        let sup = &s.supplemental;
        let mut row = vec![
            s.symbol.clone(),
            s.name.clone(),
            s.board.as_str().to_string(),
            s.date.to_string(),
            format!("{:.2}", s.close),
            s.rating.to_string(),
            sup.enhanced_score.to_string(),
            f.core_satisfied_count.to_string(),
            opt(f.macd_score),
            opt(f.macd_satisfied),
            opt_f64(f.volume_ratio, 2),
            opt(f.volume_satisfied),
            opt_f64(f.ma_distance_pct, 2),
            opt(f.ma_period_used),
            opt(f.ma_satisfied),
            sup.rsi_points.to_string(),
            sup.kdj_points.to_string(),
            sup.boll_points.to_string(),
            sup.pattern.map(|p| p.as_str().to_string()).unwrap_or_default(),
            sup.pattern_points.to_string(),
            sup.volume_price_points.to_string(),
        ];
        if include_forward {
            row.push(opt_f64(s.forward.map(|o| o.forward_return_pct), 2));
            row.push(opt(s.forward.map(|o| o.satisfied)));
        }
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_f64(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_default()
}

// ─── Markdown report ────────────────────────────────────────────────

pub fn generate_report(run: &AnalysisRun) -> String {
    let mut md = String::with_capacity(1024);
    let c = &run.counts;

    md.push_str("# Signal Scan Report\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Generated | {} |\n", run.generated_at));
    md.push_str(&format!("| Filter mode | {} |\n", run.filter_mode));
    md.push_str(&format!(
        "| Backtest | {} |\n",
        if run.backtest_enabled { "on" } else { "off" }
    ));
    md.push_str(&format!("| Instruments | {} |\n", c.total));
    md.push_str(&format!(
        "| Analyzed / filtered / failed / skipped | {} / {} / {} / {} |\n",
        c.analyzed, c.filtered, c.failed, c.skipped
    ));
    md.push_str(&format!(
        "| Instruments with signals | {} |\n",
        c.with_signals
    ));
    md.push_str(&format!("| Signals | {} |\n", run.signals.len()));
    md.push_str(&format!("| Config | `{}` |\n", short_hash(&run.config_fingerprint)));
    if run.cancelled {
        md.push_str("| Status | **CANCELLED** |\n");
    }
    md.push('\n');

    let dist = &run.rating_distribution;
    md.push_str("## Ratings\n\n");
    md.push_str("| A | B | C |\n| --- | --- | --- |\n");
    md.push_str(&format!("| {} | {} | {} |\n\n", dist.a, dist.b, dist.c));

    if let Some(avg) = &run.indicator_averages {
        md.push_str("## Averages\n\n");
        md.push_str(&format!(
            "- MACD score: {}\n",
            opt_f64(avg.macd_score, 1)
        ));
        md.push_str(&format!(
            "- Volume ratio: {}\n",
            opt_f64(avg.volume_ratio, 2)
        ));
        md.push_str(&format!("- Enhanced score: {:.1}\n\n", avg.enhanced_score));
    }

    if let Some(perf) = &run.performance {
        md.push_str("## Forward Returns\n\n");
        md.push_str("| Labelled | Mean % | Median % | Win rate % | Max % | Min % |\n");
        md.push_str("| --- | --- | --- | --- | --- | --- |\n");
        md.push_str(&format!(
            "| {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |\n\n",
            perf.labelled,
            perf.mean_return_pct,
            perf.median_return_pct,
            perf.win_rate_pct,
            perf.max_return_pct,
            perf.min_return_pct
        ));
    }

    if !run.errors.is_empty() {
        md.push_str("## Failures\n\n");
        for err in &run.errors {
            md.push_str(&format!("- `{}` {}: {}\n", err.symbol, err.name, err.message));
        }
        md.push('\n');
    }

    md
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `signals.csv`, `run.json` and `report.md` into a new
/// `scan_{mode}_{timestamp}/` directory under `output_dir`.
///
/// Returns the path to the created directory.
pub fn save_artifacts(run: &AnalysisRun, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "scan_{}_{}",
        run.filter_mode,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create output dir: {}", run_dir.display()))?;

    let csv = export_signals_csv(&run.signals, run.backtest_enabled)?;
    std::fs::write(run_dir.join("signals.csv"), csv)?;

    let json = export_run_json(run)?;
    std::fs::write(run_dir.join("run.json"), json)?;

    std::fs::write(run_dir.join("report.md"), generate_report(run))?;

    Ok(run_dir)
}

/// Load an `AnalysisRun` from an artifact directory's `run.json`.
pub fn load_artifacts(dir: &Path) -> Result<AnalysisRun> {
    let path = dir.join("run.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_run_json(&json)
}
