//! SignalScan CLI: batch signal scan and config inspection.
//!
//! Commands:
//! - `scan`: analyze a directory of daily CSV files (or synthetic data)
//! - `show-config`: print the effective configuration after all layers merge

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use signalscan_core::config::{FilterMode, ScanConfig};
use signalscan_core::features::ClassicPatterns;
use signalscan_runner::{
    load_config, run_analysis, save_artifacts, AnalysisRun, BarSource, CliOverrides,
    CsvDirectory, RunOptions, SyntheticSource,
};

/// Bars generated per synthetic instrument (about two years of sessions).
const SYNTHETIC_BARS: usize = 500;

#[derive(Parser)]
#[command(
    name = "signalscan",
    about = "SignalScan: daily buy-signal scanner for exchange-listed equities"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every instrument and export the signals found.
    Scan {
        /// Directory of `code_name_*.csv` files.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON tuning overlay merged over the config.
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// Filter mode: strict, standard or loose.
        #[arg(long)]
        mode: Option<String>,

        /// Attach forward-return labels and performance statistics.
        #[arg(long, conflicts_with = "no_backtest")]
        backtest: bool,

        /// Disable backtesting even if the config enables it.
        #[arg(long)]
        no_backtest: bool,

        /// Analyze only the first N instruments.
        #[arg(long)]
        limit: Option<usize>,

        /// Worker threads. Defaults to the number of cores.
        #[arg(long)]
        threads: Option<usize>,

        /// Cancel the remaining instruments after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Write signals.csv, run.json and report.md here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Use N synthetic instruments instead of a data directory.
        #[arg(long, conflicts_with = "data_dir")]
        synthetic: Option<usize>,
    },
    /// Print the effective configuration as TOML.
    ShowConfig {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        overlay: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Commands::Scan {
            data_dir,
            config,
            overlay,
            mode,
            backtest,
            no_backtest,
            limit,
            threads,
            timeout_secs,
            output_dir,
            synthetic,
        } => {
            let overrides = CliOverrides {
                mode: mode.as_deref().map(str::parse::<FilterMode>).transpose()?,
                backtest: match (backtest, no_backtest) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };
            let options = RunOptions {
                threads,
                limit,
                ..RunOptions::default()
            };
            run_scan_cmd(
                data_dir,
                synthetic,
                config.as_deref(),
                overlay.as_deref(),
                &overrides,
                &options,
                timeout_secs,
                output_dir.as_deref(),
            )
        }
        Commands::ShowConfig { config, overlay } => {
            run_show_config(config.as_deref(), overlay.as_deref())
        }
    }
}

fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[allow(clippy::too_many_arguments)]
fn run_scan_cmd(
    data_dir: Option<PathBuf>,
    synthetic: Option<usize>,
    config_path: Option<&Path>,
    overlay_path: Option<&Path>,
    overrides: &CliOverrides,
    options: &RunOptions,
    timeout_secs: Option<u64>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path, overlay_path, overrides)?;

    let source: Box<dyn BarSource> = match (data_dir, synthetic) {
        (Some(dir), None) => Box::new(
            CsvDirectory::open(&dir)
                .with_context(|| format!("cannot use data directory {}", dir.display()))?,
        ),
        (None, Some(0)) => bail!("--synthetic needs at least one instrument"),
        (None, Some(count)) => {
            let start = NaiveDate::from_ymd_opt(2022, 1, 3).context("invalid start date")?;
            Box::new(SyntheticSource::new(count, SYNTHETIC_BARS, start))
        }
        (None, None) => bail!("one of --data-dir or --synthetic is required"),
        (Some(_), Some(_)) => bail!("--data-dir and --synthetic are mutually exclusive"),
    };

    let cancel = Arc::new(AtomicBool::new(false));
    if let Some(secs) = timeout_secs {
        let flag = Arc::clone(&cancel);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            flag.store(true, Ordering::Relaxed);
            tracing::warn!(timeout_secs = secs, "timeout reached, cancelling remaining instruments");
        });
    }

    let detector = ClassicPatterns::default();
    let run = run_analysis(
        source.as_ref(),
        &config,
        &detector,
        options,
        Some(cancel.as_ref()),
    )?;

    print_summary(&run);

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&run, dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn run_show_config(config_path: Option<&Path>, overlay_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path, overlay_path, &CliOverrides::default())?;
    print!("{}", render_config(&config)?);
    Ok(())
}

fn render_config(config: &ScanConfig) -> Result<String> {
    let body = toml::to_string_pretty(config).context("failed to render config as TOML")?;
    Ok(format!("# fingerprint: {}\n{body}", config.fingerprint()))
}

fn print_summary(run: &AnalysisRun) {
    let c = &run.counts;
    println!();
    println!("=== Scan Result ===");
    println!("Mode:           {}", run.filter_mode);
    println!(
        "Backtest:       {}",
        if run.backtest_enabled { "on" } else { "off" }
    );
    println!("Instruments:    {}", c.total);
    println!("Analyzed:       {}", c.analyzed);
    println!("Filtered:       {}", c.filtered);
    println!("Failed:         {}", c.failed);
    if c.skipped > 0 {
        println!("Skipped:        {} (cancelled)", c.skipped);
    }
    println!("With signals:   {}", c.with_signals);
    println!("Signals:        {}", run.signals.len());
    let dist = &run.rating_distribution;
    println!("Ratings:        A {} / B {} / C {}", dist.a, dist.b, dist.c);

    if let Some(avg) = &run.indicator_averages {
        println!();
        println!("--- Averages ---");
        if let Some(macd) = avg.macd_score {
            println!("MACD score:     {macd:.1}");
        }
        if let Some(ratio) = avg.volume_ratio {
            println!("Volume ratio:   {ratio:.2}");
        }
        println!("Enhanced score: {:.1}", avg.enhanced_score);
    }

    if let Some(perf) = &run.performance {
        println!();
        println!("--- Forward Returns ---");
        println!("Labelled:       {}", perf.labelled);
        println!("Mean:           {:.2}%", perf.mean_return_pct);
        println!("Median:         {:.2}%", perf.median_return_pct);
        println!("Win Rate:       {:.1}%", perf.win_rate_pct);
        println!("Max:            {:.2}%", perf.max_return_pct);
        println!("Min:            {:.2}%", perf.min_return_pct);
    }

    for err in run.errors.iter().take(10) {
        println!("WARNING: {} {}: {}", err.symbol, err.name, err.message);
    }
    if run.errors.len() > 10 {
        println!("WARNING: {} more failures", run.errors.len() - 10);
    }
}
