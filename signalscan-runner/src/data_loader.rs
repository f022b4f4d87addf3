//! Bar sources for the batch runner.
//!
//! Three sources implement [`BarSource`]:
//! - [`CsvDirectory`]: one `code_name_*.csv` file per instrument
//! - [`SyntheticSource`]: deterministic random walks for demos and benchmarks
//! - [`InMemorySource`]: preloaded bars
//!
//! Fallback policy: a source never substitutes data. A file that cannot be
//! read or parsed is a [`LoadError`] for that instrument only. The runner
//! records it in the run's error list and continues with the next one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use thiserror::Error;

use signalscan_core::domain::{Instrument, PriceBar};

/// Errors from loading bar data.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read data directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no CSV files found in {0}")]
    NoFiles(PathBuf),

    #[error("{symbol}: failed to read {path}: {source}")]
    Csv {
        symbol: String,
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{symbol}: row {row}: unparseable date '{value}'")]
    BadDate {
        symbol: String,
        row: usize,
        value: String,
    },

    #[error("{symbol}: no data available")]
    Unavailable { symbol: String },
}

/// Provides instruments in a fixed input order and their daily bars.
pub trait BarSource: Send + Sync {
    /// Instruments in input order.
    fn instruments(&self) -> Vec<Instrument>;

    /// Bars for one instrument, ascending by date as stored.
    fn load(&self, instrument: &Instrument) -> Result<Vec<PriceBar>, LoadError>;
}

// ─── CSV directory ──────────────────────────────────────────────────

/// A directory of per-instrument CSV files.
///
/// File names follow `code_name_anything.csv` (e.g.
/// `sh.600000_浦发银行_近10年日线.csv`). Files are ordered by name so the
/// input order is stable across runs.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
    instruments: Vec<Instrument>,
    paths: HashMap<String, PathBuf>,
}

impl CsvDirectory {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let dir = dir.as_ref().to_path_buf();
        let entries = std::fs::read_dir(&dir).map_err(|source| LoadError::Directory {
            path: dir.clone(),
            source,
        })?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| LoadError::Directory {
                    path: dir.clone(),
                    source,
                })?
                .path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if is_csv && path.is_file() {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(LoadError::NoFiles(dir));
        }
        files.sort();

        let mut instruments = Vec::with_capacity(files.len());
        let mut paths = HashMap::with_capacity(files.len());
        for path in files {
            let instrument = instrument_from_file_name(&path);
            // First file wins when two files share a code.
            if paths.contains_key(&instrument.symbol) {
                continue;
            }
            paths.insert(instrument.symbol.clone(), path);
            instruments.push(instrument);
        }

        Ok(Self {
            dir,
            instruments,
            paths,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl BarSource for CsvDirectory {
    fn instruments(&self) -> Vec<Instrument> {
        self.instruments.clone()
    }

    fn load(&self, instrument: &Instrument) -> Result<Vec<PriceBar>, LoadError> {
        let path = self
            .paths
            .get(&instrument.symbol)
            .ok_or_else(|| LoadError::Unavailable {
                symbol: instrument.symbol.clone(),
            })?;
        read_bars_csv(&instrument.symbol, path)
    }
}

/// Parse `code_name_*.csv` into an instrument. A missing name is left empty.
pub fn instrument_from_file_name(path: &Path) -> Instrument {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut parts = stem.splitn(3, '_');
    let code = parts.next().unwrap_or_default();
    let name = parts.next().unwrap_or_default();
    Instrument::new(code, name)
}

/// One CSV row. Extra provider columns (`code`, `preclose`, `turn`,
/// `pctChg`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<f64>,
}

/// Read one instrument's CSV file. Rows are kept in file order; ordering
/// violations are reported later by bar validation.
pub fn read_bars_csv(symbol: &str, path: &Path) -> Result<Vec<PriceBar>, LoadError> {
    let csv_error = |source: csv::Error| LoadError::Csv {
        symbol: symbol.to_string(),
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let mut bars = Vec::new();
    for (row, record) in reader.deserialize::<CsvRow>().enumerate() {
        let record = record.map_err(csv_error)?;
        let date = parse_date(&record.date).ok_or_else(|| LoadError::BadDate {
            symbol: symbol.to_string(),
            row: row + 1,
            value: record.date.clone(),
        })?;
        bars.push(PriceBar {
            date,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
            amount: record.amount,
        });
    }

    if bars.is_empty() {
        return Err(LoadError::Unavailable {
            symbol: symbol.to_string(),
        });
    }
    Ok(bars)
}

/// Accepts `2024-01-02` and `20240102`.
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .ok()
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Deterministic random-walk instruments.
///
/// Each instrument's walk is seeded from the BLAKE3 hash of its code, so the
/// same code always yields the same bars regardless of how many instruments
/// are generated.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    instruments: Vec<Instrument>,
    bars_per_instrument: usize,
    start: NaiveDate,
}

impl SyntheticSource {
    pub fn new(count: usize, bars_per_instrument: usize, start: NaiveDate) -> Self {
        let instruments = (0..count)
            .map(|i| {
                let symbol = match i % 3 {
                    0 => format!("sh.{:06}", 600_000 + i),
                    1 => format!("sz.{:06}", i),
                    _ => format!("sz.{:06}", 300_000 + i),
                };
                Instrument::new(symbol, format!("SYN{i:04}"))
            })
            .collect();
        Self {
            instruments,
            bars_per_instrument,
            start,
        }
    }
}

impl BarSource for SyntheticSource {
    fn instruments(&self) -> Vec<Instrument> {
        self.instruments.clone()
    }

    fn load(&self, instrument: &Instrument) -> Result<Vec<PriceBar>, LoadError> {
        Ok(generate_synthetic_bars(
            &instrument.symbol,
            self.start,
            self.bars_per_instrument,
        ))
    }
}

/// Generate `count` weekday bars starting at `start`.
///
/// A random walk with roughly ±3% daily moves and occasional volume bursts,
/// which is enough to exercise every feature evaluator.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, count: usize) -> Vec<PriceBar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::with_capacity(count);
    let mut price: f64 = rng.gen_range(5.0..50.0);
    let mut current = start;

    while bars.len() < count {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.032);
        let open = price;
        let close = (price * (1.0 + daily_return)).max(0.5);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.015));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.015));
        let mut volume: f64 = rng.gen_range(200_000.0..2_000_000.0);
        if rng.gen_bool(0.05) {
            volume *= 3.0;
        }

        bars.push(PriceBar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
            amount: Some(volume * close),
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

// ─── In memory ──────────────────────────────────────────────────────

/// Preloaded bars keyed by symbol. An instrument registered without bars
/// reports [`LoadError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    instruments: Vec<Instrument>,
    bars: HashMap<String, Vec<PriceBar>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, instrument: Instrument, bars: Vec<PriceBar>) -> Self {
        self.bars.insert(instrument.symbol.clone(), bars);
        self.instruments.push(instrument);
        self
    }

    pub fn with_unavailable(mut self, instrument: Instrument) -> Self {
        self.instruments.push(instrument);
        self
    }
}

impl BarSource for InMemorySource {
    fn instruments(&self) -> Vec<Instrument> {
        self.instruments.clone()
    }

    fn load(&self, instrument: &Instrument) -> Result<Vec<PriceBar>, LoadError> {
        self.bars
            .get(&instrument.symbol)
            .cloned()
            .ok_or_else(|| LoadError::Unavailable {
                symbol: instrument.symbol.clone(),
            })
    }
}
