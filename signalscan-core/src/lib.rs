//! SignalScan Core: indicators, feature evaluation, risk filter, mode
//! classification and rating for daily buy-signal detection.
//!
//! This crate contains the per-instrument engine:
//! - Domain types (bars, instruments, boards) and bar integrity checks
//! - Indicator library (MACD, RSI, KDJ, Bollinger, moving averages, volume ratios)
//! - Core and supplemental feature evaluators with a pluggable pattern detector
//! - Risk exclusion rules
//! - Mode classifier and rating tiers
//! - Optional forward-return label for historical evaluation
//!
//! Everything here is a pure function of one instrument's bars and an
//! immutable [`ScanConfig`]. Batching, loading and export live in the runner.

pub mod backtest;
pub mod classify;
pub mod config;
pub mod domain;
pub mod features;
pub mod indicators;
pub mod pipeline;
pub mod rating;
pub mod risk;
pub mod signal;

pub use backtest::{forward_outcome, ForwardOutcome};
pub use classify::{ActiveFeatures, ModeClassifier};
pub use config::{ConfigError, FilterMode, ScanConfig};
pub use domain::{BarError, Board, Instrument, PriceBar};
pub use features::{ClassicPatterns, NoPattern, PatternDetector, PatternKind};
pub use pipeline::{evaluate_day, scan_instrument, scan_validated, DayEvaluation, InstrumentScan};
pub use rating::Rating;
pub use risk::{RiskFlags, RiskRule};
pub use signal::Signal;
