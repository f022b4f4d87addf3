//! Per-instrument pipeline.
//!
//! bars → indicators → core + supplemental features → risk filter → mode
//! classifier → rating → optional forward label.

use tracing::debug;

use crate::backtest::{forward_outcome, ForwardOutcome};
use crate::classify::ModeClassifier;
use crate::config::ScanConfig;
use crate::domain::{validate_bars, BarError, Board, Instrument, PriceBar};
use crate::features::{
    evaluate_core, evaluate_supplemental, FeatureEvaluation, PatternDetector,
    SupplementalEvaluation,
};
use crate::indicators::IndicatorSeries;
use crate::rating::Rating;
use crate::risk::{evaluate_risk, RiskFlags};
use crate::signal::Signal;

/// Everything computed for one day, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct DayEvaluation {
    pub features: FeatureEvaluation,
    pub supplemental: SupplementalEvaluation,
    pub risk: RiskFlags,
    pub forward: Option<ForwardOutcome>,
}

/// Outcome of scanning one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentScan {
    pub instrument: Instrument,
    pub bar_count: usize,
    /// Days considered (the trailing label window is skipped when backtesting).
    pub days_evaluated: usize,
    pub risk_excluded: usize,
    pub signals: Vec<Signal>,
}

/// Evaluate every feature and risk rule for one day.
///
/// The forward label is only computed when backtesting is enabled.
pub fn evaluate_day(
    bars: &[PriceBar],
    series: &IndicatorSeries,
    index: usize,
    board: Board,
    config: &ScanConfig,
    detector: &dyn PatternDetector,
) -> DayEvaluation {
    let features = evaluate_core(bars, series, index, &config.indicators, &config.thresholds);
    let supplemental =
        evaluate_supplemental(bars, series, index, &config.supplemental, detector);
    let risk = evaluate_risk(bars, series, index, board, &config.risk);
    let forward = if config.backtest.enabled {
        forward_outcome(bars, index, &config.backtest)
    } else {
        None
    };
    DayEvaluation {
        features,
        supplemental,
        risk,
        forward,
    }
}

/// Run the full pipeline over one instrument's history.
///
/// Fails only on data-integrity violations; short histories simply yield
/// absent features and no signals.
pub fn scan_instrument(
    instrument: &Instrument,
    bars: &[PriceBar],
    config: &ScanConfig,
    detector: &dyn PatternDetector,
) -> Result<InstrumentScan, BarError> {
    validate_bars(bars)?;
    Ok(scan_validated(instrument, bars, config, detector))
}

/// [`scan_instrument`] for bars that already passed [`validate_bars`].
pub fn scan_validated(
    instrument: &Instrument,
    bars: &[PriceBar],
    config: &ScanConfig,
    detector: &dyn PatternDetector,
) -> InstrumentScan {
    let series = IndicatorSeries::compute(bars, &config.indicators);
    let classifier = ModeClassifier::from_config(config);

    let end = if config.backtest.enabled {
        bars.len().saturating_sub(config.backtest.future_days)
    } else {
        bars.len()
    };

    let mut risk_excluded = 0;
    let mut signals = Vec::new();

    for index in 0..end {
        let day = evaluate_day(bars, &series, index, instrument.board, config, detector);

        if !day.risk.is_clear() {
            risk_excluded += 1;
            continue;
        }
        if !classifier.accepts(&day.features, day.forward.map(|f| f.satisfied)) {
            continue;
        }

        let bar = &bars[index];
        let rating = Rating::from_score(day.supplemental.enhanced_score);
        signals.push(Signal {
            symbol: instrument.symbol.clone(),
            name: instrument.name.clone(),
            board: instrument.board,
            date: bar.date,
            bar_index: index,
            close: bar.close,
            features: day.features,
            supplemental: day.supplemental,
            rating,
            forward: day.forward,
        });
    }

    debug!(
        symbol = %instrument.symbol,
        bars = bars.len(),
        days = end,
        risk_excluded,
        signals = signals.len(),
        "instrument scanned"
    );

    InstrumentScan {
        instrument: instrument.clone(),
        bar_count: bars.len(),
        days_evaluated: end,
        risk_excluded,
        signals,
    }
}
