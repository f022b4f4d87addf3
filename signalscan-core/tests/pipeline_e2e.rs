//! End-to-end pipeline tests on hand-built series.
//!
//! The reference series is 70 bars: a steady, accelerating decline keeps
//! MACD below its signal line, two small bounces and a jump on day 65
//! (index 64) flip DIF above DEA, volume on that day is 5.5x normal (3-day
//! ratio 2.5), and the day's high sits exactly on the 60-day average. The
//! rally that follows is excluded by the short-term surge rule.

use chrono::NaiveDate;
use signalscan_core::config::{FilterMode, ScanConfig};
use signalscan_core::domain::{Instrument, PriceBar};
use signalscan_core::features::{ClassicPatterns, NoPattern};
use signalscan_core::indicators::{Indicator, Sma};
use signalscan_core::pipeline::scan_instrument;
use signalscan_core::rating::Rating;
use signalscan_core::risk::RiskRule;

const SIGNAL_DAY: usize = 64;

fn build_bars(closes: &[f64], volumes: &[f64]) -> Vec<PriceBar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 0.1,
                low: open.min(close) - 0.1,
                close,
                volume,
                amount: None,
            }
        })
        .collect()
}

fn reference_bars() -> Vec<PriceBar> {
    let mut closes: Vec<f64> = (0..62).map(|t| 30.0 - 0.002 * (t * t) as f64).collect();
    closes.extend([22.8, 23.1, 25.0, 32.0, 33.0, 34.0, 34.5, 35.0]);
    let mut volumes = vec![1000.0; 70];
    volumes[SIGNAL_DAY] = 5500.0;

    let mut bars = build_bars(&closes, &volumes);
    let ma60 = Sma::new(60).compute(&bars)[SIGNAL_DAY];
    bars[SIGNAL_DAY].high = ma60;
    bars
}

fn instrument() -> Instrument {
    Instrument::new("sh.600519", "reference")
}

#[test]
fn single_standard_signal_on_day_65() {
    let bars = reference_bars();
    let config = ScanConfig::default();
    let scan = scan_instrument(&instrument(), &bars, &config, &ClassicPatterns::default()).unwrap();

    assert_eq!(scan.signals.len(), 1, "signals: {:?}", scan.signals);
    let signal = &scan.signals[0];
    assert_eq!(signal.bar_index, SIGNAL_DAY);
    assert_eq!(signal.date, bars[SIGNAL_DAY].date);
    assert_eq!(signal.features.macd_satisfied, Some(true));
    assert_eq!(signal.features.volume_satisfied, Some(true));
    assert_eq!(signal.features.ma_satisfied, Some(true));
    assert_eq!(signal.features.core_satisfied_count, 3);
    assert_eq!(signal.features.ma_period_used, Some(60));
    assert!((signal.features.volume_ratio.unwrap() - 2.5).abs() < 1e-9);
    assert!(signal.features.ma_distance_pct.unwrap().abs() < 1e-9);
    assert_eq!(signal.rating, Rating::from_score(signal.enhanced_score()));
    assert!(signal.enhanced_score() <= 60);
    assert!(signal.forward.is_none());
}

#[test]
fn same_signal_in_every_mode() {
    let bars = reference_bars();
    for mode in FilterMode::ALL {
        let config = ScanConfig {
            filter_mode: mode,
            ..ScanConfig::default()
        };
        let scan = scan_instrument(&instrument(), &bars, &config, &NoPattern).unwrap();
        let days: Vec<usize> = scan.signals.iter().map(|s| s.bar_index).collect();
        assert_eq!(days, vec![SIGNAL_DAY], "mode {mode}");
    }
}

#[test]
fn rally_days_are_risk_excluded() {
    let bars = reference_bars();
    let config = ScanConfig::default();
    let scan = scan_instrument(&instrument(), &bars, &config, &NoPattern).unwrap();
    assert!(scan.signals.iter().all(|s| s.bar_index <= SIGNAL_DAY));
    assert!(scan.risk_excluded >= 5);

    let series = signalscan_core::indicators::IndicatorSeries::compute(&bars, &config.indicators);
    let day = signalscan_core::pipeline::evaluate_day(
        &bars,
        &series,
        SIGNAL_DAY + 1,
        instrument().board,
        &config,
        &NoPattern,
    );
    assert!(day.risk.contains(RiskRule::ShortTermSurge));
    // The day after still has a surging volume ratio, but never becomes a signal.
    assert_eq!(day.features.volume_satisfied, Some(true));
}

#[test]
fn tightening_volume_threshold_removes_the_signal() {
    let bars = reference_bars();
    let mut config = ScanConfig::default();
    config.filter_mode = FilterMode::Strict;
    config.thresholds.volume_ratio_threshold = 3.0;
    let scan = scan_instrument(&instrument(), &bars, &config, &NoPattern).unwrap();
    assert!(scan.signals.is_empty());
}

#[test]
fn backtest_enabled_adds_forward_outcome() {
    let bars = reference_bars();
    let mut config = ScanConfig::default();
    config.backtest.enabled = true;
    let scan = scan_instrument(&instrument(), &bars, &config, &NoPattern).unwrap();

    assert_eq!(scan.days_evaluated, 65);
    assert_eq!(scan.signals.len(), 1);
    let forward = scan.signals[0].forward.expect("forward outcome when backtesting");
    // Max high over the next five sessions is 35.1 against a close of 25.
    assert!((forward.forward_return_pct - (35.1 - 25.0) / 25.0 * 100.0).abs() < 1e-9);
    assert!(forward.satisfied);
}

#[test]
fn backtest_as_core_feature_requires_label() {
    let bars = reference_bars();
    let mut config = ScanConfig::default();
    config.filter_mode = FilterMode::Strict;
    config.backtest.enabled = true;
    config.backtest.as_core_feature = true;
    let scan = scan_instrument(&instrument(), &bars, &config, &NoPattern).unwrap();
    assert_eq!(scan.signals.len(), 1);

    config.backtest.min_future_return = 50.0;
    let scan = scan_instrument(&instrument(), &bars, &config, &NoPattern).unwrap();
    assert!(scan.signals.is_empty());
}

#[test]
fn fewer_than_34_bars_never_satisfy_macd() {
    let bars = reference_bars();
    let config = ScanConfig::default();
    let scan = scan_instrument(&instrument(), &bars[..33], &config, &NoPattern).unwrap();
    assert!(scan.signals.iter().all(|s| s.features.macd_satisfied != Some(true)));

    let series =
        signalscan_core::indicators::IndicatorSeries::compute(&bars[..33], &config.indicators);
    for index in 0..33 {
        let day = signalscan_core::pipeline::evaluate_day(
            &bars[..33],
            &series,
            index,
            instrument().board,
            &config,
            &NoPattern,
        );
        assert_eq!(day.features.macd_satisfied, None);
    }
}
