//! Eligibility screen applied to an instrument before the pipeline runs.
//!
//! Instruments that fail are counted as `filtered`, never as failures.

use std::fmt;

use serde::{Deserialize, Serialize};

use signalscan_core::config::PreFilterParams;
use signalscan_core::domain::PriceBar;

/// Sessions inspected by the suspension check.
const SUSPENSION_WINDOW: usize = 3;
/// Zero-volume sessions within the window that mark a suspension.
const SUSPENSION_MIN_ZERO_DAYS: usize = 2;

/// Why an instrument was screened out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FilterReason {
    TooFewRows { rows: usize, min_rows: usize },
    Suspended,
    PriceOutOfRange { close: f64 },
    Illiquid { avg_amount: f64 },
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterReason::TooFewRows { rows, min_rows } => {
                write!(f, "{rows} rows, at least {min_rows} required")
            }
            FilterReason::Suspended => f.write_str("recently suspended"),
            FilterReason::PriceOutOfRange { close } => {
                write!(f, "last close {close:.2} outside price range")
            }
            FilterReason::Illiquid { avg_amount } => {
                write!(f, "average turnover {avg_amount:.0} below minimum")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreFilter {
    params: PreFilterParams,
}

impl PreFilter {
    pub fn new(params: PreFilterParams) -> Self {
        Self { params }
    }

    pub fn is_enabled(&self) -> bool {
        self.params.enabled
    }

    /// Run every check in order; the first failing one is returned.
    ///
    /// A disabled filter accepts everything.
    pub fn check(&self, bars: &[PriceBar]) -> Result<(), FilterReason> {
        let p = &self.params;
        if !p.enabled {
            return Ok(());
        }

        if bars.len() < p.min_rows {
            return Err(FilterReason::TooFewRows {
                rows: bars.len(),
                min_rows: p.min_rows,
            });
        }

        if bars.len() >= SUSPENSION_WINDOW {
            let zero_days = bars[bars.len() - SUSPENSION_WINDOW..]
                .iter()
                .filter(|b| b.volume == 0.0)
                .count();
            if zero_days >= SUSPENSION_MIN_ZERO_DAYS {
                return Err(FilterReason::Suspended);
            }
        }

        let Some(last) = bars.last() else {
            return Err(FilterReason::TooFewRows {
                rows: 0,
                min_rows: p.min_rows,
            });
        };
        if last.close < p.min_price || last.close > p.max_price {
            return Err(FilterReason::PriceOutOfRange { close: last.close });
        }

        if p.amount_window > 0 && bars.len() >= p.amount_window {
            let window = &bars[bars.len() - p.amount_window..];
            let avg_amount =
                window.iter().map(PriceBar::turnover).sum::<f64>() / window.len() as f64;
            if avg_amount < p.min_avg_amount {
                return Err(FilterReason::Illiquid { avg_amount });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars(n: usize, close: f64, amount: f64) -> Vec<PriceBar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        (0..n)
            .map(|i| PriceBar {
                date: base + chrono::Duration::days(i as i64),
                open: close,
                high: close + 0.1,
                low: close - 0.1,
                close,
                volume: 1_000_000.0,
                amount: Some(amount),
            })
            .collect()
    }

    fn enabled() -> PreFilter {
        PreFilter::new(PreFilterParams {
            enabled: true,
            ..PreFilterParams::default()
        })
    }

    #[test]
    fn disabled_accepts_anything() {
        let filter = PreFilter::new(PreFilterParams::default());
        assert!(!filter.is_enabled());
        assert_eq!(filter.check(&[]), Ok(()));
    }

    #[test]
    fn liquid_instrument_passes() {
        assert_eq!(enabled().check(&bars(60, 10.0, 2e7)), Ok(()));
    }

    #[test]
    fn short_history_is_filtered() {
        assert_eq!(
            enabled().check(&bars(59, 10.0, 2e7)),
            Err(FilterReason::TooFewRows {
                rows: 59,
                min_rows: 60
            })
        );
    }

    #[test]
    fn two_zero_volume_days_is_suspension() {
        let mut data = bars(80, 10.0, 2e7);
        data[77].volume = 0.0;
        data[79].volume = 0.0;
        assert_eq!(enabled().check(&data), Err(FilterReason::Suspended));

        data[77].volume = 1.0;
        assert_eq!(enabled().check(&data), Ok(()));
    }

    #[test]
    fn price_bounds_are_inclusive() {
        assert_eq!(enabled().check(&bars(60, 2.0, 2e7)), Ok(()));
        assert_eq!(enabled().check(&bars(60, 300.0, 2e7)), Ok(()));
        assert_eq!(
            enabled().check(&bars(60, 1.99, 2e7)),
            Err(FilterReason::PriceOutOfRange { close: 1.99 })
        );
    }

    #[test]
    fn low_turnover_is_illiquid() {
        let mut data = bars(60, 10.0, 2e7);
        for bar in &mut data[50..] {
            bar.amount = Some(5e6);
        }
        assert!(matches!(
            enabled().check(&data),
            Err(FilterReason::Illiquid { .. })
        ));
    }

    #[test]
    fn missing_amount_uses_volume_times_close() {
        let mut data = bars(60, 10.0, 0.0);
        for bar in &mut data {
            bar.amount = None;
        }
        // 1e6 shares at 10.0 is 1e7, exactly the minimum.
        assert_eq!(enabled().check(&data), Ok(()));
    }
}
