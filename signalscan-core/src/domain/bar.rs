//! PriceBar: the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One trading day for one instrument.
///
/// Bars arrive from the data collaborator already ordered by date. They are
/// indexed by trading-day ordinal, so calendar gaps (weekends, suspensions)
/// are expected and carry no meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Turnover amount in currency units, when the provider supplies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

/// Data-integrity violations that disqualify an instrument's bar sequence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("empty bar sequence")]
    Empty,

    #[error("bar {index}: date {date} does not follow {previous}")]
    NonMonotonicDate {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("bar {index}: {field} is not finite")]
    NonFinite { index: usize, field: &'static str },

    #[error("bar {index}: {field} is negative ({value})")]
    Negative {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("bar {index}: high {high} is below low {low}")]
    HighBelowLow { index: usize, high: f64, low: f64 },
}

impl PriceBar {
    /// Percentage change of this bar's close versus `previous_close`.
    ///
    /// Returns `None` when the previous close is not positive.
    pub fn change_pct(&self, previous_close: f64) -> Option<f64> {
        if previous_close > 0.0 {
            Some((self.close - previous_close) / previous_close * 100.0)
        } else {
            None
        }
    }

    /// Turnover amount, approximated as `volume * close` when absent.
    pub fn turnover(&self) -> f64 {
        self.amount.unwrap_or(self.volume * self.close)
    }

    fn check(&self, index: usize) -> Result<(), BarError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(BarError::NonFinite { index, field });
            }
            if value < 0.0 {
                return Err(BarError::Negative {
                    index,
                    field,
                    value,
                });
            }
        }
        if let Some(amount) = self.amount {
            if !amount.is_finite() {
                return Err(BarError::NonFinite {
                    index,
                    field: "amount",
                });
            }
            if amount < 0.0 {
                return Err(BarError::Negative {
                    index,
                    field: "amount",
                    value: amount,
                });
            }
        }
        if self.high < self.low {
            return Err(BarError::HighBelowLow {
                index,
                high: self.high,
                low: self.low,
            });
        }
        Ok(())
    }
}

/// Validate an instrument's full bar sequence.
///
/// Dates must be strictly ascending (which also rules out duplicates), every
/// price and volume must be finite and non-negative, and high must not sit
/// below low.
pub fn validate_bars(bars: &[PriceBar]) -> Result<(), BarError> {
    if bars.is_empty() {
        return Err(BarError::Empty);
    }
    for (index, bar) in bars.iter().enumerate() {
        bar.check(index)?;
        if index > 0 {
            let previous = bars[index - 1].date;
            if bar.date <= previous {
                return Err(BarError::NonMonotonicDate {
                    index,
                    previous,
                    date: bar.date,
                });
            }
        }
    }
    Ok(())
}
