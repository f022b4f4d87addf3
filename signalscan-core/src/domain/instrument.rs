//! Instrument metadata and exchange-board classification.

use serde::{Deserialize, Serialize};

/// Exchange segment. Determines the daily price-change limit used by the
/// consecutive limit-up risk rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Board {
    /// Shanghai/Shenzhen main boards: ±10%.
    Main,
    /// ChiNext (300/301) and STAR (688/689): ±20%.
    Growth,
    /// Beijing Stock Exchange: ±30%.
    Beijing,
}

impl Board {
    /// Classify a code such as `sh.600000`, `sz.300750`, `bj.430047` or a
    /// bare `688981`. Unrecognized codes fall back to the main board.
    pub fn from_code(code: &str) -> Self {
        let lower = code.to_ascii_lowercase();
        let (exchange, digits) = match lower.split_once('.') {
            Some((prefix, rest)) => (prefix.to_string(), rest.to_string()),
            None => (String::new(), lower.clone()),
        };

        if exchange == "bj" {
            return Board::Beijing;
        }
        if digits.starts_with("300")
            || digits.starts_with("301")
            || digits.starts_with("688")
            || digits.starts_with("689")
        {
            return Board::Growth;
        }
        if exchange.is_empty()
            && digits.len() == 6
            && (digits.starts_with('4') || digits.starts_with('8') || digits.starts_with("92"))
        {
            return Board::Beijing;
        }
        Board::Main
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Board::Main => "main",
            Board::Growth => "growth",
            Board::Beijing => "beijing",
        }
    }

    /// Daily price-change limit in percent.
    pub fn daily_limit_pct(self) -> f64 {
        match self {
            Board::Main => 10.0,
            Board::Growth => 20.0,
            Board::Beijing => 30.0,
        }
    }
}

/// One tradable instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    /// Provider code, e.g. `sh.600000`.
    pub symbol: String,
    /// Display name; may be empty.
    pub name: String,
    pub board: Board,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        let symbol = symbol.into();
        let board = Board::from_code(&symbol);
        Self {
            symbol,
            name: name.into(),
            board,
        }
    }
}
