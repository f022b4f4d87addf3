//! Domain types for SignalScan

pub mod bar;
pub mod instrument;

pub use bar::{validate_bars, BarError, PriceBar};
pub use instrument::{Board, Instrument};
