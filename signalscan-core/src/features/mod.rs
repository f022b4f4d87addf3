//! Per-day feature evaluation.

pub mod core;
pub mod pattern;
pub mod supplemental;

pub use self::core::{evaluate_core, macd_score, FeatureEvaluation};
pub use pattern::{ClassicPatterns, NoPattern, PatternDetector, PatternKind};
pub use supplemental::{evaluate_supplemental, SupplementalEvaluation};
