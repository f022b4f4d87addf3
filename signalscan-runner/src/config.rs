//! Run configuration loading.
//!
//! The effective [`ScanConfig`] is built in three layers, then validated:
//! 1. TOML file (or defaults when no file is given)
//! 2. JSON tuning overlay written by an external tuner
//! 3. CLI overrides
//!
//! The result is immutable for the rest of the run.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use signalscan_core::config::{ConfigError, FilterMode, ScanConfig};

/// Overlay keys the tuner writes that belong to downstream consumers.
/// They are accepted and ignored.
const DOWNSTREAM_KEYS: [&str; 5] = [
    "MIN_ENHANCED_SCORE",
    "MIN_RATING",
    "SIGNAL_LOOKBACK_DAYS",
    "last_updated",
    "update_count",
];

/// Errors from parsing or applying a tuning overlay.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("overlay is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("overlay must be a JSON object")]
    NotAnObject,
    #[error("unknown overlay key '{0}'")]
    UnknownKey(String),
    #[error("overlay key '{key}' expects {expected}, got {value}")]
    InvalidValue {
        key: String,
        expected: &'static str,
        value: Value,
    },
    #[error("overlay key 'FILTER_MODE': {0}")]
    Mode(ConfigError),
}

/// Errors from building the effective configuration. All are fatal.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("overlay {path}: {source}")]
    Overlay {
        path: PathBuf,
        #[source]
        source: OverlayError,
    },
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

/// A tuning overlay keyed by uppercase parameter names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TuningOverlay {
    entries: Map<String, Value>,
}

impl TuningOverlay {
    pub fn from_json(json: &str) -> Result<Self, OverlayError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(entries) => Ok(Self { entries }),
            _ => Err(OverlayError::NotAnObject),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge the overlay into `config`, returning the keys that changed it.
    ///
    /// Unknown keys are rejected before anything is applied.
    pub fn apply(&self, config: &mut ScanConfig) -> Result<Vec<String>, OverlayError> {
        if let Some(key) = self
            .entries
            .keys()
            .find(|k| !is_tunable(k) && !DOWNSTREAM_KEYS.contains(&k.as_str()))
        {
            return Err(OverlayError::UnknownKey(key.clone()));
        }

        let mut merged = config.clone();
        let mut applied = Vec::new();
        for (key, value) in &self.entries {
            if !is_tunable(key) {
                continue;
            }
            apply_key(&mut merged, key, value)?;
            applied.push(key.clone());
        }
        *config = merged;
        Ok(applied)
    }
}

const TUNABLE_KEYS: [&str; 7] = [
    "FILTER_MODE",
    "VOLUME_RATIO_THRESHOLD",
    "MACD_SCORE_THRESHOLD",
    "MA_DISTANCE_THRESHOLD",
    "FUTURE_DAYS",
    "MIN_FUTURE_RETURN",
    "ENABLE_BACKTEST",
];

fn is_tunable(key: &str) -> bool {
    TUNABLE_KEYS.contains(&key)
}

fn apply_key(config: &mut ScanConfig, key: &str, value: &Value) -> Result<(), OverlayError> {
    let invalid = |expected| OverlayError::InvalidValue {
        key: key.to_string(),
        expected,
        value: value.clone(),
    };

    match key {
        "FILTER_MODE" => {
            let mode = value.as_str().ok_or_else(|| invalid("a string"))?;
            config.filter_mode = mode.parse().map_err(OverlayError::Mode)?;
        }
        "VOLUME_RATIO_THRESHOLD" => {
            config.thresholds.volume_ratio_threshold =
                value.as_f64().ok_or_else(|| invalid("a number"))?;
        }
        "MACD_SCORE_THRESHOLD" => {
            config.thresholds.macd_score_threshold =
                value.as_f64().ok_or_else(|| invalid("a number"))?;
        }
        "MA_DISTANCE_THRESHOLD" => {
            config.thresholds.ma_distance_threshold =
                value.as_f64().ok_or_else(|| invalid("a number"))?;
        }
        "FUTURE_DAYS" => {
            let days = value
                .as_u64()
                .ok_or_else(|| invalid("a non-negative integer"))?;
            config.backtest.future_days =
                usize::try_from(days).map_err(|_| invalid("a non-negative integer"))?;
        }
        "MIN_FUTURE_RETURN" => {
            config.backtest.min_future_return =
                value.as_f64().ok_or_else(|| invalid("a number"))?;
        }
        "ENABLE_BACKTEST" => {
            config.backtest.enabled = value.as_bool().ok_or_else(|| invalid("a boolean"))?;
        }
        other => return Err(OverlayError::UnknownKey(other.to_string())),
    }
    Ok(())
}

/// Command-line overrides, applied after the overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub mode: Option<FilterMode>,
    pub backtest: Option<bool>,
}

impl CliOverrides {
    pub fn apply(&self, config: &mut ScanConfig) {
        if let Some(mode) = self.mode {
            config.filter_mode = mode;
        }
        if let Some(enabled) = self.backtest {
            config.backtest.enabled = enabled;
        }
    }
}

/// Parse a TOML document. Missing sections and fields take their defaults;
/// unknown keys are rejected.
pub fn parse_toml(text: &str) -> Result<ScanConfig, toml::de::Error> {
    toml::from_str(text)
}

/// Build and validate the effective configuration.
pub fn load_config(
    config_path: Option<&Path>,
    overlay_path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<ScanConfig, ConfigLoadError> {
    let mut config = match config_path {
        Some(path) => {
            let text = read(path)?;
            parse_toml(&text).map_err(|source| ConfigLoadError::Toml {
                path: path.to_path_buf(),
                source,
            })?
        }
        None => ScanConfig::default(),
    };

    if let Some(path) = overlay_path {
        let overlay_err = |source: OverlayError| ConfigLoadError::Overlay {
            path: path.to_path_buf(),
            source,
        };
        let overlay = TuningOverlay::from_json(&read(path)?).map_err(overlay_err)?;
        let applied = overlay.apply(&mut config).map_err(overlay_err)?;
        tracing::info!(path = %path.display(), keys = ?applied, "tuning overlay applied");
    }

    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn read(path: &Path) -> Result<String, ConfigLoadError> {
    std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_files_gives_defaults() {
        let config = load_config(None, None, &CliOverrides::default()).unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = parse_toml(
            r#"
            filter_mode = "strict"

            [thresholds]
            volume_ratio_threshold = 1.8

            [backtest]
            enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(config.filter_mode, FilterMode::Strict);
        assert_eq!(config.thresholds.volume_ratio_threshold, 1.8);
        assert_eq!(config.thresholds.macd_score_threshold, 50.0);
        assert!(config.backtest.enabled);
        assert_eq!(config.backtest.future_days, 5);
    }

    #[test]
    fn misspelled_toml_key_is_rejected() {
        let err = parse_toml("[thresholds]\nvolume_ratio_treshold = 3.0\n").unwrap_err();
        assert!(err.to_string().contains("volume_ratio_treshold"));
        assert!(parse_toml("filter_mod = \"strict\"\n").is_err());
    }

    #[test]
    fn toml_filter_mode_is_case_insensitive() {
        let config = parse_toml("filter_mode = \"STRICT\"\n").unwrap();
        assert_eq!(config.filter_mode, FilterMode::Strict);
    }

    #[test]
    fn misspelled_key_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.toml");
        std::fs::write(&path, "[backtest]\nenable = true\n").unwrap();
        let err = load_config(Some(&path), None, &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Toml { .. }));
    }

    #[test]
    fn overlay_updates_known_keys_and_ignores_downstream_ones() {
        let overlay = TuningOverlay::from_json(
            r#"{
                "FILTER_MODE": "loose",
                "VOLUME_RATIO_THRESHOLD": 1.6,
                "FUTURE_DAYS": 10,
                "ENABLE_BACKTEST": true,
                "MIN_ENHANCED_SCORE": 25,
                "last_updated": "2024-05-01"
            }"#,
        )
        .unwrap();
        let mut config = ScanConfig::default();
        let mut applied = overlay.apply(&mut config).unwrap();
        applied.sort();

        assert_eq!(
            applied,
            vec![
                "ENABLE_BACKTEST",
                "FILTER_MODE",
                "FUTURE_DAYS",
                "VOLUME_RATIO_THRESHOLD"
            ]
        );
        assert_eq!(config.filter_mode, FilterMode::Loose);
        assert_eq!(config.thresholds.volume_ratio_threshold, 1.6);
        assert_eq!(config.backtest.future_days, 10);
        assert!(config.backtest.enabled);
    }

    #[test]
    fn unknown_overlay_key_leaves_config_untouched() {
        let overlay =
            TuningOverlay::from_json(r#"{"FILTER_MODE": "strict", "MAGIC_NUMBER": 3}"#).unwrap();
        let mut config = ScanConfig::default();
        let err = overlay.apply(&mut config).unwrap_err();
        assert!(matches!(err, OverlayError::UnknownKey(k) if k == "MAGIC_NUMBER"));
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn overlay_type_mismatch_is_rejected() {
        let overlay = TuningOverlay::from_json(r#"{"ENABLE_BACKTEST": "yes"}"#).unwrap();
        let err = overlay.apply(&mut ScanConfig::default()).unwrap_err();
        assert!(matches!(err, OverlayError::InvalidValue { expected: "a boolean", .. }));

        let overlay = TuningOverlay::from_json(r#"{"FUTURE_DAYS": -1}"#).unwrap();
        assert!(overlay.apply(&mut ScanConfig::default()).is_err());
    }

    #[test]
    fn overlay_unknown_mode_is_rejected() {
        let overlay = TuningOverlay::from_json(r#"{"FILTER_MODE": "aggressive"}"#).unwrap();
        let err = overlay.apply(&mut ScanConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            OverlayError::Mode(ConfigError::UnknownMode(_))
        ));
    }

    #[test]
    fn overlay_must_be_an_object() {
        assert!(matches!(
            TuningOverlay::from_json("[1, 2]"),
            Err(OverlayError::NotAnObject)
        ));
        assert!(matches!(
            TuningOverlay::from_json("{"),
            Err(OverlayError::Parse(_))
        ));
    }

    #[test]
    fn cli_overrides_win_over_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let overlay_path = dir.path().join("optimized.json");
        std::fs::write(&overlay_path, r#"{"FILTER_MODE": "loose"}"#).unwrap();

        let overrides = CliOverrides {
            mode: Some(FilterMode::Strict),
            backtest: Some(true),
        };
        let config = load_config(None, Some(&overlay_path), &overrides).unwrap();
        assert_eq!(config.filter_mode, FilterMode::Strict);
        assert!(config.backtest.enabled);
    }

    #[test]
    fn out_of_range_threshold_fails_after_merge() {
        let dir = tempfile::tempdir().unwrap();
        let overlay_path = dir.path().join("optimized.json");
        std::fs::write(&overlay_path, r#"{"MACD_SCORE_THRESHOLD": 150}"#).unwrap();

        let err = load_config(None, Some(&overlay_path), &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Invalid(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn unknown_mode_in_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.toml");
        std::fs::write(&path, "filter_mode = \"turbo\"\n").unwrap();
        let err = load_config(Some(&path), None, &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Toml { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(
            Some(Path::new("/nonexistent/scan.toml")),
            None,
            &CliOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigLoadError::Io { .. }));
    }
}
