use crate::layout::{Layout, Relocation};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use visamatch_core::{ClassifyRule, DetectorConfig, FaceSelection, Strategy};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Pipeline configuration.
///
/// Built from defaults, then an optional TOML file, then `VISAMATCH_*`
/// environment variables. Relative directories resolve against `root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base directory for the role directories (default: current directory).
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub visa_dir: PathBuf,
    pub personal_dir: PathBuf,
    pub people_dir: PathBuf,
    pub unmatched_dir: PathBuf,
    /// Receives images whose embedding could not be extracted.
    pub unprocessable_dir: PathBuf,
    pub size_ratio_threshold: f32,
    pub y_ratio_threshold: f32,
    /// Cosine distance cutoff; unset means the strategy's own default.
    pub match_threshold: Option<f32>,
    pub strategy: Strategy,
    /// Unset means move for global-greedy and copy for best-available.
    pub relocation: Option<Relocation>,
    pub face_selection: FaceSelection,
    /// Fail embedding when no face is found instead of embedding the whole image.
    pub enforce_detection: bool,
    pub detector_scale_factor: f32,
    pub detector_min_neighbors: usize,
    pub detector_confidence: f32,
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let rule = ClassifyRule::default();
        let detector = DetectorConfig::default();
        Self {
            root: PathBuf::from("."),
            source_dir: PathBuf::from("passports"),
            visa_dir: PathBuf::from("visa"),
            personal_dir: PathBuf::from("personal"),
            people_dir: PathBuf::from("people"),
            unmatched_dir: PathBuf::from("unmatched"),
            unprocessable_dir: PathBuf::from("unprocessable"),
            size_ratio_threshold: rule.size_ratio_threshold,
            y_ratio_threshold: rule.y_ratio_threshold,
            match_threshold: None,
            strategy: Strategy::default(),
            relocation: None,
            face_selection: rule.selection,
            enforce_detection: false,
            detector_scale_factor: detector.scale_factor,
            detector_min_neighbors: detector.min_neighbors,
            detector_confidence: detector.confidence_threshold,
            model_dir: default_model_dir(),
        }
    }
}

impl Config {
    /// Defaults, overlaid with `path` when given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `VISAMATCH_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = lookup("VISAMATCH_ROOT") {
            self.root = PathBuf::from(v);
        }
        if let Some(v) = lookup("VISAMATCH_MODEL_DIR") {
            self.model_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("VISAMATCH_STRATEGY") {
            self.strategy = parse_strategy(&v)?;
        }
        if let Some(v) = lookup("VISAMATCH_MATCH_THRESHOLD") {
            self.match_threshold = Some(parse_env("VISAMATCH_MATCH_THRESHOLD", &v)?);
        }
        if let Some(v) = lookup("VISAMATCH_SIZE_RATIO_THRESHOLD") {
            self.size_ratio_threshold = parse_env("VISAMATCH_SIZE_RATIO_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("VISAMATCH_Y_RATIO_THRESHOLD") {
            self.y_ratio_threshold = parse_env("VISAMATCH_Y_RATIO_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("VISAMATCH_ENFORCE_DETECTION") {
            self.enforce_detection = parse_bool("VISAMATCH_ENFORCE_DETECTION", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("size_ratio_threshold", self.size_ratio_threshold),
            ("y_ratio_threshold", self.y_ratio_threshold),
            ("match_threshold", self.match_threshold()),
            ("detector_confidence", self.detector_confidence),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }
        if self.detector_scale_factor.is_nan() || self.detector_scale_factor < 1.0 {
            return Err(ConfigError::Invalid {
                key: "detector_scale_factor",
                reason: format!("must be at least 1.0, got {}", self.detector_scale_factor),
            });
        }

        let layout = self.layout();
        let dirs = [
            &layout.source,
            &layout.visa,
            &layout.personal,
            &layout.people,
            &layout.unmatched,
            &layout.unprocessable,
        ];
        for (i, a) in dirs.iter().enumerate() {
            if dirs[i + 1..].contains(a) {
                return Err(ConfigError::Invalid {
                    key: "directories",
                    reason: format!("{} is used for more than one role", a.display()),
                });
            }
        }
        Ok(())
    }

    /// Configured threshold or the strategy default.
    pub fn match_threshold(&self) -> f32 {
        self.match_threshold
            .unwrap_or_else(|| self.strategy.default_threshold())
    }

    /// Configured relocation or the strategy default.
    pub fn relocation(&self) -> Relocation {
        self.relocation.unwrap_or(match self.strategy {
            Strategy::GlobalGreedy => Relocation::Move,
            Strategy::BestAvailable => Relocation::Copy,
        })
    }

    pub fn layout(&self) -> Layout {
        let resolve = |p: &Path| self.root.join(p);
        Layout {
            source: resolve(&self.source_dir),
            visa: resolve(&self.visa_dir),
            personal: resolve(&self.personal_dir),
            people: resolve(&self.people_dir),
            unmatched: resolve(&self.unmatched_dir),
            unprocessable: resolve(&self.unprocessable_dir),
        }
    }

    pub fn classify_rule(&self) -> ClassifyRule {
        ClassifyRule {
            size_ratio_threshold: self.size_ratio_threshold,
            y_ratio_threshold: self.y_ratio_threshold,
            selection: self.face_selection,
        }
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            confidence_threshold: self.detector_confidence,
            scale_factor: self.detector_scale_factor,
            min_neighbors: self.detector_min_neighbors,
            ..DetectorConfig::default()
        }
    }

    /// Path to the SCRFD detection model.
    pub fn detector_model_path(&self) -> PathBuf {
        self.model_dir.join(visamatch_core::DETECTOR_MODEL_FILE)
    }

    /// Path to the ArcFace recognition model.
    pub fn recognizer_model_path(&self) -> PathBuf {
        self.model_dir.join(visamatch_core::RECOGNIZER_MODEL_FILE)
    }
}

/// `$VISAMATCH_MODEL_DIR`, else `$XDG_DATA_HOME/visamatch/models`, else
/// `~/.local/share/visamatch/models`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("VISAMATCH_MODEL_DIR") {
        return PathBuf::from(dir);
    }
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("visamatch")
        .join("models")
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        reason: format!("cannot parse {value:?}"),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("expected true/false or 1/0, got {other:?}"),
        }),
    }
}

fn parse_strategy(value: &str) -> Result<Strategy, ConfigError> {
    match value.trim() {
        "global-greedy" => Ok(Strategy::GlobalGreedy),
        "best-available" => Ok(Strategy::BestAvailable),
        other => Err(ConfigError::Invalid {
            key: "VISAMATCH_STRATEGY",
            reason: format!("unknown strategy {other:?} (expected global-greedy or best-available)"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.size_ratio_threshold, 0.08);
        assert_eq!(config.y_ratio_threshold, 0.35);
        assert_eq!(config.match_threshold(), 0.25);
        assert_eq!(config.detector_scale_factor, 1.1);
        assert_eq!(config.detector_min_neighbors, 0);
        assert_eq!(config.relocation(), Relocation::Move);
        assert_eq!(config.face_selection, FaceSelection::First);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_best_available_defaults() {
        let config = Config {
            strategy: Strategy::BestAvailable,
            ..Config::default()
        };
        assert_eq!(config.match_threshold(), 0.5);
        assert_eq!(config.relocation(), Relocation::Copy);
    }

    #[test]
    fn test_explicit_values_override_strategy_defaults() {
        let config = Config {
            strategy: Strategy::BestAvailable,
            match_threshold: Some(0.3),
            relocation: Some(Relocation::Move),
            ..Config::default()
        };
        assert_eq!(config.match_threshold(), 0.3);
        assert_eq!(config.relocation(), Relocation::Move);
    }

    #[test]
    fn test_toml_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visamatch.toml");
        std::fs::write(
            &path,
            r#"
root = "/data/batch"
source_dir = "scans"
strategy = "best-available"
face_selection = "largest"
match_threshold = 0.4
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.strategy, Strategy::BestAvailable);
        assert_eq!(config.face_selection, FaceSelection::Largest);
        assert_eq!(config.match_threshold(), 0.4);
        assert_eq!(config.y_ratio_threshold, 0.35);
        let layout = config.layout();
        assert_eq!(layout.source, PathBuf::from("/data/batch/scans"));
        assert_eq!(layout.visa, PathBuf::from("/data/batch/visa"));
    }

    #[test]
    fn test_toml_unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "treshold = 0.3\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file(Path::new("/nonexistent/visamatch.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("VISAMATCH_ROOT", "/srv/scans"),
                ("VISAMATCH_STRATEGY", "best-available"),
                ("VISAMATCH_MATCH_THRESHOLD", "0.2"),
                ("VISAMATCH_ENFORCE_DETECTION", "1"),
            ]))
            .unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/scans"));
        assert_eq!(config.strategy, Strategy::BestAvailable);
        assert_eq!(config.match_threshold(), 0.2);
        assert!(config.enforce_detection);
    }

    #[test]
    fn test_env_enforce_detection_parses_booleans() {
        for (value, expected) in [("1", true), ("true", true), ("TRUE", true), ("0", false), ("false", false), ("off", false)] {
            let mut config = Config {
                enforce_detection: !expected,
                ..Config::default()
            };
            config
                .apply_env(env(&[("VISAMATCH_ENFORCE_DETECTION", value)]))
                .unwrap();
            assert_eq!(config.enforce_detection, expected, "{value}");
        }

        let mut config = Config::default();
        let err = config.apply_env(env(&[("VISAMATCH_ENFORCE_DETECTION", "maybe")]));
        assert!(matches!(err, Err(ConfigError::Invalid { key: "VISAMATCH_ENFORCE_DETECTION", .. })));
    }

    #[test]
    fn test_env_bad_number() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[("VISAMATCH_MATCH_THRESHOLD", "tight")]));
        assert!(matches!(err, Err(ConfigError::Invalid { key: "VISAMATCH_MATCH_THRESHOLD", .. })));
    }

    #[test]
    fn test_env_bad_strategy() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("VISAMATCH_STRATEGY", "optimal")])).is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_threshold() {
        let config = Config {
            match_threshold: Some(0.0),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { key: "match_threshold", .. })));
    }

    #[test]
    fn test_validate_rejects_small_scale_factor() {
        let config = Config {
            detector_scale_factor: 0.9,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shared_directories() {
        let config = Config {
            visa_dir: PathBuf::from("personal"),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { key: "directories", .. })));
    }

    #[test]
    fn test_toml_roundtrip_of_effective_config() {
        let config = Config {
            match_threshold: Some(0.3),
            ..Config::default()
        };
        let text = toml::to_string(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_detector_config_mapping() {
        let config = Config {
            detector_min_neighbors: 2,
            detector_confidence: 0.6,
            ..Config::default()
        };
        let d = config.detector_config();
        assert_eq!(d.min_neighbors, 2);
        assert_eq!(d.confidence_threshold, 0.6);
        assert_eq!(d.nms_threshold, DetectorConfig::default().nms_threshold);
    }
}
