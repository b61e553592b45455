//! TSA Configuration - operator-tunable TOML values
//!
//! Every struct implements `Default` with the values in `config::defaults`,
//! so a missing file or missing section behaves like the built-in setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use crate::acquisition::{DetectorKind, MarkerChannel};
use crate::processing::FrequencyDomainOptions;
use crate::types::AveragingMethod;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration of a TSA run.
///
/// Load with `TsaConfig::load()` which searches:
/// 1. `$TSA_CONFIG` env var
/// 2. `./tsa_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TsaConfig {
    /// Input interpretation
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Cycle-start detection
    #[serde(default)]
    pub markers: MarkerConfig,

    /// Averaging methods and tolerances
    #[serde(default)]
    pub averaging: AveragingConfig,

    /// Report output
    #[serde(default)]
    pub output: OutputConfig,
}

impl TsaConfig {
    /// Load configuration using the standard search order:
    /// 1. `$TSA_CONFIG` environment variable
    /// 2. `./tsa_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./tsa_config.toml
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", defaults::LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        // Two-pass: unknown keys only warn
        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Validate every section, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = super::validation::validate_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Spectral reconstruction options derived from `[averaging]`.
    pub const fn frequency_domain_options(&self) -> FrequencyDomainOptions {
        FrequencyDomainOptions {
            imaginary_tolerance: self.averaging.imaginary_tolerance,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Acquisition
// ============================================================================

/// How recordings are interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Sampling rate (Hz). Inferred from the time column when absent.
    #[serde(default)]
    pub sampling_rate_hz: Option<f64>,

    /// Channel the markers are detected on
    #[serde(default)]
    pub channel: MarkerChannel,
}

// ============================================================================
// Markers
// ============================================================================

/// Pulse detector selection and tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Detector used to find cycle starts
    #[serde(default)]
    pub detector: DetectorKind,

    /// Trough detector: minimum spacing between cycle starts (samples)
    #[serde(default = "default_min_distance")]
    pub min_distance_samples: usize,

    /// Trough detector: ignore troughs above this level
    #[serde(default)]
    pub max_height: Option<f64>,

    /// Threshold detector: crossing level
    #[serde(default = "default_threshold_level")]
    pub threshold_level: f64,

    /// Threshold detector: re-arm margin above the level
    #[serde(default = "default_hysteresis")]
    pub hysteresis: f64,
}

const fn default_min_distance() -> usize {
    defaults::MIN_MARKER_DISTANCE_SAMPLES
}
const fn default_threshold_level() -> f64 {
    defaults::THRESHOLD_LEVEL
}
const fn default_hysteresis() -> f64 {
    defaults::THRESHOLD_HYSTERESIS
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            detector: DetectorKind::default(),
            min_distance_samples: default_min_distance(),
            max_height: None,
            threshold_level: default_threshold_level(),
            hysteresis: default_hysteresis(),
        }
    }
}

// ============================================================================
// Averaging
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragingConfig {
    /// Methods to run, in report order
    #[serde(default = "default_methods")]
    pub methods: Vec<AveragingMethod>,

    /// Relative imaginary residue tolerated after spectral reconstruction
    #[serde(default = "default_imaginary_tolerance")]
    pub imaginary_tolerance: f64,
}

fn default_methods() -> Vec<AveragingMethod> {
    AveragingMethod::ALL.to_vec()
}
const fn default_imaginary_tolerance() -> f64 {
    defaults::IMAGINARY_TOLERANCE
}

impl Default for AveragingConfig {
    fn default() -> Self {
        Self {
            methods: default_methods(),
            imaginary_tolerance: default_imaginary_tolerance(),
        }
    }
}

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// `method,index,time,phase,value` rows
    #[default]
    Csv,
    /// Pretty-printed JSON report
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}' (expected 'csv' or 'json')")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}
