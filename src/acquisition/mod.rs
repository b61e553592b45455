//! Signal acquisition module
//!
//! Handles the collaborators around the averaging core: reading recorded
//! signals and finding the cycle-start markers in them.

pub mod csv_source;
pub mod pulse;

pub use csv_source::{CsvSignalSource, SignalRecording, SourceError};
pub use pulse::{ThresholdCrossingDetector, TroughDetector};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::MarkerConfig;

/// Produces cycle-start indices for a channel.
///
/// Implementations must return strictly increasing indices into `channel`.
pub trait PulseDetector: Send + Sync {
    fn detect(&self, channel: &[f64]) -> Vec<usize>;

    /// Short identifier used in logs and reports
    fn name(&self) -> &'static str;
}

/// Which pulse detector to build from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Local minima (cycle starts at the troughs of the channel)
    #[default]
    Trough,
    /// Falling crossings through a level
    Threshold,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trough => f.write_str("trough"),
            Self::Threshold => f.write_str("threshold"),
        }
    }
}

impl FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trough" | "troughs" | "minima" => Ok(Self::Trough),
            "threshold" | "crossing" | "tacho" => Ok(Self::Threshold),
            other => Err(format!(
                "unknown detector '{other}' (expected 'trough' or 'threshold')"
            )),
        }
    }
}

/// Channel of a recording the markers are detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerChannel {
    /// Tachometer / reference channel, falling back to the signal when absent
    #[default]
    Tacho,
    /// The measured signal itself
    Signal,
}

impl FromStr for MarkerChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tacho" | "reference" => Ok(Self::Tacho),
            "signal" => Ok(Self::Signal),
            other => Err(format!(
                "unknown marker channel '{other}' (expected 'tacho' or 'signal')"
            )),
        }
    }
}

/// Build the configured pulse detector.
pub fn detector_from_config(config: &MarkerConfig) -> Box<dyn PulseDetector> {
    match config.detector {
        DetectorKind::Trough => Box::new(TroughDetector {
            min_distance: config.min_distance_samples,
            max_height: config.max_height,
        }),
        DetectorKind::Threshold => Box::new(ThresholdCrossingDetector {
            level: config.threshold_level,
            hysteresis: config.hysteresis,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_from_config() {
        let mut config = MarkerConfig::default();
        assert_eq!(detector_from_config(&config).name(), "trough");

        config.detector = DetectorKind::Threshold;
        assert_eq!(detector_from_config(&config).name(), "threshold");
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!("Threshold".parse::<DetectorKind>(), Ok(DetectorKind::Threshold));
        assert_eq!("signal".parse::<MarkerChannel>(), Ok(MarkerChannel::Signal));
        assert!("peaks".parse::<DetectorKind>().is_err());
    }
}
