//! TSA Engine: Time-Synchronous Averaging for rotating machinery
//!
//! Extracts the periodic component of a vibration signal by averaging it
//! over rotation cycles whose starts are marked by a reference (tacho) channel.
//!
//! ## Architecture
//!
//! - **Processing**: cycle segmentation and the two averagers
//!   (PCHIP time-domain resampling, truncated-spectrum frequency domain)
//! - **Acquisition**: CSV recordings and pulse detectors producing markers
//! - **Config**: TOML run configuration with validation
//! - **Report**: JSON / CSV output of the averaged cycles
//! - **Simulation**: synthetic decelerating fan signal for testing

pub mod acquisition;
pub mod config;
pub mod processing;
pub mod report;
pub mod simulation;
pub mod types;

// Re-export the averaging entry points
pub use processing::{average, average_frequency_domain, average_time_domain, TsaError};

// Re-export commonly used types
pub use types::{AveragedWaveform, AveragingMethod, CycleSegment, SampledSignal};

pub use acquisition::{CsvSignalSource, PulseDetector, SignalRecording};
pub use config::TsaConfig;
pub use report::TsaReport;
