//! Core value types for time-synchronous averaging
//!
//! Everything in here is an immutable value: a sampled signal, the cycle
//! segments cut out of it, and the averaged cycle produced by either method.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::processing::TsaError;

// ============================================================================
// Sampled Signal
// ============================================================================

/// A uniformly sampled real signal together with its sample times.
///
/// Sample times are kept explicitly because the time-domain method measures
/// cycle durations from them; for a uniform acquisition they are `k / fs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledSignal {
    /// Sample values
    pub samples: Vec<f64>,
    /// Time of each sample (s), strictly increasing
    pub sample_times: Vec<f64>,
    /// Sampling rate (Hz)
    pub sampling_rate: f64,
}

impl SampledSignal {
    /// Build a signal whose sample times are `k / sampling_rate`.
    pub fn uniform(samples: Vec<f64>, sampling_rate: f64) -> Result<Self, TsaError> {
        check_sampling_rate(sampling_rate)?;
        let sample_times = (0..samples.len())
            .map(|k| k as f64 / sampling_rate)
            .collect();
        Ok(Self {
            samples,
            sample_times,
            sampling_rate,
        })
    }

    /// Build a signal from explicit sample times.
    ///
    /// Times must match the sample count, be finite and strictly increasing.
    pub fn with_times(
        samples: Vec<f64>,
        sample_times: Vec<f64>,
        sampling_rate: f64,
    ) -> Result<Self, TsaError> {
        check_sampling_rate(sampling_rate)?;
        if samples.len() != sample_times.len() {
            return Err(TsaError::LengthMismatch {
                signal: samples.len(),
                times: sample_times.len(),
            });
        }
        check_sample_times(&sample_times)?;
        Ok(Self {
            samples,
            sample_times,
            sampling_rate,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total duration covered by the sample times (s).
    pub fn duration(&self) -> f64 {
        match (self.sample_times.first(), self.sample_times.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

pub(crate) fn check_sampling_rate(sampling_rate: f64) -> Result<(), TsaError> {
    if sampling_rate.is_finite() && sampling_rate > 0.0 {
        Ok(())
    } else {
        Err(TsaError::InvalidSamplingRate(sampling_rate))
    }
}

/// Sample times must be finite and strictly increasing.
pub(crate) fn check_sample_times(times: &[f64]) -> Result<(), TsaError> {
    if let Some(index) = times.iter().position(|t| !t.is_finite()) {
        return Err(TsaError::NonFiniteTime { index });
    }
    if let Some(index) = first_non_increasing(times) {
        return Err(TsaError::NonMonotonicTime { index });
    }
    Ok(())
}

/// Index of the first time value that does not strictly exceed its predecessor.
pub(crate) fn first_non_increasing(times: &[f64]) -> Option<usize> {
    times
        .windows(2)
        .position(|w| !(w[1] > w[0]))
        .map(|i| i + 1)
}

// ============================================================================
// Cycle Segment
// ============================================================================

/// One rotation's worth of samples: `start..end` into the signal.
///
/// `end` is the next cycle's marker; the sample there belongs to the next
/// cycle but closes this one when interpolating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSegment {
    /// Position of the segment in marker order
    pub index: usize,
    /// First sample of the cycle (inclusive)
    pub start: usize,
    /// First sample of the next cycle (exclusive)
    pub end: usize,
}

impl CycleSegment {
    /// Number of samples that belong to this cycle.
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Time (s) at which the cycle closes.
    ///
    /// This is the sample time at `end`, or one cycle length past the start
    /// when the closing marker lies just beyond the last sample.
    pub fn end_time(&self, sample_times: &[f64], sampling_rate: f64) -> f64 {
        sample_times.get(self.end).copied().unwrap_or_else(|| {
            sample_times[self.start] + self.len() as f64 / sampling_rate
        })
    }

    /// Cycle duration (s) measured on the given sample times.
    pub fn duration(&self, sample_times: &[f64], sampling_rate: f64) -> f64 {
        self.end_time(sample_times, sampling_rate) - sample_times[self.start]
    }
}

// ============================================================================
// Averaging Method
// ============================================================================

/// Which TSA algorithm produced (or should produce) a waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AveragingMethod {
    /// PCHIP resampling onto a common grid, then arithmetic mean
    TimeDomain,
    /// Truncated spectra averaged bin-wise, then inverse transform
    FrequencyDomain,
}

impl AveragingMethod {
    pub const ALL: [Self; 2] = [Self::TimeDomain, Self::FrequencyDomain];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TimeDomain => "time_domain",
            Self::FrequencyDomain => "frequency_domain",
        }
    }
}

impl fmt::Display for AveragingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AveragingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "time" | "time_domain" | "time-domain" => Ok(Self::TimeDomain),
            "frequency" | "freq" | "fft" | "frequency_domain" | "frequency-domain" => {
                Ok(Self::FrequencyDomain)
            }
            other => Err(format!(
                "unknown averaging method '{other}' (expected 'time' or 'frequency')"
            )),
        }
    }
}

// ============================================================================
// Averaged Waveform
// ============================================================================

/// One representative cycle produced by a TSA method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragedWaveform {
    /// Method that produced the waveform
    pub method: AveragingMethod,
    /// Averaged cycle values
    pub values: Vec<f64>,
    /// Time axis paired with `values` (s)
    pub time_axis: Vec<f64>,
    /// Number of cycles that went into the average
    pub cycles_averaged: usize,
}

impl AveragedWaveform {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Time axis mapped onto cycle phase in `[0, 1)`.
    ///
    /// The axis is shifted to start at zero and divided by the cycle period,
    /// i.e. the axis span plus one axis step.
    pub fn normalized_phase(&self) -> Vec<f64> {
        let Some(&origin) = self.time_axis.first() else {
            return Vec::new();
        };
        if self.time_axis.len() == 1 {
            return vec![0.0];
        }

        let span = self.time_axis[self.time_axis.len() - 1] - origin;
        let step = span / (self.time_axis.len() - 1) as f64;
        let period = span + step;
        if period <= 0.0 {
            return vec![0.0; self.time_axis.len()];
        }

        self.time_axis.iter().map(|t| (t - origin) / period).collect()
    }

    /// Max minus min of the averaged cycle.
    pub fn peak_to_peak(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let max = self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = self.values.iter().copied().fold(f64::INFINITY, f64::min);
        max - min
    }

    /// Root mean square of the averaged cycle.
    pub fn rms(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let sum_squares: f64 = self.values.iter().map(|v| v * v).sum();
        (sum_squares / self.values.len() as f64).sqrt()
    }
}
