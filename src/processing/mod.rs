//! Signal processing module - time-synchronous averaging
//!
//! Two independent averagers share the same cycle segmentation:
//!
//! - [`average_time_domain`]: PCHIP resampling of every cycle onto a common
//!   grid followed by an arithmetic mean
//! - [`average_frequency_domain`]: truncated per-cycle spectra averaged
//!   bin-wise and brought back with a Hermitian inverse transform
//!
//! Both are pure functions of their inputs and never log errors; failures are
//! returned to the caller as [`TsaError`].

mod frequency_domain;
mod pchip;
mod segmenter;
mod time_domain;

pub use frequency_domain::{
    average_frequency_domain, average_frequency_domain_with, FrequencyDomainOptions,
    DEFAULT_IMAGINARY_TOLERANCE,
};
pub use pchip::{InterpolationError, Pchip};
pub use segmenter::{segment_cycles, validate_markers};
pub use time_domain::average_time_domain;

use thiserror::Error;

use crate::types::{AveragedWaveform, AveragingMethod, SampledSignal};

/// Errors in time-synchronous averaging
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TsaError {
    #[error("Insufficient markers: need at least 2 to define a cycle, have {count}")]
    InsufficientMarkers { count: usize },

    #[error("Invalid marker at position {position} (index {index}): {reason}")]
    InvalidMarker {
        position: usize,
        index: usize,
        reason: String,
    },

    #[error("Degenerate segment {segment}: {len} sample(s), need at least 2 to interpolate")]
    DegenerateSegment { segment: usize, len: usize },

    #[error("Insufficient spectral resolution: shortest cycle gives {bins} bin(s)")]
    InsufficientResolution { bins: i64 },

    #[error("Spectral reconstruction left imaginary residue {residue:.3e} (tolerance {tolerance:.3e})")]
    Reconstruction { residue: f64, tolerance: f64 },

    #[error("Invalid sampling rate: {0}")]
    InvalidSamplingRate(f64),

    #[error("Signal has {signal} samples but {times} sample times")]
    LengthMismatch { signal: usize, times: usize },

    #[error("Sample times are not strictly increasing at index {index}")]
    NonMonotonicTime { index: usize },

    #[error("Sample time at index {index} is not finite")]
    NonFiniteTime { index: usize },

    #[error("Common grid length {value} cannot be allocated")]
    InvalidGridLength { value: f64 },

    #[error("Common grid of {grid_len} points is shorter than segment {segment} ({samples} samples); sample times disagree with the sampling rate")]
    GridShorterThanSegment {
        segment: usize,
        samples: usize,
        grid_len: usize,
    },

    #[error("Segment {segment} resampled to {actual} points, expected {expected}")]
    SegmentLengthMismatch {
        segment: usize,
        expected: usize,
        actual: usize,
    },
}

/// Run one averaging method on a sampled signal.
///
/// Thin wrapper over the two free functions that packages the result as an
/// [`AveragedWaveform`].
pub fn average(
    signal: &SampledSignal,
    markers: &[usize],
    method: AveragingMethod,
    options: &FrequencyDomainOptions,
) -> Result<AveragedWaveform, TsaError> {
    let (values, time_axis) = match method {
        AveragingMethod::TimeDomain => average_time_domain(
            &signal.samples,
            &signal.sample_times,
            markers,
            signal.sampling_rate,
        )?,
        AveragingMethod::FrequencyDomain => average_frequency_domain_with(
            &signal.samples,
            markers,
            signal.sampling_rate,
            options,
        )?,
    };

    Ok(AveragedWaveform {
        method,
        values,
        time_axis,
        cycles_averaged: markers.len() - 1,
    })
}
