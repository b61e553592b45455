//! Frequency-domain TSA using rustfft
//!
//! Each cycle is transformed on its own length, normalized, truncated to the
//! bin count the shortest cycle supports and averaged bin-wise. The averaged
//! spectrum is mirrored into a Hermitian spectrum of length `2 * nF` and
//! brought back with an inverse transform.
//!
//! # Example
//!
//! ```ignore
//! use tsa_engine::processing::average_frequency_domain;
//!
//! let (cycle, time_axis) = average_frequency_domain(&samples, &markers, 1000.0)?;
//! assert_eq!(cycle.len(), time_axis.len());
//! ```

use num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::check_sampling_rate;

use super::segmenter::segment_cycles;
use super::TsaError;

/// Largest imaginary residue accepted after the inverse transform, relative
/// to the largest real magnitude (floored at 1.0).
pub const DEFAULT_IMAGINARY_TOLERANCE: f64 = 1e-9;

/// Tuning for [`average_frequency_domain_with`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyDomainOptions {
    /// Relative tolerance on the imaginary part of the reconstructed cycle
    pub imaginary_tolerance: f64,
}

impl Default for FrequencyDomainOptions {
    fn default() -> Self {
        Self {
            imaginary_tolerance: DEFAULT_IMAGINARY_TOLERANCE,
        }
    }
}

/// Average the cycles of `signal` in the frequency domain.
///
/// Returns the averaged cycle and its time axis `[0, 1/fs, 2/fs, ...]`, both of
/// length `2 * (shortest cycle length - 1)`.
pub fn average_frequency_domain(
    signal: &[f64],
    markers: &[usize],
    sampling_rate: f64,
) -> Result<(Vec<f64>, Vec<f64>), TsaError> {
    average_frequency_domain_with(
        signal,
        markers,
        sampling_rate,
        &FrequencyDomainOptions::default(),
    )
}

/// [`average_frequency_domain`] with an explicit reconstruction tolerance.
pub fn average_frequency_domain_with(
    signal: &[f64],
    markers: &[usize],
    sampling_rate: f64,
    options: &FrequencyDomainOptions,
) -> Result<(Vec<f64>, Vec<f64>), TsaError> {
    check_sampling_rate(sampling_rate)?;
    let segments = segment_cycles(markers, signal.len())?;

    let shortest = segments.iter().map(|s| s.len()).min().unwrap_or(0);
    let bins = shortest as i64 - 1;
    if bins <= 0 {
        return Err(TsaError::InsufficientResolution { bins });
    }
    let n_bins = shortest - 1;

    debug!(
        segments = segments.len(),
        bins = n_bins,
        output_len = 2 * n_bins,
        "Frequency-domain averaging"
    );

    let mut planner = FftPlanner::<f64>::new();
    let mut accumulator = vec![Complex::new(0.0, 0.0); n_bins];

    for segment in &segments {
        let mut buffer: Vec<Complex<f64>> = signal[segment.start..segment.end]
            .iter()
            .map(|&x| Complex::new(x, 0.0))
            .collect();

        let fft = planner.plan_fft_forward(buffer.len());
        fft.process(&mut buffer);

        if buffer.len() < n_bins {
            return Err(TsaError::SegmentLengthMismatch {
                segment: segment.index,
                expected: n_bins,
                actual: buffer.len(),
            });
        }

        // Amplitude-normalize by the cycle length, then rescale for the
        // one-sided truncated spectrum
        let scale = (2 * n_bins) as f64 / buffer.len() as f64;
        for (acc, bin) in accumulator.iter_mut().zip(&buffer[..n_bins]) {
            *acc += bin * scale;
        }
    }

    let count = segments.len() as f64;
    accumulator.iter_mut().for_each(|bin| *bin /= count);

    let values = hermitian_inverse(&mut planner, &accumulator, options.imaginary_tolerance)?;
    let time_axis = (0..values.len())
        .map(|k| k as f64 / sampling_rate)
        .collect();

    Ok((values, time_axis))
}

/// Mirror `spectrum` into a conjugate-symmetric spectrum and inverse transform it.
///
/// Layout: `[X[0..nF], 0, conj(X[nF-1]), ..., conj(X[1])]`. The zero bin takes
/// the Nyquist slot.
fn hermitian_inverse(
    planner: &mut FftPlanner<f64>,
    spectrum: &[Complex<f64>],
    tolerance: f64,
) -> Result<Vec<f64>, TsaError> {
    let n_bins = spectrum.len();
    let full_len = 2 * n_bins;

    let mut full = Vec::with_capacity(full_len);
    full.extend_from_slice(spectrum);
    full.push(Complex::new(0.0, 0.0));
    full.extend(spectrum[1..].iter().rev().map(Complex::conj));
    debug_assert_eq!(full.len(), full_len);

    let ifft = planner.plan_fft_inverse(full_len);
    ifft.process(&mut full);

    // rustfft leaves the inverse unnormalized
    let norm = full_len as f64;
    let residue = full.iter().map(|c| (c.im / norm).abs()).fold(0.0, f64::max);
    let magnitude = full.iter().map(|c| (c.re / norm).abs()).fold(1.0, f64::max);
    let allowed = tolerance * magnitude;

    if residue > allowed {
        return Err(TsaError::Reconstruction {
            residue,
            tolerance: allowed,
        });
    }

    Ok(full.iter().map(|c| c.re / norm).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn cycle(len: usize, amplitude: f64, offset: f64) -> Vec<f64> {
        (0..len)
            .map(|n| offset + amplitude * (2.0 * PI * n as f64 / len as f64 + 0.3).cos())
            .collect()
    }

    #[test]
    fn test_output_length_follows_shortest_cycle() {
        let mut signal = cycle(100, 1.0, 0.0);
        signal.extend(cycle(150, 1.0, 0.0));
        assert_eq!(signal.len(), 250);

        let (waveform, axis) = average_frequency_domain(&signal, &[0, 100, 250], 1000.0).unwrap();
        assert_eq!(waveform.len(), 198);
        assert_eq!(axis.len(), 198);
        assert!((axis[1] - 0.001).abs() < 1e-15);
        assert!((axis[197] - 0.197).abs() < 1e-12);
    }

    #[test]
    fn test_fundamental_reconstructs_at_cycle_phase() {
        // Two cycles of different length and amplitude: averaged amplitude is the mean
        let mut signal = cycle(60, 1.0, 0.5);
        signal.extend(cycle(80, 3.0, 0.5));

        let (waveform, _) = average_frequency_domain(&signal, &[0, 60, 140], 100.0).unwrap();
        let len = waveform.len();
        assert_eq!(len, 2 * 59);
        for (n, value) in waveform.iter().enumerate() {
            let expected = 0.5 + 2.0 * (2.0 * PI * n as f64 / len as f64 + 0.3).cos();
            assert!((value - expected).abs() < 1e-9, "n={n}: {value} vs {expected}");
        }
    }

    #[test]
    fn test_insufficient_resolution() {
        let signal = vec![1.0; 10];
        assert_eq!(
            average_frequency_domain(&signal, &[0, 1, 5], 10.0),
            Err(TsaError::InsufficientResolution { bins: 0 })
        );
    }

    #[test]
    fn test_single_marker() {
        let signal = vec![1.0; 10];
        assert_eq!(
            average_frequency_domain(&signal, &[4], 10.0),
            Err(TsaError::InsufficientMarkers { count: 1 })
        );
    }

    #[test]
    fn test_complex_dc_is_rejected() {
        // A complex DC bin breaks conjugate symmetry
        let mut planner = FftPlanner::new();
        let spectrum = vec![Complex::new(1.0, 4.0), Complex::new(0.5, 0.5)];
        let result = hermitian_inverse(&mut planner, &spectrum, DEFAULT_IMAGINARY_TOLERANCE);
        assert!(matches!(result, Err(TsaError::Reconstruction { .. })));
    }

    #[test]
    fn test_hermitian_spectrum_is_real() {
        let mut planner = FftPlanner::new();
        let spectrum = vec![
            Complex::new(2.0, 0.0),
            Complex::new(0.5, -1.5),
            Complex::new(-0.25, 0.75),
        ];
        let values = hermitian_inverse(&mut planner, &spectrum, DEFAULT_IMAGINARY_TOLERANCE).unwrap();
        assert_eq!(values.len(), 6);
        // DC of the reconstruction is X[0] / len
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        assert!((mean - 2.0 / 6.0).abs() < 1e-12);
    }
}
