//! Time-domain TSA
//!
//! Every cycle is resampled onto the same number of points with PCHIP and the
//! resampled cycles are averaged. The common length is the native sample count
//! of the longest cycle, so no cycle is down-sampled.

use tracing::debug;

use crate::types::{check_sample_times, check_sampling_rate, CycleSegment};

use super::pchip::{InterpolationError, Pchip};
use super::segmenter::segment_cycles;
use super::TsaError;

/// Average the cycles of `signal` in the time domain.
///
/// Returns the averaged cycle and the resampling grid of the last cycle, both
/// of length `round(max cycle duration * sampling_rate)`.
pub fn average_time_domain(
    signal: &[f64],
    sample_times: &[f64],
    markers: &[usize],
    sampling_rate: f64,
) -> Result<(Vec<f64>, Vec<f64>), TsaError> {
    check_sampling_rate(sampling_rate)?;
    if signal.len() != sample_times.len() {
        return Err(TsaError::LengthMismatch {
            signal: signal.len(),
            times: sample_times.len(),
        });
    }

    let segments = segment_cycles(markers, signal.len())?;
    if let Some(segment) = segments.iter().find(|s| s.len() < 2) {
        return Err(TsaError::DegenerateSegment {
            segment: segment.index,
            len: segment.len(),
        });
    }
    check_sample_times(sample_times)?;

    let (longest, max_duration) = segments
        .iter()
        .map(|s| (s, s.duration(sample_times, sampling_rate)))
        .fold((&segments[0], f64::NEG_INFINITY), |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        });

    let grid_len = common_grid_len(max_duration, sampling_rate)?;
    if grid_len < 2 {
        return Err(TsaError::DegenerateSegment {
            segment: longest.index,
            len: grid_len,
        });
    }
    // No cycle may be down-sampled onto the common grid
    if let Some(segment) = segments.iter().find(|s| s.len() > grid_len) {
        return Err(TsaError::GridShorterThanSegment {
            segment: segment.index,
            samples: segment.len(),
            grid_len,
        });
    }

    debug!(
        segments = segments.len(),
        grid_len,
        max_duration_s = max_duration,
        "Time-domain averaging"
    );

    let mut accumulator = Vec::new();
    accumulator
        .try_reserve_exact(grid_len)
        .map_err(|_| TsaError::InvalidGridLength {
            value: grid_len as f64,
        })?;
    accumulator.resize(grid_len, 0.0);
    let mut grid = Vec::new();

    for segment in &segments {
        let (resampled, segment_grid) =
            resample_segment(signal, sample_times, segment, grid_len, sampling_rate)?;

        if resampled.len() != accumulator.len() {
            return Err(TsaError::SegmentLengthMismatch {
                segment: segment.index,
                expected: accumulator.len(),
                actual: resampled.len(),
            });
        }
        for (acc, value) in accumulator.iter_mut().zip(&resampled) {
            *acc += value;
        }

        grid = segment_grid;
    }

    let count = segments.len() as f64;
    accumulator.iter_mut().for_each(|v| *v /= count);

    Ok((accumulator, grid))
}

/// `round(max_duration * sampling_rate)`, rejected when it cannot be a length.
fn common_grid_len(max_duration: f64, sampling_rate: f64) -> Result<usize, TsaError> {
    let value = (max_duration * sampling_rate).round();
    if !value.is_finite() || value < 0.0 || value >= usize::MAX as f64 {
        return Err(TsaError::InvalidGridLength { value });
    }
    Ok(value as usize)
}

/// Resample one cycle onto `grid_len` equally spaced times.
///
/// The grid covers `[t_start, t_end)` with spacing `duration / grid_len`. The
/// sample at the next marker is the closing knot. A cycle closed by a marker
/// one past the last sample has no closing knot, so its tail is extrapolated
/// with the boundary cubic.
fn resample_segment(
    signal: &[f64],
    sample_times: &[f64],
    segment: &CycleSegment,
    grid_len: usize,
    sampling_rate: f64,
) -> Result<(Vec<f64>, Vec<f64>), TsaError> {
    let knots_end = (segment.end + 1).min(signal.len());
    let knots_x = &sample_times[segment.start..knots_end];
    let knots_y = &signal[segment.start..knots_end];

    let interpolant = Pchip::new(knots_x, knots_y).map_err(|e| match e {
        InterpolationError::TooFewKnots(_) => TsaError::DegenerateSegment {
            segment: segment.index,
            len: segment.len(),
        },
        InterpolationError::NotIncreasing(offset) => TsaError::NonMonotonicTime {
            index: segment.start + offset,
        },
        InterpolationError::LengthMismatch { x, y } => {
            TsaError::LengthMismatch { signal: y, times: x }
        }
    })?;

    let start = sample_times[segment.start];
    let step = segment.duration(sample_times, sampling_rate) / grid_len as f64;
    let grid: Vec<f64> = (0..grid_len).map(|k| start + k as f64 * step).collect();

    Ok((interpolant.evaluate_many(&grid), grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn uniform_times(len: usize, fs: f64) -> Vec<f64> {
        (0..len).map(|k| k as f64 / fs).collect()
    }

    #[test]
    fn test_grid_length_follows_longest_cycle() {
        let fs = 1000.0;
        let signal: Vec<f64> = (0..300).map(|k| (k as f64 * 0.05).sin()).collect();
        let times = uniform_times(signal.len(), fs);

        let (waveform, axis) = average_time_domain(&signal, &times, &[0, 100, 250], fs).unwrap();
        assert_eq!(waveform.len(), 150);
        assert_eq!(axis.len(), 150);
        // Axis belongs to the last cycle
        assert!((axis[0] - 0.1).abs() < 1e-12);
        assert!(axis[149] < 0.25);
    }

    #[test]
    fn test_identical_cycles_reproduce_reference() {
        let fs = 200.0;
        let period = 40;
        let reference: Vec<f64> = (0..period)
            .map(|n| {
                let phase = 2.0 * PI * n as f64 / period as f64;
                phase.cos() + 0.4 * (3.0 * phase).sin() + 0.1
            })
            .collect();
        let signal: Vec<f64> = reference.iter().cycle().take(period * 5 + 1).copied().collect();
        let times = uniform_times(signal.len(), fs);
        let markers: Vec<usize> = (0..=5).map(|c| c * period).collect();

        let (waveform, _) = average_time_domain(&signal, &times, &markers, fs).unwrap();
        assert_eq!(waveform.len(), period);
        for (got, want) in waveform.iter().zip(&reference) {
            assert!((got - want).abs() < 1e-9, "{got} vs {want}");
        }
    }

    #[test]
    fn test_closing_marker_at_signal_length() {
        let fs = 1000.0;
        let signal: Vec<f64> = (0..250).map(|k| (k as f64 * 0.05).sin()).collect();
        let times = uniform_times(signal.len(), fs);

        let (waveform, axis) = average_time_domain(&signal, &times, &[0, 100, 250], fs).unwrap();
        assert_eq!(waveform.len(), 150);
        assert_eq!(axis.len(), 150);
        assert!((axis[0] - 0.1).abs() < 1e-12);
        assert!((axis[149] - 0.249).abs() < 1e-12);
        assert!(waveform.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_last_cycle_without_closing_knot_is_exact_at_constant_speed() {
        let fs = 100.0;
        let period = 20;
        let reference: Vec<f64> = (0..period)
            .map(|n| (2.0 * PI * n as f64 / period as f64).sin())
            .collect();
        let signal: Vec<f64> = reference.iter().cycle().take(period * 3).copied().collect();
        let times = uniform_times(signal.len(), fs);

        let (waveform, _) = average_time_domain(&signal, &times, &[0, 20, 40, 60], fs).unwrap();
        assert_eq!(waveform.len(), period);
        for (got, want) in waveform.iter().zip(&reference) {
            assert!((got - want).abs() < 1e-9, "{got} vs {want}");
        }
    }

    #[test]
    fn test_non_finite_time_is_rejected() {
        let signal = vec![0.0; 20];
        let mut times = uniform_times(20, 10.0);
        times[19] = f64::INFINITY;
        assert_eq!(
            average_time_domain(&signal, &times, &[0, 10, 19], 10.0),
            Err(TsaError::NonFiniteTime { index: 19 })
        );

        times[19] = f64::NAN;
        assert_eq!(
            average_time_domain(&signal, &times, &[0, 10, 19], 10.0),
            Err(TsaError::NonFiniteTime { index: 19 })
        );
    }

    #[test]
    fn test_unallocatable_grid_is_rejected() {
        let signal = vec![0.0; 4];
        let times = [0.0, 1.0, 2.0, 1e300];
        assert!(matches!(
            average_time_domain(&signal, &times, &[0, 3], 10.0),
            Err(TsaError::InvalidGridLength { .. })
        ));
    }

    #[test]
    fn test_grid_shorter_than_cycle_is_rejected() {
        // 0.5 ms spacing while the stated rate is 1 kHz
        let signal = vec![0.0; 41];
        let times = uniform_times(signal.len(), 2000.0);
        assert_eq!(
            average_time_domain(&signal, &times, &[0, 20, 40], 1000.0),
            Err(TsaError::GridShorterThanSegment {
                segment: 0,
                samples: 20,
                grid_len: 10
            })
        );
    }

    #[test]
    fn test_degenerate_segment() {
        let signal = vec![0.0; 20];
        let times = uniform_times(20, 10.0);
        assert_eq!(
            average_time_domain(&signal, &times, &[0, 5, 6, 12], 10.0),
            Err(TsaError::DegenerateSegment { segment: 1, len: 1 })
        );
    }

    #[test]
    fn test_single_marker() {
        let signal = vec![0.0; 20];
        let times = uniform_times(20, 10.0);
        assert_eq!(
            average_time_domain(&signal, &times, &[3], 10.0),
            Err(TsaError::InsufficientMarkers { count: 1 })
        );
    }

    #[test]
    fn test_length_mismatch() {
        let signal = vec![0.0; 20];
        let times = uniform_times(19, 10.0);
        assert_eq!(
            average_time_domain(&signal, &times, &[0, 10], 10.0),
            Err(TsaError::LengthMismatch {
                signal: 20,
                times: 19
            })
        );
    }
}
