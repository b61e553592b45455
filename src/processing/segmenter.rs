//! Cycle segmentation from marker indices
//!
//! Each marker starts exactly one cycle and is the exclusive end of the
//! previous one, so `M` markers give `M - 1` segments.

use crate::types::CycleSegment;

use super::TsaError;

/// Check that markers define at least one cycle inside a signal of `signal_len`.
///
/// Markers must be strictly increasing and every marker but the last must index
/// an existing sample. The last marker only closes the final cycle, so it may
/// equal `signal_len`.
pub fn validate_markers(markers: &[usize], signal_len: usize) -> Result<(), TsaError> {
    if markers.len() < 2 {
        return Err(TsaError::InsufficientMarkers {
            count: markers.len(),
        });
    }

    for (position, &index) in markers.iter().enumerate() {
        if index > signal_len {
            return Err(TsaError::InvalidMarker {
                position,
                index,
                reason: format!("out of range for signal of {signal_len} samples"),
            });
        }
        if position > 0 {
            let previous = markers[position - 1];
            if index == previous {
                return Err(TsaError::InvalidMarker {
                    position,
                    index,
                    reason: "duplicate marker".to_string(),
                });
            }
            if index < previous {
                return Err(TsaError::InvalidMarker {
                    position,
                    index,
                    reason: format!("not increasing (previous marker {previous})"),
                });
            }
        }
    }

    Ok(())
}

/// Validate markers and cut the signal into cycle segments.
pub fn segment_cycles(markers: &[usize], signal_len: usize) -> Result<Vec<CycleSegment>, TsaError> {
    validate_markers(markers, signal_len)?;

    Ok(markers
        .windows(2)
        .enumerate()
        .map(|(index, w)| CycleSegment {
            index,
            start: w[0],
            end: w[1],
        })
        .collect())
}
