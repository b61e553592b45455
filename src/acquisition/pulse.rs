//! Cycle-start pulse detectors
//!
//! Both detectors only produce marker indices; the averagers never see how
//! the markers were found.

use serde::{Deserialize, Serialize};

use super::PulseDetector;

// ============================================================================
// Trough Detector
// ============================================================================

/// Marks local minima of a channel as cycle starts.
///
/// A plateau counts once, at its middle sample (rounded down). With
/// `min_distance > 1`, troughs closer than that to a deeper trough are dropped
/// (deepest first).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TroughDetector {
    /// Minimum spacing between accepted troughs (samples)
    pub min_distance: usize,
    /// Only troughs at or below this level are accepted
    pub max_height: Option<f64>,
}

impl Default for TroughDetector {
    fn default() -> Self {
        Self {
            min_distance: 1,
            max_height: None,
        }
    }
}

impl PulseDetector for TroughDetector {
    fn detect(&self, channel: &[f64]) -> Vec<usize> {
        let mut troughs = local_minima(channel);

        if let Some(limit) = self.max_height {
            troughs.retain(|&i| channel[i] <= limit);
        }

        if self.min_distance > 1 && troughs.len() > 1 {
            troughs = enforce_distance(channel, &troughs, self.min_distance);
        }

        troughs
    }

    fn name(&self) -> &'static str {
        "trough"
    }
}

/// Strict local minima; flat bottoms report their middle sample, rounded down.
fn local_minima(channel: &[f64]) -> Vec<usize> {
    let mut minima = Vec::new();
    if channel.len() < 3 {
        return minima;
    }

    let mut i = 1;
    while i < channel.len() - 1 {
        if channel[i] < channel[i - 1] {
            // Walk across a possible plateau
            let mut ahead = i + 1;
            while ahead < channel.len() - 1 && channel[ahead] == channel[i] {
                ahead += 1;
            }
            if channel[ahead] > channel[i] {
                minima.push((i + ahead - 1) / 2);
            }
            i = ahead;
        } else {
            i += 1;
        }
    }

    minima
}

/// Keep the deepest troughs such that no two are closer than `distance`.
fn enforce_distance(channel: &[f64], troughs: &[usize], distance: usize) -> Vec<usize> {
    let mut by_depth: Vec<usize> = (0..troughs.len()).collect();
    by_depth.sort_by(|&a, &b| channel[troughs[a]].total_cmp(&channel[troughs[b]]));

    let mut keep = vec![true; troughs.len()];
    for &candidate in &by_depth {
        if !keep[candidate] {
            continue;
        }
        let centre = troughs[candidate];

        for (other, &index) in troughs.iter().enumerate().skip(candidate + 1) {
            if index - centre >= distance {
                break;
            }
            keep[other] = false;
        }
        for (other, &index) in troughs.iter().enumerate().take(candidate).rev() {
            if centre - index >= distance {
                break;
            }
            keep[other] = false;
        }
    }

    troughs
        .iter()
        .zip(keep)
        .filter_map(|(&index, kept)| kept.then_some(index))
        .collect()
}

// ============================================================================
// Threshold Crossing Detector
// ============================================================================

/// Marks falling crossings through `level`, as from a once-per-rev tachometer.
///
/// After a crossing the detector re-arms only once the channel has risen back
/// above `level + hysteresis`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCrossingDetector {
    /// Crossing level
    pub level: f64,
    /// Re-arm margin above `level`
    pub hysteresis: f64,
}

impl Default for ThresholdCrossingDetector {
    fn default() -> Self {
        Self {
            level: 0.0,
            hysteresis: 0.0,
        }
    }
}

impl PulseDetector for ThresholdCrossingDetector {
    fn detect(&self, channel: &[f64]) -> Vec<usize> {
        let rearm = self.level + self.hysteresis;
        let mut armed = channel.first().is_some_and(|&v| v > rearm);
        let mut crossings = Vec::new();

        for (i, &value) in channel.iter().enumerate().skip(1) {
            if armed && value <= self.level {
                crossings.push(i);
                armed = false;
            } else if !armed && value > rearm {
                armed = true;
            }
        }

        crossings
    }

    fn name(&self) -> &'static str {
        "threshold"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_troughs_of_cosine() {
        // -cos has troughs at multiples of the period
        let period = 50;
        let channel: Vec<f64> = (0..260)
            .map(|n| -(2.0 * PI * n as f64 / period as f64).cos())
            .collect();
        let markers = TroughDetector::default().detect(&channel);
        assert_eq!(markers, vec![50, 100, 150, 200, 250]);
    }

    #[test]
    fn test_plateau_counts_once() {
        let channel = [3.0, 1.0, 1.0, 1.0, 2.0, 0.5, 4.0];
        let markers = TroughDetector::default().detect(&channel);
        assert_eq!(markers, vec![2, 5]);

        // Even-length plateau rounds down
        let channel = [3.0, 1.0, 1.0, 2.0];
        assert_eq!(TroughDetector::default().detect(&channel), vec![1]);
    }

    #[test]
    fn test_edges_are_not_troughs() {
        let channel = [0.0, 1.0, 2.0, 1.0, 3.0, -1.0];
        assert_eq!(TroughDetector::default().detect(&channel), vec![3]);
    }

    #[test]
    fn test_max_height_filter() {
        let channel = [2.0, 0.5, 2.0, -1.0, 2.0];
        let detector = TroughDetector {
            min_distance: 1,
            max_height: Some(0.0),
        };
        assert_eq!(detector.detect(&channel), vec![3]);
    }

    #[test]
    fn test_min_distance_keeps_deepest() {
        // Noise trough at 3 sits next to the real one at 5
        let channel = [5.0, 4.0, 3.0, 2.0, 2.5, -1.0, 3.0, 4.0, 3.0, -2.0, 4.0];
        let detector = TroughDetector {
            min_distance: 3,
            max_height: None,
        };
        assert_eq!(detector.detect(&channel), vec![5, 9]);
    }

    #[test]
    fn test_threshold_crossings_with_hysteresis() {
        let channel = [1.0, 0.5, -0.1, 0.05, -0.2, 0.6, 0.9, -0.5, 1.0];
        let detector = ThresholdCrossingDetector {
            level: 0.0,
            hysteresis: 0.3,
        };
        // The wiggle at index 3-4 does not re-arm
        assert_eq!(detector.detect(&channel), vec![2, 7]);
    }

    #[test]
    fn test_threshold_starting_low_waits_for_rearm() {
        let channel = [-1.0, -0.5, 0.5, -0.5];
        assert_eq!(ThresholdCrossingDetector::default().detect(&channel), vec![3]);
    }
}
