//! Shape-preserving piecewise cubic Hermite interpolation (PCHIP)
//!
//! Slopes follow Fritsch–Carlson: interior slopes are a weighted harmonic mean
//! of the neighbouring secants, or zero where the data changes direction, so
//! the interpolant never overshoots a local extremum. Endpoint slopes use the
//! one-sided three-point formula with the usual shape-preserving limits.
//!
//! Given values y0, y1 and slopes d0, d1 on `[x0, x1]`:
//!
//! ```text
//! p(x) = h00(t)*y0 + h10(t)*h*d0 + h01(t)*y1 + h11(t)*h*d1
//!
//! where t = (x - x0) / h, h = x1 - x0
//! ```
//!
//! Points outside the knot range are extrapolated with the boundary cubic.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    #[error("Need at least 2 knots, got {0}")]
    TooFewKnots(usize),

    #[error("x has {x} values but y has {y}")]
    LengthMismatch { x: usize, y: usize },

    #[error("Knots are not strictly increasing at index {0}")]
    NotIncreasing(usize),
}

/// A PCHIP interpolant built over a fixed set of knots.
#[derive(Debug, Clone)]
pub struct Pchip<'a> {
    x: &'a [f64],
    y: &'a [f64],
    slopes: Vec<f64>,
}

impl<'a> Pchip<'a> {
    pub fn new(x: &'a [f64], y: &'a [f64]) -> Result<Self, InterpolationError> {
        if x.len() != y.len() {
            return Err(InterpolationError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(InterpolationError::TooFewKnots(x.len()));
        }
        if let Some(index) = crate::types::first_non_increasing(x) {
            return Err(InterpolationError::NotIncreasing(index));
        }

        Ok(Self {
            x,
            y,
            slopes: pchip_slopes(x, y),
        })
    }

    /// Knot derivatives chosen by the Fritsch–Carlson rules.
    pub fn slopes(&self) -> &[f64] {
        &self.slopes
    }

    /// Evaluate the interpolant at `xi`.
    pub fn evaluate(&self, xi: f64) -> f64 {
        let k = find_interval(self.x, xi);
        hermite_eval(
            self.x[k],
            self.x[k + 1],
            self.y[k],
            self.y[k + 1],
            self.slopes[k],
            self.slopes[k + 1],
            xi,
        )
    }

    /// Evaluate the interpolant at every point of `xs`.
    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&xi| self.evaluate(xi)).collect()
    }
}

fn pchip_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let secants: Vec<f64> = y
        .windows(2)
        .zip(&h)
        .map(|(w, &hk)| (w[1] - w[0]) / hk)
        .collect();

    if n == 2 {
        return vec![secants[0], secants[0]];
    }

    let mut slopes = vec![0.0; n];

    for k in 1..n - 1 {
        let (s0, s1) = (secants[k - 1], secants[k]);
        if s0 * s1 <= 0.0 {
            continue;
        }
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        slopes[k] = (w1 + w2) / (w1 / s0 + w2 / s1);
    }

    slopes[0] = endpoint_slope(h[0], h[1], secants[0], secants[1]);
    slopes[n - 1] = endpoint_slope(h[n - 2], h[n - 3], secants[n - 2], secants[n - 3]);

    slopes
}

/// One-sided three-point slope, limited so the end piece stays shape preserving.
fn endpoint_slope(h0: f64, h1: f64, s0: f64, s1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * s0 - h0 * s1) / (h0 + h1);

    if d.signum() != s0.signum() || s0 == 0.0 {
        0.0
    } else if s0.signum() != s1.signum() && d.abs() > 3.0 * s0.abs() {
        3.0 * s0
    } else {
        d
    }
}

/// Index `k` of the knot interval `[x[k], x[k+1]]` used for `xi`.
///
/// Points left of the first knot use the first interval, points right of the
/// last knot use the last one.
fn find_interval(x: &[f64], xi: f64) -> usize {
    let mut lo = 0;
    let mut hi = x.len() - 1;

    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if x[mid] <= xi {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    lo
}

#[inline]
fn hermite_eval(x0: f64, x1: f64, y0: f64, y1: f64, d0: f64, d1: f64, xi: f64) -> f64 {
    let h = x1 - x0;
    let t = (xi - x0) / h;
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    h00 * y0 + h10 * h * d0 + h01 * y1 + h11 * h * d1
}
