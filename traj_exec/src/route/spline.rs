//! Not-a-knot cubic spline interpolation
//!
//! Each segment `i` is stored as `y_i + b_i t + c_i t^2 + d_i t^3` with `t = s - s_i`. The
//! second derivatives at the knots are found by solving a tridiagonal system in which the first
//! and last rows enforce third derivative continuity across the second and second-to-last
//! knots.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The not-a-knot condition needs at least four knots.
pub const MIN_KNOTS: usize = 4;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A scalar cubic spline over a strictly increasing parameter.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    /// Parameter values of the knots.
    knots: Vec<f64>,

    /// Polynomial coefficients `[y, b, c, d]` of each segment.
    coeffs: Vec<[f64; 4]>,

    /// Value and first derivative at the last knot, used for extrapolation.
    end: (f64, f64)
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum SplineError {
    #[error("At least 4 knots are required, found {0}")]
    NotEnoughKnots(usize),

    #[error("Found {0} knots but {1} values")]
    LengthMismatch(usize, usize),

    #[error("Knots must be strictly increasing, knot {0} is not")]
    NonIncreasingKnot(usize)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CubicSpline {
    /// Fit a not-a-knot spline through the given points.
    pub fn fit(knots: &[f64], values: &[f64]) -> Result<Self, SplineError> {
        let n = knots.len();

        if n != values.len() {
            return Err(SplineError::LengthMismatch(n, values.len()))
        }
        if n < MIN_KNOTS {
            return Err(SplineError::NotEnoughKnots(n))
        }
        for i in 1..n {
            if !(knots[i] > knots[i - 1]) {
                return Err(SplineError::NonIncreasingKnot(i))
            }
        }

        let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();
        let slope: Vec<f64> = values.windows(2)
            .zip(h.iter())
            .map(|(w, hi)| (w[1] - w[0]) / hi)
            .collect();

        // Tridiagonal system for the interior second derivatives M_1..M_{n-2}
        let m = n - 2;
        let mut lower = vec![0f64; m];
        let mut diag = vec![0f64; m];
        let mut upper = vec![0f64; m];
        let mut rhs = vec![0f64; m];

        for k in 0..m {
            let i = k + 1;
            lower[k] = h[i - 1];
            diag[k] = 2.0 * (h[i - 1] + h[i]);
            upper[k] = h[i];
            rhs[k] = 6.0 * (slope[i] - slope[i - 1]);
        }

        // Not-a-knot at the start eliminates M_0
        let (h0, h1) = (h[0], h[1]);
        diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
        upper[0] = (h1 * h1 - h0 * h0) / h1;

        // Not-a-knot at the end eliminates M_{n-1}
        let (ha, hb) = (h[n - 3], h[n - 2]);
        lower[m - 1] = (ha * ha - hb * hb) / ha;
        diag[m - 1] = (ha + hb) * (2.0 * ha + hb) / ha;
        upper[m - 1] = 0.0;

        let interior = solve_tridiagonal(&lower, &diag, &upper, &rhs);

        let mut second = vec![0f64; n];
        second[1..n - 1].copy_from_slice(&interior);
        second[0] = ((h0 + h1) / h1) * second[1] - (h0 / h1) * second[2];
        second[n - 1] = ((ha + hb) / ha) * second[n - 2] - (hb / ha) * second[n - 3];

        let coeffs: Vec<[f64; 4]> = (0..n - 1)
            .map(|i| [
                values[i],
                slope[i] - h[i] * (2.0 * second[i] + second[i + 1]) / 6.0,
                second[i] / 2.0,
                (second[i + 1] - second[i]) / (6.0 * h[i])
            ])
            .collect();

        // Slope at the last knot from the last segment
        let last = coeffs[n - 2];
        let hl = h[n - 2];
        let end_slope = last[1] + 2.0 * last[2] * hl + 3.0 * last[3] * hl * hl;

        Ok(Self {
            knots: knots.to_vec(),
            coeffs,
            end: (values[n - 1], end_slope)
        })
    }

    /// First knot parameter.
    pub fn start(&self) -> f64 {
        self.knots[0]
    }

    /// Last knot parameter.
    pub fn end(&self) -> f64 {
        self.knots[self.knots.len() - 1]
    }

    /// Evaluate the spline or one of its derivatives (`order` 0 to 3) at `s`.
    ///
    /// Outside of the knot range the spline continues as a straight line along the end tangent,
    /// so the second and third derivatives are zero there. Orders above 3 are always zero.
    pub fn eval(&self, s: f64, order: usize) -> f64 {
        if s < self.start() {
            let [y, b, _, _] = self.coeffs[0];
            return linear(y, b, s - self.start(), order)
        }
        if s > self.end() {
            let (y, b) = self.end;
            return linear(y, b, s - self.end(), order)
        }

        let seg = self.segment(s);
        let [y, b, c, d] = self.coeffs[seg];
        let t = s - self.knots[seg];

        match order {
            0 => y + t * (b + t * (c + t * d)),
            1 => b + t * (2.0 * c + 3.0 * d * t),
            2 => 2.0 * c + 6.0 * d * t,
            3 => 6.0 * d,
            _ => 0.0
        }
    }

    /// Index of the segment containing `s`, which must lie within the knot range.
    fn segment(&self, s: f64) -> usize {
        let idx = self.knots.partition_point(|k| *k <= s);
        idx.saturating_sub(1).min(self.coeffs.len() - 1)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn linear(y: f64, slope: f64, t: f64, order: usize) -> f64 {
    match order {
        0 => y + slope * t,
        1 => slope,
        _ => 0.0
    }
}

/// Solve a tridiagonal system with the Thomas algorithm.
///
/// `lower[0]` and `upper[n-1]` are ignored. The systems built by `CubicSpline::fit` are
/// diagonally dominant for increasing knots so no pivoting is done.
fn solve_tridiagonal(lower: &[f64], diag: &[f64], upper: &[f64], rhs: &[f64]) -> Vec<f64> {
    let n = diag.len();
    let mut c = vec![0f64; n];
    let mut d = vec![0f64; n];

    c[0] = upper[0] / diag[0];
    d[0] = rhs[0] / diag[0];

    for i in 1..n {
        let den = diag[i] - lower[i] * c[i - 1];
        c[i] = upper[i] / den;
        d[i] = (rhs[i] - lower[i] * d[i - 1]) / den;
    }

    let mut x = vec![0f64; n];
    x[n - 1] = d[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d[i] - c[i] * x[i + 1];
    }

    x
}

#[cfg(test)]
mod test {
    use super::*;

    fn cubic(s: f64) -> [f64; 4] {
        [
            0.5 * s.powi(3) - 2.0 * s * s + s - 3.0,
            1.5 * s * s - 4.0 * s + 1.0,
            3.0 * s - 4.0,
            3.0
        ]
    }

    #[test]
    fn test_reproduces_cubic() {
        let knots = [0.0, 1.0, 2.5, 3.0, 4.7, 6.0, 8.0];
        let values: Vec<f64> = knots.iter().map(|s| cubic(*s)[0]).collect();

        let spline = CubicSpline::fit(&knots, &values).unwrap();

        for s in [0.0, 0.2, 1.0, 2.7, 5.1, 7.9, 8.0].iter() {
            let expected = cubic(*s);
            for order in 0..4 {
                assert!(
                    (spline.eval(*s, order) - expected[order]).abs() < 1e-9,
                    "order {} at {}: {} != {}", 
                    order, s, spline.eval(*s, order), expected[order]
                );
            }
        }
    }

    #[test]
    fn test_four_knots() {
        let knots = [0.0, 1.0, 2.0, 3.0];
        let values: Vec<f64> = knots.iter().map(|s: &f64| s.powi(3) - 2.0 * s).collect();

        let spline = CubicSpline::fit(&knots, &values).unwrap();

        assert!((spline.eval(1.5, 0) - (1.5f64.powi(3) - 3.0)).abs() < 1e-12);
        assert!((spline.eval(1.5, 1) - (3.0 * 1.5 * 1.5 - 2.0)).abs() < 1e-12);
        assert!((spline.eval(1.5, 2) - 9.0).abs() < 1e-12);
        assert!((spline.eval(1.5, 3) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_interpolates_knots() {
        let knots = [0.0, 1.0, 2.5, 3.0, 4.7, 6.0];
        let values: Vec<f64> = knots.iter().map(|s: &f64| s.sin()).collect();

        let spline = CubicSpline::fit(&knots, &values).unwrap();

        for (k, v) in knots.iter().zip(values.iter()) {
            assert!((spline.eval(*k, 0) - v).abs() < 1e-12);
        }
    }

    #[test]
    fn test_linear_extrapolation() {
        let knots = [0.0, 1.0, 2.0, 3.0, 4.0];
        let values: Vec<f64> = knots.iter().map(|s: &f64| s * s).collect();

        let spline = CubicSpline::fit(&knots, &values).unwrap();

        // Past the end: tangent of s^2 at 4 is 8
        assert!((spline.eval(5.0, 0) - 24.0).abs() < 1e-9);
        assert!((spline.eval(5.0, 1) - 8.0).abs() < 1e-9);
        assert_eq!(spline.eval(5.0, 2), 0.0);
        assert_eq!(spline.eval(5.0, 3), 0.0);

        // Before the start: tangent of s^2 at 0 is 0
        assert!(spline.eval(-2.0, 0).abs() < 1e-9);
        assert!(spline.eval(-2.0, 1).abs() < 1e-9);
        assert_eq!(spline.eval(-2.0, 2), 0.0);
    }

    #[test]
    fn test_fit_errors() {
        assert_eq!(
            CubicSpline::fit(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0]).unwrap_err(),
            SplineError::NotEnoughKnots(3)
        );
        assert_eq!(
            CubicSpline::fit(&[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0]).unwrap_err(),
            SplineError::LengthMismatch(4, 2)
        );
        assert_eq!(
            CubicSpline::fit(&[0.0, 1.0, 1.0, 3.0], &[0.0, 1.0, 2.0, 3.0]).unwrap_err(),
            SplineError::NonIncreasingKnot(2)
        );
    }
}
