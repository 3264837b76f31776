use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::AnchorSet;

// ---------------------------------------------------------------------------
// Fit configuration
// ---------------------------------------------------------------------------

/// Shape of the interpolant drawn through the anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitKind {
    /// Piecewise linear segments between anchors.
    Linear,
    /// Natural cubic spline.
    #[default]
    CubicSpline,
}

impl FitKind {
    /// Minimum number of distinct anchor wavelengths the fit needs.
    pub fn min_points(self) -> usize {
        match self {
            FitKind::Linear => 2,
            FitKind::CubicSpline => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FitKind::Linear => "Linear",
            FitKind::CubicSpline => "Cubic spline",
        }
    }
}

/// What the continuum does outside `[min anchor x, max anchor x]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolation {
    /// Keep evaluating the boundary piece of the interpolant.
    #[default]
    Natural,
    /// Hold the value of the nearest end knot.
    Clamp,
}

impl Extrapolation {
    pub fn label(self) -> &'static str {
        match self {
            Extrapolation::Natural => "Natural",
            Extrapolation::Clamp => "Clamp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("need at least {required} anchors with distinct wavelengths for this fit, have {found}")]
    InsufficientPoints { required: usize, found: usize },
}

// ---------------------------------------------------------------------------
// Interpolants
// ---------------------------------------------------------------------------

/// Natural cubic spline through strictly increasing knots.
///
/// Second derivatives at the knots come from the usual tridiagonal system
/// with zero curvature at both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    y2s: Vec<f64>,
}

impl CubicSpline {
    /// Callers guarantee `xs` strictly increasing, `xs.len() == ys.len() >= 2`.
    fn new(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let n = xs.len();
        let mut y2s = vec![0.0; n];
        let mut u = vec![0.0; n];

        // Forward sweep
        for i in 1..n - 1 {
            let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
            let p = sig * y2s[i - 1] + 2.0;
            y2s[i] = (sig - 1.0) / p;
            let slope_diff = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
                - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
            u[i] = (6.0 * slope_diff / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
        }

        // Back substitution, y2s[n - 1] stays 0
        for k in (0..n - 1).rev() {
            y2s[k] = y2s[k] * y2s[k + 1] + u[k];
        }

        Self { xs, ys, y2s }
    }

    fn evaluate(&self, x: f64) -> f64 {
        let (lo, hi) = bracket(&self.xs, x);
        let h = self.xs[hi] - self.xs[lo];
        let a = (self.xs[hi] - x) / h;
        let b = (x - self.xs[lo]) / h;

        a * self.ys[lo]
            + b * self.ys[hi]
            + ((a * a * a - a) * self.y2s[lo] + (b * b * b - b) * self.y2s[hi]) * h * h / 6.0
    }
}

/// Indices of the knot interval used for `x`; outside the knots the first or
/// last interval is returned.
fn bracket(xs: &[f64], x: f64) -> (usize, usize) {
    let mut lo = 0;
    let mut hi = xs.len() - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if xs[mid] > x {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    (lo, hi)
}

#[derive(Debug, Clone, PartialEq)]
enum Interpolant {
    Linear { xs: Vec<f64>, ys: Vec<f64> },
    Cubic(CubicSpline),
}

impl Interpolant {
    fn knots(&self) -> (&[f64], &[f64]) {
        match self {
            Interpolant::Linear { xs, ys } => (xs, ys),
            Interpolant::Cubic(s) => (&s.xs, &s.ys),
        }
    }

    fn evaluate(&self, x: f64) -> f64 {
        match self {
            Interpolant::Linear { xs, ys } => {
                let (lo, hi) = bracket(xs, x);
                let t = (x - xs[lo]) / (xs[hi] - xs[lo]);
                ys[lo] + t * (ys[hi] - ys[lo])
            }
            Interpolant::Cubic(s) => s.evaluate(x),
        }
    }
}

// ---------------------------------------------------------------------------
// ContinuumFit – the fitted curve and its samples on the spectrum grid
// ---------------------------------------------------------------------------

/// A fitted continuum, valid for the anchor set it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuumFit {
    interpolant: Interpolant,
    extrapolation: Extrapolation,
    /// Continuum evaluated at every spectrum wavelength, 1:1.
    pub values: Vec<f64>,
}

impl ContinuumFit {
    /// Continuum flux at wavelength `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let (xs, ys) = self.interpolant.knots();
        if self.extrapolation == Extrapolation::Clamp {
            let last = xs.len() - 1;
            if x <= xs[0] {
                return ys[0];
            }
            if x >= xs[last] {
                return ys[last];
            }
        }
        self.interpolant.evaluate(x)
    }

    /// Number of knots after merging duplicate wavelengths.
    pub fn knot_count(&self) -> usize {
        self.interpolant.knots().0.len()
    }
}

// ---------------------------------------------------------------------------
// ContinuumFitter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContinuumFitter {
    pub kind: FitKind,
    pub extrapolation: Extrapolation,
}

impl ContinuumFitter {
    pub fn new(kind: FitKind, extrapolation: Extrapolation) -> Self {
        Self {
            kind,
            extrapolation,
        }
    }

    /// Fit the anchors and sample the result on `wavelengths`.
    ///
    /// Anchors sharing a wavelength collapse into one knot at their mean flux.
    pub fn fit(&self, anchors: &AnchorSet, wavelengths: &[f64]) -> Result<ContinuumFit, FitError> {
        let (xs, ys) = merge_knots(anchors);
        let required = self.kind.min_points();
        if xs.len() < required {
            return Err(FitError::InsufficientPoints {
                required,
                found: xs.len(),
            });
        }

        let interpolant = match self.kind {
            FitKind::Linear => Interpolant::Linear { xs, ys },
            FitKind::CubicSpline => Interpolant::Cubic(CubicSpline::new(xs, ys)),
        };
        let mut fit = ContinuumFit {
            interpolant,
            extrapolation: self.extrapolation,
            values: Vec::new(),
        };
        fit.values = wavelengths.iter().map(|&w| fit.evaluate(w)).collect();
        Ok(fit)
    }
}

fn merge_knots(anchors: &AnchorSet) -> (Vec<f64>, Vec<f64>) {
    let mut xs: Vec<f64> = Vec::with_capacity(anchors.len());
    let mut ys: Vec<f64> = Vec::with_capacity(anchors.len());
    let mut run = 0usize;
    for p in anchors.points() {
        if xs.last() == Some(&p.x) {
            run += 1;
            if let Some(y) = ys.last_mut() {
                // running mean over the duplicates seen so far
                *y += (p.y - *y) / run as f64;
            }
        } else {
            xs.push(p.x);
            ys.push(p.y);
            run = 1;
        }
    }
    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::AnchorPoint;
    use approx::assert_abs_diff_eq;

    fn anchors(points: &[(f64, f64)]) -> AnchorSet {
        AnchorSet::from_points(points.iter().map(|&(x, y)| AnchorPoint { x, y }))
    }

    #[test]
    fn spline_passes_through_anchors() {
        let set = anchors(&[
            (4000.0, 2.0),
            (4100.0, 3.0),
            (4250.0, 5.0),
            (4300.0, 4.0),
            (4500.0, 1.0),
        ]);
        let fit = ContinuumFitter::default().fit(&set, &[]).unwrap();
        for p in set.points() {
            assert_abs_diff_eq!(fit.evaluate(p.x), p.y, epsilon = 1e-10);
        }
    }

    #[test]
    fn linear_passes_through_anchors_and_interpolates() {
        let set = anchors(&[(0.0, 1.0), (10.0, 3.0)]);
        let fitter = ContinuumFitter::new(FitKind::Linear, Extrapolation::Natural);
        let fit = fitter.fit(&set, &[0.0, 5.0, 10.0]).unwrap();
        assert_eq!(fit.values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn spline_reproduces_straight_line() {
        let set = anchors(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0), (5.0, 10.0)]);
        let fit = ContinuumFitter::default().fit(&set, &[1.5, 4.0, 6.0]).unwrap();
        assert_abs_diff_eq!(fit.values[0], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.values[1], 8.0, epsilon = 1e-12);
        // natural extrapolation keeps following the line
        assert_abs_diff_eq!(fit.values[2], 12.0, epsilon = 1e-12);
    }

    #[test]
    fn cubic_needs_four_distinct_wavelengths() {
        let set = anchors(&[(5000.0, 1.0), (5003.0, 1.0), (5003.0, 1.1)]);
        let err = ContinuumFitter::default().fit(&set, &[]).unwrap_err();
        assert_eq!(
            err,
            FitError::InsufficientPoints {
                required: 4,
                found: 2
            }
        );
    }

    #[test]
    fn linear_needs_two_points() {
        let fitter = ContinuumFitter::new(FitKind::Linear, Extrapolation::Natural);
        let err = fitter.fit(&anchors(&[(1.0, 1.0)]), &[]).unwrap_err();
        assert!(matches!(err, FitError::InsufficientPoints { required: 2, found: 1 }));
        assert!(fitter.fit(&AnchorSet::new(), &[]).is_err());
    }

    #[test]
    fn duplicate_wavelengths_are_averaged() {
        let set = anchors(&[(0.0, 1.0), (1.0, 1.0), (1.0, 3.0), (2.0, 2.0)]);
        let fitter = ContinuumFitter::new(FitKind::Linear, Extrapolation::Natural);
        let fit = fitter.fit(&set, &[1.0]).unwrap();
        assert_eq!(fit.knot_count(), 3);
        assert_abs_diff_eq!(fit.values[0], 2.0);
    }

    #[test]
    fn clamp_holds_end_values() {
        let set = anchors(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0), (4.0, 8.0)]);
        let fitter = ContinuumFitter::new(FitKind::CubicSpline, Extrapolation::Clamp);
        let fit = fitter.fit(&set, &[0.0, 2.5, 9.0]).unwrap();
        assert_eq!(fit.values[0], 2.0);
        assert_abs_diff_eq!(fit.values[1], 5.0, epsilon = 1e-12);
        assert_eq!(fit.values[2], 8.0);
    }

    #[test]
    fn linear_natural_extends_boundary_segments() {
        let set = anchors(&[(1.0, 2.0), (3.0, 6.0)]);
        let fitter = ContinuumFitter::new(FitKind::Linear, Extrapolation::Natural);
        let fit = fitter.fit(&set, &[0.0, 5.0]).unwrap();
        assert_abs_diff_eq!(fit.values[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.values[1], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn linear_clamp_holds_end_values() {
        let set = anchors(&[(1.0, 2.0), (3.0, 6.0)]);
        let fitter = ContinuumFitter::new(FitKind::Linear, Extrapolation::Clamp);
        let fit = fitter.fit(&set, &[0.0, 2.0, 5.0]).unwrap();
        assert_eq!(fit.values, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn anchors_beyond_the_grid_still_sample_every_wavelength() {
        let set = anchors(&[(4990.0, 1.2), (5001.0, 1.1), (5002.0, 1.0), (5020.0, 0.9)]);
        let grid = [5000.0, 5001.0, 5002.0, 5003.0];
        for kind in [FitKind::CubicSpline, FitKind::Linear] {
            let fit = ContinuumFitter::new(kind, Extrapolation::Natural).fit(&set, &grid).unwrap();
            assert_eq!(fit.values.len(), grid.len());
            assert_abs_diff_eq!(fit.values[1], 1.1, epsilon = 1e-12);
            assert_abs_diff_eq!(fit.values[2], 1.0, epsilon = 1e-12);
            assert!(fit.values.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn values_align_with_wavelengths() {
        let set = anchors(&[(0.0, 1.0), (1.0, 1.2), (2.0, 0.9), (3.0, 1.1)]);
        let grid: Vec<f64> = (0..31).map(|i| i as f64 * 0.1).collect();
        let fit = ContinuumFitter::default().fit(&set, &grid).unwrap();
        assert_eq!(fit.values.len(), grid.len());
        for (w, v) in grid.iter().zip(&fit.values) {
            assert_eq!(*v, fit.evaluate(*w));
        }
    }

    #[test]
    fn fit_kind_deserializes_from_snake_case() {
        let kind: FitKind = serde_json::from_str("\"cubic_spline\"").unwrap();
        assert_eq!(kind, FitKind::CubicSpline);
        let ext: Extrapolation = serde_json::from_str("\"clamp\"").unwrap();
        assert_eq!(ext, Extrapolation::Clamp);
    }
}
