use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Spectrum – the loaded wavelength / flux samples
// ---------------------------------------------------------------------------

/// A single 1-D spectrum, immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Wavelength axis (x), non-decreasing.
    pub wavelength: Vec<f64>,
    /// Flux axis (y) – same length as `wavelength`.
    pub flux: Vec<f64>,
}

impl Spectrum {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    /// `(min, max)` of the wavelength axis.
    pub fn wavelength_range(&self) -> (f64, f64) {
        min_max(&self.wavelength)
    }

    /// `(min, max)` of the finite flux values.
    pub fn flux_range(&self) -> (f64, f64) {
        min_max(&self.flux)
    }

    /// Iterate `(wavelength, flux)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelength.iter().copied().zip(self.flux.iter().copied())
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}

// ---------------------------------------------------------------------------
// Anchor points
// ---------------------------------------------------------------------------

/// A user-selected point believed to lie on the continuum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub x: f64,
    pub y: f64,
}

/// Per-axis divisors applied before measuring distance between points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    #[cfg(test)]
    pub const UNIT: Scale = Scale { x: 1.0, y: 1.0 };

    /// Scale that maps the spectrum's bounding box onto the unit square.
    /// Degenerate (zero or non-finite) spans fall back to 1.
    pub fn from_spectrum(spectrum: &Spectrum) -> Self {
        let (x0, x1) = spectrum.wavelength_range();
        let (y0, y1) = spectrum.flux_range();
        Scale {
            x: usable_span(x1 - x0),
            y: usable_span(y1 - y0),
        }
    }
}

fn usable_span(span: f64) -> f64 {
    if span.is_finite() && span > 0.0 {
        span
    } else {
        1.0
    }
}

/// Anchor points kept sorted by `x`.
///
/// Duplicate `x` values are allowed; the continuum fitter merges them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnchorSet {
    points: Vec<AnchorPoint>,
}

impl AnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from arbitrary points, sorting them by `x`.
    pub fn from_points(points: impl IntoIterator<Item = AnchorPoint>) -> Self {
        let mut set = Self::new();
        for p in points {
            set.add(p.x, p.y);
        }
        set
    }

    /// Insert a point, keeping the set ordered by `x`. A point with an `x`
    /// equal to existing ones lands after them.
    pub fn add(&mut self, x: f64, y: f64) {
        let idx = self.points.partition_point(|p| p.x <= x);
        self.points.insert(idx, AnchorPoint { x, y });
    }

    /// Remove and return the point closest to `(x, y)` after dividing the
    /// offsets by `scale`. Returns `None` when the set is empty.
    pub fn remove_nearest(&mut self, x: f64, y: f64, scale: Scale) -> Option<AnchorPoint> {
        let idx = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let dx = (p.x - x) / scale.x;
                let dy = (p.y - y) / scale.y;
                (i, dx * dx + dy * dy)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)?;
        Some(self.points.remove(idx))
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[AnchorPoint] {
        &self.points
    }

    /// Number of distinct `x` values.
    pub fn distinct_x(&self) -> usize {
        self.points
            .windows(2)
            .filter(|w| w[0].x != w[1].x)
            .count()
            + usize::from(!self.points.is_empty())
    }
}

// ---------------------------------------------------------------------------
// NormalizedSpectrum – flux divided by the fitted continuum
// ---------------------------------------------------------------------------

/// Result of dividing a spectrum by its continuum.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSpectrum {
    pub wavelength: Vec<f64>,
    pub flux: Vec<f64>,
}

impl NormalizedSpectrum {
    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    /// Samples whose normalized flux is `inf` or `NaN`.
    pub fn non_finite_count(&self) -> usize {
        self.flux.iter().filter(|v| !v.is_finite()).count()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelength.iter().copied().zip(self.flux.iter().copied())
    }
}
