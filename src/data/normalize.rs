use super::continuum::ContinuumFit;
use super::model::{NormalizedSpectrum, Spectrum};

/// Divide every flux sample by the continuum at its wavelength.
///
/// A zero continuum gives `inf` or `NaN` by plain IEEE division; callers can
/// detect this with [`NormalizedSpectrum::non_finite_count`].
pub fn normalize(spectrum: &Spectrum, fit: &ContinuumFit) -> NormalizedSpectrum {
    let flux = spectrum
        .flux
        .iter()
        .zip(&fit.values)
        .map(|(f, c)| f / c)
        .collect();
    NormalizedSpectrum {
        wavelength: spectrum.wavelength.clone(),
        flux,
    }
}
