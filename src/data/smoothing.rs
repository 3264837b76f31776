use super::model::Spectrum;

/// Median flux of the samples whose wavelength lies within `window / 2` of
/// `x`. Falls back to the flux of the sample nearest in wavelength when the
/// window holds no sample. Returns `None` only for an empty spectrum.
pub fn median_flux_near(spectrum: &Spectrum, x: f64, window: f64) -> Option<f64> {
    let half = window.abs() / 2.0;
    let lo = spectrum.wavelength.partition_point(|&w| w < x - half);
    let hi = spectrum.wavelength.partition_point(|&w| w <= x + half);

    let mut in_window: Vec<f64> = spectrum.flux[lo..hi]
        .iter()
        .copied()
        .filter(|f| f.is_finite())
        .collect();
    if in_window.is_empty() {
        return nearest_flux(spectrum, x);
    }

    in_window.sort_by(f64::total_cmp);
    let mid = in_window.len() / 2;
    if in_window.len() % 2 == 0 {
        Some((in_window[mid - 1] + in_window[mid]) / 2.0)
    } else {
        Some(in_window[mid])
    }
}

/// Flux of the sample whose wavelength is closest to `x`.
pub fn nearest_flux(spectrum: &Spectrum, x: f64) -> Option<f64> {
    spectrum
        .points()
        .min_by(|a, b| (a.0 - x).abs().total_cmp(&(b.0 - x).abs()))
        .map(|(_, f)| f)
}
