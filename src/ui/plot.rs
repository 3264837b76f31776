use eframe::egui::Ui;
use egui_plot::{HLine, Legend, Line, LineStyle, MarkerShape, Plot, PlotPoints, Points};

use crate::color::SeriesColors;
use crate::session::{Event, Session};

// ---------------------------------------------------------------------------
// Spectrum plot (anchors + continuum overlay)
// ---------------------------------------------------------------------------

/// Render the original spectrum with anchors and the fitted continuum.
///
/// Primary clicks add an anchor at the pointer, secondary clicks remove the
/// nearest one; the resulting events are appended to `events`.
pub fn spectrum_plot(
    ui: &mut Ui,
    session: &Session,
    colors: &SeriesColors,
    height: f32,
    events: &mut Vec<Event>,
) {
    let spectrum = session.spectrum();

    let response = Plot::new("spectrum_plot")
        .legend(Legend::default())
        .height(height)
        .x_axis_label("Wavelength (Å)")
        .y_axis_label("Flux")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .allow_double_click_reset(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(finite_points(spectrum.points()))
                    .name("Spectrum")
                    .color(colors.spectrum)
                    .width(1.0),
            );

            if let Some(fit) = session.fit() {
                let curve = spectrum.wavelength.iter().copied().zip(fit.values.iter().copied());
                plot_ui.line(
                    Line::new(finite_points(curve))
                        .name("Continuum")
                        .color(colors.continuum)
                        .width(2.0),
                );
            }

            let anchors = session.anchors().points();
            if !anchors.is_empty() {
                let markers: PlotPoints = anchors.iter().map(|p| [p.x, p.y]).collect();
                plot_ui.points(
                    Points::new(markers)
                        .name("Anchors")
                        .shape(MarkerShape::Square)
                        .filled(true)
                        .radius(5.0)
                        .color(colors.anchors),
                );
            }
        });

    // the second half of a double click is not a new anchor
    let clicked = response.response.clicked() && !response.response.double_clicked();
    let secondary = response.response.secondary_clicked();
    if clicked || secondary {
        if let Some(pos) = response.response.interact_pointer_pos() {
            let at = response.transform.value_from_position(pos);
            events.push(if clicked {
                Event::AddPoint { x: at.x, y: at.y }
            } else {
                Event::RemovePoint { x: at.x, y: at.y }
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized plot
// ---------------------------------------------------------------------------

/// Render the normalized spectrum with a unity reference line. Shows a hint
/// instead while nothing has been normalized.
pub fn normalized_plot(ui: &mut Ui, session: &Session, colors: &SeriesColors) {
    let Some(normalized) = session.normalized() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Pick anchors, fit (Enter) and normalize (n) to see the result here.");
        });
        return;
    };

    Plot::new("normalized_plot")
        .legend(Legend::default())
        .x_axis_label("Wavelength (Å)")
        .y_axis_label("Normalized flux")
        .show(ui, |plot_ui| {
            plot_ui.hline(
                HLine::new(1.0)
                    .color(colors.reference)
                    .style(LineStyle::Dashed { length: 4.0 })
                    .name("Unity"),
            );
            plot_ui.line(
                Line::new(finite_points(normalized.points()))
                    .name("Normalized")
                    .color(colors.normalized)
                    .width(1.0),
            );
        });
}

/// Drop samples egui_plot cannot place (`inf`/`NaN`).
fn finite_points(points: impl Iterator<Item = (f64, f64)>) -> Vec<[f64; 2]> {
    points
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| [x, y])
        .collect()
}
