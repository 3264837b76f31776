use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::{feedback_color, SeriesColors};
use crate::config::{AnchorY, Settings};
use crate::data::continuum::{Extrapolation, FitKind};
use crate::session::{Event, Feedback, Phase, Session};

const DEFAULT_MEDIAN_WINDOW: f64 = 10.0;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the menu bar, command buttons and the status message.
pub fn top_bar(ui: &mut Ui, session: &Session, status: Option<&Feedback>, events: &mut Vec<Event>) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            let normalized = session.normalized().is_some();
            if ui
                .add_enabled(normalized, egui::Button::new("Save normalized   (w)"))
                .clicked()
            {
                events.push(Event::Save);
                ui.close_menu();
            }
            if ui
                .add_enabled(normalized, egui::Button::new("Save normalized as…"))
                .clicked()
            {
                if let Some(path) = save_dialog(session) {
                    events.push(Event::SaveAs(path));
                }
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Export anchors…").clicked() {
                if let Some(path) = anchors_dialog("Export anchors").save_file() {
                    events.push(Event::ExportAnchors(path));
                }
                ui.close_menu();
            }
            if ui.button("Import anchors…").clicked() {
                if let Some(path) = anchors_dialog("Import anchors").pick_file() {
                    events.push(Event::ImportAnchors(path));
                }
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Quit   (q)").clicked() {
                events.push(Event::Quit);
                ui.close_menu();
            }
        });

        ui.separator();

        if ui.button("Fit ⏎").on_hover_text("Fit the continuum (Enter)").clicked() {
            events.push(Event::Fit);
        }
        if ui
            .add_enabled(session.fit().is_some(), egui::Button::new("Normalize"))
            .on_hover_text("Divide by the continuum (n)")
            .clicked()
        {
            events.push(Event::Normalize);
        }
        if ui.button("Reset").on_hover_text("Clear anchors and fit (r)").clicked() {
            events.push(Event::Reset);
        }

        ui.separator();
        ui.label(phase_label(session.phase()));

        if let Some(feedback) = status {
            ui.separator();
            ui.label(RichText::new(feedback.text()).color(feedback_color(feedback)));
        }
    });
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Click to add anchors",
        Phase::Selecting => "Selecting anchors",
        Phase::Fitted => "Continuum fitted",
        Phase::Normalized => "Normalized",
    }
}

// ---------------------------------------------------------------------------
// Left side panel – settings and anchor list
// ---------------------------------------------------------------------------

/// Render the settings editor and the anchor table.
pub fn side_panel(ui: &mut Ui, session: &Session, colors: &SeriesColors, events: &mut Vec<Event>) {
    let spectrum = session.spectrum();
    let (w0, w1) = spectrum.wavelength_range();
    ui.heading("Spectrum");
    ui.label(
        session
            .source()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    ui.label(format!("{} samples, {w0:.2} – {w1:.2} Å", spectrum.len()));
    ui.separator();

    ui.heading("Settings");
    let mut settings = session.settings().clone();
    settings_editor(ui, &mut settings);
    if &settings != session.settings() {
        events.push(Event::UpdateSettings(settings));
    }
    ui.separator();

    let anchors = session.anchors().points();
    let kind = session.settings().fit.kind;
    ui.heading(format!("Anchors ({})", anchors.len()));
    ui.label(format!(
        "{} distinct wavelengths, {} needs {}",
        session.anchors().distinct_x(),
        kind.label().to_lowercase(),
        kind.min_points()
    ));
    TableBuilder::new(ui)
        .striped(true)
        .auto_shrink([false, false])
        .column(Column::auto())
        .column(Column::auto().at_least(80.0))
        .column(Column::auto().at_least(60.0))
        .column(Column::remainder())
        .header(18.0, |mut header| {
            header.col(|ui| {
                ui.strong("#");
            });
            header.col(|ui| {
                ui.strong("λ");
            });
            header.col(|ui| {
                ui.strong("Flux");
            });
            header.col(|_| {});
        })
        .body(|mut body| {
            for (i, p) in anchors.iter().enumerate() {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(RichText::new(format!("{}", i + 1)).color(colors.anchors));
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.3}", p.x));
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.4}", p.y));
                    });
                    row.col(|ui| {
                        if ui.small_button("✕").on_hover_text("Remove").clicked() {
                            events.push(Event::RemovePoint { x: p.x, y: p.y });
                        }
                    });
                });
            }
        });
}

fn settings_editor(ui: &mut Ui, settings: &mut Settings) {
    egui::Grid::new("settings_grid")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("Fit");
            egui::ComboBox::from_id_salt("fit_kind")
                .selected_text(settings.fit.kind.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for kind in [FitKind::CubicSpline, FitKind::Linear] {
                        ui.selectable_value(&mut settings.fit.kind, kind, kind.label());
                    }
                });
            ui.end_row();

            ui.label("Outside anchors");
            egui::ComboBox::from_id_salt("extrapolation")
                .selected_text(settings.fit.extrapolation.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for ext in [Extrapolation::Natural, Extrapolation::Clamp] {
                        ui.selectable_value(&mut settings.fit.extrapolation, ext, ext.label());
                    }
                });
            ui.end_row();

            ui.label("Anchor flux");
            ui.horizontal(|ui: &mut Ui| {
                let mut median = matches!(settings.anchor_y, AnchorY::Median { .. });
                if ui.checkbox(&mut median, "Median").changed() {
                    settings.anchor_y = if median {
                        AnchorY::Median {
                            window: DEFAULT_MEDIAN_WINDOW,
                        }
                    } else {
                        AnchorY::Click
                    };
                }
                if let AnchorY::Median { window } = &mut settings.anchor_y {
                    ui.add(
                        egui::DragValue::new(window)
                            .speed(0.5)
                            .range(0.0..=10_000.0)
                            .suffix(" Å"),
                    );
                }
            });
            ui.end_row();

            ui.label("Output");
            ui.checkbox(&mut settings.export.header, "Header line");
            ui.end_row();

            ui.label("Decimals");
            ui.horizontal(|ui: &mut Ui| {
                let mut fixed = settings.export.precision.is_some();
                if ui.checkbox(&mut fixed, "Fixed").changed() {
                    settings.export.precision = fixed.then_some(6);
                }
                if let Some(precision) = &mut settings.export.precision {
                    ui.add(egui::DragValue::new(precision).range(0..=17));
                }
            });
            ui.end_row();
        });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn save_dialog(session: &Session) -> Option<std::path::PathBuf> {
    let default = session.output_path();
    let mut dialog = rfd::FileDialog::new()
        .set_title("Save normalized spectrum")
        .add_filter("Normalized spectrum", &["nspec"])
        .add_filter("Text", &["txt", "dat"]);
    if let Some(name) = default.file_name() {
        dialog = dialog.set_file_name(name.to_string_lossy());
    }
    if let Some(dir) = default.parent().filter(|d| !d.as_os_str().is_empty()) {
        dialog = dialog.set_directory(dir);
    }
    dialog.save_file()
}

fn anchors_dialog(title: &str) -> rfd::FileDialog {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Anchor list", &["json"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Spectrum;
    use std::path::PathBuf;

    fn side_panel_events(session: &Session) -> Vec<Event> {
        let ctx = egui::Context::default();
        let colors = SeriesColors::default();
        let mut events = Vec::new();
        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                egui::SidePanel::left("side_panel").show(ctx, |ui| {
                    side_panel(ui, session, &colors, &mut events);
                });
            });
        }
        events
    }

    #[test]
    fn idle_side_panel_emits_nothing() {
        let spectrum = Spectrum {
            wavelength: (0..200).map(|i| 5000.0 + i as f64).collect(),
            flux: vec![1.0; 200],
        };
        let mut session = Session::new(PathBuf::from("star.txt"), spectrum, Settings::default());
        for i in 0..60 {
            session.handle(Event::AddPoint {
                x: 5000.0 + i as f64 * 3.0,
                y: 1.0,
            });
        }
        assert!(side_panel_events(&session).is_empty());
    }

    #[test]
    fn phase_labels_are_distinct() {
        let labels = [Phase::Idle, Phase::Selecting, Phase::Fitted, Phase::Normalized].map(phase_label);
        for (i, a) in labels.iter().enumerate() {
            assert!(labels[i + 1..].iter().all(|b| a != b));
        }
    }
}
