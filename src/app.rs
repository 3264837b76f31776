use std::collections::VecDeque;

use eframe::egui;

use crate::color::SeriesColors;
use crate::session::{Event, Feedback, Redraw, Session};
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ContinuumApp {
    session: Session,
    colors: SeriesColors,
    /// Events waiting for dispatch, oldest first.
    queue: VecDeque<Event>,
    /// Last message worth showing in the status bar.
    status: Option<Feedback>,
}

impl ContinuumApp {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            colors: SeriesColors::default(),
            queue: VecDeque::new(),
            status: None,
        }
    }

    /// Queue the command bound to each key pressed this frame.
    fn collect_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let pressed: Vec<Event> = ctx.input(|i| {
            KEY_BINDINGS
                .iter()
                .filter(|(key, _)| i.key_pressed(*key))
                .filter_map(|(key, _)| key_event(*key))
                .collect()
        });
        self.queue.extend(pressed);
    }

    /// Feed queued events to the session one at a time, in order.
    fn dispatch(&mut self, ctx: &egui::Context) {
        while let Some(event) = self.queue.pop_front() {
            let outcome = self.session.handle(event);
            if let Some(feedback) = outcome.feedback {
                self.status = Some(feedback);
            }
            if outcome.redraw != Redraw::Nothing {
                ctx.request_repaint();
            }
            if outcome.quit {
                log::info!("Quit requested");
                self.queue.clear();
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }
}

static KEY_BINDINGS: [(egui::Key, &str); 5] = [
    (egui::Key::Enter, "fit continuum"),
    (egui::Key::N, "normalize"),
    (egui::Key::R, "reset"),
    (egui::Key::W, "write normalized spectrum"),
    (egui::Key::Q, "quit"),
];

/// Keyboard command surface.
pub fn key_event(key: egui::Key) -> Option<Event> {
    match key {
        egui::Key::Enter => Some(Event::Fit),
        egui::Key::N => Some(Event::Normalize),
        egui::Key::R => Some(Event::Reset),
        egui::Key::W => Some(Event::Save),
        egui::Key::Q => Some(Event::Quit),
        _ => None,
    }
}

/// Usage lines logged at startup.
pub fn usage() -> impl Iterator<Item = String> {
    ["left click: add anchor", "right click: remove nearest anchor"]
        .into_iter()
        .map(str::to_string)
        .chain(
            KEY_BINDINGS
                .iter()
                .map(|(key, action)| format!("{}: {action}", key.name())),
        )
}

impl eframe::App for ContinuumApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut events = Vec::new();

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.session, self.status.as_ref(), &mut events);
        });

        // ---- Left side panel: settings + anchors ----
        egui::SidePanel::left("side_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.session, &self.colors, &mut events);
            });

        // ---- Central panel: spectrum on top, normalized below ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let height = ui.available_height() * 0.6;
            plot::spectrum_plot(ui, &self.session, &self.colors, height, &mut events);
            ui.separator();
            plot::normalized_plot(ui, &self.session, &self.colors);
        });

        self.queue.extend(events);
        self.collect_keys(ctx);
        self.dispatch(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::data::model::Spectrum;
    use crate::session::Phase;
    use std::path::PathBuf;

    fn app() -> ContinuumApp {
        let spectrum = Spectrum {
            wavelength: vec![5000.0, 5001.0, 5002.0, 5003.0],
            flux: vec![1.0, 1.1, 0.95, 1.05],
        };
        ContinuumApp::new(Session::new(PathBuf::from("star.txt"), spectrum, Settings::default()))
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(key_event(egui::Key::Enter), Some(Event::Fit));
        assert_eq!(key_event(egui::Key::N), Some(Event::Normalize));
        assert_eq!(key_event(egui::Key::R), Some(Event::Reset));
        assert_eq!(key_event(egui::Key::W), Some(Event::Save));
        assert_eq!(key_event(egui::Key::Q), Some(Event::Quit));
        assert_eq!(key_event(egui::Key::A), None);
        assert!(KEY_BINDINGS.iter().all(|(k, _)| key_event(*k).is_some()));
    }

    #[test]
    fn queue_is_drained_in_order() {
        let ctx = egui::Context::default();
        let mut app = app();
        app.queue.extend([
            Event::AddPoint { x: 5000.0, y: 1.0 },
            Event::AddPoint { x: 5001.0, y: 1.0 },
            Event::AddPoint { x: 5002.0, y: 1.0 },
            Event::AddPoint { x: 5003.0, y: 1.0 },
            Event::Fit,
            Event::Normalize,
        ]);
        app.dispatch(&ctx);
        assert!(app.queue.is_empty());
        assert_eq!(app.session.phase(), Phase::Normalized);
        assert!(matches!(app.status, Some(Feedback::Info(_))));
    }

    fn key(key: egui::Key) -> egui::Event {
        egui::Event::Key {
            key,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers: egui::Modifiers::NONE,
        }
    }

    /// One frame with `key` pressed, optionally while a text field holds focus.
    fn press(app: &mut ContinuumApp, ctx: &egui::Context, pressed: egui::Key, focused: bool) {
        let raw = egui::RawInput {
            events: vec![key(pressed)],
            ..Default::default()
        };
        let _ = ctx.run(raw, |ctx| {
            if focused {
                ctx.memory_mut(|m| m.request_focus(egui::Id::new("window_field")));
            }
            app.collect_keys(ctx);
        });
        app.dispatch(ctx);
    }

    fn with_four_anchors() -> ContinuumApp {
        let mut app = app();
        for x in [5000.0, 5001.0, 5002.0, 5003.0] {
            app.session.handle(Event::AddPoint { x, y: 1.0 });
        }
        app
    }

    #[test]
    fn pressed_keys_drive_the_session() {
        let ctx = egui::Context::default();
        let mut app = with_four_anchors();
        press(&mut app, &ctx, egui::Key::Enter, false);
        assert_eq!(app.session.phase(), Phase::Fitted);
        press(&mut app, &ctx, egui::Key::N, false);
        assert_eq!(app.session.phase(), Phase::Normalized);
        press(&mut app, &ctx, egui::Key::R, false);
        assert_eq!(app.session.phase(), Phase::Idle);
    }

    #[test]
    fn keys_are_ignored_while_a_field_has_focus() {
        let ctx = egui::Context::default();
        let mut app = with_four_anchors();
        press(&mut app, &ctx, egui::Key::Enter, true);
        assert_eq!(app.session.phase(), Phase::Selecting);
        assert!(app.status.is_none());
    }

    #[test]
    fn warnings_land_in_status_and_keep_state() {
        let ctx = egui::Context::default();
        let mut app = app();
        app.queue.push_back(Event::Normalize);
        app.dispatch(&ctx);
        assert!(matches!(app.status, Some(Feedback::Warning(_))));
        assert_eq!(app.session.phase(), Phase::Idle);
    }

    #[test]
    fn quit_discards_remaining_events() {
        let ctx = egui::Context::default();
        let mut app = app();
        app.queue.extend([Event::Quit, Event::AddPoint { x: 5000.0, y: 1.0 }]);
        app.dispatch(&ctx);
        assert!(app.queue.is_empty());
        assert!(app.session.anchors().is_empty());
    }

    #[test]
    fn usage_lists_every_binding() {
        let lines: Vec<String> = usage().collect();
        assert_eq!(lines.len(), 2 + KEY_BINDINGS.len());
        assert!(lines.iter().any(|l| l.ends_with("quit")));
    }
}
