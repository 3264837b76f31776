use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{AnchorY, Settings};
use crate::data::continuum::{ContinuumFit, FitError};
use crate::data::export::{self, ExportError};
use crate::data::model::{AnchorSet, NormalizedSpectrum, Scale, Spectrum};
use crate::data::normalize::normalize;
use crate::data::smoothing::median_flux_near;

// ---------------------------------------------------------------------------
// Events and their outcome
// ---------------------------------------------------------------------------

/// Input to the session, in plot (wavelength, flux) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    AddPoint { x: f64, y: f64 },
    RemovePoint { x: f64, y: f64 },
    Fit,
    Normalize,
    Reset,
    /// Write the normalized spectrum next to the input file.
    Save,
    SaveAs(PathBuf),
    ExportAnchors(PathBuf),
    ImportAnchors(PathBuf),
    UpdateSettings(Settings),
    Quit,
}

/// Which part of the display changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Redraw {
    #[default]
    Nothing,
    /// Anchor markers changed; any continuum overlay is gone.
    Markers,
    Continuum,
    Normalized,
    /// Back to the bare original spectrum.
    Original,
}

/// Message for the status bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Info(String),
    Warning(String),
    Error(String),
}

impl Feedback {
    pub fn text(&self) -> &str {
        match self {
            Feedback::Info(s) | Feedback::Warning(s) | Feedback::Error(s) => s,
        }
    }
}

/// What a single event did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outcome {
    pub redraw: Redraw,
    pub feedback: Option<Feedback>,
    pub quit: bool,
}

impl Outcome {
    fn redraw(redraw: Redraw) -> Self {
        Self {
            redraw,
            ..Default::default()
        }
    }

    fn with(mut self, feedback: Feedback) -> Self {
        self.feedback = Some(feedback);
        self
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Fit(#[from] FitError),

    /// The command needs state that does not exist yet.
    #[error("{0}")]
    EmptySelection(&'static str),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl SessionError {
    fn feedback(&self) -> Feedback {
        match self {
            SessionError::Fit(_) | SessionError::EmptySelection(_) => {
                Feedback::Warning(self.to_string())
            }
            SessionError::Export(_) => Feedback::Error(self.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Where the session is in the select → fit → normalize cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Selecting,
    Fitted,
    Normalized,
}

/// Everything one normalization session works on. The spectrum is fixed;
/// anchors, fit and normalized spectrum each derive from the previous one
/// and are dropped whenever something upstream changes.
pub struct Session {
    source: PathBuf,
    spectrum: Spectrum,
    scale: Scale,
    anchors: AnchorSet,
    fit: Option<ContinuumFit>,
    normalized: Option<NormalizedSpectrum>,
    settings: Settings,
}

impl Session {
    pub fn new(source: PathBuf, spectrum: Spectrum, settings: Settings) -> Self {
        Self {
            source,
            scale: Scale::from_spectrum(&spectrum),
            spectrum,
            anchors: AnchorSet::new(),
            fit: None,
            normalized: None,
            settings,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn anchors(&self) -> &AnchorSet {
        &self.anchors
    }

    pub fn fit(&self) -> Option<&ContinuumFit> {
        self.fit.as_ref()
    }

    pub fn normalized(&self) -> Option<&NormalizedSpectrum> {
        self.normalized.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Default destination of [`Event::Save`].
    pub fn output_path(&self) -> PathBuf {
        export::output_path(&self.source)
    }

    pub fn phase(&self) -> Phase {
        match (&self.normalized, &self.fit) {
            (Some(_), _) => Phase::Normalized,
            (None, Some(_)) => Phase::Fitted,
            (None, None) if self.anchors.is_empty() => Phase::Idle,
            (None, None) => Phase::Selecting,
        }
    }

    /// Apply one event. Recoverable failures leave the state untouched and
    /// come back as feedback; nothing here panics or ends the session except
    /// [`Event::Quit`].
    pub fn handle(&mut self, event: Event) -> Outcome {
        log::debug!("{:?} <- {event:?}", self.phase());
        let result = match event {
            Event::AddPoint { x, y } => Ok(self.add_point(x, y)),
            Event::RemovePoint { x, y } => self.remove_point(x, y),
            Event::Fit => self.fit_continuum(),
            Event::Normalize => self.normalize(),
            Event::Reset => Ok(self.reset()),
            Event::Save => self.save(&self.output_path()),
            Event::SaveAs(path) => self.save(&path),
            Event::ExportAnchors(path) => self.export_anchors(&path),
            Event::ImportAnchors(path) => self.import_anchors(&path),
            Event::UpdateSettings(settings) => Ok(self.update_settings(settings)),
            Event::Quit => Ok(Outcome {
                quit: true,
                ..Default::default()
            }),
        };
        result.unwrap_or_else(|e| {
            log::warn!("{e}");
            Outcome::default().with(e.feedback())
        })
    }

    fn invalidate(&mut self) {
        self.fit = None;
        self.normalized = None;
    }

    fn add_point(&mut self, x: f64, y: f64) -> Outcome {
        let y = match self.settings.anchor_y {
            AnchorY::Click => y,
            AnchorY::Median { window } => median_flux_near(&self.spectrum, x, window).unwrap_or(y),
        };
        self.anchors.add(x, y);
        self.invalidate();
        Outcome::redraw(Redraw::Markers)
            .with(Feedback::Info(format!("Anchor at {x:.3}, {y:.4} ({} total)", self.anchors.len())))
    }

    fn remove_point(&mut self, x: f64, y: f64) -> Result<Outcome, SessionError> {
        let removed = self
            .anchors
            .remove_nearest(x, y, self.scale)
            .ok_or(SessionError::EmptySelection("no anchor point to remove"))?;
        self.invalidate();
        Ok(Outcome::redraw(Redraw::Markers).with(Feedback::Info(format!(
            "Removed anchor at {:.3}, {:.4}",
            removed.x, removed.y
        ))))
    }

    fn fit_continuum(&mut self) -> Result<Outcome, SessionError> {
        let fitter = self.settings.fitter();
        let fit = fitter.fit(&self.anchors, &self.spectrum.wavelength)?;
        let message = format!(
            "{} continuum fitted through {} anchors",
            fitter.kind.label(),
            fit.knot_count()
        );
        log::info!("{message}");
        self.fit = Some(fit);
        self.normalized = None;
        Ok(Outcome::redraw(Redraw::Continuum).with(Feedback::Info(message)))
    }

    fn normalize(&mut self) -> Result<Outcome, SessionError> {
        let fit = self.fit.as_ref().ok_or(SessionError::EmptySelection(
            "fit the continuum first (Enter)",
        ))?;
        let normalized = normalize(&self.spectrum, fit);
        let bad = normalized.non_finite_count();
        self.normalized = Some(normalized);

        let outcome = Outcome::redraw(Redraw::Normalized);
        if bad > 0 {
            log::warn!("{bad} samples divided by a zero continuum");
            Ok(outcome.with(Feedback::Warning(format!(
                "Normalized; {bad} samples are inf/NaN where the continuum is zero"
            ))))
        } else {
            Ok(outcome.with(Feedback::Info("Spectrum normalized".to_string())))
        }
    }

    fn reset(&mut self) -> Outcome {
        self.anchors.clear();
        self.invalidate();
        Outcome::redraw(Redraw::Original).with(Feedback::Info("Reset to the original spectrum".into()))
    }

    fn save(&self, path: &Path) -> Result<Outcome, SessionError> {
        let normalized = self.normalized.as_ref().ok_or(SessionError::EmptySelection(
            "normalize the spectrum first (n)",
        ))?;
        export::write_normalized(path, normalized, self.settings.export_format())?;
        Ok(Outcome::default().with(Feedback::Info(format!("Saved {}", path.display()))))
    }

    fn export_anchors(&self, path: &Path) -> Result<Outcome, SessionError> {
        if self.anchors.is_empty() {
            return Err(SessionError::EmptySelection("no anchor points to export"));
        }
        export::write_anchors(path, &self.anchors)?;
        Ok(Outcome::default().with(Feedback::Info(format!(
            "Exported {} anchors to {}",
            self.anchors.len(),
            path.display()
        ))))
    }

    fn import_anchors(&mut self, path: &Path) -> Result<Outcome, SessionError> {
        self.anchors = export::read_anchors(path)?;
        self.invalidate();
        Ok(Outcome::redraw(Redraw::Markers).with(Feedback::Info(format!(
            "Imported {} anchors from {}",
            self.anchors.len(),
            path.display()
        ))))
    }

    fn update_settings(&mut self, settings: Settings) -> Outcome {
        let refit = settings.fit != self.settings.fit;
        self.settings = settings;
        if refit && self.fit.is_some() {
            self.invalidate();
            return Outcome::redraw(Redraw::Markers)
                .with(Feedback::Info("Fit settings changed; fit again (Enter)".into()));
        }
        Outcome::default()
    }
}
