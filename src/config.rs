use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::continuum::{ContinuumFitter, Extrapolation, FitKind};
use crate::data::export::ExportFormat;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// How the flux of a new anchor is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnchorY {
    /// Use the clicked flux as-is.
    #[default]
    Click,
    /// Median flux of the samples within `window` (wavelength units) of the
    /// clicked wavelength.
    Median { window: f64 },
}

/// User-tunable options, loadable from a JSON file. Missing keys keep their
/// defaults, e.g. `{"fit": {"kind": "linear"}}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fit: FitSettings,
    pub anchor_y: AnchorY,
    pub export: ExportSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FitSettings {
    pub kind: FitKind,
    pub extrapolation: Extrapolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub header: bool,
    pub precision: Option<usize>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&text)
            .with_context(|| format!("parsing settings file {}", path.display()))?;
        log::info!("Loaded settings from {}: {settings:?}", path.display());
        Ok(settings)
    }

    pub fn fitter(&self) -> ContinuumFitter {
        ContinuumFitter::new(self.fit.kind, self.fit.extrapolation)
    }

    pub fn export_format(&self) -> ExportFormat {
        ExportFormat {
            header: self.export.header,
            precision: self.export.precision,
        }
    }
}
