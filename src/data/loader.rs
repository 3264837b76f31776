use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::model::Spectrum;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("{} contains no samples", path.display())]
    Empty { path: PathBuf },
}

impl LoadError {
    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    fn parse(path: &Path, line: usize, reason: impl Into<String>) -> Self {
        LoadError::Parse {
            path: path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a spectrum from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`    – header-less `wavelength,flux` rows
/// * anything else – whitespace-separated `wavelength flux` columns
///
/// In both, extra columns are ignored and `#` starts a comment line.
pub fn load_file(path: &Path) -> Result<Spectrum, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let spectrum = match ext.as_str() {
        "csv" => load_csv(path)?,
        _ => load_columns(path)?,
    };
    log::info!(
        "Loaded {} samples from {} ({:.2} – {:.2})",
        spectrum.len(),
        path.display(),
        spectrum.wavelength_range().0,
        spectrum.wavelength_range().1
    );
    Ok(spectrum)
}

// ---------------------------------------------------------------------------
// Whitespace-separated columns
// ---------------------------------------------------------------------------

fn load_columns(path: &Path) -> Result<Spectrum, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    parse_columns(path, &text)
}

/// Parse two-column text. `path` only labels errors.
pub fn parse_columns(path: &Path, text: &str) -> Result<Spectrum, LoadError> {
    let mut builder = SpectrumBuilder::new(path);
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        builder.push_fields(i + 1, fields.next(), fields.next())?;
    }
    builder.finish()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Spectrum, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let mut builder = SpectrumBuilder::new(path);
    for result in reader.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        if record.iter().all(str::is_empty) {
            continue;
        }
        builder.push_fields(line, record.get(0), record.get(1))?;
    }
    builder.finish()
}

fn csv_error(path: &Path, err: csv::Error) -> LoadError {
    let line = err.position().map_or(0, |p| p.line() as usize);
    match err.into_kind() {
        csv::ErrorKind::Io(e) => LoadError::io(path, e),
        other => LoadError::parse(path, line, format!("{other:?}")),
    }
}

// ---------------------------------------------------------------------------
// Shared row validation
// ---------------------------------------------------------------------------

struct SpectrumBuilder<'a> {
    path: &'a Path,
    wavelength: Vec<f64>,
    flux: Vec<f64>,
}

impl<'a> SpectrumBuilder<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            wavelength: Vec::new(),
            flux: Vec::new(),
        }
    }

    fn push_fields(
        &mut self,
        line: usize,
        wavelength: Option<&str>,
        flux: Option<&str>,
    ) -> Result<(), LoadError> {
        let (Some(w), Some(f)) = (wavelength, flux) else {
            return Err(LoadError::parse(
                self.path,
                line,
                "expected two columns (wavelength flux)",
            ));
        };
        let w = self.number(line, "wavelength", w)?;
        let f = self.number(line, "flux", f)?;

        if !w.is_finite() {
            return Err(LoadError::parse(self.path, line, format!("wavelength {w} is not finite")));
        }
        if let Some(&prev) = self.wavelength.last() {
            if w < prev {
                return Err(LoadError::parse(
                    self.path,
                    line,
                    format!("wavelength {w} is smaller than the previous {prev}"),
                ));
            }
        }
        self.wavelength.push(w);
        self.flux.push(f);
        Ok(())
    }

    fn number(&self, line: usize, column: &str, token: &str) -> Result<f64, LoadError> {
        token
            .parse::<f64>()
            .map_err(|_| LoadError::parse(self.path, line, format!("{column} '{token}' is not a number")))
    }

    fn finish(self) -> Result<Spectrum, LoadError> {
        if self.wavelength.is_empty() {
            return Err(LoadError::Empty {
                path: self.path.to_path_buf(),
            });
        }
        Ok(Spectrum {
            wavelength: self.wavelength,
            flux: self.flux,
        })
    }
}
