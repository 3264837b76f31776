use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::model::{AnchorPoint, AnchorSet, NormalizedSpectrum};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("writing {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("anchors in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Layout options for the normalized output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportFormat {
    /// Emit a `# wavelength normalized_flux` first line.
    pub header: bool,
    /// Fixed decimals; `None` writes the shortest exact representation.
    pub precision: Option<usize>,
}

/// `HD50230.txt` → `HD50230.nspec`.
///
/// An input that is already `.nspec` gets `.norm.nspec` so the source is never
/// overwritten.
pub fn output_path(input: &Path) -> PathBuf {
    let out = input.with_extension("nspec");
    if out == input {
        input.with_extension("norm.nspec")
    } else {
        out
    }
}

/// Write `wavelength flux` rows to `path`.
///
/// Rows go to a temporary sibling first which is renamed over `path` once
/// complete, so a failed write leaves no partial file behind.
pub fn write_normalized(
    path: &Path,
    spectrum: &NormalizedSpectrum,
    format: ExportFormat,
) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let tmp = temp_sibling(path);

    let result = write_rows(&tmp, spectrum, format).and_then(|()| {
        std::fs::rename(&tmp, path).map_err(io_err)
    });
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result?;

    log::info!("Wrote {} normalized samples to {}", spectrum.len(), path.display());
    Ok(())
}

fn write_rows(
    tmp: &Path,
    spectrum: &NormalizedSpectrum,
    format: ExportFormat,
) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: tmp.to_path_buf(),
        source,
    };
    let csv_err = |source| ExportError::Csv {
        path: tmp.to_path_buf(),
        source,
    };

    let mut out = BufWriter::new(File::create(tmp).map_err(io_err)?);
    if format.header {
        writeln!(out, "# wavelength normalized_flux").map_err(io_err)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_writer(out);
    for (w, f) in spectrum.points() {
        writer
            .write_record([format_value(w, format.precision), format_value(f, format.precision)])
            .map_err(csv_err)?;
    }
    let out = writer
        .into_inner()
        .map_err(|e| io_err(io::Error::new(io::ErrorKind::Other, e.to_string())))?;
    out.into_inner()
        .map_err(|e| io_err(e.into_error()))?
        .sync_all()
        .map_err(io_err)
}

fn format_value(v: f64, precision: Option<usize>) -> String {
    match precision {
        Some(p) if v.is_finite() => format!("{v:.p$}"),
        _ => v.to_string(),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Anchor sets as JSON
// ---------------------------------------------------------------------------

pub fn write_anchors(path: &Path, anchors: &AnchorSet) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(anchors).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_anchors(path: &Path) -> Result<AnchorSet, ExportError> {
    let text = std::fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let points: Vec<AnchorPoint> =
        serde_json::from_str(&text).map_err(|source| ExportError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(AnchorSet::from_points(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_file;
    use approx::assert_abs_diff_eq;

    fn normalized() -> NormalizedSpectrum {
        NormalizedSpectrum {
            wavelength: vec![5000.0, 5001.25, 5002.5],
            flux: vec![1.0, 0.9523809523809523, 1.0476190476190477],
        }
    }

    #[test]
    fn output_path_replaces_extension() {
        assert_eq!(output_path(Path::new("data/HD50230.txt")), PathBuf::from("data/HD50230.nspec"));
        assert_eq!(output_path(Path::new("spectrum")), PathBuf::from("spectrum.nspec"));
    }

    #[test]
    fn output_path_never_equals_nspec_input() {
        let input = Path::new("data/HD50230.nspec");
        assert_eq!(output_path(input), PathBuf::from("data/HD50230.norm.nspec"));
        assert_ne!(output_path(input), input);
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nspec");
        let norm = normalized();
        write_normalized(&path, &norm, ExportFormat::default()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(text.lines().next(), Some("5000 1"));

        let back = load_file(&path).unwrap();
        assert_eq!(back.wavelength, norm.wavelength);
        for (a, b) in back.flux.iter().zip(&norm.flux) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
        assert!(!dir.path().join("out.nspec.tmp").exists());
    }

    #[test]
    fn header_and_precision_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nspec");
        let format = ExportFormat {
            header: true,
            precision: Some(6),
        };
        write_normalized(&path, &normalized(), format).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# wavelength normalized_flux");
        assert_eq!(lines[1], "5000.000000 1.000000");
        assert_eq!(lines[2], "5001.250000 0.952381");

        // the header is a comment for the loader
        assert_eq!(load_file(&path).unwrap().len(), 3);
    }

    #[test]
    fn non_finite_values_are_written_literally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nan.nspec");
        let norm = NormalizedSpectrum {
            wavelength: vec![1.0, 2.0],
            flux: vec![f64::NAN, f64::INFINITY],
        };
        write_normalized(&path, &norm, ExportFormat { header: false, precision: Some(3) }).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "1.000 NaN\n2.000 inf\n");
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("out.nspec");
        assert!(write_normalized(&path, &normalized(), ExportFormat::default()).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn anchors_round_trip_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anchors.json");
        let set = AnchorSet::from_points([
            AnchorPoint { x: 5003.0, y: 1.0 },
            AnchorPoint { x: 5000.0, y: 0.98 },
        ]);
        write_anchors(&path, &set).unwrap();
        assert_eq!(read_anchors(&path).unwrap(), set);
    }

    #[test]
    fn unsorted_anchor_file_is_sorted_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anchors.json");
        std::fs::write(&path, r#"[{"x": 3.0, "y": 1.0}, {"x": 1.0, "y": 2.0}]"#).unwrap();
        let set = read_anchors(&path).unwrap();
        assert_eq!(set.points()[0], AnchorPoint { x: 1.0, y: 2.0 });
    }

    #[test]
    fn malformed_anchor_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anchors.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(read_anchors(&path), Err(ExportError::Json { .. })));
    }
}
