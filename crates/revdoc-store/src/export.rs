//! Export boundary - rendering the published text into a derived artifact.
//!
//! Exporters only ever see the published text, never the draft.

use crate::error::ExportError;
use std::fs;
use std::path::{Path, PathBuf};

/// Renders published text into an output artifact.
pub trait Exporter {
    /// Extension of the produced file, without the dot.
    fn extension(&self) -> &str;

    fn export(&self, published: &str) -> Result<Vec<u8>, ExportError>;
}

/// Writes the published text unchanged as UTF-8.
#[derive(Clone, Debug, Default)]
pub struct PlainTextExporter;

impl Exporter for PlainTextExporter {
    fn extension(&self) -> &str {
        "txt"
    }

    fn export(&self, published: &str) -> Result<Vec<u8>, ExportError> {
        Ok(published.as_bytes().to_vec())
    }
}

/// Output name for an entry: a trailing `.<source_extension>` is replaced by
/// `.<target_extension>`.
///
/// `export_path("chapters/intro.tex", "tex", "pdf") == "chapters/intro.pdf"`
pub fn export_path(entry_path: &str, source_extension: &str, target_extension: &str) -> String {
    let suffix = format!(".{}", source_extension);
    let stem = entry_path.strip_suffix(suffix.as_str()).unwrap_or(entry_path);
    format!("{}.{}", stem, target_extension)
}

/// Run `exporter` on `published` and write the result under `build_dir`.
///
/// Parent directories are created as needed. Returns the written path.
pub fn export_to_dir<E: Exporter + ?Sized>(
    exporter: &E,
    published: &str,
    build_dir: &Path,
    entry_path: &str,
    source_extension: &str,
) -> Result<PathBuf, ExportError> {
    let relative = export_path(entry_path, source_extension, exporter.extension());
    let output = build_dir.join(relative);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    let bytes = exporter.export(published)?;
    fs::write(&output, bytes)?;
    tracing::info!(path = %output.display(), "Exported published text");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_path() {
        assert_eq!(export_path("chapters/intro.tex", "tex", "pdf"), "chapters/intro.pdf");
        assert_eq!(export_path("notes", "tex", "pdf"), "notes.pdf");
        assert_eq!(export_path("a.tex.bak", "tex", "txt"), "a.tex.bak.txt");
    }

    #[test]
    fn test_export_to_dir_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_to_dir(
            &PlainTextExporter,
            "published",
            dir.path(),
            "deep/nested/doc.tex",
            "tex",
        )
        .unwrap();

        assert_eq!(path, dir.path().join("deep/nested/doc.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "published");
    }
}
