use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ExportError;
use crate::export::csv::{self, MIME_TYPE};
use crate::types::storyboard::Scene;

/// A finished document ready to be handed to an [`ExportSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBlob {
    pub content: String,
    pub mime: &'static str,
}

impl ExportBlob {
    pub fn csv(scenes: &[Scene]) -> Self {
        Self {
            content: csv::serialize(scenes),
            mime: MIME_TYPE,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }
}

/// One-shot save of a finished blob.
pub trait ExportSink {
    /// Saves `blob` under `filename` and returns where it landed.
    fn trigger_download(&self, blob: &ExportBlob, filename: &str) -> Result<PathBuf, ExportError>;
}

/// Saves exports as files inside a fixed directory.
#[derive(Debug, Clone)]
pub struct DirectoryExporter {
    dir: PathBuf,
}

impl DirectoryExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirectoryExporter {
    fn trigger_download(&self, blob: &ExportBlob, filename: &str) -> Result<PathBuf, ExportError> {
        // only the final component is honoured, the file always lands in `dir`
        let name = Path::new(filename.trim())
            .file_name()
            .ok_or(ExportError::EmptyFilename)?;
        let path = self.dir.join(name);

        fs::create_dir_all(&self.dir).map_err(|source| ExportError::Io {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, blob.as_bytes()).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), mime = blob.mime, bytes = blob.content.len(), "export saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::segment;
    use assert_matches::assert_matches;

    #[test]
    fn writes_blob_bytes_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DirectoryExporter::new(dir.path().join("exports"));
        let blob = ExportBlob::csv(&segment("এক।দুই").unwrap());

        let path = exporter.trigger_download(&blob, csv::DEFAULT_FILENAME).unwrap();

        assert_eq!(path, dir.path().join("exports").join("script_breakdown.csv"));
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(bytes, blob.as_bytes());
        assert_eq!(blob.mime, "text/csv; charset=utf-8");
    }

    #[test]
    fn strips_directories_from_filename() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DirectoryExporter::new(dir.path());
        let blob = ExportBlob::csv(&segment("x").unwrap());

        let path = exporter.trigger_download(&blob, "../elsewhere/out.csv").unwrap();
        assert_eq!(path, dir.path().join("out.csv"));
    }

    #[test]
    fn rejects_empty_filename() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DirectoryExporter::new(dir.path());
        let blob = ExportBlob::csv(&segment("x").unwrap());

        assert_matches!(
            exporter.trigger_download(&blob, "  "),
            Err(ExportError::EmptyFilename)
        );
        assert_matches!(
            exporter.trigger_download(&blob, ".."),
            Err(ExportError::EmptyFilename)
        );
    }
}
