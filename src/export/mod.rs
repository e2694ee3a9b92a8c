pub mod csv;
pub mod download;

pub use download::{DirectoryExporter, ExportBlob, ExportSink};
