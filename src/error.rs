use std::path::PathBuf;

use thiserror::Error;

/// Failures of the text-to-scenes split. Both variants are shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("Invalid input: text must be a non-empty string")]
    InvalidInput,

    #[error("No valid scenes found in the input text")]
    NoScenesFound,
}

/// Raised inside the storage adapter only. Callers of `RecordStore` never see it.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored collection is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("export filename must not be empty")]
    EmptyFilename,

    #[error("failed to save {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value in {path}: {message}")]
    Invalid { path: String, message: String },
}

/// Anything a user-triggered action can fail with.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
