use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::geometry::GeometryError;
use crate::split::SplitReport;

/// The main error type for yoloprep operations.
#[derive(Debug, Error)]
pub enum YoloprepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse label file {path} at line {line}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid geometry in {path} at line {line}: {source}")]
    Geometry {
        path: PathBuf,
        line: usize,
        #[source]
        source: GeometryError,
    },

    #[error("Failed to write label file {path}: {source}")]
    LabelWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dataset layout at {path}: {message}")]
    SourceLayout { path: PathBuf, message: String },

    #[error("Source file not found: {path}")]
    MissingSource { path: PathBuf },

    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to transfer {from} to {to}: {source}")]
    Transfer {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid split policy: {message}")]
    InvalidSplitPolicy { message: String },

    #[error("No images found in {path}")]
    EmptySource { path: PathBuf },

    #[error("Invalid convert parameters: {message}")]
    InvalidConvertParams { message: String },

    #[error("Split halted: destination already exists: {path}")]
    SplitConflict {
        path: PathBuf,
        report: Box<SplitReport>,
    },

    #[error("{failed} of {total} file(s) failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("Failed to write dataset descriptor {path}: {source}")]
    DatasetYamlWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize report: {0}")]
    ReportSerialize(#[from] serde_json::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Coarse classification of failures, used in per-file failure summaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed label line; aborts that file only.
    Format,
    /// Degenerate or out-of-range geometry; skips that record only.
    Geometry,
    /// Missing paths, permissions, disk errors, conflicts.
    Io,
    /// Invalid invocation; fatal, nothing is written.
    Policy,
}

impl YoloprepError {
    /// Which of the four failure classes this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            YoloprepError::LabelParse { .. } => ErrorKind::Format,
            YoloprepError::Geometry { .. } => ErrorKind::Geometry,
            YoloprepError::InvalidSplitPolicy { .. }
            | YoloprepError::EmptySource { .. }
            | YoloprepError::InvalidConvertParams { .. }
            | YoloprepError::Cancelled => ErrorKind::Policy,
            YoloprepError::Io(_)
            | YoloprepError::LabelWrite { .. }
            | YoloprepError::SourceLayout { .. }
            | YoloprepError::MissingSource { .. }
            | YoloprepError::CreateDir { .. }
            | YoloprepError::DestinationExists { .. }
            | YoloprepError::Transfer { .. }
            | YoloprepError::SplitConflict { .. }
            | YoloprepError::BatchFailed { .. }
            | YoloprepError::DatasetYamlWrite { .. }
            | YoloprepError::ReportSerialize(_) => ErrorKind::Io,
        }
    }
}
