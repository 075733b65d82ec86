//! Error types for Meridian.
//!
//! Two layers:
//! - [`MeridianError`]: infrastructure failures (dataset, config, I/O).
//! - [`QueryError`]: the caller-facing outcome of a single query. Every
//!   variant maps to a stable [`ErrorKind`] the presentation layer can branch on.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Infrastructure errors raised while loading data or configuration.
#[derive(Error, Debug)]
pub enum MeridianError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(PathBuf),

    #[error("Dataset parse error in {path}: {message}")]
    DatasetParse { path: PathBuf, message: String },

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Config error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Serialization error: {0}")]
    SerializeError(String),
}

/// Result type for infrastructure operations.
pub type Result<T> = std::result::Result<T, MeridianError>;

/// Failures of the external graph/database collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrimitiveError {
    #[error("primitive call timed out after {0} ms")]
    Timeout(u64),

    #[error("unknown graph node: {0}")]
    UnknownNode(u32),

    #[error("graph has no nodes to snap to")]
    EmptyGraph,

    #[error("backend failure: {0}")]
    Backend(String),
}

/// Stable, serializable classification of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    UnsupportedOperation,
    UnknownCategory,
    MissingCoordinate,
    Unreachable,
    PrimitiveFailure,
    Timeout,
    ModelFailure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::UnsupportedOperation => "unsupported_operation",
            ErrorKind::UnknownCategory => "unknown_category",
            ErrorKind::MissingCoordinate => "missing_coordinate",
            ErrorKind::Unreachable => "unreachable",
            ErrorKind::PrimitiveFailure => "primitive_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ModelFailure => "model_failure",
        };
        write!(f, "{}", s)
    }
}

/// Typed failure of one query.
///
/// A valid query with zero matches is not an error; see
/// [`crate::tools::Answer::is_empty`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Geocoding found no known place name. The user should rephrase.
    #[error("no known place matches '{0}'")]
    NotFound(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("unknown POI category: {0}")]
    UnknownCategory(String),

    /// No explicit coordinate and no resolvable place name for `parameter`.
    #[error("missing coordinate for '{parameter}' and no place name could be resolved")]
    MissingCoordinate { parameter: String },

    /// Start and end snapped to disconnected graph components.
    #[error("no walking path between node {from} and node {to}")]
    Unreachable { from: u32, to: u32 },

    #[error("spatial backend failure: {0}")]
    PrimitiveFailure(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("model failure: {0}")]
    ModelFailure(String),
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::NotFound(_) => ErrorKind::NotFound,
            QueryError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            QueryError::UnknownCategory(_) => ErrorKind::UnknownCategory,
            QueryError::MissingCoordinate { .. } => ErrorKind::MissingCoordinate,
            QueryError::Unreachable { .. } => ErrorKind::Unreachable,
            QueryError::PrimitiveFailure(_) => ErrorKind::PrimitiveFailure,
            QueryError::Timeout(_) => ErrorKind::Timeout,
            QueryError::ModelFailure(_) => ErrorKind::ModelFailure,
        }
    }

    /// Validation and geocoding failures the caller can fix by rephrasing.
    pub fn is_caller_facing(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound
                | ErrorKind::UnsupportedOperation
                | ErrorKind::UnknownCategory
                | ErrorKind::MissingCoordinate
        )
    }
}

impl From<PrimitiveError> for QueryError {
    fn from(err: PrimitiveError) -> Self {
        match err {
            PrimitiveError::Timeout(_) => QueryError::Timeout(err.to_string()),
            other => QueryError::PrimitiveFailure(other.to_string()),
        }
    }
}
