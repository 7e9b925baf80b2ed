//! Error types of the bencher.

use std::path::PathBuf;

use arrow_schema::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Section {section} not found in {}", .path.display())]
    SectionNotFound { path: PathBuf, section: String },

    #[error("Malformed section {section} in {}: {reason}", .path.display())]
    MalformedSection {
        path: PathBuf,
        section: String,
        reason: String,
    },

    #[error("Column {0} already exists in the frame")]
    DuplicateColumn(String),

    /// The combined frame doesn't have the expected `(rows, columns)` shape.
    #[error("Shape mismatch, expect {expected:?}, actual {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Failed to build write pool: {0}")]
    BuildPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to parse config {}: {source}", .path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Failed to init logging: {0}")]
    InitLogging(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps an io error with the path it happens on.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error is caused by a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_display() {
        let err = Error::ShapeMismatch {
            expected: (5, 3),
            actual: (5, 2),
        };
        assert_eq!(
            err.to_string(),
            "Shape mismatch, expect (5, 3), actual (5, 2)"
        );
    }

    #[test]
    fn test_is_not_found() {
        let err = Error::io(
            "Ensemble_0.h5",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Ensemble_0.h5"));

        let err = Error::DuplicateColumn("0".to_string());
        assert!(!err.is_not_found());
    }
}
