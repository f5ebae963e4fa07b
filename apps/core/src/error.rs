use std::io;
use thiserror::Error;

use crate::nn::matrix::MatrixError;

/// Engine-wide error type, consolidating all possible errors into a single enum.
#[derive(Debug, Error)]
pub enum AppError {
    /// Matrix shape violations. These indicate a programming or data-corruption bug.
    #[error("Matrix error: {0}")]
    Matrix(#[from] MatrixError),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON documents (intents, messages, trained networks).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A dataset or model file required by a locale is missing.
    #[error("Missing resource: {0}")]
    Resource(String),

    /// Malformed or unusable intent data (e.g. an empty corpus).
    #[error("Data error: {0}")]
    Data(String),

    /// The vocabulary or class list derived from the current intents no longer
    /// matches the ones the network was trained with.
    #[error("Trained model for locale '{locale}' is out of date with its intents")]
    StaleModel { locale: String },

    /// The locale has no loaded model or is not supported.
    #[error("Unknown locale: {0}")]
    UnknownLocale(String),

    /// Represents data validation errors (e.g., invalid input format).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents configuration-related errors (e.g., invalid environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Communication failures with the background trainer.
    #[error("Actor error: {0}")]
    Actor(String),

    /// Represents errors from operations that did not complete in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl AppError {
    /// Whether the failing locale can be recovered by skipping it or retraining.
    ///
    /// Matrix errors are never recoverable: they abort the operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Io(_)
                | AppError::Json(_)
                | AppError::Resource(_)
                | AppError::Data(_)
                | AppError::StaleModel { .. }
                | AppError::Validation(_)
        )
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout(format!("Operation timed out: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation errors: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_errors_are_fatal() {
        let err = AppError::from(MatrixError::ShapeMismatch {
            op: "add",
            left: (1, 2),
            right: (2, 1),
        });
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_data_errors_are_recoverable() {
        assert!(AppError::Data("empty corpus".into()).is_recoverable());
        assert!(AppError::Resource("training.json".into()).is_recoverable());
        assert!(AppError::StaleModel { locale: "en".into() }.is_recoverable());
        assert!(!AppError::Config("bad".into()).is_recoverable());
    }
}
