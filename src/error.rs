//! Error types for the diary recommender.
//!
//! Data problems found while cleaning, bad configuration, model fits that
//! cannot produce a usable model and invalid queries each get their own
//! variant so callers can tell a bad input file from a bad request.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiaryError {
    /// Raw rows that cannot be coerced into a clean record. `row` is the
    /// 0-based position of the record in its input file, header and blank
    /// lines not counted.
    #[error("Data quality error at input record {row} (0-based): {message}")]
    DataQuality { row: usize, message: String },

    /// Override tables or pipeline parameters that do not fit the data
    #[error("Configuration error: {0}")]
    Config(String),

    /// A model could not be fitted for one cluster (or the whole corpus)
    #[error("Model fit error for {scope}: {reason}")]
    ModelFit { scope: String, reason: String },

    /// Query values outside the accepted range
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Trained artifacts that do not match what the recommender needs
    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DiaryError {
    pub fn data_quality(row: usize, message: impl Into<String>) -> Self {
        DiaryError::DataQuality {
            row,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        DiaryError::Config(message.into())
    }

    pub fn model_fit(scope: impl Into<String>, reason: impl Into<String>) -> Self {
        DiaryError::ModelFit {
            scope: scope.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        DiaryError::InvalidQuery(message.into())
    }

    pub fn artifact(message: impl Into<String>) -> Self {
        DiaryError::Artifact(message.into())
    }
}

pub type Result<T> = std::result::Result<T, DiaryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failing_scope() {
        let err = DiaryError::model_fit("cluster 3", "no terms remain after pruning");
        assert_eq!(
            err.to_string(),
            "Model fit error for cluster 3: no terms remain after pruning"
        );

        let err = DiaryError::data_quality(12, "salary 'n/a' is not a number");
        assert_eq!(
            err.to_string(),
            "Data quality error at input record 12 (0-based): salary 'n/a' is not a number"
        );
    }

    #[test]
    fn test_io_errors_convert() {
        fn open_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/here.json")?)
        }
        assert!(matches!(open_missing(), Err(DiaryError::Io(_))));
    }
}
