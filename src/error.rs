//! Typed errors for the analysis core.
//!
//! The filter, aggregator, loader and catalog return [`EdaError`] so callers
//! can tell a bad selection apart from a bad input file. The binary wraps
//! these in `anyhow` at the boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the loading and analysis pipeline.
#[derive(Debug, Error)]
pub enum EdaError {
    /// An unrecognized treatment level, aggregation method, grouping or
    /// variable name was supplied.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required column is absent from the input table.
    #[error("schema error: missing column '{column}'")]
    Schema { column: String },

    /// The input file could not be read or parsed.
    #[error("failed to load {}: {message}", path.display())]
    Load { path: PathBuf, message: String },
}

impl EdaError {
    pub fn configuration(message: impl Into<String>) -> Self {
        EdaError::Configuration(message.into())
    }

    pub fn missing_column(column: impl Into<String>) -> Self {
        EdaError::Schema {
            column: column.into(),
        }
    }
}

pub type EdaResult<T> = std::result::Result<T, EdaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EdaError::configuration("unknown citation design 'Foo'");
        assert_eq!(
            err.to_string(),
            "configuration error: unknown citation design 'Foo'"
        );

        let err = EdaError::missing_column("participant_id");
        assert_eq!(
            err.to_string(),
            "schema error: missing column 'participant_id'"
        );

        let err = EdaError::Load {
            path: PathBuf::from("data.csv"),
            message: "bad row".to_string(),
        };
        assert_eq!(err.to_string(), "failed to load data.csv: bad row");
    }
}
