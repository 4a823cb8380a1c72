use std::num::ParseIntError;
use thiserror::Error;

/// Main error type for the csv2sql system
#[derive(Error, Debug)]
pub enum Csv2SqlError {
    #[error("Configuration error in {field}: {message}")]
    ConfigParse { field: String, message: String },

    #[error("Line {line}, column {column}: '{value}' is not an integer ({source})")]
    NumericField {
        line: usize,
        column: usize,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("SQL validation error: {message}")]
    Validation { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Csv2SqlError {
    pub fn config_parse(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Line number of the input row that caused the error, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::NumericField { line, .. } | Self::FieldCount { line, .. } => Some(*line),
            _ => None,
        }
    }
}
