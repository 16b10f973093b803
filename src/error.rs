use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort processing of a single survey file.
#[derive(Debug, Error)]
pub enum Error {
    #[error("File {} does not exist.", .path.display())]
    FileNotFound { path: PathBuf },

    #[error(
        "CSV file does not have the required format (missing columns: {}).",
        .missing.join(", ")
    )]
    SchemaMismatch { missing: Vec<String> },

    #[error("line {line}: expected {expected} fields, found {found}")]
    RowShape {
        line: u64,
        expected: u64,
        found: u64,
    },

    #[error("line {line}: could not parse {field} value '{value}'")]
    FieldParse {
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Rejected console input. Always recovered by prompting again.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("'{0}' is not a whole number.")]
    NotANumber(String),

    #[error("Day must be between 1 and 31.")]
    Day,

    #[error("Month must be between 1 and 12.")]
    Month,

    #[error("Year must be between 2000 and 2024.")]
    Year,
}
