use std::path::PathBuf;

use thiserror::Error;

use super::model::ColumnType;

// ---------------------------------------------------------------------------
// Angle parsing errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AngleParseError {
    #[error("Expected 3 sexagesimal components in '{input}', found {found}")]
    WrongComponentCount { input: String, found: usize },

    #[error("Component '{component}' of '{input}' is not a finite number")]
    NotANumber { input: String, component: String },

    #[error("The {which} component of '{input}' must be in [0, 60), got {value}")]
    OutOfRange {
        input: String,
        which: &'static str,
        value: f64,
    },

    #[error("Conflicting signs in '{0}'")]
    ConflictingSigns(String),
}

// ---------------------------------------------------------------------------
// Table errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TableError {
    /// Structural problem with the input: empty file, bad indices, etc.
    #[error("Format error: {0}")]
    Format(String),

    #[error("Line {line}: expected {expected} fields but found {found}")]
    RowLength {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}, column '{column}': cannot parse '{value}' as {expected}")]
    CellParse {
        column: String,
        line: usize,
        value: String,
        expected: ColumnType,
    },

    #[error(transparent)]
    Angle(#[from] AngleParseError),

    #[error("Column '{column}' holds {expected} values; a {got} value is not compatible")]
    Type {
        column: String,
        expected: ColumnType,
        got: &'static str,
    },

    #[error("No column named '{0}'")]
    NoSuchColumn(String),

    #[error("Couldn't read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid read options: {0}")]
    Options(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
}
