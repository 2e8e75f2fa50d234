//! Domain errors raised while building the fund series and the refund ledger.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FundError {
    #[error("Missing input for {name}: {} not found", .path.display())]
    InputMissing { name: String, path: PathBuf },

    #[error("No price series supplied for {0}")]
    MissingSeries(String),

    #[error("Invalid timestamp '{value}': expected YYYY-MM-DD HH:MM:SS with optional offset")]
    InvalidTimestamp { value: String },

    #[error("Invalid number '{value}' in column '{column}' at row {row}")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Ledger is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Row {row} has too few columns: expected at least {expected}, found {found}")]
    ShortRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("No fund return recorded for {column} '{value}' at row {row}")]
    LookupMiss {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Invalid fund composition: {0}")]
    InvalidComposition(String),
}
