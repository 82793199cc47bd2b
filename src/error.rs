use thiserror::Error;

use crate::ModelError;

/// Node settings that cannot work with the given input. Raised before any row
/// is processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no molecule column selected")]
    NoColumnSelected,
    #[error("column '{0}' does not exist in the input table")]
    ColumnNotFound(String),
    #[error("column type '{0}' cannot be converted to molecules")]
    UnrecognizedColumnType(String),
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("column '{name}' has {found} cells, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
    #[error("cannot read '{value}' as {expected} in column '{column}' (row {row})")]
    InvalidCell {
        column: String,
        row: usize,
        value: String,
        expected: &'static str,
    },
    #[error("cannot write molecule objects in column '{0}' as text")]
    UnwritableCell(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Fatal failures of a node run.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("execution canceled after {rows} rows")]
    Canceled { rows: usize },
}
