//! Error handling
//!
//! Only hard preconditions surface as `Err`. Recoverable degradations (a
//! column that will not parse, a filter that cannot apply, a lookup that
//! returns nothing) travel inside the outcome structs as warnings so the
//! dashboard keeps rendering.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("column '{0}' not found")]
    UnknownColumn(String),

    #[error("no numeric columns available for analysis")]
    NoNumericColumns,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("not enough rows: {rows} rows for {clusters} clusters")]
    NotEnoughRows { rows: usize, clusters: usize },

    #[error("row count mismatch: table has {table_rows} rows, analysis covered {report_rows}")]
    RowCountMismatch { table_rows: usize, report_rows: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
