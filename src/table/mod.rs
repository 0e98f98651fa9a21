//! Table Module - Column-major dataset model
//!
//! One `Table` per uploaded file. Engines treat it as immutable and derive
//! new tables instead of mutating in place, so the same table can feed the
//! geolocation branch and the pattern-detection branch independently.

pub mod loader;
pub mod export;


use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Classification of a column's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Text,
    Temporal,
}

/// Typed column storage. Nulls are explicit; a failed parse never shrinks a
/// column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Number(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Timestamp(Vec<Option<NaiveDateTime>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Number(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Number(_) => ColumnKind::Numeric,
            ColumnData::Text(_) => ColumnKind::Text,
            ColumnData::Timestamp(_) => ColumnKind::Temporal,
        }
    }

    /// String rendering of one cell, `None` for nulls and out-of-range rows.
    pub fn cell_to_string(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Number(v) => v.get(row).copied().flatten().map(format_number),
            ColumnData::Text(v) => v.get(row).cloned().flatten(),
            ColumnData::Timestamp(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        }
    }
}

/// Render a float the way it was most likely written: no trailing `.0` on
/// whole numbers.
pub(crate) fn format_number(value: f64) -> String {
    format!("{}", value)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build from columns. All columns must have the same length.
    pub fn new(columns: Vec<Column>) -> Self {
        debug_assert!(
            columns.windows(2).all(|w| w[0].data.len() == w[1].data.len()),
            "columns must have uniform length"
        );
        Self { columns }
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(|c| c.data.kind())
    }

    /// New table with `column` replacing the same-named column, or appended
    /// when no column carries that name.
    pub fn with_column(&self, column: Column) -> Table {
        let mut columns = self.columns.clone();
        match columns.iter_mut().find(|c| c.name == column.name) {
            Some(slot) => *slot = column,
            None => columns.push(column),
        }
        Table { columns }
    }

    /// Stable row selection: output order follows `indices`.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let data = match &column.data {
                    ColumnData::Number(v) => ColumnData::Number(
                        indices.iter().map(|&i| v.get(i).copied().flatten()).collect(),
                    ),
                    ColumnData::Text(v) => ColumnData::Text(
                        indices.iter().map(|&i| v.get(i).cloned().flatten()).collect(),
                    ),
                    ColumnData::Timestamp(v) => ColumnData::Timestamp(
                        indices.iter().map(|&i| v.get(i).copied().flatten()).collect(),
                    ),
                };
                Column {
                    name: column.name.clone(),
                    data,
                }
            })
            .collect();
        Table { columns }
    }
}
