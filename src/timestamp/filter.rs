//! Time-Range Filter
//!
//! Best-effort and never fatal: a column that cannot be made temporal yields
//! the input unchanged plus a warning instead of an error. Bounds are
//! inclusive on both ends and row order is preserved.

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::table::{ColumnData, Table};

use super::parser::{parse_column, ParseReport};

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub table: Table,
    /// Rows retained. Always equals `table.n_rows()`.
    pub retained: usize,
    /// Rows in the input table.
    pub total: usize,
    pub warning: Option<String>,
}

/// Keep rows where `start <= value <= end` in the named column. Parses the
/// column first when it is not yet temporal. Null timestamps never match.
pub fn filter_by_time(
    table: &Table,
    name: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<FilterOutcome> {
    let column = table
        .column(name)
        .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
    let total = table.n_rows();

    let working = match &column.data {
        ColumnData::Timestamp(_) => table.clone(),
        _ => {
            let outcome = parse_column(table, name)?;
            if let ParseReport::Unparsed { reason } = outcome.report {
                log::warn!("time filter disabled: {}", reason);
                return Ok(FilterOutcome {
                    table: table.clone(),
                    retained: total,
                    total,
                    warning: Some(reason),
                });
            }
            outcome.table
        }
    };

    let values = match working.column(name).map(|c| &c.data) {
        Some(ColumnData::Timestamp(values)) => values,
        _ => {
            // Parser reported success but the column is not temporal; treat
            // as filter-unavailable rather than failing the caller.
            let warning = format!("column '{}' could not be resolved to timestamps", name);
            log::warn!("time filter disabled: {}", warning);
            return Ok(FilterOutcome {
                table: table.clone(),
                retained: total,
                total,
                warning: Some(warning),
            });
        }
    };

    let keep: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| match v {
            Some(ts) if *ts >= start && *ts <= end => Some(i),
            _ => None,
        })
        .collect();

    let filtered = working.select_rows(&keep);
    log::info!("time filter retained {} of {} rows", keep.len(), total);
    Ok(FilterOutcome {
        table: filtered,
        retained: keep.len(),
        total,
        warning: None,
    })
}
