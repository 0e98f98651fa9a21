//! CSV loader with iptables header fallback.
//!
//! Firewall log exports frequently come without a header row. If the first
//! record looks like data (all numeric fields, or no field matching the
//! expected iptables column vocabulary) the loader assigns the vocabulary
//! positionally instead of consuming the row as a header.

use std::io::Read;

use crate::constants::IPTABLES_COLUMNS;
use crate::error::Result;

use super::{Column, ColumnData, Table};

/// Load delimited text into a typed table. A column is numeric iff every
/// non-empty value parses as a float; everything else stays text. Timestamp
/// coercion is left to the parser, which runs on demand.
pub fn load_csv<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records: Vec<csv::StringRecord> = Vec::new();
    for record in rdr.records() {
        records.push(record?);
    }
    if records.is_empty() {
        return Ok(Table::default());
    }

    let first = &records[0];
    let (names, data_rows): (Vec<String>, &[csv::StringRecord]) = if looks_like_header(first) {
        let names = first
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let trimmed = f.trim();
                if trimmed.is_empty() {
                    format!("col_{}", i)
                } else {
                    trimmed.to_string()
                }
            })
            .collect();
        (names, &records[1..])
    } else {
        log::info!("no recognizable CSV header, assigning iptables column names positionally");
        let names = (0..first.len())
            .map(|i| {
                IPTABLES_COLUMNS
                    .get(i)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| format!("col_{}", i))
            })
            .collect();
        (names, &records[..])
    };

    let n_cols = names.len();
    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(data_rows.len()); n_cols];
    for record in data_rows {
        for (j, cell) in raw.iter_mut().enumerate() {
            let value = record.get(j).map(str::trim).filter(|v| !v.is_empty());
            cell.push(value.map(str::to_string));
        }
    }

    let columns = names
        .into_iter()
        .zip(raw)
        .map(|(name, values)| Column {
            name,
            data: infer_column(values),
        })
        .collect();

    Ok(Table::new(columns))
}

/// A first record is a header iff it is not all-numeric and at least one
/// field matches the expected iptables vocabulary.
fn looks_like_header(record: &csv::StringRecord) -> bool {
    if record.is_empty() {
        return false;
    }
    let all_numeric = record
        .iter()
        .all(|f| !f.trim().is_empty() && f.trim().parse::<f64>().is_ok());
    let any_known = record
        .iter()
        .any(|f| IPTABLES_COLUMNS.contains(&f.trim().to_lowercase().as_str()));
    !all_numeric && any_known
}

fn infer_column(values: Vec<Option<String>>) -> ColumnData {
    let mut non_null = values.iter().flatten().peekable();
    let numeric = non_null.peek().is_some()
        && values
            .iter()
            .flatten()
            .all(|v| v.parse::<f64>().is_ok());
    if numeric {
        ColumnData::Number(
            values
                .iter()
                .map(|v| v.as_ref().and_then(|s| s.parse().ok()))
                .collect(),
        )
    } else {
        ColumnData::Text(values)
    }
}
