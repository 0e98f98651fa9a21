//! Timestamp Column Detector
//!
//! Flags columns that plausibly hold date/time values: by name vocabulary,
//! by declared temporal type, or by regex-probing a small sample of the text
//! values. Detection is a belief, not a guarantee - the parser may still
//! fail per value.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{
    DETECT_SAMPLE_SIZE, MAX_TIMESTAMP_CANDIDATES, NARROW_NAME_HINTS, TIME_NAME_HINTS,
};
use crate::table::{ColumnData, ColumnKind, Table};

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d{4}-\d{2}-\d{2}",             // ISO date
        r"\d{1,2}/\d{1,2}/\d{2,4}",       // US / European slash date
        r"[A-Za-z]{3}\s\d{1,2},\s\d{4}",  // Mon DD, YYYY
        r"\d{1,2}:\d{2}:\d{2}",           // bare time
        r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}", // ISO datetime with T separator
        r"@",                             // Kibana-style export marker
        r"\d{1,2}-[A-Za-z]{3}-\d{4}",     // DD-Mon-YYYY
        r"^\d{14}$",                      // compact YYYYMMDDHHMMSS
        r"\d{1,2}\s[A-Za-z]{3}\s\d{4}",   // D Mon YYYY
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

/// Scan all columns and return the names judged likely-temporal, in column
/// order. Empty table gives an empty result.
pub fn detect_timestamp_columns(table: &Table) -> Vec<String> {
    let mut candidates = Vec::new();

    for column in table.columns() {
        let name_lower = column.name.to_lowercase();
        if TIME_NAME_HINTS.iter().any(|hint| name_lower.contains(hint)) {
            candidates.push(column.name.clone());
            continue;
        }

        if column.data.kind() == ColumnKind::Temporal {
            candidates.push(column.name.clone());
            continue;
        }

        if let ColumnData::Text(values) = &column.data {
            let matched = values
                .iter()
                .flatten()
                .take(DETECT_SAMPLE_SIZE)
                .any(|v| DATE_PATTERNS.iter().any(|re| re.is_match(v)));
            if matched {
                candidates.push(column.name.clone());
            }
        }
    }

    // Too many candidates drown the UI in false positives. Narrow to columns
    // whose name says timestamp outright, unless that would leave nothing.
    if candidates.len() > MAX_TIMESTAMP_CANDIDATES {
        let narrowed: Vec<String> = candidates
            .iter()
            .filter(|name| {
                let lower = name.to_lowercase();
                NARROW_NAME_HINTS.iter().any(|hint| lower.contains(hint))
            })
            .cloned()
            .collect();
        if !narrowed.is_empty() {
            log::debug!(
                "narrowed {} timestamp candidates to {} by name",
                candidates.len(),
                narrowed.len()
            );
            return narrowed;
        }
    }

    candidates
}
