//! Timestamp Parser
//!
//! Coerces one column to naive datetimes through an ordered cascade of
//! format hypotheses, cheapest and most specific first:
//!
//! 1. already temporal - no-op
//! 2. year-less syslog format ("Mar 10 20:26:05") - current year stamped on
//! 3. Kibana `@` export format ("Mar 10, 2025 @ 12:42:28.656")
//! 4. explicit format list, whole column, first format that takes every value
//! 5. regex extraction of a date+time substring, reassembled and parsed
//! 6. lenient per-value best effort
//!
//! Parse failure is data, not a fault: individual bad values become nulls,
//! and a column that defeats every hypothesis comes back unchanged together
//! with a diagnostic naming the column and sample raw values. Timestamps are
//! naive; no timezone conversion is performed.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::constants::FORMAT_PROBE_SAMPLE_SIZE;
use crate::error::{Error, Result};
use crate::table::{format_number, Column, ColumnData, Table};

// ============================================================================
// FORMAT HYPOTHESES
// ============================================================================

/// One format hypothesis. `DateOnly` parses a calendar date and assumes
/// midnight; the compact variants are digit-sliced by hand because a greedy
/// `%Y` swallows the whole string.
#[derive(Debug, Clone, Copy)]
enum FormatHypothesis {
    DateTime(&'static str),
    DateOnly(&'static str),
    Compact14,
    Compact8,
}

use FormatHypothesis::{Compact14, Compact8, DateOnly, DateTime};

/// Explicit formats tried over the whole column, most specific first so a
/// loose hypothesis never mis-reads an ISO column.
const EXPLICIT_FORMATS: &[FormatHypothesis] = &[
    DateTime("%Y-%m-%dT%H:%M:%S%.3fZ"),   // ISO with milliseconds and Z
    DateTime("%Y-%m-%dT%H:%M:%SZ"),       // ISO without milliseconds
    DateTime("%Y-%m-%dT%H:%M:%S%.3f"),
    DateTime("%Y-%m-%dT%H:%M:%S"),
    DateTime("%Y-%m-%d %H:%M:%S%.3f"),    // standard datetime with milliseconds
    DateTime("%Y-%m-%d %H:%M:%S"),        // standard datetime
    DateOnly("%Y-%m-%d"),                 // just date
    DateTime("%m/%d/%Y %H:%M:%S"),        // US format
    DateTime("%d/%m/%Y %H:%M:%S"),        // European format
    DateOnly("%m/%d/%Y"),
    DateOnly("%d/%m/%Y"),
    DateTime("%b %d, %Y @ %H:%M:%S%.3f"), // Kibana export format
    DateTime("%b %d, %Y %H:%M:%S"),
    DateOnly("%b %d, %Y"),                // short month name
    DateOnly("%B %d, %Y"),                // long month name
    DateTime("%d-%b-%Y %H:%M:%S"),
    DateOnly("%d-%b-%Y"),
    DateOnly("%d %b %Y"),
    Compact14,                            // YYYYMMDDHHMMSS
    Compact8,                             // YYYYMMDD
    DateTime("%b %d %H:%M:%S"),           // syslog, only parses when a year precedes
];

impl FormatHypothesis {
    fn label(&self) -> &'static str {
        match self {
            DateTime(fmt) | DateOnly(fmt) => fmt,
            Compact14 => "YYYYMMDDHHMMSS",
            Compact8 => "YYYYMMDD",
        }
    }
}

fn parse_value(value: &str, hypothesis: FormatHypothesis) -> Option<NaiveDateTime> {
    match hypothesis {
        DateTime(fmt) => NaiveDateTime::parse_from_str(value, fmt).ok(),
        DateOnly(fmt) => NaiveDate::parse_from_str(value, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        Compact14 => parse_compact(value, true),
        Compact8 => parse_compact(value, false),
    }
}

fn parse_compact(value: &str, with_time: bool) -> Option<NaiveDateTime> {
    let expected = if with_time { 14 } else { 8 };
    if value.len() != expected || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(
        value[0..4].parse().ok()?,
        value[4..6].parse().ok()?,
        value[6..8].parse().ok()?,
    )?;
    if with_time {
        date.and_hms_opt(
            value[8..10].parse().ok()?,
            value[10..12].parse().ok()?,
            value[12..14].parse().ok()?,
        )
    } else {
        date.and_hms_opt(0, 0, 0)
    }
}

// ============================================================================
// PROBE AND EXTRACTION PATTERNS
// ============================================================================

/// Year-less syslog timestamp: "Mar 10 20:26:05".
static YEARLESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{3}\s+\d{1,2}\s+\d{1,2}:\d{2}:\d{2}$").expect("static pattern"));

/// Kibana export timestamp: "Mar 10, 2025 @ 12:42:28.656".
static KIBANA_AT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]{3}\s\d{1,2},\s\d{4}\s@\s\d{1,2}:\d{2}:\d{2}\.\d{3}$")
        .expect("static pattern")
});

static EXTRACT_ISO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})[T ](\d{2}:\d{2}:\d{2}(?:\.\d+)?)").expect("static pattern")
});

static EXTRACT_KIBANA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z]{3}\s\d{1,2},\s\d{4})\s@\s(\d{1,2}:\d{2}:\d{2}\.\d{3})")
        .expect("static pattern")
});

static EXTRACT_YEARLESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z]{3})\s+(\d{1,2})\s+(\d{1,2}:\d{2}:\d{2})").expect("static pattern")
});

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParseReport {
    /// Column was already temporal; values returned bit-identical.
    AlreadyTemporal,
    /// Parsed under `format`; `failed` values did not convert and are nulls.
    Parsed { format: String, failed: usize },
    /// No hypothesis produced a single timestamp; table returned unchanged.
    Unparsed { reason: String },
}

#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub table: Table,
    pub report: ParseReport,
}

// ============================================================================
// PARSER
// ============================================================================

/// Run the format cascade over `name`. `Err` only for an unknown column;
/// every parse-level failure is reported inside the outcome.
pub fn parse_column(table: &Table, name: &str) -> Result<ParseOutcome> {
    let column = table
        .column(name)
        .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;

    let values: Vec<Option<String>> = match &column.data {
        ColumnData::Timestamp(_) => {
            return Ok(ParseOutcome {
                table: table.clone(),
                report: ParseReport::AlreadyTemporal,
            });
        }
        ColumnData::Text(v) => v.clone(),
        ColumnData::Number(v) => v.iter().map(|o| o.map(format_number)).collect(),
    };

    let non_null: Vec<&str> = values.iter().flatten().map(|s| s.trim()).collect();
    if non_null.is_empty() {
        return Ok(unparsed(table, name, &non_null, "column has no values"));
    }

    // Year-less syslog format. The export dropped the year, so stamp the
    // current calendar year onto every value before parsing.
    if non_null
        .iter()
        .take(FORMAT_PROBE_SAMPLE_SIZE)
        .all(|v| YEARLESS.is_match(v))
    {
        let year = Local::now().year();
        let parsed = per_value(&values, |s| {
            NaiveDateTime::parse_from_str(&format!("{} {}", year, s), "%Y %b %d %H:%M:%S").ok()
        });
        if parsed.iter().any(Option::is_some) {
            return Ok(success(table, name, &values, parsed, "%b %d %H:%M:%S (year synthesized)"));
        }
    }

    // Kibana export format: strip the " @ " separator, then parse explicitly.
    if non_null
        .iter()
        .take(FORMAT_PROBE_SAMPLE_SIZE)
        .all(|v| KIBANA_AT.is_match(v))
    {
        let parsed = per_value(&values, |s| {
            NaiveDateTime::parse_from_str(&s.replacen(" @ ", " ", 1), "%b %d, %Y %H:%M:%S%.3f").ok()
        });
        if parsed.iter().any(Option::is_some) {
            return Ok(success(table, name, &values, parsed, "%b %d, %Y @ %H:%M:%S%.3f"));
        }
    }

    // Explicit formats: first hypothesis that takes every non-null value wins.
    for hypothesis in EXPLICIT_FORMATS {
        if let Some(parsed) = try_format_all(&values, *hypothesis) {
            return Ok(success(table, name, &values, parsed, hypothesis.label()));
        }
    }

    // Regex extraction: salvage a date+time substring per value, reassemble
    // and parse. Non-matching values become nulls.
    for (pattern, reassemble, fmt) in extraction_rules() {
        let parsed = per_value(&values, |s| {
            let caps = pattern.captures(s)?;
            NaiveDateTime::parse_from_str(&reassemble(&caps), fmt).ok()
        });
        if parsed.iter().any(Option::is_some) {
            return Ok(success(table, name, &values, parsed, "regex extraction"));
        }
    }

    // Last resort: any explicit format, per value.
    let parsed = per_value(&values, |s| {
        EXPLICIT_FORMATS
            .iter()
            .find_map(|h| parse_value(s, *h))
    });
    if parsed.iter().any(Option::is_some) {
        return Ok(success(table, name, &values, parsed, "best effort"));
    }

    Ok(unparsed(
        table,
        name,
        &non_null,
        "no format hypothesis matched",
    ))
}

type Reassembler = fn(&Captures) -> String;

fn extraction_rules() -> Vec<(&'static Regex, Reassembler, &'static str)> {
    fn iso(caps: &Captures) -> String {
        format!("{} {}", &caps[1], &caps[2])
    }
    fn kibana(caps: &Captures) -> String {
        format!("{} {}", &caps[1], &caps[2])
    }
    fn yearless(caps: &Captures) -> String {
        format!("{} {} {} {}", Local::now().year(), &caps[1], &caps[2], &caps[3])
    }
    vec![
        (&*EXTRACT_ISO, iso as Reassembler, "%Y-%m-%d %H:%M:%S%.f"),
        (&*EXTRACT_KIBANA, kibana as Reassembler, "%b %d, %Y %H:%M:%S%.3f"),
        (&*EXTRACT_YEARLESS, yearless as Reassembler, "%Y %b %d %H:%M:%S"),
    ]
}

/// Whole-column attempt: `None` unless every non-null value parses.
fn try_format_all(
    values: &[Option<String>],
    hypothesis: FormatHypothesis,
) -> Option<Vec<Option<NaiveDateTime>>> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value {
            None => out.push(None),
            Some(s) => match parse_value(s.trim(), hypothesis) {
                Some(ts) => out.push(Some(ts)),
                None => return None,
            },
        }
    }
    Some(out)
}

fn per_value<F>(values: &[Option<String>], parse: F) -> Vec<Option<NaiveDateTime>>
where
    F: Fn(&str) -> Option<NaiveDateTime>,
{
    values
        .iter()
        .map(|v| v.as_deref().and_then(|s| parse(s.trim())))
        .collect()
}

fn success(
    table: &Table,
    name: &str,
    original: &[Option<String>],
    parsed: Vec<Option<NaiveDateTime>>,
    format: &str,
) -> ParseOutcome {
    let failed = original
        .iter()
        .zip(&parsed)
        .filter(|(orig, new)| orig.is_some() && new.is_none())
        .count();
    if failed > 0 {
        log::warn!(
            "column '{}': {} value(s) did not parse as '{}' and became null",
            name,
            failed,
            format
        );
    }
    let table = table.with_column(Column {
        name: name.to_string(),
        data: ColumnData::Timestamp(parsed),
    });
    ParseOutcome {
        table,
        report: ParseReport::Parsed {
            format: format.to_string(),
            failed,
        },
    }
}

fn unparsed(table: &Table, name: &str, samples: &[&str], detail: &str) -> ParseOutcome {
    let examples = samples
        .iter()
        .take(3)
        .map(|s| format!("'{}'", s))
        .collect::<Vec<_>>()
        .join(", ");
    let reason = if examples.is_empty() {
        format!("could not parse column '{}': {}", name, detail)
    } else {
        format!(
            "could not parse column '{}': {}; example values: {}",
            name, detail, examples
        )
    };
    log::warn!("{}", reason);
    ParseOutcome {
        table: table.clone(),
        report: ParseReport::Unparsed { reason },
    }
}
