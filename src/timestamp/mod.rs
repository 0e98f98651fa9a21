//! Timestamp Engine - detection, parsing and time filtering
//!
//! Real log exports rarely agree on a timestamp format: syslog drops the
//! year, Kibana exports put an `@` between date and time, routers write
//! 14-digit compacts. This module guesses which columns are temporal,
//! coerces them through an ordered format cascade and filters rows by range.

pub mod detector;
pub mod parser;
pub mod filter;


pub use detector::detect_timestamp_columns;
pub use filter::{filter_by_time, FilterOutcome};
pub use parser::{parse_column, ParseOutcome, ParseReport};
