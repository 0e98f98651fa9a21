//! Central Configuration Constants
//!
//! Single source of truth for heuristic vocabularies, sampling caps and the
//! fixed seed of the randomized pipeline stages.

/// Column names suggesting temporal content (case-insensitive substring match).
pub const TIME_NAME_HINTS: &[&str] = &[
    "time",
    "date",
    "timestamp",
    "@timestamp",
    "datetime",
    "created",
    "modified",
    "start",
    "end",
    "occurred",
];

/// Narrowing vocabulary applied when detection yields too many candidates.
pub const NARROW_NAME_HINTS: &[&str] = &["timestamp", "date", "time"];

/// Candidate count above which name-based narrowing kicks in.
pub const MAX_TIMESTAMP_CANDIDATES: usize = 5;

/// Non-null values sampled per column when pattern-probing for dates.
pub const DETECT_SAMPLE_SIZE: usize = 20;

/// Values sampled when probing for year-less or vendor-specific formats.
pub const FORMAT_PROBE_SAMPLE_SIZE: usize = 10;

/// Expected iptables log columns, in on-the-wire order. Used as the
/// positional fallback when a CSV has no recognizable header row.
pub const IPTABLES_COLUMNS: &[&str] = &[
    "timestamp",
    "name",
    "rule",
    "interface_in",
    "interface_out",
    "mac",
    "src_ip",
    "dst_ip",
    "len",
    "tos",
    "prec",
    "ttl",
    "id",
    "df",
    "proto",
    "src_port",
    "dst_port",
    "seq",
    "ack",
    "window",
    "flags",
    "flags2",
    "urgp",
    "uid",
    "gid",
    "mark",
];

/// Unique IPs resolved per side (source/destination). Bounds external-call
/// volume of the geolocation resolver.
pub const MAX_GEO_LOOKUPS: usize = 50;

/// Seed for k-means and isolation forest. Fixed so repeated runs over the
/// same data return identical labels.
pub const DEFAULT_SEED: u64 = 42;

/// Default geolocation endpoint (ip-api.com JSON contract).
pub const DEFAULT_GEO_ENDPOINT: &str = "http://ip-api.com/json";

/// Get geolocation endpoint from environment or use default
pub fn get_geo_endpoint() -> String {
    std::env::var("NETLENS_GEO_ENDPOINT").unwrap_or_else(|_| DEFAULT_GEO_ENDPOINT.to_string())
}
