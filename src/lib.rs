//! NetLens - Analytics core for network-log dashboards
//!
//! The dashboard UI loads a firewall/iptables log export and hands the core a
//! [`table::Table`]. The core answers with structured results the UI renders:
//!
//! - `timestamp` - detect likely timestamp columns, coerce them to datetimes
//!   through a multi-format cascade, filter rows by time range
//! - `geo`       - infer src/dst IP columns and shape them into geolocated
//!   flow edges for the traffic map
//! - `pipeline`  - standardize numeric features, project with PCA, cluster
//!   with k-means and flag outliers with an isolation forest
//!
//! Every engine is a pure function over its inputs: identical calls return
//! identical results (randomized stages are seeded), so the surrounding UI
//! framework is free to cache by input identity.

pub mod constants;
pub mod error;
pub mod table;
pub mod timestamp;
pub mod geo;
pub mod pipeline;

pub use error::{Error, Result};
pub use pipeline::{AnalysisReport, PipelineConfig};
pub use table::Table;
