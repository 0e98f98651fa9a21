//! Geolocation Shaping
//!
//! Data-shaping side of the traffic map: infer which columns carry source
//! and destination IPs, deduplicate and cap the unique addresses, resolve
//! them through a [`GeoLookup`], and aggregate (source, destination) pairs
//! into weighted flow edges. The network sits behind the trait so the rest
//! of the crate tests offline.

pub mod lookup;

#[cfg(test)]
mod tests;

pub use lookup::{GeoLocation, GeoLookup, HttpGeoLookup};

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_GEO_LOOKUPS;
use crate::table::Table;

/// One aggregated (source, destination) traffic edge for the map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub src_ip: String,
    pub dst_ip: String,
    pub src_lat: f64,
    pub src_lon: f64,
    pub dst_lat: f64,
    pub dst_lon: f64,
    pub count: usize,
    pub src_country: String,
    pub dst_country: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoReport {
    pub src_column: Option<String>,
    pub dst_column: Option<String>,
    pub src_locations: Vec<GeoLocation>,
    pub dst_locations: Vec<GeoLocation>,
    pub flows: Vec<FlowEdge>,
}

/// Find the source and destination IP columns by name: substring "ip" first,
/// then "src"/"source" against "dst"/"dest"/"destination". Falls back to the
/// first two ip-named columns positionally.
pub fn infer_ip_columns(table: &Table) -> (Option<String>, Option<String>) {
    let mut ip_columns = Vec::new();
    let mut src = None;
    let mut dst = None;

    for column in table.columns() {
        let lower = column.name.to_lowercase();
        if !lower.contains("ip") {
            continue;
        }
        ip_columns.push(column.name.clone());
        if src.is_none() && (lower.contains("src") || lower.contains("source")) {
            src = Some(column.name.clone());
        } else if dst.is_none()
            && (lower.contains("dst") || lower.contains("dest") || lower.contains("destination"))
        {
            dst = Some(column.name.clone());
        }
    }

    if src.is_none() {
        src = ip_columns.first().cloned();
    }
    if dst.is_none() {
        dst = ip_columns.get(1).cloned();
    }
    (src, dst)
}

/// Resolve the IP columns of `table` into located endpoints and flow edges.
/// Returns `None` when no IP column can be found at all.
pub fn extract_flows(table: &Table, lookup: &dyn GeoLookup) -> Option<GeoReport> {
    let (src_column, dst_column) = infer_ip_columns(table);
    if src_column.is_none() && dst_column.is_none() {
        return None;
    }

    let src_ips = src_column
        .as_deref()
        .map(|c| unique_ips(table, c))
        .unwrap_or_default();
    let dst_ips = dst_column
        .as_deref()
        .map(|c| unique_ips(table, c))
        .unwrap_or_default();

    let src_locations = resolve_locations(&src_ips, lookup);
    let mut dst_locations = resolve_locations(&dst_ips, lookup);

    // Prefer a degraded-but-populated map over an empty one: when nothing on
    // the destination side resolves, pin a single placeholder endpoint.
    if !src_locations.is_empty() && dst_locations.is_empty() {
        log::warn!("no destination locations resolved, adding placeholder endpoint");
        dst_locations.push(GeoLocation::placeholder());
    }

    let mut flows = Vec::new();
    if let (Some(src_col), Some(dst_col)) = (&src_column, &dst_column) {
        let src_by_ip: HashMap<&str, &GeoLocation> =
            src_locations.iter().map(|l| (l.ip.as_str(), l)).collect();
        let dst_by_ip: HashMap<&str, &GeoLocation> =
            dst_locations.iter().map(|l| (l.ip.as_str(), l)).collect();

        for ((src_ip, dst_ip), count) in pair_counts(table, src_col, dst_col) {
            let (src_loc, dst_loc) =
                match (src_by_ip.get(src_ip.as_str()), dst_by_ip.get(dst_ip.as_str())) {
                    (Some(s), Some(d)) => (s, d),
                    _ => continue, // unresolved endpoint drops the edge, not the run
                };
            flows.push(FlowEdge {
                src_ip,
                dst_ip,
                src_lat: src_loc.latitude,
                src_lon: src_loc.longitude,
                dst_lat: dst_loc.latitude,
                dst_lon: dst_loc.longitude,
                count,
                src_country: src_loc.country.clone(),
                dst_country: dst_loc.country.clone(),
            });
        }
    }

    Some(GeoReport {
        src_column,
        dst_column,
        src_locations,
        dst_locations,
        flows,
    })
}

/// Resolve addresses one by one, skipping private/invalid ones before the
/// lookup ever fires. Per-IP failures are swallowed; they mean "no location".
pub fn resolve_locations(ips: &[String], lookup: &dyn GeoLookup) -> Vec<GeoLocation> {
    ips.iter()
        .filter_map(|raw| {
            let addr: IpAddr = match raw.trim().parse() {
                Ok(a) => a,
                Err(_) => {
                    log::debug!("skipping invalid IP '{}'", raw);
                    return None;
                }
            };
            if is_non_routable(addr) {
                log::debug!("skipping non-routable IP {}", addr);
                return None;
            }
            lookup.lookup(addr)
        })
        .collect()
}

fn is_non_routable(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_unspecified() || v4.is_link_local()
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

/// Order-preserving dedup of a column's values, capped at [`MAX_GEO_LOOKUPS`].
fn unique_ips(table: &Table, name: &str) -> Vec<String> {
    let Some(column) = table.column(name) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in 0..column.data.len() {
        if out.len() == MAX_GEO_LOOKUPS {
            log::debug!("capping unique IPs of '{}' at {}", name, MAX_GEO_LOOKUPS);
            break;
        }
        if let Some(value) = column.data.cell_to_string(row) {
            if seen.insert(value.clone()) {
                out.push(value);
            }
        }
    }
    out
}

/// Frequency of each (src, dst) pair, heaviest first; ties break on the pair
/// key so the result is deterministic.
fn pair_counts(table: &Table, src_col: &str, dst_col: &str) -> Vec<((String, String), usize)> {
    let (Some(src), Some(dst)) = (table.column(src_col), table.column(dst_col)) else {
        return Vec::new();
    };
    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    for row in 0..table.n_rows() {
        if let (Some(s), Some(d)) = (src.data.cell_to_string(row), dst.data.cell_to_string(row)) {
            *counts.entry((s, d)).or_insert(0) += 1;
        }
    }
    let mut pairs: Vec<_> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs
}
