use std::cell::Cell;
use std::collections::HashMap;
use std::net::IpAddr;

use super::lookup::{GeoLocation, GeoLookup};
use super::{extract_flows, infer_ip_columns, resolve_locations};
use crate::table::{Column, ColumnData, Table};

/// Offline lookup backed by a fixed map, counting how often it fires.
struct MapLookup {
    locations: HashMap<IpAddr, GeoLocation>,
    calls: Cell<usize>,
}

impl MapLookup {
    fn new(entries: &[(&str, f64, f64, &str)]) -> Self {
        let locations = entries
            .iter()
            .map(|(ip, lat, lon, country)| {
                let addr: IpAddr = ip.parse().unwrap();
                (
                    addr,
                    GeoLocation {
                        ip: ip.to_string(),
                        city: "City".to_string(),
                        region: String::new(),
                        country: country.to_string(),
                        latitude: *lat,
                        longitude: *lon,
                        isp: String::new(),
                        org: String::new(),
                    },
                )
            })
            .collect();
        Self {
            locations,
            calls: Cell::new(0),
        }
    }

    fn empty() -> Self {
        Self::new(&[])
    }
}

impl GeoLookup for MapLookup {
    fn lookup(&self, ip: IpAddr) -> Option<GeoLocation> {
        self.calls.set(self.calls.get() + 1);
        self.locations.get(&ip).cloned()
    }
}

fn text_column(name: &str, values: &[&str]) -> Column {
    Column {
        name: name.to_string(),
        data: ColumnData::Text(values.iter().map(|v| Some(v.to_string())).collect()),
    }
}

#[test]
fn infers_src_and_dst_columns_by_name() {
    let table = Table::new(vec![
        text_column("timestamp", &[]),
        text_column("src_ip", &[]),
        text_column("dst_ip", &[]),
        text_column("len", &[]),
    ]);
    let (src, dst) = infer_ip_columns(&table);
    assert_eq!(src.as_deref(), Some("src_ip"));
    assert_eq!(dst.as_deref(), Some("dst_ip"));
}

#[test]
fn positional_fallback_for_unlabeled_ip_columns() {
    let table = Table::new(vec![
        text_column("client_ip", &[]),
        text_column("server_ip", &[]),
    ]);
    let (src, dst) = infer_ip_columns(&table);
    assert_eq!(src.as_deref(), Some("client_ip"));
    assert_eq!(dst.as_deref(), Some("server_ip"));
}

#[test]
fn no_ip_columns_means_no_report() {
    let table = Table::new(vec![text_column("proto", &["tcp"])]);
    let lookup = MapLookup::empty();
    assert!(extract_flows(&table, &lookup).is_none());
}

#[test]
fn private_and_invalid_addresses_never_hit_the_lookup() {
    let lookup = MapLookup::empty();
    let ips = vec![
        "10.0.0.1".to_string(),
        "192.168.1.5".to_string(),
        "127.0.0.1".to_string(),
        "not-an-ip".to_string(),
    ];
    let resolved = resolve_locations(&ips, &lookup);
    assert!(resolved.is_empty());
    assert_eq!(lookup.calls.get(), 0);
}

#[test]
fn unique_ips_are_capped_at_fifty() {
    let raw: Vec<String> = (0..60).map(|i| format!("8.8.{}.1", i)).collect();
    let refs: Vec<&str> = raw.iter().map(String::as_str).collect();
    let table = Table::new(vec![text_column("src_ip", &refs)]);

    let lookup = MapLookup::empty();
    extract_flows(&table, &lookup).unwrap();
    assert_eq!(lookup.calls.get(), 50);
}

#[test]
fn flows_aggregate_pair_frequencies() {
    let table = Table::new(vec![
        text_column("src_ip", &["1.2.3.4", "1.2.3.4", "1.2.3.4", "5.6.7.8"]),
        text_column("dst_ip", &["9.9.9.9", "9.9.9.9", "8.8.8.8", "9.9.9.9"]),
    ]);
    let lookup = MapLookup::new(&[
        ("1.2.3.4", 48.85, 2.35, "France"),
        ("5.6.7.8", 40.71, -74.0, "United States"),
        ("8.8.8.8", 37.4, -122.0, "United States"),
        ("9.9.9.9", 52.52, 13.4, "Germany"),
    ]);

    let report = extract_flows(&table, &lookup).unwrap();
    assert_eq!(report.flows.len(), 3);
    // heaviest edge first
    assert_eq!(report.flows[0].src_ip, "1.2.3.4");
    assert_eq!(report.flows[0].dst_ip, "9.9.9.9");
    assert_eq!(report.flows[0].count, 2);
    assert_eq!(report.flows[0].dst_country, "Germany");
}

#[test]
fn placeholder_destination_keeps_the_map_populated() {
    let table = Table::new(vec![
        text_column("src_ip", &["1.2.3.4"]),
        text_column("dst_ip", &["10.0.0.7"]), // private, never resolves
    ]);
    let lookup = MapLookup::new(&[("1.2.3.4", 48.85, 2.35, "France")]);

    let report = extract_flows(&table, &lookup).unwrap();
    assert_eq!(report.src_locations.len(), 1);
    assert_eq!(report.dst_locations.len(), 1);
    assert_eq!(report.dst_locations[0].country, "Unknown");
}
