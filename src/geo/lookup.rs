//! IP Geolocation Lookup
//!
//! Narrow boundary around the external service: one address in, optionally
//! one location out. `None` always means "no location for this IP" - a rate
//! limit or network failure is never fatal.

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::get_geo_endpoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub ip: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub isp: String,
    pub org: String,
}

impl GeoLocation {
    /// Placeholder endpoint shown when no destination resolves at all.
    pub fn placeholder() -> Self {
        Self {
            ip: String::new(),
            city: "Unknown".to_string(),
            region: String::new(),
            country: "Unknown".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            isp: String::new(),
            org: String::new(),
        }
    }
}

pub trait GeoLookup {
    /// Resolve one address. `None` means "no location", never an error.
    fn lookup(&self, ip: IpAddr) -> Option<GeoLocation>;
}

/// ip-api.com style response payload.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    city: String,
    #[serde(default, rename = "regionName")]
    region_name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
    #[serde(default)]
    isp: String,
    #[serde(default)]
    org: String,
}

/// HTTP GET resolver speaking the ip-api.com JSON contract.
pub struct HttpGeoLookup {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpGeoLookup {
    pub fn new() -> Self {
        Self::with_endpoint(get_geo_endpoint())
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(5))
                .build(),
        }
    }
}

impl Default for HttpGeoLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoLookup for HttpGeoLookup {
    fn lookup(&self, ip: IpAddr) -> Option<GeoLocation> {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), ip);
        let response = match self.agent.get(&url).call() {
            Ok(r) => r,
            Err(e) => {
                log::warn!("geolocation lookup failed for {}: {}", ip, e);
                return None;
            }
        };
        let body: ApiResponse = match response.into_json() {
            Ok(b) => b,
            Err(e) => {
                log::warn!("geolocation response for {} not understood: {}", ip, e);
                return None;
            }
        };
        if body.status != "success" {
            log::debug!("no location for {}", ip);
            return None;
        }
        Some(GeoLocation {
            ip: ip.to_string(),
            city: body.city,
            region: body.region_name,
            country: body.country,
            latitude: body.lat,
            longitude: body.lon,
            isp: body.isp,
            org: body.org,
        })
    }
}
