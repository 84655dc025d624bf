//! IP geolocation
//!
//! Only public addresses are looked up; anything else is rejected before a
//! request leaves the process. Hostnames are resolved to their first IPv4
//! address first.

use crate::dispatch::{Dispatcher, ProviderError};
use crate::model::{AggregatedReport, NormalizedRecord, Outcome, QueryRequest};
use crate::resolve::{classify, DnsResolve};
use crate::validate::{validate_address, Address};
use crate::ValidationError;
use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;
use std::sync::Arc;

pub const GEO_SOURCE: &str = "Geolocation";
pub const THREAT_SOURCE: &str = "Threat Intelligence";

const IP_API_FIELDS: &str =
    "status,message,country,countryCode,region,regionName,city,zip,lat,lon,timezone,isp,org,as,query";

/// Location data for one address
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeoRecord {
    #[serde(rename = "query")]
    pub ip: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "countryCode")]
    pub country_code: Option<String>,
    #[serde(rename = "regionName")]
    pub region: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: Option<String>,
    pub isp: Option<String>,
    pub org: Option<String>,
    #[serde(rename = "as")]
    pub autonomous_system: Option<String>,
}

/// Geolocation seam
#[async_trait]
pub trait Geolocate: Send + Sync {
    async fn geolocate(&self, ip: IpAddr) -> Result<GeoRecord, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: Option<String>,
    message: Option<String>,
    #[serde(flatten)]
    record: GeoRecord,
}

/// `Geolocate` over the ip-api JSON endpoint
pub struct IpApiGeolocator {
    dispatcher: Arc<Dispatcher>,
}

impl IpApiGeolocator {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl Geolocate for IpApiGeolocator {
    async fn geolocate(&self, ip: IpAddr) -> Result<GeoRecord, ProviderError> {
        let url = format!(
            "{}/json/{}?fields={}",
            self.dispatcher
                .config()
                .endpoints
                .geolocation
                .trim_end_matches('/'),
            ip,
            IP_API_FIELDS
        );

        let value = self.dispatcher.get_json(&url).await?;
        let response: IpApiResponse =
            serde_json::from_value(value).map_err(|e| ProviderError::Parse(e.into()))?;

        if response.status.as_deref() != Some("success") {
            return Err(ProviderError::Upstream(response.message.unwrap_or_else(|| {
                "Failed to retrieve geolocation data".to_string()
            })));
        }

        Ok(response.record)
    }
}

/// Rejects addresses that have no public location
pub fn ensure_geolocatable(ip: IpAddr) -> Result<(), ValidationError> {
    let class = classify(ip);
    if class.is_public() {
        Ok(())
    } else {
        Err(ValidationError::NotGeolocatable { ip, class })
    }
}

/// Geolocates an IP address or hostname
///
/// # Arguments
///
/// * `geolocator` - Location provider
/// * `resolver` - Used for hostname resolution and the reverse lookup
/// * `request` - IP address or hostname
///
/// # Returns
///
/// * `Ok(AggregatedReport)` - "Geolocation" and "Threat Intelligence" sections
/// * `Err(OsintError)` - Unresolvable subject or a non-public address
pub async fn geolocate(
    geolocator: &dyn Geolocate,
    resolver: &dyn DnsResolve,
    request: &QueryRequest,
) -> crate::Result<AggregatedReport> {
    let ip = match validate_address(&request.subject)? {
        Address::Ip(ip) => ip,
        Address::Host(host) => {
            let resolved = resolver.lookup_ipv4(&host).await.unwrap_or_else(|e| {
                tracing::warn!("Could not resolve {}: {}", host, e);
                Vec::new()
            });
            match resolved.first() {
                Some(v4) => IpAddr::V4(*v4),
                None => return Err(ValidationError::InvalidAddress(host).into()),
            }
        }
    };

    ensure_geolocatable(ip)?;
    tracing::info!("Geolocating {}", ip);

    let hostname = resolver.resolve_ptr(ip).await;
    let record = match geolocator.geolocate(ip).await {
        Ok(geo) => geo_record(ip, geo, hostname),
        Err(e) => {
            tracing::warn!("Geolocation of {} failed: {}", ip, e);
            NormalizedRecord::failed(GEO_SOURCE, e).with("ip", ip.to_string())
        }
    };

    let mut report = AggregatedReport::new();
    report.push(GEO_SOURCE, vec![record]);
    report.push(THREAT_SOURCE, vec![threat_reference(ip)]);
    Ok(report)
}

fn geo_record(ip: IpAddr, geo: GeoRecord, hostname: Option<String>) -> NormalizedRecord {
    NormalizedRecord::data(GEO_SOURCE, Outcome::Present)
        .with("ip", geo.ip.unwrap_or_else(|| ip.to_string()))
        .with_opt("country", geo.country)
        .with_opt("country_code", geo.country_code)
        .with_opt("region", geo.region)
        .with_opt("city", geo.city)
        .with_opt("zip", geo.zip)
        .with_opt("lat", geo.lat)
        .with_opt("lon", geo.lon)
        .with_opt("timezone", geo.timezone)
        .with_opt("isp", geo.isp)
        .with_opt("org", geo.org)
        .with_opt("as", geo.autonomous_system)
        .with_opt("hostname", hostname)
}

fn threat_reference(ip: IpAddr) -> NormalizedRecord {
    NormalizedRecord::manual_reference(
        THREAT_SOURCE,
        "IP Reputation",
        format!("Abuse reports and reputation for {}", ip),
        format!("https://www.abuseipdb.com/check/{}", ip),
        "Threat intelligence requires API keys for services like AbuseIPDB or VirusTotal.",
    )
}
