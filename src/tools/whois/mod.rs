//! WHOIS lookups
//!
//! Domains are looked up over TCP port 43, starting at the IANA root and
//! following its referral. IP addresses are not looked up; their report
//! points at the ARIN search pages instead.

mod client;
mod parser;

use crate::dispatch::{FanOut, ProviderError, ProviderJob};
use crate::model::{AggregatedReport, NormalizedRecord, Outcome, QueryRequest};
use crate::validate::validate_domain;
use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;

// Re-export
pub use client::{TcpWhois, WhoisLookup};
pub use parser::{parse, referral, WhoisRecord, CONTACT_ROLES};

pub const WHOIS_SOURCE: &str = "WHOIS";
pub const CONTACTS_SOURCE: &str = "Contacts";

/// WHOIS client errors
#[derive(Debug, Error)]
pub enum WhoisError {
    #[error("Could not connect to WHOIS server {server}: {source}")]
    Connect {
        server: String,
        source: std::io::Error,
    },

    #[error("WHOIS server {0} timed out")]
    Timeout(String),

    #[error("No WHOIS data found for domain: {0}")]
    NotFound(String),

    #[error("WHOIS IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Looks up WHOIS data for a domain or IP address
///
/// # Arguments
///
/// * `lookup` - WHOIS client
/// * `fan_out` - Isolation wrapper for the lookup
/// * `request` - Domain name or IP address
///
/// # Returns
///
/// * `Ok(AggregatedReport)` - "WHOIS" section, plus "Contacts" when any were listed
/// * `Err(OsintError)` - Subject is neither an IP address nor a valid domain
pub async fn whois(
    lookup: Arc<dyn WhoisLookup>,
    fan_out: &FanOut,
    request: &QueryRequest,
) -> crate::Result<AggregatedReport> {
    if let Ok(ip) = request.subject.trim().parse::<IpAddr>() {
        tracing::info!("WHOIS subject {} is an IP address, pointing at ARIN", ip);
        let mut report = AggregatedReport::new();
        report.push(WHOIS_SOURCE, vec![ip_reference(ip)]);
        return Ok(report);
    }

    let domain = validate_domain(&request.subject)?;
    tracing::info!("WHOIS lookup for {}", domain);

    let d = domain.clone();
    let job = ProviderJob::new(WHOIS_SOURCE, async move {
        match lookup.whois(&d).await {
            Ok(record) => Ok(records(record)),
            Err(e @ WhoisError::NotFound(_)) => {
                Ok(vec![NormalizedRecord::no_results(WHOIS_SOURCE, e.to_string())])
            }
            Err(e) => Err(ProviderError::Upstream(e.to_string())),
        }
    });

    let mut report = AggregatedReport::new();
    for record in fan_out.isolate(job).await {
        let source = record.source().to_string();
        report.push(&source, vec![record]);
    }

    tracing::info!(
        "WHOIS lookup for {} produced {} records",
        domain,
        report.total_records()
    );
    Ok(report)
}

/// One WHOIS record followed by one record per contact role
fn records(whois: WhoisRecord) -> Vec<NormalizedRecord> {
    let mut out = vec![NormalizedRecord::data(WHOIS_SOURCE, Outcome::Present)
        .with("domain_name", whois.domain_name)
        .with_opt("registrar", whois.registrar)
        .with_opt("whois_server", whois.whois_server)
        .with_opt("referral_url", whois.referral_url)
        .with_opt("creation_date", whois.creation_date)
        .with_opt("updated_date", whois.updated_date)
        .with_opt("expiration_date", whois.expiration_date)
        .with("name_servers", whois.name_servers)
        .with("status", whois.status)
        .with_opt("dnssec", whois.dnssec)
        .with_opt("abuse_email", whois.abuse_email)
        .with_opt("abuse_phone", whois.abuse_phone)
        .with("raw", whois.raw)];

    for role in CONTACT_ROLES {
        let Some(fields) = whois.contacts.get(*role) else {
            continue;
        };
        let contact = fields.iter().fold(
            NormalizedRecord::data(CONTACTS_SOURCE, Outcome::Present).with("role", *role),
            |record, (field, value)| record.with(field, value.as_str()),
        );
        out.push(contact);
    }

    out
}

fn ip_reference(ip: IpAddr) -> NormalizedRecord {
    NormalizedRecord::manual_reference(
        WHOIS_SOURCE,
        "IP WHOIS",
        format!("Registration data for {}", ip),
        format!("https://search.arin.net/rdap/?query={}", ip),
        "IP WHOIS is served by the regional registries; follow the links to look it up.",
    )
    .with("ip", ip.to_string())
    .with(
        "lookup_urls",
        vec![
            format!("https://search.arin.net/rdap/?query={}", ip),
            format!("https://whois.arin.net/rest/ip/{}", ip),
        ],
    )
}
