//! DNS enumeration
//!
//! Record types are queried concurrently through the fan-out. Every
//! requested type gets a key in the report, empty when the domain has no
//! such records. Two derived sections follow: "Additional" (what is known
//! about each A address) and "Subdomains" (a paced sweep over common
//! labels).

use crate::dispatch::{Dispatcher, EmptyPolicy, ProviderError, ProviderJob};
use crate::model::{AggregatedReport, NormalizedRecord, Outcome};
use crate::resolve::{classify, AddressClass, DnsAnswer, DnsData, DnsResolve, RecordType};
use crate::validate::validate_domain;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

pub const ADDITIONAL_SOURCE: &str = "Additional";
pub const SUBDOMAINS_SOURCE: &str = "Subdomains";

const NOT_AVAILABLE: &str = "Not available";

/// What to enumerate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRequest {
    pub domain: String,

    /// Types to query; empty means the defaults
    pub record_types: Vec<RecordType>,

    /// Whether to run the subdomain sweep
    pub sweep_subdomains: bool,

    /// Whether to build the "Additional" section
    pub resolve_additional: bool,
}

impl DnsRequest {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            record_types: Vec::new(),
            sweep_subdomains: true,
            resolve_additional: true,
        }
    }

    pub fn with_record_types(mut self, record_types: Vec<RecordType>) -> Self {
        self.record_types = record_types;
        self
    }

    /// Only the record-type sections
    pub fn records_only(mut self) -> Self {
        self.sweep_subdomains = false;
        self.resolve_additional = false;
        self
    }
}

/// Enumerates DNS records for a domain
///
/// # Arguments
///
/// * `dispatcher` - Supplies the fan-out width, budget and pacing
/// * `resolver` - DNS seam
/// * `request` - Domain and record-type selection
///
/// # Returns
///
/// * `Ok(AggregatedReport)` - One key per record type plus derived sections
/// * `Err(OsintError)` - The domain is invalid
pub async fn enumerate(
    dispatcher: &Dispatcher,
    resolver: Arc<dyn DnsResolve>,
    request: &DnsRequest,
) -> crate::Result<AggregatedReport> {
    let domain = validate_domain(&request.domain)?;
    let record_types: Vec<RecordType> = if request.record_types.is_empty() {
        RecordType::DEFAULTS.to_vec()
    } else {
        let mut unique = Vec::new();
        for t in &request.record_types {
            if !unique.contains(t) {
                unique.push(*t);
            }
        }
        unique
    };

    tracing::info!(
        "Enumerating {} record types for {}",
        record_types.len(),
        domain
    );

    let jobs = record_types
        .iter()
        .map(|&record_type| {
            let resolver = resolver.clone();
            let domain = domain.clone();
            ProviderJob::new(record_type.as_str(), async move {
                query_records(resolver.as_ref(), &domain, record_type).await
            })
        })
        .collect();

    let mut report = dispatcher
        .fan_out()
        .with_empty_policy(EmptyPolicy::KeepEmpty)
        .run(jobs)
        .await;

    // Fan-out reports in completion order; present types in request order
    report.sort_sources_by(|(a, _), (b, _)| {
        let pos = |name: &str| record_types.iter().position(|t| t.as_str() == name);
        pos(a).cmp(&pos(b))
    });

    if request.resolve_additional {
        if let Some(a_records) = report.get(RecordType::A.as_str()) {
            let ips: Vec<IpAddr> = a_records
                .iter()
                .filter_map(|r| r.text("value"))
                .filter_map(|v| v.parse().ok())
                .collect();
            if !ips.is_empty() {
                let additional = additional_info(resolver.as_ref(), &ips).await;
                report.push(ADDITIONAL_SOURCE, additional);
            }
        }
    }

    if request.sweep_subdomains {
        let delay = Duration::from_millis(dispatcher.config().dns.subdomain_delay_ms);
        let labels = &dispatcher.config().dns.subdomains;
        let found = sweep_subdomains(dispatcher, resolver.as_ref(), &domain, labels, delay).await;
        report.push(SUBDOMAINS_SOURCE, found);
    }

    tracing::info!(
        "DNS enumeration of {} produced {} records",
        domain,
        report.total_records()
    );

    Ok(report)
}

/// Queries one record type and shapes the answers
async fn query_records(
    resolver: &dyn DnsResolve,
    domain: &str,
    record_type: RecordType,
) -> Result<Vec<NormalizedRecord>, ProviderError> {
    let answers = resolver
        .resolve(domain, record_type)
        .await
        .map_err(|e| ProviderError::Dns(e.to_string()))?;

    let mut records = Vec::with_capacity(answers.len());
    for answer in answers {
        records.push(shape_answer(resolver, record_type, answer).await);
    }
    Ok(records)
}

/// First IPv4 address of a host, or "Not available"
async fn first_ip(resolver: &dyn DnsResolve, host: &str) -> String {
    match resolver.lookup_ipv4(host).await {
        Ok(ips) => ips
            .first()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        Err(_) => NOT_AVAILABLE.to_string(),
    }
}

async fn shape_answer(
    resolver: &dyn DnsResolve,
    record_type: RecordType,
    answer: DnsAnswer,
) -> NormalizedRecord {
    let source = record_type.as_str();
    let record = NormalizedRecord::data(source, Outcome::Present).with("ttl", answer.ttl);

    match answer.data {
        DnsData::A(ip) => {
            let reverse = resolver
                .resolve_ptr(IpAddr::V4(ip))
                .await
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            record
                .with("value", ip.to_string())
                .with("reverse_dns", reverse)
        }
        DnsData::Aaaa(ip) => record.with("value", ip.to_string()),
        DnsData::Mx {
            preference,
            exchange,
        } => {
            let ip = first_ip(resolver, &exchange).await;
            record
                .with("preference", preference)
                .with("exchange", exchange)
                .with("ip", ip)
        }
        DnsData::Ns(nameserver) => {
            let ip = first_ip(resolver, &nameserver).await;
            record.with("nameserver", nameserver).with("ip", ip)
        }
        DnsData::Txt(value) => record.with("value", value),
        DnsData::Cname(target) => record.with("target", target),
        DnsData::Soa {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        } => record
            .with("mname", mname)
            .with("rname", rname)
            .with("serial", serial)
            .with("refresh", i64::from(refresh))
            .with("retry", i64::from(retry))
            .with("expire", i64::from(expire))
            .with("minimum", minimum),
        DnsData::Ptr(host) => record.with("value", host),
    }
}

/// Annotates each A address: non-public ranges by class, public ones by PTR
async fn additional_info(resolver: &dyn DnsResolve, ips: &[IpAddr]) -> Vec<NormalizedRecord> {
    let mut records = Vec::new();
    for &ip in ips {
        let class = classify(ip);
        if class == AddressClass::Private {
            records.push(
                NormalizedRecord::data(ADDITIONAL_SOURCE, Outcome::Present)
                    .with("ip", ip.to_string())
                    .with("info", "Private IP address range"),
            );
            continue;
        }
        if !class.is_public() {
            records.push(
                NormalizedRecord::data(ADDITIONAL_SOURCE, Outcome::Present)
                    .with("ip", ip.to_string())
                    .with("info", format!("{} address", class)),
            );
            continue;
        }
        if let Some(hostname) = resolver.resolve_ptr(ip).await {
            records.push(
                NormalizedRecord::data(ADDITIONAL_SOURCE, Outcome::Present)
                    .with("ip", ip.to_string())
                    .with("hostname", hostname),
            );
        }
    }
    records
}

/// Looks up `label.domain` for each label, one at a time
async fn sweep_subdomains(
    dispatcher: &Dispatcher,
    resolver: &dyn DnsResolve,
    domain: &str,
    labels: &[String],
    delay: Duration,
) -> Vec<NormalizedRecord> {
    let mut pacer = dispatcher.pacer_with(delay, delay);
    let mut found = Vec::new();

    for label in labels {
        pacer.wait().await;
        let fqdn = format!("{}.{}", label, domain);
        match resolver.resolve(&fqdn, RecordType::A).await {
            Ok(answers) => {
                for answer in answers {
                    if let DnsData::A(ip) = answer.data {
                        found.push(
                            NormalizedRecord::data(SUBDOMAINS_SOURCE, Outcome::Present)
                                .with("subdomain", fqdn.as_str())
                                .with("ip", ip.to_string())
                                .with("ttl", answer.ttl),
                        );
                    }
                }
            }
            Err(e) => tracing::debug!("Subdomain lookup failed for {}: {}", fqdn, e),
        }
    }

    tracing::debug!("Subdomain sweep of {} found {} hosts", domain, found.len());
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::testing::{dispatcher, quiet_config, StubFetcher};
    use crate::resolve::testing::StubResolver;
    use crate::resolve::DnsError;
    use crate::OsintError;
    use std::net::Ipv4Addr;

    fn setup() -> Dispatcher {
        dispatcher(quiet_config(), Arc::new(StubFetcher::new()))
    }

    #[tokio::test]
    async fn test_missing_type_keeps_empty_key() {
        let resolver: Arc<dyn DnsResolve> = Arc::new(StubResolver::new().answer(
            "example.com",
            RecordType::A,
            vec![DnsData::A(Ipv4Addr::new(93, 184, 216, 34))],
        ));
        let request = DnsRequest::new("example.com")
            .with_record_types(vec![RecordType::A, RecordType::Mx])
            .records_only();

        let report = enumerate(&setup(), resolver, &request).await.unwrap();

        assert_eq!(report.get("A").unwrap().len(), 1);
        assert_eq!(report.get("MX"), Some(&[][..]));
        let names: Vec<_> = report.sources().collect();
        assert_eq!(names, vec!["A", "MX"]);
    }

    #[tokio::test]
    async fn test_a_record_shape() {
        let resolver: Arc<dyn DnsResolve> = Arc::new(
            StubResolver::new()
                .answer(
                    "example.com",
                    RecordType::A,
                    vec![DnsData::A(Ipv4Addr::new(93, 184, 216, 34))],
                )
                .ptr("93.184.216.34", "edge.example.net"),
        );
        let request = DnsRequest::new("example.com")
            .with_record_types(vec![RecordType::A])
            .records_only();

        let report = enumerate(&setup(), resolver, &request).await.unwrap();
        let record = &report.get("A").unwrap()[0];

        assert_eq!(record.text("value"), Some("93.184.216.34"));
        assert_eq!(record.text("reverse_dns"), Some("edge.example.net"));
        assert_eq!(record.number("ttl"), Some(300.0));
    }

    #[tokio::test]
    async fn test_mx_and_ns_carry_target_ip() {
        let resolver: Arc<dyn DnsResolve> = Arc::new(
            StubResolver::new()
                .answer(
                    "example.com",
                    RecordType::Mx,
                    vec![DnsData::Mx {
                        preference: 10,
                        exchange: "mail.example.com".to_string(),
                    }],
                )
                .answer(
                    "mail.example.com",
                    RecordType::A,
                    vec![DnsData::A(Ipv4Addr::new(203, 0, 113, 9))],
                )
                .answer(
                    "example.com",
                    RecordType::Ns,
                    vec![DnsData::Ns("ns1.example.com".to_string())],
                ),
        );
        let request = DnsRequest::new("example.com")
            .with_record_types(vec![RecordType::Mx, RecordType::Ns])
            .records_only();

        let report = enumerate(&setup(), resolver, &request).await.unwrap();

        let mx = &report.get("MX").unwrap()[0];
        assert_eq!(mx.text("exchange"), Some("mail.example.com"));
        assert_eq!(mx.text("ip"), Some("203.0.113.9"));
        assert_eq!(mx.number("preference"), Some(10.0));

        let ns = &report.get("NS").unwrap()[0];
        assert_eq!(ns.text("ip"), Some("Not available"));
    }

    #[tokio::test]
    async fn test_resolver_failure_is_an_error_record() {
        let resolver: Arc<dyn DnsResolve> = Arc::new(StubResolver::new().fail(
            "example.com",
            RecordType::Txt,
            DnsError::Failed("SERVFAIL".to_string()),
        ));
        let request = DnsRequest::new("example.com")
            .with_record_types(vec![RecordType::Txt, RecordType::A])
            .records_only();

        let report = enumerate(&setup(), resolver, &request).await.unwrap();

        assert!(report.get("TXT").unwrap()[0].outcome().is_error());
        assert!(report.get("A").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_additional_and_subdomains() {
        let resolver: Arc<dyn DnsResolve> = Arc::new(
            StubResolver::new()
                .answer(
                    "example.com",
                    RecordType::A,
                    vec![
                        DnsData::A(Ipv4Addr::new(10, 0, 0, 1)),
                        DnsData::A(Ipv4Addr::new(93, 184, 216, 34)),
                    ],
                )
                .ptr("93.184.216.34", "edge.example.net")
                .answer(
                    "www.example.com",
                    RecordType::A,
                    vec![DnsData::A(Ipv4Addr::new(93, 184, 216, 35))],
                ),
        );
        let mut config = quiet_config();
        config.dns.subdomains = vec!["www".to_string(), "mail".to_string()];
        let dispatcher = dispatcher(config, Arc::new(StubFetcher::new()));
        let request =
            DnsRequest::new("example.com").with_record_types(vec![RecordType::A]);

        let report = enumerate(&dispatcher, resolver, &request).await.unwrap();

        let additional = report.get(ADDITIONAL_SOURCE).unwrap();
        assert_eq!(additional.len(), 2);
        assert_eq!(additional[0].text("info"), Some("Private IP address range"));
        assert_eq!(additional[1].text("hostname"), Some("edge.example.net"));

        let subdomains = report.get(SUBDOMAINS_SOURCE).unwrap();
        assert_eq!(subdomains.len(), 1);
        assert_eq!(subdomains[0].text("subdomain"), Some("www.example.com"));
    }

    #[tokio::test]
    async fn test_invalid_domain() {
        let resolver: Arc<dyn DnsResolve> = Arc::new(StubResolver::new());
        let err = enumerate(&setup(), resolver, &DnsRequest::new("not a domain"))
            .await
            .unwrap_err();
        assert!(matches!(err, OsintError::InvalidSubject(_)));
    }
}
