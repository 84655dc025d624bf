use crate::resolve::{trim_root, DnsAnswer, DnsData, DnsError, DnsResolve, RecordType};
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use trust_dns_resolver::{
    config::{ResolverConfig, ResolverOpts},
    error::{ResolveError, ResolveErrorKind},
    proto::rr::{self, RData},
    TokioAsyncResolver,
};

/// `DnsResolve` over the system-default upstream resolvers
pub struct SystemResolver {
    resolver: TokioAsyncResolver,
}

impl SystemResolver {
    /// Creates a resolver with the given per-query timeout
    pub fn new(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }
}

fn to_wire_type(record_type: RecordType) -> rr::RecordType {
    match record_type {
        RecordType::A => rr::RecordType::A,
        RecordType::Aaaa => rr::RecordType::AAAA,
        RecordType::Mx => rr::RecordType::MX,
        RecordType::Ns => rr::RecordType::NS,
        RecordType::Txt => rr::RecordType::TXT,
        RecordType::Cname => rr::RecordType::CNAME,
        RecordType::Soa => rr::RecordType::SOA,
        RecordType::Ptr => rr::RecordType::PTR,
    }
}

/// Maps wire data to the normalized payload; None for types we do not model
fn to_dns_data(data: &RData) -> Option<DnsData> {
    let mapped = match data {
        RData::A(a) => DnsData::A(a.0),
        RData::AAAA(aaaa) => DnsData::Aaaa(aaaa.0),
        RData::MX(mx) => DnsData::Mx {
            preference: mx.preference(),
            exchange: trim_root(&mx.exchange().to_utf8()),
        },
        RData::NS(ns) => DnsData::Ns(trim_root(&ns.0.to_utf8())),
        RData::CNAME(cname) => DnsData::Cname(trim_root(&cname.0.to_utf8())),
        RData::PTR(ptr) => DnsData::Ptr(trim_root(&ptr.0.to_utf8())),
        RData::TXT(txt) => DnsData::Txt(
            txt.txt_data()
                .iter()
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                .collect::<Vec<_>>()
                .join(""),
        ),
        RData::SOA(soa) => DnsData::Soa {
            mname: trim_root(&soa.mname().to_utf8()),
            rname: trim_root(&soa.rname().to_utf8()),
            serial: soa.serial(),
            refresh: soa.refresh(),
            retry: soa.retry(),
            expire: soa.expire(),
            minimum: soa.minimum(),
        },
        _ => return None,
    };
    Some(mapped)
}

/// True for failures that mean "nothing there"
fn is_empty_answer(e: &ResolveError) -> bool {
    matches!(
        e.kind(),
        ResolveErrorKind::NoRecordsFound { .. } | ResolveErrorKind::Timeout
    )
}

#[async_trait]
impl DnsResolve for SystemResolver {
    async fn resolve(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsAnswer>, DnsError> {
        let fqdn = rr::Name::from_ascii(name).map_err(|_| DnsError::InvalidName(name.to_string()))?;

        match self.resolver.lookup(fqdn, to_wire_type(record_type)).await {
            Ok(lookup) => Ok(lookup
                .record_iter()
                .filter(|record| record.record_type() == to_wire_type(record_type))
                .filter_map(|record| {
                    let data = to_dns_data(record.data()?)?;
                    Some(DnsAnswer {
                        ttl: record.ttl(),
                        data,
                    })
                })
                .collect()),
            Err(e) if is_empty_answer(&e) => {
                tracing::debug!("No {} records for {}: {}", record_type, name, e);
                Ok(Vec::new())
            }
            Err(e) => Err(DnsError::Failed(e.to_string())),
        }
    }

    async fn resolve_ptr(&self, ip: IpAddr) -> Option<String> {
        match self.resolver.reverse_lookup(ip).await {
            Ok(lookup) => lookup.iter().next().map(|ptr| trim_root(&ptr.0.to_utf8())),
            Err(e) => {
                tracing::debug!("Reverse lookup failed for {}: {}", ip, e);
                None
            }
        }
    }
}
