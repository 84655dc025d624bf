//! DNS resolution seam
//!
//! Tools resolve names through the `DnsResolve` trait so tests can use a
//! scripted resolver. `SystemResolver` is the trust-dns implementation.
//! Missing names, empty answers and resolver timeouts all come back as an
//! empty answer list; only other failures are errors.

pub mod ip;
mod system;

pub use ip::{classify, AddressClass};
pub use system::SystemResolver;

use crate::OsintError;
use async_trait::async_trait;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use thiserror::Error;

/// Record types the enumeration understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
    Mx,
    Ns,
    Txt,
    Cname,
    Soa,
    Ptr,
}

impl RecordType {
    /// Types queried when the caller does not choose
    pub const DEFAULTS: &'static [RecordType] = &[
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Mx,
        RecordType::Ns,
        RecordType::Txt,
        RecordType::Cname,
        RecordType::Soa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Mx => "MX",
            Self::Ns => "NS",
            Self::Txt => "TXT",
            Self::Cname => "CNAME",
            Self::Soa => "SOA",
            Self::Ptr => "PTR",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = OsintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "AAAA" => Ok(Self::Aaaa),
            "MX" => Ok(Self::Mx),
            "NS" => Ok(Self::Ns),
            "TXT" => Ok(Self::Txt),
            "CNAME" => Ok(Self::Cname),
            "SOA" => Ok(Self::Soa),
            "PTR" => Ok(Self::Ptr),
            _ => Err(OsintError::Unsupported {
                what: "record type",
                value: s.to_string(),
            }),
        }
    }
}

/// Record payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Mx { preference: u16, exchange: String },
    Ns(String),
    Txt(String),
    Cname(String),
    Soa {
        mname: String,
        rname: String,
        serial: u32,
        refresh: i32,
        retry: i32,
        expire: i32,
        minimum: u32,
    },
    Ptr(String),
}

/// One answer record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    pub ttl: u32,
    pub data: DnsData,
}

/// Resolver failure other than "no such record"
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnsError {
    #[error("Invalid DNS name '{0}'")]
    InvalidName(String),

    #[error("Resolution failed: {0}")]
    Failed(String),
}

/// DNS seam used by every tool
#[async_trait]
pub trait DnsResolve: Send + Sync {
    /// Looks up records of one type
    ///
    /// Returns an empty list for NXDOMAIN, no answer and timeouts.
    async fn resolve(&self, name: &str, record_type: RecordType)
        -> Result<Vec<DnsAnswer>, DnsError>;

    /// Reverse lookup; None when there is no PTR record
    async fn resolve_ptr(&self, ip: IpAddr) -> Option<String>;

    /// IPv4 addresses of a name
    async fn lookup_ipv4(&self, name: &str) -> Result<Vec<Ipv4Addr>, DnsError> {
        let answers = self.resolve(name, RecordType::A).await?;
        Ok(answers
            .into_iter()
            .filter_map(|answer| match answer.data {
                DnsData::A(ip) => Some(ip),
                _ => None,
            })
            .collect())
    }
}

/// Strips the root label from a fully qualified name
pub(crate) fn trim_root(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted resolver for tool tests

    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Resolver answering from a table; unknown names resolve to nothing
    #[derive(Default)]
    pub struct StubResolver {
        answers: Mutex<HashMap<(String, RecordType), Result<Vec<DnsAnswer>, DnsError>>>,
        ptr: Mutex<HashMap<IpAddr, String>>,
        calls: AtomicUsize,
    }

    impl StubResolver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn answer(self, name: &str, record_type: RecordType, data: Vec<DnsData>) -> Self {
            let answers = data
                .into_iter()
                .map(|data| DnsAnswer { ttl: 300, data })
                .collect();
            self.answers
                .lock()
                .unwrap()
                .insert((name.to_string(), record_type), Ok(answers));
            self
        }

        pub fn fail(self, name: &str, record_type: RecordType, err: DnsError) -> Self {
            self.answers
                .lock()
                .unwrap()
                .insert((name.to_string(), record_type), Err(err));
            self
        }

        pub fn ptr(self, ip: &str, host: &str) -> Self {
            self.ptr
                .lock()
                .unwrap()
                .insert(ip.parse().unwrap(), host.to_string());
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DnsResolve for StubResolver {
        async fn resolve(
            &self,
            name: &str,
            record_type: RecordType,
        ) -> Result<Vec<DnsAnswer>, DnsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers
                .lock()
                .unwrap()
                .get(&(name.to_string(), record_type))
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn resolve_ptr(&self, ip: IpAddr) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.ptr.lock().unwrap().get(&ip).cloned()
        }
    }
}
