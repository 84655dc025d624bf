//! OSINT tools
//!
//! Each tool takes one subject, validates it, dispatches to its providers
//! and returns an `AggregatedReport`.

pub mod darkweb;
pub mod dns;
pub mod geo;
pub mod social;
pub mod username;
pub mod whois;

// Re-export entry points
pub use darkweb::search as search_dark_web;
pub use dns::{enumerate as enumerate_dns, DnsRequest};
pub use geo::{geolocate, Geolocate, GeoRecord, IpApiGeolocator};
pub use social::{analyze as analyze_social, Analysis, Platform};
pub use username::{check_email, check_username};
pub use whois::{whois, TcpWhois, WhoisError, WhoisLookup, WhoisRecord};
