//! Engine facade
//!
//! `Engine` owns the configuration and the collaborators every tool needs
//! (HTTP dispatcher, DNS resolver, WHOIS client, geolocator) and exposes one
//! async entry point per tool.

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::model::{AggregatedReport, QueryRequest};
use crate::registry::SearchType;
use crate::resolve::{DnsResolve, SystemResolver};
use crate::tools::{
    self, Analysis, DnsRequest, Geolocate, IpApiGeolocator, Platform, TcpWhois, WhoisLookup,
};
use std::sync::Arc;
use std::time::Duration;

/// Entry point for every OSINT tool
pub struct Engine {
    dispatcher: Arc<Dispatcher>,
    resolver: Arc<dyn DnsResolve>,
    whois: Arc<dyn WhoisLookup>,
    geolocator: Arc<dyn Geolocate>,
}

impl Engine {
    /// Creates an engine backed by reqwest, the system resolver and TCP WHOIS
    ///
    /// # Returns
    ///
    /// * `Ok(Engine)` - Ready to run tools
    /// * `Err(OsintError::Client)` - The HTTP client could not be built
    pub fn new(config: Config) -> crate::Result<Self> {
        let dns_timeout = Duration::from_secs(config.dns.timeout_secs);
        let whois_timeout = Duration::from_secs(config.dispatch.request_timeout_secs);
        let whois = TcpWhois::from_config(&config.endpoints, whois_timeout);

        let dispatcher = Arc::new(Dispatcher::with_reqwest(config)?);
        let geolocator = IpApiGeolocator::new(dispatcher.clone());

        Ok(Self {
            dispatcher,
            resolver: Arc::new(SystemResolver::new(dns_timeout)),
            whois: Arc::new(whois),
            geolocator: Arc::new(geolocator),
        })
    }

    /// Creates an engine over caller-supplied collaborators
    pub fn with_collaborators(
        dispatcher: Arc<Dispatcher>,
        resolver: Arc<dyn DnsResolve>,
        whois: Arc<dyn WhoisLookup>,
        geolocator: Arc<dyn Geolocate>,
    ) -> Self {
        Self {
            dispatcher,
            resolver,
            whois,
            geolocator,
        }
    }

    pub fn config(&self) -> &Config {
        self.dispatcher.config()
    }

    pub async fn check_username(&self, request: &QueryRequest) -> crate::Result<AggregatedReport> {
        tools::check_username(self.dispatcher.clone(), request).await
    }

    pub async fn check_email(&self, request: &QueryRequest) -> crate::Result<AggregatedReport> {
        tools::check_email(self.resolver.as_ref(), request).await
    }

    pub async fn enumerate_dns(&self, request: &DnsRequest) -> crate::Result<AggregatedReport> {
        tools::enumerate_dns(&self.dispatcher, self.resolver.clone(), request).await
    }

    pub async fn search_dark_web(
        &self,
        request: &QueryRequest,
        search_type: SearchType,
    ) -> crate::Result<AggregatedReport> {
        tools::search_dark_web(self.dispatcher.clone(), request, search_type).await
    }

    pub async fn analyze_social(
        &self,
        platform: Platform,
        analysis: Analysis,
        request: &QueryRequest,
    ) -> crate::Result<AggregatedReport> {
        tools::analyze_social(self.dispatcher.clone(), platform, analysis, request).await
    }

    pub async fn geolocate(&self, request: &QueryRequest) -> crate::Result<AggregatedReport> {
        tools::geolocate(self.geolocator.as_ref(), self.resolver.as_ref(), request).await
    }

    pub async fn whois(&self, request: &QueryRequest) -> crate::Result<AggregatedReport> {
        tools::whois(self.whois.clone(), &self.dispatcher.fan_out(), request).await
    }
}
