use serde::Deserialize;

/// Main configuration structure for OSINT-Ripple
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// working configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dispatch: DispatchConfig,
    pub identity: IdentityConfig,
    pub mirrors: MirrorConfig,
    pub dns: DnsConfig,
    pub endpoints: EndpointConfig,
}

/// Fan-out and request pacing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum number of provider queries in flight at once
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,

    /// Timeout for a single outbound HTTP call (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Total budget for one provider's flow, all of its calls included (seconds)
    #[serde(rename = "provider-timeout-secs")]
    pub provider_timeout_secs: u64,

    /// Lower bound of the jitter between sequential calls to one host (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the jitter between sequential calls to one host (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Fixed seed for identity/mirror selection and jitter
    pub seed: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            request_timeout_secs: 10,
            provider_timeout_secs: 30,
            min_delay_ms: 500,
            max_delay_ms: 1500,
            seed: None,
        }
    }
}

/// Pool of browser identities used for outbound requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// User-Agent strings, one is picked per request
    #[serde(rename = "user-agents")]
    pub user_agents: Vec<String>,

    /// Accept header value
    pub accept: String,

    /// Accept-Language header value
    #[serde(rename = "accept-language")]
    pub accept_language: String,

    /// Referer sent when a flow does not supply its own
    pub referer: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            ],
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            referer: "https://www.google.com/".to_string(),
        }
    }
}

/// Third-party front-end mirrors
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Nitter instances used in place of Twitter's own front-end
    pub nitter: Vec<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            nitter: vec![
                "https://nitter.net".to_string(),
                "https://nitter.poast.org".to_string(),
                "https://nitter.privacydev.net".to_string(),
                "https://nitter.1d4.us".to_string(),
            ],
        }
    }
}

/// DNS enumeration configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    /// Resolver timeout per query (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Pause between consecutive subdomain lookups (milliseconds)
    #[serde(rename = "subdomain-delay-ms")]
    pub subdomain_delay_ms: u64,

    /// Candidate labels checked by the subdomain sweep
    pub subdomains: Vec<String>,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 3,
            subdomain_delay_ms: 100,
            subdomains: [
                "www", "mail", "ftp", "webmail", "admin", "blog", "dev", "test", "staging", "api",
                "vpn", "ns1", "ns2", "smtp", "pop", "imap", "cloud", "mobile", "app", "support",
                "shop", "portal", "cdn", "secure",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Base URLs of providers whose host may be overridden
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// ip-api compatible geolocation service
    pub geolocation: String,

    /// Reddit JSON front-end
    pub reddit: String,

    /// Instagram web front-end
    pub instagram: String,

    /// YouTube web front-end
    pub youtube: String,

    /// WHOIS server queried first (referrals are followed from there)
    #[serde(rename = "whois-root")]
    pub whois_root: String,

    /// WHOIS TCP port
    #[serde(rename = "whois-port")]
    pub whois_port: u16,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            geolocation: "http://ip-api.com".to_string(),
            reddit: "https://www.reddit.com".to_string(),
            instagram: "https://www.instagram.com".to_string(),
            youtube: "https://www.youtube.com".to_string(),
            whois_root: "whois.iana.org".to_string(),
            whois_port: 43,
        }
    }
}
