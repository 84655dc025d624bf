//! Query dispatcher
//!
//! This module owns everything between a tool and the network:
//! - `HttpFetch`: the outbound HTTP seam and its reqwest implementation
//! - `IdentityPool`: rotating browser header sets
//! - `Pacer`: jittered delays for sequential same-host calls
//! - `FanOut`: bounded, failure-isolating execution of provider jobs
//! - `Dispatcher`: the shared handle tools use to reach all of the above

mod fanout;
mod fetcher;
mod identity;
mod pacing;

pub use fanout::{EmptyPolicy, FanOut, ProviderJob, ProviderOutput};
pub use fetcher::{build_http_client, FetchResponse, HttpFetch, ReqwestFetcher, TransportError};
pub use identity::{HeaderSet, IdentityPool};
pub use pacing::Pacer;

use crate::config::Config;
use crate::parse::ParseError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Headroom on top of a flow's worst case
const FLOW_SLACK: Duration = Duration::from_secs(1);

/// Failure of one provider's flow
///
/// Never escapes a tool; the fan-out turns it into an error record.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("DNS error: {0}")]
    Dns(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

/// Shared handle for outbound queries
///
/// Holds the HTTP seam, the identity pool and the RNG every random choice
/// goes through.
pub struct Dispatcher {
    fetcher: Arc<dyn HttpFetch>,
    identities: IdentityPool,
    config: Config,
    rng: Mutex<StdRng>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given fetcher
    ///
    /// The RNG is seeded from `dispatch.seed` when set, from entropy otherwise.
    pub fn new(config: Config, fetcher: Arc<dyn HttpFetch>) -> Self {
        let rng = match config.dispatch.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            fetcher,
            identities: IdentityPool::from_config(&config.identity),
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Creates a dispatcher backed by reqwest
    pub fn with_reqwest(config: Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(Duration::from_secs(config.dispatch.request_timeout_secs))?;
        Ok(Self::new(config, Arc::new(ReqwestFetcher::new(client))))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.dispatch.request_timeout_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.config.dispatch.provider_timeout_secs)
    }

    /// Budget for a flow of `calls` sequential, paced calls to one host
    ///
    /// Covers every call running into its request timeout plus the pacing
    /// between calls, and is never shorter than the provider budget.
    pub fn flow_budget(&self, calls: u32) -> Duration {
        let calls = calls.max(1);
        let worst_case = self.request_timeout() * calls
            + Duration::from_millis(self.config.dispatch.max_delay_ms) * (calls - 1)
            + FLOW_SLACK;
        worst_case.max(self.provider_timeout())
    }

    /// Runs `f` with exclusive access to the RNG
    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut guard = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    /// Picks one element of a slice
    pub fn choose<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.with_rng(|rng| rng.gen_range(0..items.len()));
        items.get(idx)
    }

    /// Creates a pacer for one sequential flow
    pub fn pacer(&self) -> Pacer {
        self.pacer_with(
            Duration::from_millis(self.config.dispatch.min_delay_ms),
            Duration::from_millis(self.config.dispatch.max_delay_ms),
        )
    }

    /// Creates a pacer with an explicit delay range
    pub fn pacer_with(&self, min: Duration, max: Duration) -> Pacer {
        let seed = self.with_rng(|rng| rng.gen::<u64>());
        Pacer::new(min, max, StdRng::seed_from_u64(seed))
    }

    /// Fan-out configured from `[dispatch]`
    pub fn fan_out(&self) -> FanOut {
        FanOut::new(self.config.dispatch.max_concurrent, self.provider_timeout())
    }

    /// GET with a fresh identity and the default referer
    pub async fn get(&self, url: &str) -> Result<FetchResponse, ProviderError> {
        self.get_with_referer(url, None).await
    }

    /// GET with a fresh identity
    ///
    /// Non-2xx statuses are returned as responses.
    pub async fn get_with_referer(
        &self,
        url: &str,
        referer: Option<&str>,
    ) -> Result<FetchResponse, ProviderError> {
        let headers = self.with_rng(|rng| self.identities.pick(rng, referer));
        let timeout = self.request_timeout();

        tracing::debug!("GET {}", url);
        match tokio::time::timeout(timeout, self.fetcher.fetch(url, &headers, timeout)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TransportError::Timeout.into()),
        }
    }

    /// GET that treats any non-2xx status as a failure
    pub async fn get_ok(&self, url: &str) -> Result<FetchResponse, ProviderError> {
        let response = self.get(url).await?;
        if !response.is_success() {
            return Err(ProviderError::Status {
                status: response.status,
                url: response.final_url,
            });
        }
        Ok(response)
    }

    /// GET a 2xx JSON document
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, ProviderError> {
        let response = self.get_ok(url).await?;
        serde_json::from_str(&response.body).map_err(|e| ProviderError::Parse(e.into()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted fetcher for tool tests

    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned reply for a URL
    #[derive(Clone)]
    pub enum Reply {
        Body(u16, String),
        Fail(TransportError),
        Hang,
    }

    /// Fetcher answering from a URL → reply table
    ///
    /// Unknown URLs get a 404 with an empty body.
    #[derive(Default)]
    pub struct StubFetcher {
        replies: Mutex<HashMap<String, Reply>>,
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, HeaderSet)>>,
    }

    impl StubFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, url: &str, status: u16, body: &str) -> Self {
            self.set(url, Reply::Body(status, body.to_string()))
        }

        pub fn fail(self, url: &str, err: TransportError) -> Self {
            self.set(url, Reply::Fail(err))
        }

        pub fn hang(self, url: &str) -> Self {
            self.set(url, Reply::Hang)
        }

        fn set(self, url: &str, reply: Reply) -> Self {
            self.replies
                .lock()
                .unwrap()
                .insert(url.to_string(), reply);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn seen(&self) -> Vec<(String, HeaderSet)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpFetch for StubFetcher {
        async fn fetch(
            &self,
            url: &str,
            headers: &HeaderSet,
            _timeout: Duration,
        ) -> Result<FetchResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((url.to_string(), headers.clone()));

            let reply = self.replies.lock().unwrap().get(url).cloned();
            match reply {
                Some(Reply::Body(status, body)) => Ok(FetchResponse {
                    status,
                    final_url: url.to_string(),
                    body,
                }),
                Some(Reply::Fail(err)) => Err(err),
                Some(Reply::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(TransportError::Timeout)
                }
                None => Ok(FetchResponse {
                    status: 404,
                    final_url: url.to_string(),
                    body: String::new(),
                }),
            }
        }
    }

    /// Config with no pacing delay and a fixed seed
    pub fn quiet_config() -> Config {
        let mut config = Config::default();
        config.dispatch.min_delay_ms = 0;
        config.dispatch.max_delay_ms = 0;
        config.dispatch.seed = Some(7);
        config.dns.subdomain_delay_ms = 0;
        config
    }

    pub fn dispatcher(config: Config, fetcher: Arc<StubFetcher>) -> Dispatcher {
        Dispatcher::new(config, fetcher)
    }
}
