//! Integration tests for the OSINT tools
//!
//! HTTP-backed flows run against wiremock servers through the real reqwest
//! fetcher. Flows with fixed public URLs use a scripted fetcher instead, and
//! DNS goes through a table-driven resolver.

use async_trait::async_trait;
use osint_ripple::dispatch::{Dispatcher, FetchResponse, HeaderSet, HttpFetch, TransportError};
use osint_ripple::model::{RecordKind, GENERAL_SOURCE};
use osint_ripple::registry::SearchType;
use osint_ripple::resolve::{DnsAnswer, DnsData, DnsError, DnsResolve, RecordType};
use osint_ripple::tools::social::{COMMENTS, POSTS, PROFILE, TWEETS};
use osint_ripple::tools::{Analysis, DnsRequest, IpApiGeolocator, Platform, TcpWhois};
use osint_ripple::{Config, Engine, OsintError, QueryRequest, ValidationError};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a configuration with no pacing and a fixed seed
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.dispatch.min_delay_ms = 0;
    config.dispatch.max_delay_ms = 0;
    config.dispatch.seed = Some(42);
    config.dns.subdomain_delay_ms = 0;
    config
}

/// Resolver answering from a table; unknown names resolve to nothing
#[derive(Default)]
struct TableResolver {
    answers: HashMap<(String, RecordType), Vec<DnsAnswer>>,
    calls: AtomicUsize,
}

impl TableResolver {
    fn with(mut self, name: &str, record_type: RecordType, data: Vec<DnsData>) -> Self {
        let answers = data
            .into_iter()
            .map(|data| DnsAnswer { ttl: 300, data })
            .collect();
        self.answers.insert((name.to_string(), record_type), answers);
        self
    }
}

#[async_trait]
impl DnsResolve for TableResolver {
    async fn resolve(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsAnswer>, DnsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .answers
            .get(&(name.to_string(), record_type))
            .cloned()
            .unwrap_or_default())
    }

    async fn resolve_ptr(&self, _ip: IpAddr) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        None
    }
}

/// Fetcher answering by URL substring, in insertion order
#[derive(Default)]
struct ScriptedFetch {
    routes: Vec<(&'static str, u16, &'static str)>,
    slow: Vec<&'static str>,
    calls: AtomicUsize,
}

impl ScriptedFetch {
    fn route(mut self, needle: &'static str, status: u16, body: &'static str) -> Self {
        self.routes.push((needle, status, body));
        self
    }

    fn slow(mut self, needle: &'static str) -> Self {
        self.slow.push(needle);
        self
    }
}

#[async_trait]
impl HttpFetch for ScriptedFetch {
    async fn fetch(
        &self,
        url: &str,
        _headers: &HeaderSet,
        _timeout: Duration,
    ) -> Result<FetchResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.slow.iter().any(|needle| url.contains(needle)) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }

        let (status, body) = self
            .routes
            .iter()
            .find(|(needle, _, _)| url.contains(needle))
            .map(|(_, status, body)| (*status, *body))
            .unwrap_or((404, ""));

        Ok(FetchResponse {
            status,
            final_url: url.to_string(),
            body: body.to_string(),
        })
    }
}

/// Builds an engine over the reqwest fetcher and the given resolver
fn create_engine(config: Config, resolver: Arc<dyn DnsResolve>) -> Engine {
    let dispatcher = Arc::new(Dispatcher::with_reqwest(config).expect("Failed to build client"));
    let geolocator = Arc::new(IpApiGeolocator::new(dispatcher.clone()));
    let whois = Arc::new(TcpWhois::new("127.0.0.1", 9, Duration::from_secs(1)));
    Engine::with_collaborators(dispatcher, resolver, whois, geolocator)
}

/// Builds an engine over a scripted fetcher
fn create_scripted_engine(config: Config, fetcher: Arc<ScriptedFetch>) -> Engine {
    let dispatcher = Arc::new(Dispatcher::new(config, fetcher));
    let geolocator = Arc::new(IpApiGeolocator::new(dispatcher.clone()));
    let whois = Arc::new(TcpWhois::new("127.0.0.1", 9, Duration::from_secs(1)));
    Engine::with_collaborators(
        dispatcher,
        Arc::new(TableResolver::default()),
        whois,
        geolocator,
    )
}

#[tokio::test]
async fn test_username_found_on_two_of_four_platforms() {
    let fetcher = Arc::new(
        ScriptedFetch::default()
            .route("github.com", 200, "<html><h1>octo</h1></html>")
            .route("medium.com", 200, "<html><h1>octo's stories</h1></html>")
            .route("reddit.com", 200, "Sorry, nobody on Reddit goes by that name."),
    );
    let engine = create_scripted_engine(create_test_config(), fetcher.clone());

    let request =
        QueryRequest::new("octo").with_providers(["Twitter", "GitHub", "Reddit", "Medium"]);
    let report = engine.check_username(&request).await.unwrap();

    let order: Vec<&str> = report.sources().collect();
    assert_eq!(order, vec!["GitHub", "Medium", "Reddit", "Twitter"]);

    assert!(report.get("GitHub").unwrap()[0].outcome().is_present());
    assert!(report.get("Medium").unwrap()[0].outcome().is_present());
    assert!(!report.get("Reddit").unwrap()[0].outcome().is_present());

    let twitter = &report.get("Twitter").unwrap()[0];
    assert!(!twitter.outcome().is_present());
    assert_eq!(twitter.number("status_code"), Some(404.0));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_slow_platform_times_out_alone() {
    let mut config = create_test_config();
    config.dispatch.provider_timeout_secs = 1;
    let fetcher = Arc::new(
        ScriptedFetch::default()
            .route("github.com", 200, "<html>octo</html>")
            .slow("twitter.com"),
    );
    let engine = create_scripted_engine(config, fetcher);

    let request = QueryRequest::new("octo").with_providers(["Twitter", "GitHub"]);
    let report = engine.check_username(&request).await.unwrap();

    assert_eq!(report.len(), 2);
    assert!(report.get("GitHub").unwrap()[0].outcome().is_present());
    let twitter = &report.get("Twitter").unwrap()[0];
    assert!(twitter.outcome().is_error());
    assert!(twitter.error().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_unknown_platform_is_rejected_before_dispatch() {
    let fetcher = Arc::new(ScriptedFetch::default());
    let engine = create_scripted_engine(create_test_config(), fetcher.clone());

    let request = QueryRequest::new("octo").with_providers(["Myspace"]);
    let err = engine.check_username(&request).await.unwrap_err();

    assert!(matches!(err, OsintError::UnknownProvider(_)));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dns_empty_type_keeps_its_key() {
    let resolver = Arc::new(TableResolver::default().with(
        "example.com",
        RecordType::A,
        vec![DnsData::A(Ipv4Addr::new(93, 184, 216, 34))],
    ));
    let engine = create_engine(create_test_config(), resolver);

    let request = DnsRequest::new("example.com")
        .with_record_types(vec![RecordType::A, RecordType::Mx])
        .records_only();
    let report = engine.enumerate_dns(&request).await.unwrap();

    let order: Vec<&str> = report.sources().collect();
    assert_eq!(order, vec!["A", "MX"]);

    let a = report.get("A").unwrap();
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].text("value"), Some("93.184.216.34"));
    assert_eq!(a[0].text("reverse_dns"), Some("Not available"));
    assert!(report.get("MX").unwrap().is_empty());
}

#[tokio::test]
async fn test_geolocation_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/1.1.1.1"))
        .and(query_param(
            "fields",
            "status,message,country,countryCode,region,regionName,city,zip,lat,lon,timezone,isp,org,as,query",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"status":"success","query":"1.1.1.1","country":"Australia",
                "countryCode":"AU","regionName":"Queensland","city":"South Brisbane",
                "lat":-27.4766,"lon":153.0166,"isp":"Cloudflare, Inc"}"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.endpoints.geolocation = mock_server.uri();
    let engine = create_engine(config, Arc::new(TableResolver::default()));

    let report = engine.geolocate(&QueryRequest::new("1.1.1.1")).await.unwrap();

    let geo = &report.get("Geolocation").unwrap()[0];
    assert_eq!(geo.text("country"), Some("Australia"));
    assert_eq!(geo.text("country_code"), Some("AU"));
    assert_eq!(geo.text("city"), Some("South Brisbane"));
    assert_eq!(geo.number("lat"), Some(-27.4766));
    assert!(geo.get("hostname").is_none());
    assert!(report.get("Threat Intelligence").is_some());
}

#[tokio::test]
async fn test_geolocation_failure_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/8.8.4.4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"status":"fail","message":"invalid query"}"#),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.endpoints.geolocation = mock_server.uri();
    let engine = create_engine(config, Arc::new(TableResolver::default()));

    let report = engine.geolocate(&QueryRequest::new("8.8.4.4")).await.unwrap();

    let geo = &report.get("Geolocation").unwrap()[0];
    assert!(geo.outcome().is_error());
    assert!(geo.error().unwrap().contains("invalid query"));
}

#[tokio::test]
async fn test_private_address_makes_no_calls() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.endpoints.geolocation = mock_server.uri();
    let resolver = Arc::new(TableResolver::default());
    let engine = create_engine(config, resolver.clone());

    let err = engine
        .geolocate(&QueryRequest::new("10.0.0.5"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OsintError::InvalidSubject(ValidationError::NotGeolocatable { .. })
    ));
    assert!(err.to_string().contains("private"));
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_reddit_user_with_failing_comments() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/spez/about.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data":{"name":"spez","link_karma":1200,"comment_karma":800,"created_utc":1118030400.0}}"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/spez/submitted.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data":{"children":[
                {"data":{"title":"Hello","subreddit":"announcements","score":10,"created_utc":1700000000}},
                {"data":{"title":"Again","subreddit":"announcements","score":30,"created_utc":1700003600}},
                {"data":{"title":"Elsewhere","subreddit":"rust","score":20,"created_utc":1700007200}}
            ]}}"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/spez/comments.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.endpoints.reddit = mock_server.uri();
    let engine = create_engine(config, Arc::new(TableResolver::default()));

    let report = engine
        .analyze_social(Platform::Reddit, Analysis::User, &QueryRequest::new("spez"))
        .await
        .unwrap();

    let profile = &report.get(PROFILE).unwrap()[0];
    assert_eq!(profile.text("username"), Some("spez"));
    assert_eq!(profile.number("post_karma"), Some(1200.0));

    assert_eq!(report.get(POSTS).unwrap().len(), 3);

    let comments = report.get(COMMENTS).unwrap();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].outcome().is_error());

    assert!(report.insight("top_subreddits").is_some());
    assert!(report.insight("avg_post_score").is_some());
    assert!(report.insight("avg_comment_score").is_none());
}

#[tokio::test]
async fn test_twitter_user_through_mirror() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ferris"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
            <div class="profile-card">
              <a class="profile-card-fullname">Ferris</a>
              <ul class="profile-statlist">
                <li><span class="profile-stat-header">Followers</span><span class="profile-stat-num">1.5K</span></li>
              </ul>
            </div>
            <div class="timeline">
              <div class="timeline-item">
                <a class="username">@ferris</a>
                <div class="tweet-content">Hello #rust</div>
                <span class="tweet-date"><a title="Jan 5, 2024 · 3:04 PM UTC">Jan 5</a></span>
              </div>
            </div>
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.mirrors.nitter = vec![mock_server.uri()];
    let engine = create_engine(config, Arc::new(TableResolver::default()));

    let report = engine
        .analyze_social(Platform::Twitter, Analysis::User, &QueryRequest::new("@ferris"))
        .await
        .unwrap();

    let profile = &report.get(PROFILE).unwrap()[0];
    assert_eq!(profile.text("name"), Some("Ferris"));
    assert_eq!(profile.number("followers_count"), Some(1500.0));

    let tweets = report.get(TWEETS).unwrap();
    assert_eq!(tweets.len(), 1);
    assert_eq!(tweets[0].text("username"), Some("ferris"));
    assert!(report.insight("most_active_day").is_some());
    assert!(report.insight("top_hashtags").is_some());
}

#[tokio::test]
async fn test_dark_web_scope_without_providers_is_general() {
    let fetcher = Arc::new(ScriptedFetch::default());
    let engine = create_scripted_engine(create_test_config(), fetcher.clone());

    let request = QueryRequest::new("leak").with_providers(["Ahmia"]);
    let report = engine
        .search_dark_web(&request, SearchType::Forums)
        .await
        .unwrap();

    let general = report.get(GENERAL_SOURCE).unwrap();
    assert_eq!(general.len(), 1);
    assert_eq!(general[0].kind(), RecordKind::NoResults);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}
