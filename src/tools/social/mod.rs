//! Social-media analysis
//!
//! One platform front-end is queried per request. Its records are grouped
//! into report sections ("Profile", "Tweets", "Posts", ...) and insights are
//! derived from the data records of those sections. A failure of the first
//! call of a flow becomes an error record under the flow's primary section.
//! A flow's budget covers all of its sequential calls, so a slow later call
//! fails on its own request timeout and earlier sections are kept.

mod instagram;
mod reddit;
mod tiktok;
mod twitter;
mod youtube;

// Re-export
pub use instagram::extract_profile as extract_instagram_profile;
pub use reddit::{extract_subreddit_info, extract_user_profile as extract_reddit_profile};
pub use twitter::{extract_search_page, extract_user_page};
pub use youtube::extract_channel;

use crate::dispatch::{Dispatcher, ProviderJob};
use crate::insight::InsightValue;
use crate::model::{AggregatedReport, NormalizedRecord, QueryRequest, RecordKind};
use crate::validate::validate_query;
use crate::OsintError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const PROFILE: &str = "Profile";
pub const TWEETS: &str = "Tweets";
pub const POSTS: &str = "Posts";
pub const COMMENTS: &str = "Comments";
pub const SUBREDDIT: &str = "Subreddit";
pub const CHANNEL: &str = "Channel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Twitter,
    Reddit,
    Instagram,
    TikTok,
    YouTube,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Twitter => "Twitter",
            Self::Reddit => "Reddit",
            Self::Instagram => "Instagram",
            Self::TikTok => "TikTok",
            Self::YouTube => "YouTube",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = OsintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twitter" | "x" => Ok(Self::Twitter),
            "reddit" => Ok(Self::Reddit),
            "instagram" => Ok(Self::Instagram),
            "tiktok" => Ok(Self::TikTok),
            "youtube" => Ok(Self::YouTube),
            _ => Err(OsintError::Unsupported {
                what: "platform",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analysis {
    User,
    Hashtag,
    Search,
    Subreddit,
}

impl Analysis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Hashtag => "hashtag",
            Self::Search => "search",
            Self::Subreddit => "subreddit",
        }
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Analysis {
    type Err = OsintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "profile" => Ok(Self::User),
            "hashtag" => Ok(Self::Hashtag),
            "search" => Ok(Self::Search),
            "subreddit" => Ok(Self::Subreddit),
            _ => Err(OsintError::Unsupported {
                what: "analysis",
                value: s.to_string(),
            }),
        }
    }
}

/// Supported platform and analysis pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    TwitterUser,
    TwitterHashtag,
    TwitterSearch,
    RedditUser,
    RedditSubreddit,
    RedditSearch,
    InstagramUser,
    TikTokUser,
    YouTubeUser,
}

impl Flow {
    fn resolve(platform: Platform, analysis: Analysis) -> crate::Result<Self> {
        use Analysis::*;
        let flow = match (platform, analysis) {
            (Platform::Twitter, User) => Self::TwitterUser,
            (Platform::Twitter, Hashtag) => Self::TwitterHashtag,
            (Platform::Twitter, Search) => Self::TwitterSearch,
            (Platform::Reddit, User) => Self::RedditUser,
            (Platform::Reddit, Subreddit) => Self::RedditSubreddit,
            (Platform::Reddit, Search) => Self::RedditSearch,
            (Platform::Instagram, User) => Self::InstagramUser,
            (Platform::TikTok, User) => Self::TikTokUser,
            (Platform::YouTube, User) => Self::YouTubeUser,
            _ => {
                return Err(OsintError::Unsupported {
                    what: "analysis",
                    value: format!("{} on {}", analysis, platform),
                })
            }
        };
        Ok(flow)
    }

    /// Sequential calls the flow makes at most
    fn calls(&self) -> u32 {
        match self {
            Self::RedditUser => 3,
            Self::RedditSubreddit | Self::YouTubeUser => 2,
            Self::TikTokUser => 0,
            Self::TwitterUser
            | Self::TwitterHashtag
            | Self::TwitterSearch
            | Self::RedditSearch
            | Self::InstagramUser => 1,
        }
    }

    /// Section that carries the flow's error record if its first call fails
    fn primary_section(&self) -> &'static str {
        match self {
            Self::TwitterHashtag | Self::TwitterSearch => TWEETS,
            Self::RedditSearch => POSTS,
            Self::RedditSubreddit => SUBREDDIT,
            Self::YouTubeUser => CHANNEL,
            Self::TwitterUser | Self::RedditUser | Self::InstagramUser | Self::TikTokUser => {
                PROFILE
            }
        }
    }
}

/// Analyzes a subject on one social platform
///
/// # Arguments
///
/// * `dispatcher` - Shared query dispatcher
/// * `platform` - Front-end to query
/// * `analysis` - What the subject is (user, hashtag, search, subreddit)
/// * `request` - The subject and the maximum number of items per listing
///
/// # Returns
///
/// * `Ok(AggregatedReport)` - Sections of records plus derived insights
/// * `Err(OsintError)` - Empty subject or a pair the platform does not support
pub async fn analyze(
    dispatcher: Arc<Dispatcher>,
    platform: Platform,
    analysis: Analysis,
    request: &QueryRequest,
) -> crate::Result<AggregatedReport> {
    let flow = Flow::resolve(platform, analysis)?;
    let query = validate_query(&request.subject)?;
    let limit = request.limit.max(1);

    tracing::info!("Analyzing {} '{}' on {}", analysis, query, platform);

    let d = dispatcher.clone();
    let q = query.clone();
    let section = flow.primary_section();
    let job = match flow {
        Flow::TwitterUser => {
            ProviderJob::new(section, async move { twitter::user(&d, &q, limit).await })
        }
        Flow::TwitterHashtag => {
            ProviderJob::new(section, async move { twitter::hashtag(&d, &q, limit).await })
        }
        Flow::TwitterSearch => {
            ProviderJob::new(section, async move { twitter::search(&d, &q, limit).await })
        }
        Flow::RedditUser => {
            ProviderJob::new(section, async move { reddit::user(&d, &q, limit).await })
        }
        Flow::RedditSubreddit => {
            ProviderJob::new(section, async move { reddit::subreddit(&d, &q, limit).await })
        }
        Flow::RedditSearch => {
            ProviderJob::new(section, async move { reddit::search(&d, &q, limit).await })
        }
        Flow::InstagramUser => {
            ProviderJob::new(section, async move { instagram::user(&d, &q).await })
        }
        Flow::TikTokUser => ProviderJob::new(section, async move { Ok(tiktok::user(&q)) }),
        Flow::YouTubeUser => {
            ProviderJob::new(section, async move { youtube::user(&d, &q).await })
        }
    };

    let records = dispatcher
        .fan_out()
        .with_job_timeout(dispatcher.flow_budget(flow.calls()))
        .isolate(job)
        .await;
    let mut report = group_by_source(records);
    report.extend_insights(insights(flow, &report, &query));
    report.ensure_not_empty(&format!("No results found for '{}' on {}", query, platform));

    tracing::info!(
        "{} analysis of '{}' produced {} records and {} insights",
        platform,
        query,
        report.total_records(),
        report.insights().len()
    );

    Ok(report)
}

/// Sections in first-seen order
fn group_by_source(records: Vec<NormalizedRecord>) -> AggregatedReport {
    let mut report = AggregatedReport::new();
    for record in records {
        let source = record.source().to_string();
        report.push(&source, vec![record]);
    }
    report
}

/// Data records of a section; error, manual and no-result records carry no signal
fn data_records(report: &AggregatedReport, section: &str) -> Vec<NormalizedRecord> {
    report
        .get(section)
        .unwrap_or_default()
        .iter()
        .filter(|r| r.kind() == RecordKind::Data && !r.outcome().is_error())
        .cloned()
        .collect()
}

fn insights(flow: Flow, report: &AggregatedReport, query: &str) -> BTreeMap<String, InsightValue> {
    match flow {
        Flow::TwitterUser => twitter::user_insights(&data_records(report, TWEETS)),
        Flow::TwitterHashtag => twitter::hashtag_insights(&data_records(report, TWEETS), query),
        Flow::RedditUser => reddit::user_insights(
            &data_records(report, POSTS),
            &data_records(report, COMMENTS),
        ),
        Flow::RedditSubreddit => reddit::subreddit_insights(&data_records(report, POSTS)),
        Flow::TwitterSearch
        | Flow::RedditSearch
        | Flow::InstagramUser
        | Flow::TikTokUser
        | Flow::YouTubeUser => BTreeMap::new(),
    }
}
