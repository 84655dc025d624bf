//! Reddit through its public JSON endpoints
//!
//! Multi-step flows (profile, then posts, then comments) hit the same host
//! in sequence and are paced. Only the first call is fatal; a later listing
//! that fails becomes an error record under its own section.

use super::{COMMENTS, POSTS, PROFILE, SUBREDDIT};
use crate::dispatch::{Dispatcher, ProviderError, ProviderOutput};
use crate::insight::{categorical, numeric, InsightBuilder, InsightValue};
use crate::model::{FieldValue, NormalizedRecord, Outcome};
use crate::parse::json::{array_at, at, f64_at, i64_at, str_at};
use crate::parse::{from_unix, text};
use chrono::{NaiveDateTime, Timelike, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

const PERMALINK_BASE: &str = "https://www.reddit.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    Posts,
    Comments,
}

/// Endpoint URL with each segment path-encoded
fn endpoint(
    dispatcher: &Dispatcher,
    segments: &[&str],
    limit: Option<usize>,
) -> Result<String, ProviderError> {
    let base = &dispatcher.config().endpoints.reddit;
    let invalid = || ProviderError::Upstream(format!("invalid Reddit endpoint {}", base));

    let mut url = Url::parse(base).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(segments);
    if let Some(limit) = limit {
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
    }
    Ok(url.to_string())
}

fn encode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

fn strip_prefix<'a>(query: &'a str, prefix: &str) -> &'a str {
    let query = query.trim().trim_start_matches('/');
    query.strip_prefix(prefix).unwrap_or(query)
}

pub(super) async fn user(dispatcher: &Dispatcher, query: &str, limit: usize) -> ProviderOutput {
    let username = strip_prefix(query, "u/");
    let mut pacer = dispatcher.pacer();

    pacer.wait().await;
    let about = dispatcher
        .get_json(&endpoint(dispatcher, &["user", username, "about.json"], None)?)
        .await?;
    let mut records = vec![extract_user_profile(
        &about,
        username,
        Utc::now().naive_utc(),
    )];

    pacer.wait().await;
    let posts_url = endpoint(dispatcher, &["user", username, "submitted.json"], Some(limit))?;
    records.extend(fetch_listing(dispatcher, &posts_url, Listing::Posts, limit).await);

    pacer.wait().await;
    let comments_url = endpoint(dispatcher, &["user", username, "comments.json"], Some(limit))?;
    records.extend(fetch_listing(dispatcher, &comments_url, Listing::Comments, limit).await);

    Ok(records)
}

pub(super) async fn subreddit(
    dispatcher: &Dispatcher,
    query: &str,
    limit: usize,
) -> ProviderOutput {
    let name = strip_prefix(query, "r/");
    let mut pacer = dispatcher.pacer();

    pacer.wait().await;
    let about = dispatcher
        .get_json(&endpoint(dispatcher, &["r", name, "about.json"], None)?)
        .await?;
    let mut records = vec![extract_subreddit_info(&about, name)];

    pacer.wait().await;
    let hot_url = endpoint(dispatcher, &["r", name, "hot.json"], Some(limit))?;
    records.extend(fetch_listing(dispatcher, &hot_url, Listing::Posts, limit).await);

    Ok(records)
}

pub(super) async fn search(dispatcher: &Dispatcher, query: &str, limit: usize) -> ProviderOutput {
    let url = format!(
        "{}&q={}",
        endpoint(dispatcher, &["search.json"], Some(limit))?,
        encode(query.trim())
    );
    let listing = dispatcher.get_json(&url).await?;
    Ok(or_no_results(
        extract_listing(&listing, Listing::Posts, limit),
        Listing::Posts,
    ))
}

/// Fetches a listing; failures become an error record for that section
async fn fetch_listing(
    dispatcher: &Dispatcher,
    url: &str,
    listing: Listing,
    limit: usize,
) -> Vec<NormalizedRecord> {
    let section = section(listing);
    match dispatcher.get_json(url).await {
        Ok(value) => or_no_results(extract_listing(&value, listing, limit), listing),
        Err(e) => {
            tracing::warn!("Reddit {} listing failed: {}", section, e);
            vec![NormalizedRecord::failed(section, e)]
        }
    }
}

fn section(listing: Listing) -> &'static str {
    match listing {
        Listing::Posts => POSTS,
        Listing::Comments => COMMENTS,
    }
}

fn or_no_results(records: Vec<NormalizedRecord>, listing: Listing) -> Vec<NormalizedRecord> {
    if records.is_empty() {
        let message = match listing {
            Listing::Posts => "No posts found",
            Listing::Comments => "No comments found",
        };
        vec![NormalizedRecord::no_results(section(listing), message)]
    } else {
        records
    }
}

fn manual_profile(url: String, description: String) -> NormalizedRecord {
    NormalizedRecord::manual_reference(
        PROFILE,
        "Reddit Profile",
        description,
        url,
        "The about document had no data section.",
    )
}

/// Reads a user's about document
///
/// `now` is the reference point for the account age.
pub fn extract_user_profile(about: &Value, username: &str, now: NaiveDateTime) -> NormalizedRecord {
    let Some(data) = at(about, &["data"]) else {
        return manual_profile(
            format!("{}/user/{}", PERMALINK_BASE, username),
            format!("Profile of u/{}", username),
        );
    };

    let created = f64_at(data, &["created_utc"])
        .filter(|t| *t > 0.0)
        .and_then(from_unix);

    NormalizedRecord::data(PROFILE, Outcome::Present)
        .with("username", str_at(data, &["name"]).unwrap_or(username))
        .with("post_karma", i64_at(data, &["link_karma"]).unwrap_or(0))
        .with("comment_karma", i64_at(data, &["comment_karma"]).unwrap_or(0))
        .with("awarder_karma", i64_at(data, &["awarder_karma"]).unwrap_or(0))
        .with("awardee_karma", i64_at(data, &["awardee_karma"]).unwrap_or(0))
        .with_opt("created_at", created)
        .with_opt(
            "account_age_days",
            created.map(|c| now.signed_duration_since(c).num_days()),
        )
}

/// Reads a subreddit's about document
pub fn extract_subreddit_info(about: &Value, name: &str) -> NormalizedRecord {
    let Some(data) = at(about, &["data"]) else {
        return NormalizedRecord::manual_reference(
            SUBREDDIT,
            "Subreddit",
            format!("Community r/{}", name),
            format!("{}/r/{}", PERMALINK_BASE, name),
            "The about document had no data section.",
        );
    };

    NormalizedRecord::data(SUBREDDIT, Outcome::Present)
        .with("name", str_at(data, &["display_name"]).unwrap_or(name))
        .with("title", str_at(data, &["title"]).unwrap_or_default())
        .with(
            "description",
            str_at(data, &["public_description"]).unwrap_or_default(),
        )
        .with("subscribers", i64_at(data, &["subscribers"]).unwrap_or(0))
        .with("active_users", i64_at(data, &["active_user_count"]).unwrap_or(0))
        .with_opt(
            "created_at",
            f64_at(data, &["created_utc"])
                .filter(|t| *t > 0.0)
                .and_then(from_unix),
        )
        .with(
            "type",
            str_at(data, &["subreddit_type"]).unwrap_or("unknown"),
        )
}

/// Reads up to `limit` children of a listing document
fn extract_listing(listing: &Value, kind: Listing, limit: usize) -> Vec<NormalizedRecord> {
    array_at(listing, &["data", "children"])
        .iter()
        .filter_map(|child| at(child, &["data"]))
        .take(limit)
        .map(|data| {
            let permalink = format!(
                "{}{}",
                PERMALINK_BASE,
                str_at(data, &["permalink"]).unwrap_or_default()
            );
            let record = NormalizedRecord::data(section(kind), Outcome::Present)
                .with("subreddit", str_at(data, &["subreddit"]).unwrap_or_default())
                .with_opt(
                    "created_at",
                    f64_at(data, &["created_utc"]).and_then(from_unix),
                )
                .with("score", i64_at(data, &["score"]).unwrap_or(0))
                .with("permalink", permalink);

            match kind {
                Listing::Posts => record
                    .with("title", str_at(data, &["title"]).unwrap_or_default())
                    .with("author", str_at(data, &["author"]).unwrap_or_default())
                    .with_opt("upvote_ratio", f64_at(data, &["upvote_ratio"]))
                    .with("num_comments", i64_at(data, &["num_comments"]).unwrap_or(0))
                    .with("text", str_at(data, &["selftext"]).unwrap_or_default())
                    .with("url", str_at(data, &["url"]).unwrap_or_default()),
                Listing::Comments => {
                    record.with("text", str_at(data, &["body"]).unwrap_or_default())
                }
            }
        })
        .collect()
}

fn hours(records: &[NormalizedRecord]) -> impl Iterator<Item = i64> + '_ {
    records
        .iter()
        .filter_map(|r| r.get("created_at").and_then(FieldValue::as_timestamp))
        .map(|ts| i64::from(ts.hour()))
}

/// Community and activity insights for a user
pub(super) fn user_insights(
    posts: &[NormalizedRecord],
    comments: &[NormalizedRecord],
) -> BTreeMap<String, InsightValue> {
    let subreddits = categorical(posts, "subreddit")
        .into_iter()
        .chain(categorical(comments, "subreddit"))
        .filter(|s| !s.is_empty());

    InsightBuilder::new()
        .top_n("top_subreddits", subreddits, 5)
        .average("avg_post_score", numeric(posts, "score"))
        .average("avg_comment_score", numeric(comments, "score"))
        .top_n_integers("active_hours", hours(posts).chain(hours(comments)), 3)
        .build()
}

/// Poster and topic insights for a subreddit's hot listing
pub(super) fn subreddit_insights(posts: &[NormalizedRecord]) -> BTreeMap<String, InsightValue> {
    let authors = categorical(posts, "author")
        .into_iter()
        .filter(|a| !a.is_empty() && a != "[deleted]");
    let words = posts
        .iter()
        .filter_map(|p| p.text("title"))
        .flat_map(text::title_words);

    InsightBuilder::new()
        .top_n("top_posters", authors, 5)
        .average("avg_post_score", numeric(posts, "score"))
        .top_n("common_words", words, 10)
        .top_n_integers("peak_hours", hours(posts), 3)
        .build()
}
