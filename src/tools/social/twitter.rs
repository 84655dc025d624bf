//! Twitter through Nitter mirrors

use super::{PROFILE, TWEETS};
use crate::dispatch::{Dispatcher, ProviderError, ProviderOutput};
use crate::insight::{categorical, mode, numeric, InsightBuilder, InsightValue};
use crate::model::{NormalizedRecord, Outcome};
use crate::parse::html::{element_text, first_attr, first_text, selector};
use crate::parse::{parse_count, parse_social_date, text, ParseError, ParsedWhen};
use scraper::{ElementRef, Html};
use std::collections::BTreeMap;

fn encode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

/// Picks a mirror from the configured pool
fn mirror(dispatcher: &Dispatcher) -> Result<String, ProviderError> {
    dispatcher
        .choose(&dispatcher.config().mirrors.nitter)
        .map(|m| m.trim_end_matches('/').to_string())
        .ok_or_else(|| ProviderError::Upstream("no Nitter mirror configured".to_string()))
}

pub(super) async fn user(dispatcher: &Dispatcher, query: &str, limit: usize) -> ProviderOutput {
    let username = query.trim().trim_start_matches('@');
    let mirror = mirror(dispatcher)?;
    tracing::debug!("Using Nitter mirror {}", mirror);

    let response = dispatcher
        .get_ok(&format!("{}/{}", mirror, encode(username)))
        .await?;
    Ok(extract_user_page(&response.body, username, limit)?)
}

pub(super) async fn hashtag(dispatcher: &Dispatcher, query: &str, limit: usize) -> ProviderOutput {
    let tag = query.trim().trim_start_matches('#');
    let mirror = mirror(dispatcher)?;

    let response = dispatcher
        .get_ok(&format!("{}/search?f=tweets&q=%23{}", mirror, encode(tag)))
        .await?;
    let fallback = format!("https://twitter.com/hashtag/{}", encode(tag));
    Ok(extract_search_page(&response.body, limit, &fallback)?)
}

pub(super) async fn search(dispatcher: &Dispatcher, query: &str, limit: usize) -> ProviderOutput {
    let mirror = mirror(dispatcher)?;

    let response = dispatcher
        .get_ok(&format!("{}/search?f=tweets&q={}", mirror, encode(query)))
        .await?;
    let fallback = format!("https://twitter.com/search?q={}", encode(query));
    Ok(extract_search_page(&response.body, limit, &fallback)?)
}

/// Extracts the profile card and timeline of a user page
///
/// A page with neither becomes a manual reference to the profile.
pub fn extract_user_page(
    html: &str,
    username: &str,
    limit: usize,
) -> Result<Vec<NormalizedRecord>, ParseError> {
    let document = Html::parse_document(html);
    let profile = extract_profile(&document, username)?;
    let tweets = extract_timeline(&document, limit)?;

    if profile.is_none() && tweets.is_none() {
        return Ok(vec![NormalizedRecord::manual_reference(
            PROFILE,
            "Twitter Profile",
            format!("Profile of @{}", username),
            format!("https://twitter.com/{}", username),
            "The mirror page had no profile card or timeline; it may be rate-limited.",
        )]);
    }

    let mut records: Vec<NormalizedRecord> = profile.into_iter().collect();
    match tweets {
        Some(tweets) if !tweets.is_empty() => records.extend(tweets),
        _ => records.push(NormalizedRecord::no_results(TWEETS, "No tweets found")),
    }
    Ok(records)
}

/// Extracts the timeline of a search page
pub fn extract_search_page(
    html: &str,
    limit: usize,
    fallback_url: &str,
) -> Result<Vec<NormalizedRecord>, ParseError> {
    let document = Html::parse_document(html);
    match extract_timeline(&document, limit)? {
        None => Ok(vec![NormalizedRecord::manual_reference(
            TWEETS,
            "Twitter Search",
            "Search results on Twitter",
            fallback_url,
            "The mirror page had no timeline; it may be rate-limited.",
        )]),
        Some(tweets) if tweets.is_empty() => {
            Ok(vec![NormalizedRecord::no_results(TWEETS, "No tweets found")])
        }
        Some(tweets) => Ok(tweets),
    }
}

fn extract_profile(
    document: &Html,
    username: &str,
) -> Result<Option<NormalizedRecord>, ParseError> {
    let card_sel = selector(".profile-card")?;
    let Some(card) = document.select(&card_sel).next() else {
        return Ok(None);
    };

    let mut record = NormalizedRecord::data(PROFILE, Outcome::Present)
        .with("username", username)
        .with_opt("name", first_text(card, &selector(".profile-card-fullname")?))
        .with_opt("description", first_text(card, &selector(".profile-bio")?))
        .with_opt("location", first_text(card, &selector(".profile-location")?));

    let join_sel = selector(".profile-joindate span")?;
    let joined = first_attr(card, &join_sel, "title").or_else(|| first_text(card, &join_sel));
    record = record.with_opt("created_at", joined);

    let stat_sel = selector(".profile-statlist > *")?;
    let header_sel = selector(".profile-stat-header")?;
    let num_sel = selector(".profile-stat-num")?;
    for stat in card.select(&stat_sel) {
        let (Some(name), Some(value)) = (first_text(stat, &header_sel), first_text(stat, &num_sel))
        else {
            continue;
        };
        let name = name.to_lowercase();
        let key = if name.contains("tweets") || name.contains("posts") {
            "tweets_count"
        } else if name.contains("following") {
            "following_count"
        } else if name.contains("followers") {
            "followers_count"
        } else {
            continue;
        };
        record = record.with_opt(key, parse_count(&value));
    }

    Ok(Some(record))
}

/// Tweets of the page's timeline; None when the page has no timeline at all
fn extract_timeline(
    document: &Html,
    limit: usize,
) -> Result<Option<Vec<NormalizedRecord>>, ParseError> {
    let timeline_sel = selector(".timeline")?;
    let Some(timeline) = document.select(&timeline_sel).next() else {
        return Ok(None);
    };

    let item_sel = selector(".timeline-item")?;
    let username_sel = selector("a.username")?;
    let content_sel = selector(".tweet-content")?;
    let date_sel = selector("span.tweet-date a")?;
    let stat_sel = selector(".tweet-stats .tweet-stat")?;

    let mut tweets = Vec::new();
    for item in timeline.select(&item_sel).take(limit) {
        let body = first_text(item, &content_sel);
        let created_at =
            first_attr(item, &date_sel, "title").or_else(|| first_text(item, &date_sel));

        let mut tweet = NormalizedRecord::data(TWEETS, Outcome::Present)
            .with_opt(
                "username",
                first_text(item, &username_sel).map(|u| u.trim_start_matches('@').to_string()),
            )
            .with_opt("created_at", created_at);

        if let Some(body) = body {
            let tags = text::hashtags(&body);
            let mentioned = text::mentions(&body);
            if !tags.is_empty() {
                tweet = tweet.with("hashtags", tags);
            }
            if !mentioned.is_empty() {
                tweet = tweet.with("mentions", mentioned);
            }
            tweet = tweet.with("text", body);
        }

        for stat in item.select(&stat_sel) {
            if let Some((key, count)) = tweet_stat(stat)? {
                tweet = tweet.with(key, count);
            }
        }

        tweets.push(tweet);
    }

    Ok(Some(tweets))
}

/// Reads one engagement counter, identified by its link or its icon
fn tweet_stat(stat: ElementRef<'_>) -> Result<Option<(&'static str, i64)>, ParseError> {
    let link_sel = selector("a")?;
    let href = first_attr(stat, &link_sel, "href").unwrap_or_default();
    let icons = stat
        .select(&selector("[class^='icon-']")?)
        .filter_map(|icon| icon.value().attr("class"))
        .collect::<Vec<_>>()
        .join(" ");

    let key = if href.contains("replies") || icons.contains("icon-comment") {
        "reply_count"
    } else if href.contains("retweets") || icons.contains("icon-retweet") {
        "retweet_count"
    } else if href.contains("likes") || icons.contains("icon-heart") {
        "favorite_count"
    } else {
        return Ok(None);
    };

    Ok(parse_count(&element_text(stat)).map(|count| (key, count)))
}

/// Replies plus retweets plus likes; missing counters count as zero
fn engagement(tweet: &NormalizedRecord) -> f64 {
    ["reply_count", "retweet_count", "favorite_count"]
        .iter()
        .filter_map(|key| tweet.number(key))
        .sum()
}

fn when(tweets: &[NormalizedRecord]) -> Vec<ParsedWhen> {
    tweets
        .iter()
        .filter_map(|t| t.text("created_at"))
        .filter_map(parse_social_date)
        .collect()
}

/// Activity and engagement insights for a user timeline
pub(super) fn user_insights(tweets: &[NormalizedRecord]) -> BTreeMap<String, InsightValue> {
    let when = when(tweets);

    InsightBuilder::new()
        .mode("most_active_day", when.iter().map(ParsedWhen::weekday_name))
        .value(
            "most_active_hour",
            mode(when.iter().filter_map(ParsedWhen::hour))
                .map(|hour| InsightValue::Text(format!("{}:00", hour))),
        )
        .top_n("top_hashtags", categorical(tweets, "hashtags"), 5)
        .top_n("top_mentions", categorical(tweets, "mentions"), 5)
        .average("avg_likes", numeric(tweets, "favorite_count"))
        .average("avg_retweets", numeric(tweets, "retweet_count"))
        .build()
}

/// Reach insights for a hashtag timeline; the queried tag is not "related"
pub(super) fn hashtag_insights(
    tweets: &[NormalizedRecord],
    query: &str,
) -> BTreeMap<String, InsightValue> {
    let tag = query.trim().trim_start_matches('#');
    let related = categorical(tweets, "hashtags")
        .into_iter()
        .filter(|t| !t.eq_ignore_ascii_case(tag));

    InsightBuilder::new()
        .count("tweet_count", tweets.len())
        .unique_count("unique_users", categorical(tweets, "username"))
        .average("avg_engagement", tweets.iter().map(|t| Some(engagement(t))))
        .top_n("related_hashtags", related, 10)
        .build()
}
