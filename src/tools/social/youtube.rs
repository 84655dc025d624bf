use super::CHANNEL;
use crate::dispatch::{Dispatcher, ProviderOutput};
use crate::model::{NormalizedRecord, Outcome};
use crate::parse::parse_count;
use once_cell::sync::Lazy;
use regex::Regex;

static CHANNEL_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""channelMetadataRenderer":\s*\{\s*"title":\s*"([^"]+)""#)
        .expect("channel name regex is hardcoded and valid")
});

static SUBSCRIBERS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""subscriberCountText":\s*\{\s*"simpleText":\s*"([^"]+)""#)
        .expect("subscriber regex is hardcoded and valid")
});

const UNKNOWN: &str = "Unknown";

/// Tries the legacy `/user/` URL first, then the `@handle` URL
pub(super) async fn user(dispatcher: &Dispatcher, query: &str) -> ProviderOutput {
    let base = dispatcher
        .config()
        .endpoints
        .youtube
        .trim_end_matches('/')
        .to_string();
    let handle = query.trim();
    let legacy_url = format!("{}/user/{}", base, handle.trim_start_matches('@'));
    let handle_url = if handle.starts_with('@') {
        format!("{}/{}", base, handle)
    } else {
        format!("{}/@{}", base, handle)
    };

    let mut pacer = dispatcher.pacer();
    pacer.wait().await;
    let mut response = dispatcher.get(&legacy_url).await?;
    if !response.is_success() {
        tracing::debug!(
            "YouTube legacy URL returned {}, trying {}",
            response.status,
            handle_url
        );
        pacer.wait().await;
        response = dispatcher.get_ok(&handle_url).await?;
    }

    Ok(vec![extract_channel(&response.body, &response.final_url)])
}

/// Pulls the channel name and subscriber count out of the page's inline JSON
pub fn extract_channel(html: &str, channel_url: &str) -> NormalizedRecord {
    let name = CHANNEL_NAME_RE.captures(html).map(|c| c[1].to_string());
    let subscribers = SUBSCRIBERS_RE.captures(html).map(|c| c[1].to_string());

    let outcome = if name.is_some() {
        Outcome::Present
    } else {
        Outcome::Indeterminate
    };

    NormalizedRecord::data(CHANNEL, outcome)
        .with_opt("subscribers", subscribers.as_deref().and_then(parse_count))
        .with("channel_name", name.unwrap_or_else(|| UNKNOWN.to_string()))
        .with(
            "subscriber_count",
            subscribers.unwrap_or_else(|| UNKNOWN.to_string()),
        )
        .with("channel_url", channel_url)
        .with(
            "note",
            "For comprehensive YouTube analysis, use the YouTube Data API.",
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_name_and_subscribers() {
        let html = r#"var ytInitialData = {"metadata":{"channelMetadataRenderer": {"title": "Rust Videos"}},"header":{"subscriberCountText": {"simpleText": "1.2M subscribers"}}};"#;

        let record = extract_channel(html, "https://www.youtube.com/@rustvideos");

        assert!(record.outcome().is_present());
        assert_eq!(record.text("channel_name"), Some("Rust Videos"));
        assert_eq!(record.text("subscriber_count"), Some("1.2M subscribers"));
        assert_eq!(record.number("subscribers"), Some(1_200_000.0));
    }

    #[test]
    fn test_missing_metadata_is_unknown() {
        let record = extract_channel("<html></html>", "https://www.youtube.com/@nobody");
        assert_eq!(record.text("channel_name"), Some("Unknown"));
        assert_eq!(record.text("subscriber_count"), Some("Unknown"));
        assert!(record.get("subscribers").is_none());
    }
}
