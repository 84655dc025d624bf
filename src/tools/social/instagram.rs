use super::PROFILE;
use crate::dispatch::{Dispatcher, ProviderOutput};
use crate::model::{NormalizedRecord, Outcome};
use crate::parse::json::{at, bool_at, i64_at, str_at};
use crate::parse::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static SHARED_DATA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)window\._sharedData\s*=\s*(\{.*?\});\s*</script>")
        .expect("shared data regex is hardcoded and valid")
});

pub(super) async fn user(dispatcher: &Dispatcher, query: &str) -> ProviderOutput {
    let username = query.trim().trim_start_matches('@');
    let url = format!(
        "{}/{}/",
        dispatcher.config().endpoints.instagram.trim_end_matches('/'),
        username
    );

    let response = dispatcher.get_ok(&url).await?;
    Ok(vec![extract_profile(&response.body, username, &url)?])
}

/// Reads the profile embedded in the page's `_sharedData` script
///
/// Pages without the embedded document (login walls, new layouts) become a
/// manual reference to the profile.
pub fn extract_profile(
    html: &str,
    username: &str,
    profile_url: &str,
) -> Result<NormalizedRecord, ParseError> {
    let manual = || {
        NormalizedRecord::manual_reference(
            PROFILE,
            "Instagram Profile",
            format!("Profile of @{}", username),
            profile_url,
            "Instagram did not embed profile data in the page; it heavily restricts scraping.",
        )
    };

    let Some(caps) = SHARED_DATA_RE.captures(html) else {
        return Ok(manual());
    };
    let shared: Value = serde_json::from_str(&caps[1])?;

    let Some(user) = at(&shared, &["entry_data", "ProfilePage", "0", "graphql", "user"]) else {
        return Ok(manual());
    };

    Ok(NormalizedRecord::data(PROFILE, Outcome::Present)
        .with("username", str_at(user, &["username"]).unwrap_or(username))
        .with("full_name", str_at(user, &["full_name"]).unwrap_or_default())
        .with("biography", str_at(user, &["biography"]).unwrap_or_default())
        .with(
            "follower_count",
            i64_at(user, &["edge_followed_by", "count"]).unwrap_or(0),
        )
        .with(
            "following_count",
            i64_at(user, &["edge_follow", "count"]).unwrap_or(0),
        )
        .with(
            "media_count",
            i64_at(user, &["edge_owner_to_timeline_media", "count"]).unwrap_or(0),
        )
        .with("is_private", bool_at(user, &["is_private"]).unwrap_or(false))
        .with("is_verified", bool_at(user, &["is_verified"]).unwrap_or(false))
        .with(
            "external_url",
            str_at(user, &["external_url"]).unwrap_or_default(),
        )
        .with("profile_url", profile_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordKind;

    #[test]
    fn test_extracts_shared_data_profile() {
        let html = r#"<script type="text/javascript">window._sharedData = {"entry_data":{"ProfilePage":[{"graphql":{"user":{"username":"ferris","full_name":"Ferris","edge_followed_by":{"count":4200},"edge_follow":{"count":12},"is_verified":true,"external_url":null}}}]}};</script>"#;

        let record = extract_profile(html, "ferris", "https://www.instagram.com/ferris/").unwrap();

        assert_eq!(record.kind(), RecordKind::Data);
        assert_eq!(record.number("follower_count"), Some(4200.0));
        assert_eq!(record.number("media_count"), Some(0.0));
        assert_eq!(record.get("is_verified").and_then(|v| v.as_bool()), Some(true));
        assert_eq!(record.text("external_url"), Some(""));
    }

    #[test]
    fn test_login_wall_is_manual_reference() {
        let record = extract_profile(
            "<html><body>Log in</body></html>",
            "ferris",
            "https://www.instagram.com/ferris/",
        )
        .unwrap();
        assert_eq!(record.kind(), RecordKind::ManualReference);
    }

    #[test]
    fn test_malformed_shared_data_is_parse_error() {
        let html = "<script>window._sharedData = {not json};</script>";
        assert!(matches!(
            extract_profile(html, "ferris", "https://www.instagram.com/ferris/"),
            Err(ParseError::Json(_))
        ));
    }
}
