use super::PROFILE;
use crate::model::NormalizedRecord;

/// TikTok blocks automated collection, so only a profile link is produced
pub(super) fn user(query: &str) -> Vec<NormalizedRecord> {
    let username = query.trim().trim_start_matches('@');
    vec![NormalizedRecord::manual_reference(
        PROFILE,
        "TikTok Profile",
        format!("Profile of @{}", username),
        format!("https://www.tiktok.com/@{}", username),
        "TikTok restricts automated data collection. Use the official API or a dedicated OSINT service.",
    )]
}
