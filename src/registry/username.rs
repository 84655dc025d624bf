use crate::registry::{ProviderDescriptor, SuccessPredicate};

const fn platform(
    id: &'static str,
    query_template: &'static str,
    markers: &'static [&'static str],
) -> ProviderDescriptor {
    ProviderDescriptor {
        id,
        query_template,
        predicate: SuccessPredicate::NotFoundMarkers(markers),
        requires_auth: false,
        note: None,
    }
}

/// Platforms checked for profile existence
pub static USERNAME_PLATFORMS: &[ProviderDescriptor] = &[
    platform(
        "Twitter",
        "https://twitter.com/{subject}",
        &["page doesn't exist"],
    ),
    platform(
        "Instagram",
        "https://www.instagram.com/{subject}/",
        &["page not found", "page isn't available"],
    ),
    platform("GitHub", "https://github.com/{subject}", &["not found", "404"]),
    platform(
        "Reddit",
        "https://www.reddit.com/user/{subject}",
        &["page not found", "Sorry, nobody on Reddit"],
    ),
    platform(
        "LinkedIn",
        "https://www.linkedin.com/in/{subject}",
        &["page not found", "this page doesn't exist"],
    ),
    platform(
        "TikTok",
        "https://www.tiktok.com/@{subject}",
        &["couldn't find this account"],
    ),
    platform(
        "Pinterest",
        "https://www.pinterest.com/{subject}/",
        &["user not found", "404"],
    ),
    platform(
        "Telegram",
        "https://t.me/{subject}",
        &["Sorry, this user doesn't seem to exist"],
    ),
    platform("Medium", "https://medium.com/@{subject}", &["page not found", "404"]),
    platform(
        "DeviantArt",
        "https://www.deviantart.com/{subject}",
        &["page not found", "is not a deviantart"],
    ),
];
