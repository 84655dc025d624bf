use crate::registry::{HasDescriptor, ProviderDescriptor, SuccessPredicate};
use crate::OsintError;
use std::fmt;
use std::str::FromStr;

/// Scope of a dark-web search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    General,
    DataBreaches,
    Forums,
    Marketplaces,
    Comprehensive,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::DataBreaches => "Data Breaches",
            Self::Forums => "Forums",
            Self::Marketplaces => "Marketplaces",
            Self::Comprehensive => "Comprehensive",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = OsintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "general" => Ok(Self::General),
            "databreaches" | "breaches" => Ok(Self::DataBreaches),
            "forums" => Ok(Self::Forums),
            "marketplaces" => Ok(Self::Marketplaces),
            "comprehensive" | "all" => Ok(Self::Comprehensive),
            _ => Err(OsintError::Unsupported {
                what: "search type",
                value: s.to_string(),
            }),
        }
    }
}

/// How a dark-web provider is served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DarkWebRule {
    /// `.results-container .result-item` cards
    IntelX,

    /// `li.result` entries with redirect-wrapped onion links
    Ahmia,

    /// `table#exploits-table` rows
    ExploitDb,

    /// Needs credentials; emitted as a manual reference
    Manual,

    /// A search-engine dork link
    Dork,

    /// Only a note is emitted, no link
    NoteOnly,
}

impl DarkWebRule {
    /// Whether the provider is fetched live
    pub fn is_live(&self) -> bool {
        matches!(self, Self::IntelX | Self::Ahmia | Self::ExploitDb)
    }
}

/// A dark-web provider and the search types it serves
#[derive(Debug, Clone, Copy)]
pub struct DarkWebProvider {
    pub descriptor: ProviderDescriptor,
    pub scopes: &'static [SearchType],
    pub rule: DarkWebRule,

    /// Link shown when results must be checked by hand
    pub manual_url: &'static str,

    /// Title of the manual-reference record
    pub manual_title: &'static str,

    /// Description with a `{subject}` placeholder
    pub description: &'static str,
}

impl DarkWebProvider {
    pub fn serves(&self, search_type: SearchType) -> bool {
        self.scopes.contains(&search_type)
    }
}

impl HasDescriptor for DarkWebProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }
}

use SearchType::{Comprehensive, DataBreaches, Forums, General, Marketplaces};

const AUTH_NOTE: &str = "API access requires authentication. Please visit the website directly.";

/// Dark-web index and breach-search providers, in query order
pub static DARK_WEB_PROVIDERS: &[DarkWebProvider] = &[
    DarkWebProvider {
        descriptor: ProviderDescriptor {
            id: "IntelX",
            query_template: "https://intelx.io/tools?q={subject}",
            predicate: SuccessPredicate::Structured,
            requires_auth: false,
            note: None,
        },
        scopes: &[General, Comprehensive, DataBreaches],
        rule: DarkWebRule::IntelX,
        manual_url: "https://intelx.io/tools?q={subject}",
        manual_title: "IntelX Search",
        description: "Search query '{subject}' on IntelX manually",
    },
    DarkWebProvider {
        descriptor: ProviderDescriptor {
            id: "HaveIBeenPwned",
            query_template: "https://haveibeenpwned.com/",
            predicate: SuccessPredicate::Structured,
            requires_auth: true,
            note: Some(AUTH_NOTE),
        },
        scopes: &[DataBreaches, Comprehensive],
        rule: DarkWebRule::Manual,
        manual_url: "https://haveibeenpwned.com/",
        manual_title: "Manual Check Required",
        description: "Check if '{subject}' is in data breaches on HaveIBeenPwned",
    },
    DarkWebProvider {
        descriptor: ProviderDescriptor {
            id: "Dehashed",
            query_template: "https://www.dehashed.com/search?query={subject}",
            predicate: SuccessPredicate::Structured,
            requires_auth: true,
            note: Some(AUTH_NOTE),
        },
        scopes: &[DataBreaches, Comprehensive],
        rule: DarkWebRule::Manual,
        manual_url: "https://www.dehashed.com/search?query={subject}",
        manual_title: "Manual Check Required",
        description: "Search for '{subject}' in data breach records on Dehashed",
    },
    DarkWebProvider {
        descriptor: ProviderDescriptor {
            id: "Ahmia",
            query_template: "https://ahmia.fi/search/?q={subject}",
            predicate: SuccessPredicate::Structured,
            requires_auth: false,
            note: None,
        },
        scopes: &[General, Comprehensive],
        rule: DarkWebRule::Ahmia,
        manual_url: "https://ahmia.fi/search/?q={subject}",
        manual_title: "Ahmia Search",
        description: "Search query '{subject}' on Ahmia manually",
    },
    DarkWebProvider {
        descriptor: ProviderDescriptor {
            id: "DarkSearch",
            query_template: "https://darksearch.io/",
            predicate: SuccessPredicate::Structured,
            requires_auth: true,
            note: Some(AUTH_NOTE),
        },
        scopes: &[General, Forums, Marketplaces, Comprehensive],
        rule: DarkWebRule::Manual,
        manual_url: "https://darksearch.io/",
        manual_title: "Manual Check Required",
        description: "Search for '{subject}' on dark web through DarkSearch.io",
    },
    DarkWebProvider {
        descriptor: ProviderDescriptor {
            id: "ExploitDB",
            query_template: "https://www.exploit-db.com/search?q={subject}",
            predicate: SuccessPredicate::Structured,
            requires_auth: false,
            note: None,
        },
        scopes: &[General, Comprehensive],
        rule: DarkWebRule::ExploitDb,
        manual_url: "https://www.exploit-db.com/search?q={subject}",
        manual_title: "ExploitDB Search",
        description: "Search query '{subject}' on ExploitDB manually",
    },
    DarkWebProvider {
        descriptor: ProviderDescriptor {
            id: "Pastebin",
            query_template: "https://www.google.com/search?q=site:pastebin.com+{subject}",
            predicate: SuccessPredicate::Structured,
            requires_auth: true,
            note: Some(
                "Direct API access requires authentication. This link uses Google to search Pastebin.",
            ),
        },
        scopes: &[DataBreaches, Comprehensive],
        rule: DarkWebRule::Dork,
        manual_url: "https://www.google.com/search?q=site:pastebin.com+{subject}",
        manual_title: "Pastebin Google Search",
        description: "Search for '{subject}' on Pastebin through Google",
    },
    DarkWebProvider {
        descriptor: ProviderDescriptor {
            id: "ForumSearch",
            query_template: "",
            predicate: SuccessPredicate::Structured,
            requires_auth: true,
            note: Some(
                "Specialized forum searching would require API keys for dedicated OSINT services like Flashpoint, Recorded Future, etc.",
            ),
        },
        scopes: &[Forums, Comprehensive],
        rule: DarkWebRule::NoteOnly,
        manual_url: "",
        manual_title: "Forum Search",
        description: "Search for '{subject}' across dark web forums",
    },
    DarkWebProvider {
        descriptor: ProviderDescriptor {
            id: "MarketSearch",
            query_template: "",
            predicate: SuccessPredicate::Structured,
            requires_auth: true,
            note: Some(
                "Specialized marketplace searching would require API keys for dedicated OSINT services like Sixgill, Flare Systems, etc.",
            ),
        },
        scopes: &[Marketplaces, Comprehensive],
        rule: DarkWebRule::NoteOnly,
        manual_url: "",
        manual_title: "Market Search",
        description: "Search for '{subject}' across dark web marketplaces",
    },
];
