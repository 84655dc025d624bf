//! Response parsing helpers
//!
//! Tools turn raw provider payloads into records with pure extraction
//! functions. This module holds the shared pieces:
//! - HTML selection helpers over `scraper`
//! - JSON path lookups over `serde_json::Value`
//! - Tolerant number and date parsing for free-text values
//! - Hashtag, mention and keyword extraction

pub mod dates;
pub mod html;
pub mod json;
pub mod numeric;
pub mod text;

pub use dates::{from_unix, normalize_whois_date, parse_social_date, ParsedWhen};
pub use numeric::parse_count;

use thiserror::Error;

/// Errors raised while reading a provider payload
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid selector '{0}'")]
    Selector(String),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    Missing(String),

    #[error("Unexpected response shape: {0}")]
    Shape(String),
}
