//! Subject validation
//!
//! Every tool validates its subject before anything is dispatched. A
//! rejected subject fails the whole request with `OsintError::InvalidSubject`.

use crate::ValidationError;
use std::net::IpAddr;

/// TLDs accepted regardless of length
const COMMON_TLDS: &[&str] = &[
    "com", "net", "org", "edu", "gov", "mil", "int", "io", "co", "ai", "app", "dev", "info", "biz",
    "name", "pro", "blog", "shop", "site", "uk", "us", "ca", "au", "de", "fr", "jp", "ru", "ch",
    "it", "nl", "se", "no", "es", "me", "tv", "xyz",
];

/// Validates and normalizes a domain name
///
/// The domain is trimmed and lowercased. It must contain a dot and no
/// spaces, must not be an IP address, and must end in a common TLD or a
/// two/three letter one.
///
/// # Returns
///
/// * `Ok(String)` - The normalized domain
/// * `Err(ValidationError)` - The domain was rejected
pub fn validate_domain(raw: &str) -> Result<String, ValidationError> {
    let domain = raw.trim().trim_end_matches('.').to_lowercase();

    if domain.is_empty() {
        return Err(ValidationError::Empty);
    }

    if domain.contains(char::is_whitespace) || !domain.contains('.') {
        return Err(ValidationError::InvalidDomain(domain));
    }

    if domain.parse::<IpAddr>().is_ok() {
        return Err(ValidationError::InvalidDomain(domain));
    }

    if !valid_labels(&domain) {
        return Err(ValidationError::InvalidDomain(domain));
    }

    let tld = domain.rsplit('.').next().unwrap_or_default();
    let tld_ok = COMMON_TLDS.contains(&tld)
        || ((2..=3).contains(&tld.len()) && tld.chars().all(|c| c.is_ascii_alphabetic()));
    if !tld_ok {
        return Err(ValidationError::InvalidDomain(domain));
    }

    Ok(domain)
}

/// Checks every dot-separated label of a host name
fn valid_labels(host: &str) -> bool {
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}

/// Validates a username, stripping a leading '@'
pub fn validate_username(raw: &str) -> Result<String, ValidationError> {
    let username = raw.trim().trim_start_matches('@');

    if username.is_empty() {
        return Err(ValidationError::Empty);
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::InvalidUsername(username.to_string()));
    }

    Ok(username.to_string())
}

/// Validates an email address of the form `local@domain.tld`
///
/// # Returns
///
/// * `Ok((email, domain))` - Trimmed address and its domain part
/// * `Err(ValidationError)` - The address was rejected
pub fn validate_email(raw: &str) -> Result<(String, String), ValidationError> {
    let email = raw.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty);
    }

    let invalid = || ValidationError::InvalidEmail(email.to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || local.contains(char::is_whitespace) {
        return Err(invalid());
    }

    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() || domain.contains(char::is_whitespace) {
        return Err(invalid());
    }

    Ok((email.to_string(), domain.to_lowercase()))
}

/// Validates a free-text search query
pub fn validate_query(raw: &str) -> Result<String, ValidationError> {
    let query = raw.trim();
    if query.is_empty() {
        return Err(ValidationError::Empty);
    }
    Ok(query.to_string())
}

/// Parses an IP address, or checks that the subject looks like a hostname
pub fn validate_address(raw: &str) -> Result<Address, ValidationError> {
    let subject = raw.trim();
    if subject.is_empty() {
        return Err(ValidationError::Empty);
    }

    if let Ok(ip) = subject.parse::<IpAddr>() {
        return Ok(Address::Ip(ip));
    }

    let host = subject.trim_end_matches('.').to_lowercase();
    if host.contains('.') && valid_labels(&host) {
        Ok(Address::Host(host))
    } else {
        Err(ValidationError::InvalidAddress(subject.to_string()))
    }
}

/// A validated network subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Ip(IpAddr),
    Host(String),
}
