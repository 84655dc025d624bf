//! WHOIS response parsing
//!
//! Registries and registrars print `Key: Value` lines with their own key
//! spellings. Keys are matched case-insensitively against the aliases
//! below; the first value of a scalar field wins.

use crate::parse::normalize_whois_date;
use crate::tools::whois::WhoisError;
use std::collections::BTreeMap;

/// Contact roles, in report order
pub const CONTACT_ROLES: &[&str] = &["registrant", "admin", "tech"];

/// Contact attributes and the key suffixes that carry them
const CONTACT_FIELDS: &[(&str, &[&str])] = &[
    ("name", &["name"]),
    ("organization", &["organization", "organisation"]),
    ("street", &["street", "address"]),
    ("city", &["city"]),
    ("state", &["state/province", "state", "province"]),
    ("postal_code", &["postal code", "postcode"]),
    ("country", &["country"]),
    ("phone", &["phone"]),
    ("fax", &["fax"]),
    ("email", &["email", "e-mail"]),
];

/// Keys that point at the next server to ask
const REFERRAL_KEYS: &[&str] = &["refer", "registrar whois server", "whois server", "whois"];

/// Parsed WHOIS data for a domain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhoisRecord {
    pub domain_name: String,
    pub registrar: Option<String>,
    pub whois_server: Option<String>,
    pub referral_url: Option<String>,

    /// Dates are `YYYY-MM-DD` when recognized, the raw value otherwise
    pub creation_date: Option<String>,
    pub updated_date: Option<String>,
    pub expiration_date: Option<String>,

    pub name_servers: Vec<String>,
    pub status: Vec<String>,
    pub dnssec: Option<String>,
    pub abuse_email: Option<String>,
    pub abuse_phone: Option<String>,

    /// Role → attribute → value
    pub contacts: BTreeMap<String, BTreeMap<String, String>>,

    pub raw: String,
}

/// `Key: Value` pairs of a response, keys lowercased
///
/// Comment lines are skipped and parsing stops at the `>>>` footer.
fn pairs(text: &str) -> impl Iterator<Item = (String, String)> + '_ {
    text.lines()
        .map(str::trim)
        .take_while(|line| !line.starts_with(">>>"))
        .filter(|line| !line.starts_with('%') && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let value = value.trim();
            if value.is_empty() {
                return None;
            }
            Some((key.trim().to_lowercase(), value.to_string()))
        })
}

/// Server named by a referral line, if any
pub fn referral(text: &str) -> Option<String> {
    pairs(text)
        .find(|(key, _)| REFERRAL_KEYS.contains(&key.as_str()))
        .map(|(_, value)| {
            value
                .trim_start_matches("whois://")
                .trim_end_matches('/')
                .to_lowercase()
        })
        .filter(|server| !server.is_empty() && !server.contains(char::is_whitespace))
}

fn set_once(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

fn date(raw: Option<String>) -> Option<String> {
    raw.map(|value| normalize_whois_date(&value).unwrap_or(value))
}

/// Parses a WHOIS response for `domain`
///
/// # Returns
///
/// * `Ok(WhoisRecord)` - Parsed fields plus the raw text
/// * `Err(WhoisError::NotFound)` - The response names no matching domain
pub fn parse(domain: &str, text: &str) -> Result<WhoisRecord, WhoisError> {
    let mut record = WhoisRecord {
        raw: text.to_string(),
        ..WhoisRecord::default()
    };
    let mut domain_name = None;
    let (mut created, mut updated, mut expires) = (None, None, None);

    for (key, value) in pairs(text) {
        match key.as_str() {
            "domain name" => set_once(&mut domain_name, &value.to_lowercase()),
            "domain" if value.eq_ignore_ascii_case(domain) => {
                set_once(&mut domain_name, &value.to_lowercase())
            }
            "registrar" | "sponsoring registrar" | "registrar name" => {
                set_once(&mut record.registrar, &value)
            }
            "registrar whois server" | "whois server" => set_once(&mut record.whois_server, &value),
            "registrar url" | "referral url" => set_once(&mut record.referral_url, &value),
            "creation date" | "created" | "created on" | "registered on" | "registration time" => {
                set_once(&mut created, &value)
            }
            "updated date" | "last updated" | "last-update" | "changed" => {
                set_once(&mut updated, &value)
            }
            "registry expiry date"
            | "registrar registration expiration date"
            | "expiration date"
            | "expiry date"
            | "expires"
            | "expires on" => set_once(&mut expires, &value),
            "name server" | "nserver" | "nameserver" => {
                let server = value.split_whitespace().next().unwrap_or_default();
                push_unique(&mut record.name_servers, server.to_lowercase());
            }
            "domain status" | "status" => {
                let status = value.split_whitespace().next().unwrap_or_default();
                push_unique(&mut record.status, status.to_string());
            }
            "dnssec" => set_once(&mut record.dnssec, &value),
            "registrar abuse contact email" => set_once(&mut record.abuse_email, &value),
            "registrar abuse contact phone" => set_once(&mut record.abuse_phone, &value),
            _ => collect_contact(&mut record.contacts, &key, &value),
        }
    }

    record.domain_name = domain_name.ok_or_else(|| WhoisError::NotFound(domain.to_string()))?;
    record.creation_date = date(created);
    record.updated_date = date(updated);
    record.expiration_date = date(expires);
    Ok(record)
}

/// Files `registrant name`, `admin email` and similar keys under their role
fn collect_contact(
    contacts: &mut BTreeMap<String, BTreeMap<String, String>>,
    key: &str,
    value: &str,
) {
    for role in CONTACT_ROLES {
        let Some(rest) = key.strip_prefix(role).map(str::trim) else {
            continue;
        };
        let Some((field, _)) = CONTACT_FIELDS
            .iter()
            .find(|(_, suffixes)| suffixes.contains(&rest))
        else {
            return;
        };
        contacts
            .entry(role.to_string())
            .or_default()
            .entry(field.to_string())
            .or_insert_with(|| value.to_string());
        return;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = "\
   Domain Name: EXAMPLE.COM
   Registry Domain ID: 2336799_DOMAIN_COM-VRSN
   Registrar WHOIS Server: whois.iana.org
   Registrar URL: http://res-dom.iana.org
   Updated Date: 2024-08-14T07:01:34Z
   Creation Date: 1995-08-14T04:00:00Z
   Registry Expiry Date: 2025-08-13T04:00:00Z
   Registrar: RESERVED-Internet Assigned Numbers Authority
   Domain Status: clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited
   Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited
   Name Server: A.IANA-SERVERS.NET
   Name Server: B.IANA-SERVERS.NET
   DNSSEC: signedDelegation
   Registrant Organization: Internet Assigned Numbers Authority
   Registrant Country: US
   Tech Email: tech@example.com
   Registrar Abuse Contact Email: abuse@example.com
>>> Last update of whois database: 2024-09-01T00:00:00Z <<<
   Name Server: IGNORED.EXAMPLE
";

    #[test]
    fn test_parses_registry_response() {
        let record = parse("example.com", REGISTRY).unwrap();

        assert_eq!(record.domain_name, "example.com");
        assert_eq!(
            record.registrar.as_deref(),
            Some("RESERVED-Internet Assigned Numbers Authority")
        );
        assert_eq!(record.creation_date.as_deref(), Some("1995-08-14"));
        assert_eq!(record.expiration_date.as_deref(), Some("2025-08-13"));
        assert_eq!(
            record.name_servers,
            vec!["a.iana-servers.net", "b.iana-servers.net"]
        );
        assert_eq!(
            record.status,
            vec!["clientDeleteProhibited", "clientTransferProhibited"]
        );
        assert_eq!(record.dnssec.as_deref(), Some("signedDelegation"));
        assert_eq!(record.abuse_email.as_deref(), Some("abuse@example.com"));
        assert_eq!(
            record.contacts["registrant"]["organization"],
            "Internet Assigned Numbers Authority"
        );
        assert_eq!(record.contacts["tech"]["email"], "tech@example.com");
        assert!(!record.contacts.contains_key("admin"));
    }

    #[test]
    fn test_unrecognized_date_is_kept_raw() {
        let text = "Domain Name: example.se\ncreated: sometime in 1997\n";
        let record = parse("example.se", text).unwrap();
        assert_eq!(record.creation_date.as_deref(), Some("sometime in 1997"));
    }

    #[test]
    fn test_not_found() {
        let text = "No match for \"NOPE-EXAMPLE.COM\".\n>>> Last update <<<\n";
        assert!(matches!(
            parse("nope-example.com", text),
            Err(WhoisError::NotFound(_))
        ));
    }

    #[test]
    fn test_iana_referral() {
        let text = "% IANA WHOIS server\n\nrefer:        whois.verisign-grs.com\n\ndomain:       COM\n";
        assert_eq!(referral(text).as_deref(), Some("whois.verisign-grs.com"));
        assert!(matches!(
            parse("example.com", text),
            Err(WhoisError::NotFound(_))
        ));
    }
}
