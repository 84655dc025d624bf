//! Provider descriptor registry
//!
//! Static tables describing every external provider a tool can query: how to
//! build the request target, how to classify the response, and whether the
//! provider can be queried at all without credentials.
//!
//! # Components
//!
//! - `ProviderDescriptor`: one provider's id, query template and predicate
//! - `USERNAME_PLATFORMS`: profile-existence checks
//! - `DARK_WEB_PROVIDERS`: dark-web index and breach-search providers

mod darkweb;
mod username;

pub use darkweb::{DarkWebProvider, DarkWebRule, SearchType, DARK_WEB_PROVIDERS};
pub use username::USERNAME_PLATFORMS;

use crate::model::Outcome;
use crate::OsintError;

/// Placeholder substituted with the subject in query templates
pub const SUBJECT_PLACEHOLDER: &str = "{subject}";

/// How a provider's raw response is classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessPredicate {
    /// HTTP 200 and none of the markers in the body (case-insensitive)
    NotFoundMarkers(&'static [&'static str]),

    /// Any 2xx status means present
    StatusOk,

    /// The provider's extraction rule decides
    Structured,
}

impl SuccessPredicate {
    /// Classifies a response by status code and body
    pub fn classify(&self, status: u16, body: &str) -> Outcome {
        match self {
            Self::NotFoundMarkers(markers) => {
                if status != 200 {
                    return Outcome::Absent;
                }
                let body = body.to_lowercase();
                if markers.iter().any(|m| body.contains(&m.to_lowercase())) {
                    Outcome::Absent
                } else {
                    Outcome::Present
                }
            }
            Self::StatusOk => {
                if (200..300).contains(&status) {
                    Outcome::Present
                } else {
                    Outcome::Absent
                }
            }
            Self::Structured => Outcome::Indeterminate,
        }
    }
}

/// Static description of an external provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// Stable provider id, used as the report key
    pub id: &'static str,

    /// Request target with a `{subject}` placeholder
    pub query_template: &'static str,

    pub predicate: SuccessPredicate,

    /// Providers without public access are emitted as manual references
    pub requires_auth: bool,

    pub note: Option<&'static str>,
}

impl ProviderDescriptor {
    /// Substitutes the subject verbatim
    pub fn render(&self, subject: &str) -> String {
        self.query_template.replace(SUBJECT_PLACEHOLDER, subject)
    }

    /// Substitutes the subject form-urlencoded, for query-string templates
    pub fn render_encoded(&self, subject: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(subject.as_bytes()).collect();
        self.render(&encoded)
    }
}

/// Anything the registry can select by id
pub trait HasDescriptor {
    fn descriptor(&self) -> &ProviderDescriptor;
}

impl HasDescriptor for ProviderDescriptor {
    fn descriptor(&self) -> &ProviderDescriptor {
        self
    }
}

/// Selects providers by id, keeping table order
///
/// An empty selection means every provider in the table. Ids match
/// case-insensitively; an id the table does not know fails the request.
///
/// # Arguments
///
/// * `table` - Static provider table
/// * `requested` - Provider ids from the request
///
/// # Returns
///
/// * `Ok(Vec<&T>)` - Selected providers
/// * `Err(OsintError::UnknownProvider)` - A requested id is not in the table
pub fn select<'a, T: HasDescriptor>(
    table: &'a [T],
    requested: &[String],
) -> Result<Vec<&'a T>, OsintError> {
    if requested.is_empty() {
        return Ok(table.iter().collect());
    }

    for id in requested {
        if !table
            .iter()
            .any(|p| p.descriptor().id.eq_ignore_ascii_case(id))
        {
            return Err(OsintError::UnknownProvider(id.clone()));
        }
    }

    Ok(table
        .iter()
        .filter(|p| {
            requested
                .iter()
                .any(|id| p.descriptor().id.eq_ignore_ascii_case(id))
        })
        .collect())
}
