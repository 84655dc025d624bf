/// Normalized record definitions
///
/// Every provider response, successful or not, is reduced to one of these.
use chrono::NaiveDateTime;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A single normalized field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Timestamp(NaiveDateTime),
    List(Vec<String>),
}

impl FieldValue {
    /// Returns the text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view of integer and float values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            Self::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u16> for FieldValue {
    fn from(value: u16) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Classification of what a provider said about the subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    // ===== Definitive Answers =====
    /// The provider confirmed the subject exists / returned data
    Present,

    /// The provider confirmed the subject does not exist
    Absent,

    // ===== Undecided =====
    /// The provider answered but the answer could not be classified
    Indeterminate,

    /// The provider could not be queried or its answer could not be read
    Error(String),
}

impl Outcome {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns the error message for failed outcomes
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Indeterminate => "indeterminate",
            Self::Error(_) => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(msg) => write!(f, "error: {}", msg),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// What a record represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Extracted data
    Data,

    /// A deep link for the user to follow by hand
    ManualReference,

    /// Explicit marker that a provider (or the whole batch) found nothing
    NoResults,

    /// The provider cannot serve this query
    Unsupported,
}

/// One provider response reduced to semantic fields
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    source: String,
    fields: BTreeMap<String, FieldValue>,
    outcome: Outcome,
    kind: RecordKind,
}

impl NormalizedRecord {
    /// Creates an empty data record with the given outcome
    pub fn data(source: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            source: source.into(),
            fields: BTreeMap::new(),
            outcome,
            kind: RecordKind::Data,
        }
    }

    /// Creates a record for a provider call that failed
    pub fn failed(source: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::data(source, Outcome::Error(err.to_string()))
    }

    /// Creates a manual-reference record pointing the user at the provider
    ///
    /// # Arguments
    ///
    /// * `source` - Provider id
    /// * `title` - Short title shown to the user
    /// * `description` - What the user will find at the link
    /// * `url` - Deep link to follow
    /// * `note` - Why the data was not fetched automatically
    pub fn manual_reference(
        source: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            fields: BTreeMap::new(),
            outcome: Outcome::Indeterminate,
            kind: RecordKind::ManualReference,
        }
        .with("title", title.into())
        .with("description", description.into())
        .with("url", url.into())
        .with("note", note.into())
    }

    /// Creates the explicit "nothing found" record
    pub fn no_results(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            fields: BTreeMap::new(),
            outcome: Outcome::Absent,
            kind: RecordKind::NoResults,
        }
        .with("message", message.into())
    }

    pub fn unsupported(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            fields: BTreeMap::new(),
            outcome: Outcome::Indeterminate,
            kind: RecordKind::Unsupported,
        }
        .with("message", message.into())
    }

    /// Sets a field, replacing any previous value
    pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Sets a field only when a value is available
    pub fn with_opt<V: Into<FieldValue>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Shorthand for a text field
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    /// Shorthand for a numeric field
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_f64)
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.error_message()
    }
}

impl Serialize for NormalizedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.outcome.is_error() { 5 } else { 4 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("source", &self.source)?;
        map.serialize_entry("kind", &self.kind)?;
        map.serialize_entry("outcome", self.outcome.as_str())?;
        if let Some(msg) = self.outcome.error_message() {
            map.serialize_entry("error", msg)?;
        }
        map.serialize_entry("fields", &self.fields)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_record_carries_message() {
        let record = NormalizedRecord::failed("GitHub", "connection refused");
        assert_eq!(record.source(), "GitHub");
        assert_eq!(record.kind(), RecordKind::Data);
        assert_eq!(record.error(), Some("connection refused"));
        assert!(record.outcome().is_error());
    }

    #[test]
    fn test_error_only_serialized_for_failures() {
        let ok = NormalizedRecord::data("GitHub", Outcome::Present).with("status_code", 200u16);
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["outcome"], "present");
        assert!(json.get("error").is_none());
        assert_eq!(json["fields"]["status_code"], 200);

        let failed = NormalizedRecord::failed("GitHub", "timed out");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["outcome"], "error");
        assert_eq!(json["error"], "timed out");
    }

    #[test]
    fn test_manual_reference_fields() {
        let record = NormalizedRecord::manual_reference(
            "TikTok",
            "TikTok Profile",
            "Profile for demo",
            "https://www.tiktok.com/@demo",
            "Requires manual review",
        );
        assert_eq!(record.kind(), RecordKind::ManualReference);
        assert_eq!(record.text("url"), Some("https://www.tiktok.com/@demo"));
        assert_eq!(record.outcome(), &Outcome::Indeterminate);
    }

    #[test]
    fn test_with_opt_skips_missing_values() {
        let record = NormalizedRecord::data("Reddit", Outcome::Present)
            .with_opt("karma", Some(12i64))
            .with_opt::<i64>("awards", None);
        assert_eq!(record.number("karma"), Some(12.0));
        assert!(record.get("awards").is_none());
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::from(vec!["a".to_string(), "b".to_string()]).to_string(), "a, b");
        assert_eq!(FieldValue::from(3i64).to_string(), "3");
    }
}
