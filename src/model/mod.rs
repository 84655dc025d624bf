//! Normalized data model shared by every tool
//!
//! # Components
//!
//! - `NormalizedRecord`: one provider response reduced to semantic fields
//! - `Outcome`: what the provider said (present, absent, indeterminate, error)
//! - `AggregatedReport`: records grouped by source plus derived insights
//! - `QueryRequest`: subject, provider selection and per-provider limit

mod record;
mod report;
mod request;

// Re-export main types
pub use record::{FieldValue, NormalizedRecord, Outcome, RecordKind};
pub use report::{AggregatedReport, GENERAL_SOURCE};
pub use request::{QueryRequest, DEFAULT_LIMIT};
