//! OSINT-Ripple: multi-provider open-source intelligence aggregation
//!
//! This crate fans a single subject (username, domain, IP address, search
//! term) out to many independent public providers, normalizes whatever each
//! one returns into a common record shape, and folds the results into one
//! report with derived insights. A provider that fails, times out or changes
//! its page structure degrades into an annotated record; it never takes the
//! rest of the batch down with it.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod insight;
pub mod model;
pub mod parse;
pub mod registry;
pub mod resolve;
pub mod tools;
pub mod validate;

use std::net::IpAddr;
use thiserror::Error;

/// Main error type for request-level failures
///
/// Provider-level problems never surface here; they are folded into the
/// report as error records. Only problems with the request itself abort it.
#[derive(Debug, Error)]
pub enum OsintError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid subject: {0}")]
    InvalidSubject(#[from] ValidationError),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Unsupported {what}: {value}")]
    Unsupported { what: &'static str, value: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Subject validation errors, raised before any provider is contacted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("subject is empty")]
    Empty,

    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid IP address or hostname: {0}")]
    InvalidAddress(String),

    #[error("{ip}: this is a {class} address and cannot be geolocated")]
    NotGeolocatable {
        ip: IpAddr,
        class: resolve::AddressClass,
    },
}

/// Result type alias for request-level operations
pub type Result<T> = std::result::Result<T, OsintError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use engine::Engine;
pub use model::{AggregatedReport, FieldValue, NormalizedRecord, Outcome, QueryRequest, RecordKind};
