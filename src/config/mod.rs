//! Configuration module for OSINT-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use osint_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("osint.toml")).unwrap();
//! println!("Fan-out width: {}", config.dispatch.max_concurrent);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DispatchConfig, DnsConfig, EndpointConfig, IdentityConfig, MirrorConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
