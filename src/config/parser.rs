use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Missing sections and keys fall back to their defaults.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two runs can be told apart by their settings.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[dispatch]
max-concurrent = 8
request-timeout-secs = 6
min-delay-ms = 200
max-delay-ms = 900
seed = 42

[identity]
user-agents = ["TestAgent/1.0"]

[mirrors]
nitter = ["https://nitter.example.org"]

[dns]
subdomain-delay-ms = 0
subdomains = ["www", "mail"]
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.dispatch.max_concurrent, 8);
        assert_eq!(config.dispatch.request_timeout_secs, 6);
        assert_eq!(config.dispatch.seed, Some(42));
        assert_eq!(config.identity.user_agents, vec!["TestAgent/1.0"]);
        assert_eq!(config.mirrors.nitter.len(), 1);
        assert_eq!(config.dns.subdomains, vec!["www", "mail"]);
        // Untouched keys keep their defaults
        assert_eq!(config.dispatch.provider_timeout_secs, 30);
        assert_eq!(config.endpoints.whois_port, 43);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.dispatch.max_concurrent, 5);
        assert_eq!(config.dns.subdomains.len(), 24);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/osint.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[dispatch]
max-concurrent = 0
"#;
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_config_fingerprint() {
        let file = create_temp_config("[dispatch]\nseed = 1\n");
        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.dispatch.seed, Some(1));
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());

        let other = create_temp_config("[dispatch]\nseed = 2\n");
        assert_ne!(hash, compute_config_hash(other.path()).unwrap());
    }
}
