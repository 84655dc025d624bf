//! Browser identity rotation
//!
//! Every outbound request carries a header set drawn from a fixed pool of
//! browser identities. Selection goes through the dispatcher's RNG, so a
//! seeded run always picks the same identities.

use crate::config::IdentityConfig;
use rand::Rng;

/// Ordered request headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    /// Sets a header, replacing any previous value (names compare case-insensitively)
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pool of browser identities
#[derive(Debug, Clone)]
pub struct IdentityPool {
    user_agents: Vec<String>,
    accept: String,
    accept_language: String,
    default_referer: String,
}

impl IdentityPool {
    pub fn from_config(config: &IdentityConfig) -> Self {
        Self {
            user_agents: config.user_agents.clone(),
            accept: config.accept.clone(),
            accept_language: config.accept_language.clone(),
            default_referer: config.referer.clone(),
        }
    }

    /// Builds the header set for one request
    ///
    /// # Arguments
    ///
    /// * `rng` - Source of randomness for the User-Agent choice
    /// * `referer` - Referer override; the configured default is used when None
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R, referer: Option<&str>) -> HeaderSet {
        let mut headers = HeaderSet::default();

        if !self.user_agents.is_empty() {
            let idx = rng.gen_range(0..self.user_agents.len());
            headers.insert("User-Agent", self.user_agents[idx].as_str());
        }

        headers.insert("Accept", self.accept.as_str());
        headers.insert("Accept-Language", self.accept_language.as_str());
        headers.insert("Referer", referer.unwrap_or(&self.default_referer));
        headers.insert("Upgrade-Insecure-Requests", "1");
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_header_set_replaces_case_insensitively() {
        let mut headers = HeaderSet::default();
        headers.insert("Referer", "a");
        headers.insert("referer", "b");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("REFERER"), Some("b"));
    }

    #[test]
    fn test_pick_uses_pool_and_referer() {
        let pool = IdentityPool::from_config(&IdentityConfig::default());
        let mut rng = StdRng::seed_from_u64(7);

        let headers = pool.pick(&mut rng, Some("https://www.google.com/search?q=GitHub"));
        let ua = headers.get("User-Agent").unwrap();
        assert!(IdentityConfig::default().user_agents.iter().any(|u| u == ua));
        assert_eq!(
            headers.get("Referer"),
            Some("https://www.google.com/search?q=GitHub")
        );

        let headers = pool.pick(&mut rng, None);
        assert_eq!(headers.get("Referer"), Some("https://www.google.com/"));
    }

    #[test]
    fn test_seeded_selection_is_deterministic() {
        let pool = IdentityPool::from_config(&IdentityConfig::default());
        let picks = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..8)
                .map(|_| pool.pick(&mut rng, None).get("User-Agent").map(String::from))
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(42), picks(42));
    }

    #[test]
    fn test_rotation_varies() {
        let pool = IdentityPool::from_config(&IdentityConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        let agents: Vec<_> = (0..20)
            .map(|_| pool.pick(&mut rng, None).get("User-Agent").map(String::from))
            .collect();
        let first = &agents[0];
        assert!(
            !agents.iter().all(|a| a == first),
            "Expected variation in user agents"
        );
    }
}
