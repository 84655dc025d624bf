/// Default number of records kept per provider
pub const DEFAULT_LIMIT: usize = 30;

/// A single tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// What is being looked up (username, domain, IP, search term)
    pub subject: String,

    /// Provider ids to query; empty means every eligible provider
    pub providers: Vec<String>,

    /// Maximum records retained per provider
    pub limit: usize,
}

impl QueryRequest {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            providers: Vec::new(),
            limit: DEFAULT_LIMIT,
        }
    }

    /// Restricts the request to the given provider ids
    pub fn with_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.providers = providers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}
