//! Configuration types for the Solr provider.

/// Default Solr base URL.
pub const DEFAULT_SOLR_URL: &str = "http://localhost:8983/solr";

/// Default Solr core.
pub const DEFAULT_SOLR_CORE: &str = "lutece";

/// Configuration for the Solr provider.
#[derive(Debug, Clone)]
pub struct SolrConfig {
    /// Solr base URL, e.g. `http://localhost:8983/solr`.
    pub url: String,
    /// Core (collection) holding the site documents.
    pub core: String,
    /// Site name prefixed to every written uid.
    pub site: String,
    /// Ask Solr to commit written documents within this delay.
    pub commit_within_ms: u64,
    /// Maximum number of documents sent in one update request.
    ///
    /// Larger batches are split. Defaults to 1000.
    pub max_batch_size: usize,
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOLR_URL.to_string(),
            core: DEFAULT_SOLR_CORE.to_string(),
            site: "lutece".to_string(),
            commit_within_ms: 1000,
            max_batch_size: 1000,
        }
    }
}

impl SolrConfig {
    /// Create a config for the given Solr URL, core and site.
    pub fn new(url: impl Into<String>, core: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            core: core.into(),
            site: site.into(),
            ..Self::default()
        }
    }

    /// Return a copy with a custom batch size limit.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    /// Return a copy with a custom commit delay.
    pub fn with_commit_within_ms(mut self, commit_within_ms: u64) -> Self {
        self.commit_within_ms = commit_within_ms;
        self
    }
}
