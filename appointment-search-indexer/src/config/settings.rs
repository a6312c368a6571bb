//! Typed settings shared by the indexer components.

/// Default site name.
pub const DEFAULT_SITE_NAME: &str = "lutece";

/// Default site root URL.
pub const DEFAULT_SITE_ROOT_URL: &str = "http://localhost:8080/lutece/";

/// Front-office page every document URL points to.
const PORTAL_PATH: &str = "jsp/site/Portal.jsp";

/// Site the documents belong to.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Site name, stored in the `site` field and prefixed to uids.
    pub name: String,
    /// Root URL of the site, ending with `/`.
    pub root_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SITE_NAME, DEFAULT_SITE_ROOT_URL)
    }
}

impl SiteConfig {
    /// Create a site config. A missing trailing slash on the root URL is added.
    pub fn new(name: impl Into<String>, root_url: impl Into<String>) -> Self {
        let mut root_url = root_url.into();
        if !root_url.ends_with('/') {
            root_url.push('/');
        }
        Self {
            name: name.into(),
            root_url,
        }
    }

    /// URL of the front-office portal page.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.root_url, PORTAL_PATH)
    }
}

/// Indexer settings.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// When false, notifications are ignored and full runs index nothing.
    pub enabled: bool,
    pub site: SiteConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            site: SiteConfig::default(),
        }
    }
}

/// Reindex coordinator settings.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Maximum number of form rebuilds running at the same time.
    pub max_concurrent_form_rebuilds: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_form_rebuilds: 4,
        }
    }
}
