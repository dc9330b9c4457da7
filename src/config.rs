//! Immutable client configuration
//!
//! Configuration is validated during construction and never mutated
//! afterwards, so one `ClientConfig` can back any number of sequential
//! operations without locking.

use crate::error::{Error, Result};

/// Default path to the item array in a page body
pub const DEFAULT_ITEM_PATH: &str = "$.data[*]";

/// Default path to the continuation cursor in a page body
pub const DEFAULT_CURSOR_PATH: &str = "$.responseDetails.next_page";

/// Default fallback path to the error array in a failed page body
pub const DEFAULT_ERROR_PATH: &str = "$.errors[*]";

/// Default path to the status field in a page body
pub const DEFAULT_STATUS_PATH: &str = "$.responseStatus";

/// Status markers treated as success
pub const DEFAULT_ACCEPTED_STATUSES: &[&str] = &["SUCCESS", "WARNING"];

/// Path segment suffix marking a subquery object in a selected field
pub const DEFAULT_SUBQUERY_SUFFIX: &str = "__r";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// Default user agent
pub const DEFAULT_USER_AGENT: &str = concat!("tabql/", env!("CARGO_PKG_VERSION"));

/// Immutable configuration for one query client
///
/// `base_url` carries the scheme and host only; `api_prefix` is the fixed
/// two-segment API/version prefix every request path re-enters under.
/// Continuation URLs returned by the service are absolute and include the
/// same prefix, which is why the next-page rewriter strips exactly two
/// path segments.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) base_url: String,
    pub(crate) api_prefix: String,
    pub(crate) item_path: String,
    pub(crate) cursor_path: String,
    pub(crate) error_path: String,
    pub(crate) status_path: String,
    pub(crate) accepted_statuses: Vec<String>,
    pub(crate) subquery_suffix: String,
    pub(crate) timeout_seconds: u64,
    pub(crate) user_agent: String,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the endpoint
    ///
    /// `api_prefix` must be of the form `/segment/segment`, e.g. `/api/v1`.
    pub fn new(base_url: impl Into<String>, api_prefix: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let api_prefix = api_prefix.into();
        validate_base_url(&base_url)?;
        validate_api_prefix(&api_prefix)?;

        Ok(Self {
            base_url,
            api_prefix,
            item_path: DEFAULT_ITEM_PATH.to_string(),
            cursor_path: DEFAULT_CURSOR_PATH.to_string(),
            error_path: DEFAULT_ERROR_PATH.to_string(),
            status_path: DEFAULT_STATUS_PATH.to_string(),
            accepted_statuses: DEFAULT_ACCEPTED_STATUSES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            subquery_suffix: DEFAULT_SUBQUERY_SUFFIX.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    /// Create a configuration builder
    #[inline]
    pub fn builder(
        base_url: impl Into<String>,
        api_prefix: impl Into<String>,
    ) -> ClientConfigBuilder {
        ClientConfigBuilder {
            base_url: base_url.into(),
            api_prefix: api_prefix.into(),
            item_path: None,
            cursor_path: None,
            error_path: None,
            status_path: None,
            accepted_statuses: None,
            subquery_suffix: None,
            timeout_seconds: None,
            user_agent: None,
        }
    }

    /// Scheme and host requests are issued against
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fixed two-segment API/version prefix
    #[inline]
    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    /// Match path for item payloads
    #[inline]
    pub fn item_path(&self) -> &str {
        &self.item_path
    }

    /// Match path for the continuation cursor
    #[inline]
    pub fn cursor_path(&self) -> &str {
        &self.cursor_path
    }

    /// Fallback match path for error payloads
    #[inline]
    pub fn error_path(&self) -> &str {
        &self.error_path
    }

    /// Match path for the response status field
    #[inline]
    pub fn status_path(&self) -> &str {
        &self.status_path
    }

    /// Status values accepted as success
    #[inline]
    pub fn accepted_statuses(&self) -> &[String] {
        &self.accepted_statuses
    }

    /// Segment suffix marking a subquery object in selected fields
    #[inline]
    pub fn subquery_suffix(&self) -> &str {
        &self.subquery_suffix
    }

    /// Request timeout in seconds
    #[inline]
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    /// User agent sent with every request
    #[inline]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Request path of the query endpoint, relative to the API prefix
    #[inline]
    pub(crate) fn query_path(&self) -> &'static str {
        "/query"
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug)]
pub struct ClientConfigBuilder {
    base_url: String,
    api_prefix: String,
    item_path: Option<String>,
    cursor_path: Option<String>,
    error_path: Option<String>,
    status_path: Option<String>,
    accepted_statuses: Option<Vec<String>>,
    subquery_suffix: Option<String>,
    timeout_seconds: Option<u64>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    /// Override the item match path
    pub fn item_path(mut self, path: impl Into<String>) -> Self {
        self.item_path = Some(path.into());
        self
    }

    /// Override the cursor match path
    pub fn cursor_path(mut self, path: impl Into<String>) -> Self {
        self.cursor_path = Some(path.into());
        self
    }

    /// Override the error-array match path
    pub fn error_path(mut self, path: impl Into<String>) -> Self {
        self.error_path = Some(path.into());
        self
    }

    /// Override the status match path
    pub fn status_path(mut self, path: impl Into<String>) -> Self {
        self.status_path = Some(path.into());
        self
    }

    /// Override the accepted status markers
    pub fn accepted_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted_statuses = Some(statuses.into_iter().map(Into::into).collect());
        self
    }

    /// Override the subquery marker suffix
    pub fn subquery_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.subquery_suffix = Some(suffix.into());
        self
    }

    /// Override the request timeout
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Override the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<ClientConfig> {
        let mut config = ClientConfig::new(self.base_url, self.api_prefix)?;
        if let Some(v) = self.item_path {
            config.item_path = v;
        }
        if let Some(v) = self.cursor_path {
            config.cursor_path = v;
        }
        if let Some(v) = self.error_path {
            config.error_path = v;
        }
        if let Some(v) = self.status_path {
            config.status_path = v;
        }
        if let Some(v) = self.accepted_statuses {
            config.accepted_statuses = v;
        }
        if let Some(v) = self.subquery_suffix {
            config.subquery_suffix = v;
        }
        if let Some(v) = self.timeout_seconds {
            config.timeout_seconds = v;
        }
        if let Some(v) = self.user_agent {
            config.user_agent = v;
        }
        Ok(config)
    }
}

fn validate_base_url(base_url: &str) -> Result<()> {
    if base_url.is_empty() {
        return Err(Error::config("base URL cannot be empty"));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(Error::config("base URL must start with http:// or https://"));
    }
    if base_url.ends_with('/') {
        return Err(Error::config("base URL must not end with '/'"));
    }
    Ok(())
}

fn validate_api_prefix(api_prefix: &str) -> Result<()> {
    if !api_prefix.starts_with('/') {
        return Err(Error::config("API prefix must start with '/'"));
    }
    let segments: Vec<&str> = api_prefix[1..].split('/').collect();
    if segments.len() != 2 || segments.iter().any(|s| s.is_empty()) {
        return Err(Error::config(
            "API prefix must consist of exactly two path segments",
        ));
    }
    Ok(())
}
