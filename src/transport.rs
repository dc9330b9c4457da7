//! HTTP transport seam
//!
//! A thin facade that never leaks `reqwest` into the public API. The
//! driver only sees [`Transport`]; the default implementation rides one
//! process-wide connection-pooled client. Non-2xx responses are returned,
//! not raised — the driver decides how an error page is routed, and
//! headers are captured even on failure paths.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use once_cell::sync::Lazy;
use reqwest::Client as ReqwestClient;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Shared, connection-pooled reqwest client
static SHARED_CLIENT: Lazy<Arc<ReqwestClient>> = Lazy::new(|| {
    Arc::new(
        reqwest::ClientBuilder::new()
            .use_rustls_tls()
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .expect("failed to initialize shared HTTP client"),
    )
});

/// Form content type used for query submissions
const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// One request against the service, relative to base URL + API prefix
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path under the API prefix, starting with `/`
    pub path: String,
    pub body: Option<Bytes>,
    pub content_type: Option<&'static str>,
}

impl ApiRequest {
    /// Build a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            content_type: None,
        }
    }

    /// Build a POST request carrying a form-encoded body
    pub fn post_form(path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body.into()),
            content_type: Some(CONTENT_TYPE_FORM),
        }
    }
}

/// One response from the service
///
/// The body is fully read before the response is handed over, so at most
/// one page body is in memory at a time and the connection is always
/// released, error paths included.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Transport collaborator executing one page request at a time
///
/// Implementations must not retry; retry policy belongs to the caller's
/// environment, not this client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a request and return the full response, whatever its status
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Default transport over the shared pooled client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base: String,
    user_agent: String,
    timeout: Duration,
    client: Arc<ReqwestClient>,
}

impl HttpTransport {
    /// Create a transport rooted at the configuration's base URL and
    /// API prefix
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base: format!("{}{}", config.base_url(), config.api_prefix()),
            user_agent: config.user_agent().to_string(),
            timeout: Duration::from_secs(config.timeout_seconds()),
            client: SHARED_CLIENT.clone(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base, request.path);

        let mut builder = self
            .client
            .request(request.method, &url)
            .header(http::header::USER_AGENT, &self.user_agent)
            .header(http::header::ACCEPT, "application/json")
            .timeout(self.timeout);
        if let Some(content_type) = request.content_type {
            builder = builder.header(http::header::CONTENT_TYPE, content_type);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| Error::Transport {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| Error::Transport {
            status: Some(status.as_u16()),
            message: format!("reading body: {e}"),
        })?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
