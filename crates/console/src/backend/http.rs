//! `reqwest` implementation of [`Backend`].

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::{Backend, BackendRequest};
use crate::config::ConsoleConfig;
use crate::error::FetchError;

/// HTTP client for the order backend.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<HttpBackendInner>,
}

struct HttpBackendInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Transport` if the HTTP client fails to build.
    pub fn new(config: &ConsoleConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpBackendInner {
                client,
                base_url: config.api_base_url.clone(),
            }),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Handle the HTTP response: JSON body on success, mapped error
    /// otherwise.
    async fn handle_response(response: reqwest::Response) -> Result<Value, FetchError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16(), text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| FetchError::InvalidResponse(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: BackendRequest) -> Result<Value, FetchError> {
        let url = endpoint_url(&self.inner.base_url, &request.path, &request.query)?;

        let mut builder = self.inner.client.request(request.method, url);
        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        debug!(status = %response.status(), "backend responded");
        Self::handle_response(response).await
    }
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Append `path` to the base URL, keeping any path prefix the base has.
fn endpoint_url(base: &Url, path: &str, query: &[(String, String)]) -> Result<Url, FetchError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined)
        .map_err(|e| FetchError::Transport(format!("Invalid endpoint URL {joined}: {e}")))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_keeps_base_path() {
        let base = Url::parse("https://ops.example.com/api/").unwrap();
        let url = endpoint_url(&base, "/walmart/unshipped/orders", &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://ops.example.com/api/walmart/unshipped/orders"
        );
    }

    #[test]
    fn test_endpoint_url_encodes_query() {
        let base = Url::parse("http://localhost:4000").unwrap();
        let url = endpoint_url(
            &base,
            "/walmart/orders/sync",
            &[("date".to_string(), "2024-06-01".to_string())],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:4000/walmart/orders/sync?date=2024-06-01"
        );
    }

    #[test]
    fn test_new_keeps_base_url() {
        let config = ConsoleConfig::new(Url::parse("http://localhost:4000").unwrap());
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.base_url().as_str(), "http://localhost:4000/");
    }
}
