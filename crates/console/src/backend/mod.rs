//! Transport to the order backend.
//!
//! Sync operations talk to the backend only through the [`Backend`] trait,
//! one JSON request and one JSON response per call. [`HttpBackend`] is the
//! `reqwest` implementation; tests substitute a recording double.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use reqwest::Method;
use secrecy::SecretString;
use serde_json::Value;

use crate::auth::AuthProvider;
use crate::error::FetchError;

/// One backend call.
#[derive(Clone)]
pub struct BackendRequest {
    pub method: Method,
    /// Path below the backend base URL, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub token: Option<SecretString>,
}

impl BackendRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            token: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn bearer(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }
}

impl std::fmt::Debug for BackendRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Sends requests to the order backend.
///
/// A successful response yields its JSON body, or `Value::Null` when the
/// body is empty.
#[async_trait]
pub trait Backend: Send + Sync {
    /// # Errors
    ///
    /// Returns [`FetchError::Unauthenticated`] for 401/403,
    /// [`FetchError::Status`] for other failures, [`FetchError::Transport`]
    /// for network errors and [`FetchError::InvalidResponse`] for bodies
    /// that are not JSON.
    async fn send(&self, request: BackendRequest) -> Result<Value, FetchError>;
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for std::sync::Arc<T> {
    async fn send(&self, request: BackendRequest) -> Result<Value, FetchError> {
        (**self).send(request).await
    }
}

/// Attach the current bearer token and send.
///
/// Fails with [`FetchError::Unauthenticated`] before any request is made
/// when `auth` has no token.
pub(crate) async fn send_authorized<B, A>(
    backend: &B,
    auth: &A,
    request: BackendRequest,
) -> Result<Value, FetchError>
where
    B: Backend + ?Sized,
    A: AuthProvider + ?Sized,
{
    let token = auth
        .bearer_token()
        .ok_or(FetchError::Unauthenticated { status: None })?;
    backend.send(request.bearer(token)).await
}
