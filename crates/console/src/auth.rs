//! Credential injection for backend requests.
//!
//! Sync operations never read a token from ambient state; they ask the
//! [`AuthProvider`] they were built with, once per request.

use secrecy::SecretString;

/// Source of the bearer token attached to backend requests.
pub trait AuthProvider: Send + Sync {
    /// The current token, or `None` when the user is logged out.
    fn bearer_token(&self) -> Option<SecretString>;
}

/// A fixed token, or none at all.
#[derive(Clone, Default)]
pub struct StaticToken(Option<SecretString>);

impl StaticToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(SecretString::from(token.into())))
    }

    /// A provider that never yields a token.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }
}

impl From<Option<SecretString>> for StaticToken {
    fn from(token: Option<SecretString>) -> Self {
        Self(token)
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticToken")
            .field(&self.0.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AuthProvider for StaticToken {
    fn bearer_token(&self) -> Option<SecretString> {
        self.0.clone()
    }
}

impl<T: AuthProvider + ?Sized> AuthProvider for std::sync::Arc<T> {
    fn bearer_token(&self) -> Option<SecretString> {
        (**self).bearer_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_static_token() {
        let provider = StaticToken::new("abc123");
        assert_eq!(
            provider.bearer_token().map(|t| t.expose_secret().to_owned()),
            Some("abc123".to_string())
        );
        assert!(StaticToken::none().bearer_token().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug_output = format!("{:?}", StaticToken::new("super_secret_token"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token"));
    }
}
