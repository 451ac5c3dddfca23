//! Errors raised by sync operations.

use seller_console_core::{DecodeError, ValidationError};
use thiserror::Error;

use crate::sync::Operation;

/// A backend call failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The backend rejected the credential (401/403), or no credential was
    /// available. Callers should send the user back to login.
    #[error("Unauthenticated{}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Unauthenticated { status: Option<u16> },

    /// Any other non-success status.
    #[error("Backend error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Network failure or timeout.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Whether this is the 401/403 case.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated { .. })
    }

    /// Map a non-success HTTP status and its body text.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Unauthenticated {
                status: Some(status),
            },
            _ => Self::Status { status, message },
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// A sync operation failed. The view is left as it was.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The same operation is already running on this view.
    #[error("{0} is already in progress")]
    InFlight(Operation),
}

impl SyncError {
    /// Whether the caller should send the user back to login.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Fetch(err) if err.is_unauthenticated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_auth_codes() {
        assert!(FetchError::from_status(401, String::new()).is_unauthenticated());
        assert!(FetchError::from_status(403, "Forbidden".to_string()).is_unauthenticated());
        assert!(matches!(
            FetchError::from_status(500, "boom".to_string()),
            FetchError::Status { status: 500, .. }
        ));
        assert!(!FetchError::from_status(404, String::new()).is_unauthenticated());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            FetchError::Unauthenticated { status: Some(403) }.to_string(),
            "Unauthenticated (403)"
        );
        assert_eq!(
            FetchError::Unauthenticated { status: None }.to_string(),
            "Unauthenticated"
        );
        assert_eq!(
            SyncError::InFlight(Operation::SyncShippingPrice).to_string(),
            "sync shipping price is already in progress"
        );
    }

    #[test]
    fn test_sync_error_unauthenticated() {
        let err = SyncError::from(FetchError::Unauthenticated { status: Some(401) });
        assert!(err.is_unauthenticated());
        let err = SyncError::from(ValidationError::MissingField("to"));
        assert!(!err.is_unauthenticated());
    }
}
