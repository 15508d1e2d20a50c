//! Error types for credential operations
//!
//! This module defines all error types that can occur while loading,
//! refreshing, and persisting OAuth credentials.

use thiserror::Error;

/// Authentication error types.
///
/// These errors cover credential lookup, token refresh, the local
/// authorization-code flow, and configuration issues.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No persisted credential exists; the user must run the auth flow first
    #[error("Not authenticated: no stored credential")]
    NotAuthenticated,

    /// Token refresh failed; the user must re-authorize
    #[error("Re-authentication required: {0}")]
    ReauthRequired(String),

    /// Provider or store configuration is incomplete
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// OAuth state returned by the callback did not match
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// The local callback listener failed or received a malformed request
    #[error("Callback error: {0}")]
    CallbackError(String),

    /// Token endpoint returned an error during code exchange
    #[error("Token exchange failed ({status}): {message}")]
    ExchangeFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the provider body.
        message: String,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Credential file I/O failed
    #[error("Credential file error: {0}")]
    Io(#[from] std::io::Error),

    /// Credential file contents could not be (de)serialized
    #[error("Credential serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
