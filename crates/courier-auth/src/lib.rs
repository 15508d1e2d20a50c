//! # Courier Auth
//!
//! OAuth 2.0 credential lifecycle for Courier SaaS adapters.
//!
//! ## Overview
//!
//! Every adapter process owns exactly one credential for the vendor it talks
//! to. This crate handles the full lifecycle of that credential:
//!
//! - **Providers**: catalog of known OAuth providers with their endpoints
//! - **Credential**: the persisted access/refresh token pair
//! - **CredentialStore**: load, refresh-on-expiry, persist, invalidate
//! - **Callback**: one-shot local listener for the authorization code flow
//!
//! ## Usage
//!
//! ```rust,no_run
//! use courier_auth::{CredentialStore, Provider, ProviderConfig};
//!
//! async fn send_request() -> Result<(), courier_auth::AuthError> {
//!     let config = ProviderConfig::new(
//!         Provider::Google,
//!         "client-id",
//!         "client-secret",
//!         "http://localhost:8765/callback",
//!     );
//!     let store = CredentialStore::new("gmail-token.json", config);
//!
//!     // Refreshes (and persists) automatically when the token is expired.
//!     let credential = store.get_valid_token().await?;
//!     println!("bearer {}", credential.access_token);
//!     Ok(())
//! }
//! ```
//!
//! ## Refresh policy
//!
//! Tokens are refreshed only when expired (with a 60s clock-skew margin),
//! not on every call. A refresh failure clears the in-memory cache and
//! surfaces as [`AuthError::ReauthRequired`]; the credential file on disk is
//! left untouched so the failure is inspectable.

pub mod callback;
pub mod credential;
pub mod error;
pub mod provider;
pub mod store;

// Re-export main types
pub use callback::{exchange_code, CallbackListener};
pub use credential::{Credential, TokenResponse};
pub use error::{AuthError, AuthResult};
pub use provider::{authorization_url, AuthState, Provider, ProviderConfig};
pub use store::CredentialStore;
