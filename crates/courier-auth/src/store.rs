//! Credential store with refresh-on-expiry and file persistence
//!
//! The [`CredentialStore`] is an owned instance handed to tool handlers by
//! dependency injection; there is no process-global cached client. It keeps
//! one credential in memory, backed by a JSON file next to the adapter, and
//! refreshes it against the provider token endpoint when expired.
//!
//! Failure semantics: network errors and provider error bodies during a
//! refresh both surface as [`AuthError::ReauthRequired`], after the
//! in-memory cache has been cleared. The file on disk is only overwritten by
//! a successful refresh.

use crate::credential::{Credential, TokenResponse, DEFAULT_EXPIRY_SKEW_SECS};
use crate::error::{AuthError, AuthResult};
use crate::provider::ProviderConfig;
use reqwest::Client;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Owns one adapter's credential: load, refresh, persist, invalidate.
pub struct CredentialStore {
    /// Path of the persisted credential file.
    path: PathBuf,

    /// Provider configuration (token endpoint, client credentials).
    config: ProviderConfig,

    /// HTTP client for token refresh.
    client: Client,

    /// In-memory cache. Cleared by `invalidate` and on refresh failure.
    cached: Mutex<Option<Credential>>,

    /// Clock-skew margin for expiry checks, in seconds.
    skew_secs: i64,
}

impl CredentialStore {
    /// Create a store backed by the given credential file.
    pub fn new(path: impl Into<PathBuf>, config: ProviderConfig) -> Self {
        Self {
            path: path.into(),
            config,
            client: Client::new(),
            cached: Mutex::new(None),
            skew_secs: DEFAULT_EXPIRY_SKEW_SECS,
        }
    }

    /// Override the expiry skew margin.
    pub fn with_skew(mut self, skew_secs: i64) -> Self {
        self.skew_secs = skew_secs;
        self
    }

    /// Path of the persisted credential file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Return a credential whose access token is valid right now.
    ///
    /// Loads the persisted credential on first use, refreshes it against the
    /// provider token endpoint when expired, and persists the merged result.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotAuthenticated`] if no credential file exists
    /// - [`AuthError::ReauthRequired`] if the refresh fails for any reason
    #[instrument(skip(self), fields(provider = self.config.provider.as_str()))]
    pub async fn get_valid_token(&self) -> AuthResult<Credential> {
        let mut cached = self.cached.lock().await;

        let credential = match cached.as_ref() {
            Some(c) => c.clone(),
            None => {
                let loaded = self.load().await?;
                *cached = Some(loaded.clone());
                loaded
            }
        };

        let now = chrono::Utc::now().timestamp();
        if !credential.is_expired(now, self.skew_secs) {
            return Ok(credential);
        }

        debug!("Access token expired, refreshing");
        match self.refresh(&credential, now).await {
            Ok(refreshed) => {
                self.persist(&refreshed).await?;
                *cached = Some(refreshed.clone());
                info!("Credential refreshed and persisted");
                Ok(refreshed)
            }
            Err(e) => {
                // Clear the cache so the next call re-reads disk; the file
                // itself is left intact for inspection.
                *cached = None;
                warn!(error = %e, "Token refresh failed");
                Err(e)
            }
        }
    }

    /// Persist a credential (e.g. right after the authorization-code
    /// exchange) and prime the cache with it.
    pub async fn store(&self, credential: Credential) -> AuthResult<()> {
        self.persist(&credential).await?;
        *self.cached.lock().await = Some(credential);
        Ok(())
    }

    /// Drop the in-memory cache.
    ///
    /// Called when a vendor request comes back 401 despite a seemingly
    /// valid token; the next `get_valid_token` re-reads the file and goes
    /// through the expiry check again.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
        debug!("Credential cache invalidated");
    }

    /// Load the credential file.
    async fn load(&self) -> AuthResult<Credential> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::NotAuthenticated);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Exchange the refresh token for a new access token.
    async fn refresh(&self, current: &Credential, now: i64) -> AuthResult<Credential> {
        let refresh_token = current
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::ReauthRequired("no refresh token on record".to_string()))?;

        let token_url = self.config.get_token_url()?;
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(&token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::ReauthRequired(format!("token endpoint unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AuthError::ReauthRequired(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ReauthRequired(format!("invalid token response: {}", e)))?;

        Ok(current.merged_with(token, now))
    }

    /// Write the credential file atomically (temp file + rename).
    async fn persist(&self, credential: &Credential) -> AuthResult<()> {
        let json = serde_json::to_vec_pretty(credential)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("courier-cred-{}.json", uuid::Uuid::now_v7()))
    }

    fn config(token_url: &str) -> ProviderConfig {
        ProviderConfig::new(Provider::Custom, "client-id", "client-secret", "http://localhost/cb")
            .with_token_url(token_url)
    }

    fn credential(expires_in: i64, issued_secs_ago: i64) -> Credential {
        Credential {
            access_token: "old-access".to_string(),
            refresh_token: Some("original-refresh".to_string()),
            token_type: "Bearer".to_string(),
            scope: Some("mail".to_string()),
            expires_in: Some(expires_in),
            created_at: chrono::Utc::now().timestamp() - issued_secs_ago,
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_not_authenticated() {
        let store = CredentialStore::new(temp_path(), config("http://localhost/token"));
        let err = store.get_valid_token().await.unwrap_err();
        assert!(matches!(err, AuthError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_valid_token_returned_without_refresh() {
        let server = MockServer::start().await;
        // No mock mounted: any request to the token endpoint would 404 and
        // fail the test via ReauthRequired.
        let path = temp_path();
        let store = CredentialStore::new(&path, config(&server.uri()));
        store.store(credential(3600, 0)).await.unwrap();

        let cred = store.get_valid_token().await.unwrap();
        assert_eq!(cred.access_token, "old-access");
    }

    #[tokio::test]
    async fn test_refresh_preserves_original_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=original-refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-access",
                "token_type": "Bearer",
                "expires_in": 3600
                // no refresh_token in the response
            })))
            .expect(1)
            .mount(&server)
            .await;

        let file = temp_path();
        let store =
            CredentialStore::new(&file, config(&format!("{}/token", server.uri())));
        store.store(credential(3600, 7200)).await.unwrap(); // expired

        let cred = store.get_valid_token().await.unwrap();
        assert_eq!(cred.access_token, "new-access");
        assert_eq!(cred.refresh_token, Some("original-refresh".to_string()));

        // Round trip: a fresh store instance reads the merged credential.
        let reloaded_store =
            CredentialStore::new(&file, config(&format!("{}/token", server.uri())));
        let reloaded = reloaded_store.get_valid_token().await.unwrap();
        assert_eq!(reloaded.access_token, "new-access");
        assert_eq!(reloaded.refresh_token, Some("original-refresh".to_string()));
    }

    #[tokio::test]
    async fn test_refresh_failure_is_reauth_required() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let store = CredentialStore::new(
            temp_path(),
            config(&format!("{}/token", server.uri())),
        );
        store.store(credential(3600, 7200)).await.unwrap();

        let err = store.get_valid_token().await.unwrap_err();
        match err {
            AuthError::ReauthRequired(msg) => assert!(msg.contains("invalid_grant")),
            other => panic!("expected ReauthRequired, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_fails() {
        let store = CredentialStore::new(temp_path(), config("http://localhost/token"));
        let mut cred = credential(3600, 7200);
        cred.refresh_token = None;
        store.store(cred).await.unwrap();

        let err = store.get_valid_token().await.unwrap_err();
        assert!(matches!(err, AuthError::ReauthRequired(_)));
    }

    #[tokio::test]
    async fn test_invalidate_clears_cache_not_disk() {
        let server = MockServer::start().await;
        let file = temp_path();
        let store = CredentialStore::new(&file, config(&server.uri()));
        store.store(credential(3600, 0)).await.unwrap();

        store.invalidate().await;

        // Cache was cleared but the file survives, so the next call reloads.
        let cred = store.get_valid_token().await.unwrap();
        assert_eq!(cred.access_token, "old-access");
    }
}
