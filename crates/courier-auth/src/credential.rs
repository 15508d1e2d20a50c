//! Persisted credential types
//!
//! A [`Credential`] is the on-disk representation of an adapter's OAuth
//! token pair. Expiry is derived from `created_at + expires_in` rather than
//! stored, matching what provider token endpoints actually return.

use serde::{Deserialize, Serialize};

/// Default clock-skew margin applied when checking expiry, in seconds.
pub const DEFAULT_EXPIRY_SKEW_SECS: i64 = 60;

/// An OAuth credential owned by a single adapter process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    /// Access token sent as the bearer token on vendor requests
    pub access_token: String,

    /// Refresh token, if the provider issued one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token type (usually "Bearer")
    pub token_type: String,

    /// Granted scopes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Lifetime in seconds as reported by the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Unix timestamp (seconds) at which the token was issued
    pub created_at: i64,
}

impl Credential {
    /// Build a credential from a token endpoint response.
    pub fn from_response(response: TokenResponse, now: i64) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            token_type: response
                .token_type
                .unwrap_or_else(|| "Bearer".to_string()),
            scope: response.scope,
            expires_in: response.expires_in,
            created_at: now,
        }
    }

    /// Unix timestamp at which the access token expires, if known.
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_in.map(|secs| self.created_at + secs)
    }

    /// Whether the access token is expired at `now`, with a skew margin.
    ///
    /// Credentials without an `expires_in` (long-lived API keys) never
    /// expire.
    pub fn is_expired(&self, now: i64, skew_secs: i64) -> bool {
        match self.expires_at() {
            Some(at) => now + skew_secs >= at,
            None => false,
        }
    }

    /// Merge a refresh response into this credential.
    ///
    /// Providers are not guaranteed to return a new refresh_token on every
    /// refresh; when the response omits one, the original is preserved.
    pub fn merged_with(&self, response: TokenResponse, now: i64) -> Self {
        let refresh_token = response
            .refresh_token
            .clone()
            .or_else(|| self.refresh_token.clone());
        let mut merged = Self::from_response(response, now);
        merged.refresh_token = refresh_token;
        if merged.scope.is_none() {
            merged.scope = self.scope.clone();
        }
        merged
    }
}

/// Raw token endpoint response (authorization_code or refresh_token grant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token
    pub access_token: String,

    /// Token type (usually "Bearer")
    pub token_type: Option<String>,

    /// Lifetime in seconds
    pub expires_in: Option<i64>,

    /// Refresh token (if provided)
    pub refresh_token: Option<String>,

    /// Granted scopes
    pub scope: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(refresh: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: "new-access".to_string(),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(3600),
            refresh_token: refresh.map(String::from),
            scope: None,
        }
    }

    #[test]
    fn test_expiry_derived_from_created_at() {
        let cred = Credential::from_response(response(Some("r")), 1_000);
        assert_eq!(cred.expires_at(), Some(4_600));
        assert!(!cred.is_expired(1_000, 60));
        assert!(cred.is_expired(4_600, 0));
        // Skew makes it expire early
        assert!(cred.is_expired(4_550, 60));
    }

    #[test]
    fn test_no_expires_in_never_expires() {
        let mut resp = response(None);
        resp.expires_in = None;
        let cred = Credential::from_response(resp, 1_000);
        assert_eq!(cred.expires_at(), None);
        assert!(!cred.is_expired(i64::MAX - 100, 60));
    }

    #[test]
    fn test_merge_preserves_refresh_token() {
        let original = Credential::from_response(response(Some("original-refresh")), 1_000);

        // Provider omits refresh_token in the refresh response
        let merged = original.merged_with(response(None), 2_000);
        assert_eq!(merged.access_token, "new-access");
        assert_eq!(merged.refresh_token, Some("original-refresh".to_string()));
        assert_eq!(merged.created_at, 2_000);
    }

    #[test]
    fn test_merge_takes_new_refresh_token_when_present() {
        let original = Credential::from_response(response(Some("original-refresh")), 1_000);
        let merged = original.merged_with(response(Some("rotated-refresh")), 2_000);
        assert_eq!(merged.refresh_token, Some("rotated-refresh".to_string()));
    }

    #[test]
    fn test_round_trip_serialization() {
        let cred = Credential::from_response(response(Some("r")), 1_000);
        let json = serde_json::to_string(&cred).unwrap();
        let loaded: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(cred, loaded);
    }
}
