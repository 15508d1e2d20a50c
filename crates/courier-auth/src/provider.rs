//! OAuth 2.0 provider catalog
//!
//! This module describes the vendors Courier adapters authenticate against.
//! Known providers come with default authorization/token endpoints and
//! scopes; custom providers must configure both URLs explicitly.

use crate::error::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supported OAuth providers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Google (Gmail, Calendar, Sheets, Drive, BigQuery)
    Google,
    /// LinkedIn
    LinkedIn,
    /// Canva
    Canva,
    /// Figma
    Figma,
    /// HeyGen
    HeyGen,
    /// Custom OAuth provider
    Custom,
}

impl Provider {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::LinkedIn => "linkedin",
            Provider::Canva => "canva",
            Provider::Figma => "figma",
            Provider::HeyGen => "heygen",
            Provider::Custom => "custom",
        }
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "google" => Some(Provider::Google),
            "linkedin" => Some(Provider::LinkedIn),
            "canva" => Some(Provider::Canva),
            "figma" => Some(Provider::Figma),
            "heygen" => Some(Provider::HeyGen),
            "custom" => Some(Provider::Custom),
            _ => None,
        }
    }

    /// Get the default authorization URL for the provider.
    pub fn auth_url(&self) -> Option<&'static str> {
        match self {
            Provider::Google => Some("https://accounts.google.com/o/oauth2/v2/auth"),
            Provider::LinkedIn => Some("https://www.linkedin.com/oauth/v2/authorization"),
            Provider::Canva => Some("https://www.canva.com/api/oauth/authorize"),
            Provider::Figma => Some("https://www.figma.com/oauth"),
            Provider::HeyGen => None,
            Provider::Custom => None,
        }
    }

    /// Get the default token URL for the provider.
    pub fn token_url(&self) -> Option<&'static str> {
        match self {
            Provider::Google => Some("https://oauth2.googleapis.com/token"),
            Provider::LinkedIn => Some("https://www.linkedin.com/oauth/v2/accessToken"),
            Provider::Canva => Some("https://api.canva.com/rest/v1/oauth/token"),
            Provider::Figma => Some("https://www.figma.com/api/oauth/token"),
            Provider::HeyGen => None,
            Provider::Custom => None,
        }
    }

    /// Get default scopes for the provider.
    pub fn default_scopes(&self) -> Vec<&'static str> {
        match self {
            Provider::Google => vec![
                "https://www.googleapis.com/auth/gmail.modify",
                "https://www.googleapis.com/auth/calendar",
            ],
            Provider::LinkedIn => vec!["openid", "profile", "w_member_social"],
            Provider::Canva => vec!["design:content:read", "design:content:write"],
            Provider::Figma => vec!["file_read"],
            Provider::HeyGen => vec![],
            Provider::Custom => vec![],
        }
    }
}

/// OAuth provider configuration for one adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type
    pub provider: Provider,

    /// Client ID
    pub client_id: String,

    /// Client secret
    pub client_secret: String,

    /// Authorization URL (optional, uses default for known providers)
    pub auth_url: Option<String>,

    /// Token URL (optional, uses default for known providers)
    pub token_url: Option<String>,

    /// Redirect URL (the local callback address)
    pub redirect_url: String,

    /// Scopes to request
    pub scopes: Vec<String>,

    /// Additional authorization parameters (e.g. access_type=offline)
    #[serde(default)]
    pub extra_params: HashMap<String, String>,
}

impl ProviderConfig {
    /// Create a new provider configuration with default scopes.
    pub fn new(
        provider: Provider,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: None,
            token_url: None,
            redirect_url: redirect_url.into(),
            scopes: provider
                .default_scopes()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extra_params: HashMap::new(),
        }
    }

    /// Override the token URL.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    /// Override the authorization URL.
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = Some(url.into());
        self
    }

    /// Override the scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Get the authorization URL.
    pub fn get_auth_url(&self) -> AuthResult<String> {
        self.auth_url
            .clone()
            .or_else(|| self.provider.auth_url().map(String::from))
            .ok_or_else(|| AuthError::ConfigError("Authorization URL not configured".to_string()))
    }

    /// Get the token URL.
    pub fn get_token_url(&self) -> AuthResult<String> {
        self.token_url
            .clone()
            .or_else(|| self.provider.token_url().map(String::from))
            .ok_or_else(|| AuthError::ConfigError("Token URL not configured".to_string()))
    }
}

/// State for one authorization-code flow: CSRF token plus optional PKCE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthState {
    /// Random state value
    pub state: String,

    /// PKCE code verifier (for PKCE flow)
    pub code_verifier: Option<String>,

    /// Created timestamp
    pub created_at: i64,
}

impl AuthState {
    /// Create a new auth state.
    pub fn new() -> Self {
        use rand::Rng;
        let state: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        Self {
            state,
            code_verifier: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Create with PKCE support.
    pub fn with_pkce() -> Self {
        use rand::Rng;

        let code_verifier: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();

        let mut state = Self::new();
        state.code_verifier = Some(code_verifier);
        state
    }

    /// Get the PKCE code challenge (S256).
    pub fn code_challenge(&self) -> Option<String> {
        use sha2::{Digest, Sha256};

        self.code_verifier.as_ref().map(|verifier| {
            let mut hasher = Sha256::new();
            hasher.update(verifier.as_bytes());
            let hash = hasher.finalize();
            base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, hash)
        })
    }

    /// Check if the state has expired (default: 10 minutes).
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now - self.created_at > 600
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the provider consent URL for the given configuration and state.
pub fn authorization_url(config: &ProviderConfig, state: &AuthState) -> AuthResult<String> {
    let base = config.get_auth_url()?;

    let mut params: Vec<(String, String)> = vec![
        ("response_type".to_string(), "code".to_string()),
        ("client_id".to_string(), config.client_id.clone()),
        ("redirect_uri".to_string(), config.redirect_url.clone()),
        ("scope".to_string(), config.scopes.join(" ")),
        ("state".to_string(), state.state.clone()),
    ];

    if let Some(challenge) = state.code_challenge() {
        params.push(("code_challenge".to_string(), challenge));
        params.push(("code_challenge_method".to_string(), "S256".to_string()));
    }

    for (k, v) in &config.extra_params {
        params.push((k.clone(), v.clone()));
    }

    let url = reqwest::Url::parse_with_params(&base, &params)
        .map_err(|e| AuthError::ConfigError(format!("Invalid authorization URL: {}", e)))?;

    Ok(url.to_string())
}
