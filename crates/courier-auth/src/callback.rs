//! Local OAuth callback listener and authorization-code exchange
//!
//! The authorization flow needs exactly one inbound HTTP request: the
//! provider redirecting the browser back with `?code=...&state=...`. Rather
//! than carry a web framework, the listener speaks just enough HTTP over a
//! [`tokio::net::TcpListener`] to serve a single GET to `/callback` (or
//! `/oauth2callback`), after which it is torn down.

use crate::credential::{Credential, TokenResponse};
use crate::error::{AuthError, AuthResult};
use crate::provider::{AuthState, ProviderConfig};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info, instrument, warn};

const SUCCESS_PAGE: &str = "<html><body><h2>Authorization complete.</h2>\
<p>You can close this tab and return to the terminal.</p></body></html>";

/// One-shot listener for the OAuth redirect.
pub struct CallbackListener {
    listener: TcpListener,
}

impl CallbackListener {
    /// Bind to a local port. Pass 0 to let the OS pick one.
    pub async fn bind(port: u16) -> AuthResult<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        info!(addr = %listener.local_addr()?, "Callback listener bound");
        Ok(Self { listener })
    }

    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> AuthResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for the provider redirect and return the authorization code.
    ///
    /// Requests to other paths get a 404 and the listener keeps waiting
    /// (browsers probe for favicons). The listener is consumed: once a code
    /// has been received the socket is closed.
    #[instrument(skip(self, expected))]
    pub async fn recv_code(self, expected: &AuthState) -> AuthResult<String> {
        loop {
            let (mut stream, peer) = self.listener.accept().await?;
            debug!(%peer, "Callback connection accepted");

            let mut buf = vec![0u8; 4096];
            let n = stream.read(&mut buf).await?;
            let request = String::from_utf8_lossy(&buf[..n]);

            let target = match request_target(&request) {
                Some(t) => t,
                None => {
                    respond(&mut stream, 400, "Bad request").await?;
                    return Err(AuthError::CallbackError(
                        "malformed HTTP request".to_string(),
                    ));
                }
            };

            let (route, query) = match target.split_once('?') {
                Some((r, q)) => (r, q),
                None => (target, ""),
            };

            if route != "/callback" && route != "/oauth2callback" {
                respond(&mut stream, 404, "Not found").await?;
                continue;
            }

            let params = parse_query(query);

            if let Some(err) = params.get("error") {
                respond(&mut stream, 200, "Authorization was denied.").await?;
                return Err(AuthError::CallbackError(format!(
                    "provider returned error: {}",
                    err
                )));
            }

            match params.get("state") {
                Some(state) if *state == expected.state => {}
                _ => {
                    warn!("Callback state did not match");
                    respond(&mut stream, 400, "State mismatch").await?;
                    return Err(AuthError::StateMismatch);
                }
            }

            let code = params.get("code").cloned().ok_or_else(|| {
                AuthError::CallbackError("redirect missing code parameter".to_string())
            })?;

            respond(&mut stream, 200, SUCCESS_PAGE).await?;
            info!("Authorization code received");
            return Ok(code);
        }
    }
}

/// Exchange an authorization code for a credential.
///
/// Posts the `authorization_code` grant to the provider token endpoint,
/// including the PKCE verifier when the flow used one.
#[instrument(skip_all, fields(provider = config.provider.as_str()))]
pub async fn exchange_code(
    config: &ProviderConfig,
    code: &str,
    pkce_verifier: Option<&str>,
) -> AuthResult<Credential> {
    let token_url = config.get_token_url()?;

    let mut form: Vec<(&str, &str)> = vec![
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", config.redirect_url.as_str()),
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
    ];
    if let Some(verifier) = pkce_verifier {
        form.push(("code_verifier", verifier));
    }

    let response = reqwest::Client::new()
        .post(&token_url)
        .form(&form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AuthError::ExchangeFailed {
            status: status.as_u16(),
            message,
        });
    }

    let token: TokenResponse = response.json().await?;
    Ok(Credential::from_response(
        token,
        chrono::Utc::now().timestamp(),
    ))
}

/// Extract the request target from "GET <target> HTTP/1.1".
fn request_target(request: &str) -> Option<&str> {
    let line = request.lines().next()?;
    let mut parts = line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    parts.next()
}

/// Parse a query string into a map, percent-decoding values.
fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            Some((percent_decode(k), percent_decode(v)))
        })
        .collect()
}

/// Minimal percent-decoding (%XX escapes and '+' as space).
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                if let (Some(hi), Some(lo)) = (
                    bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16)),
                    bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16)),
                ) {
                    out.push((hi * 16 + lo) as u8);
                    i += 3;
                } else {
                    out.push(b'%');
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

async fn respond(
    stream: &mut tokio::net::TcpStream,
    status: u16,
    body: &str,
) -> AuthResult<()> {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "OK",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_query() {
        let params = parse_query("code=abc%2F123&state=xyz&scope=a+b");
        assert_eq!(params.get("code"), Some(&"abc/123".to_string()));
        assert_eq!(params.get("state"), Some(&"xyz".to_string()));
        assert_eq!(params.get("scope"), Some(&"a b".to_string()));
    }

    #[test]
    fn test_request_target() {
        assert_eq!(
            request_target("GET /callback?code=1 HTTP/1.1\r\nHost: x\r\n\r\n"),
            Some("/callback?code=1")
        );
        assert_eq!(request_target("POST /callback HTTP/1.1"), None);
        assert_eq!(request_target(""), None);
    }

    #[tokio::test]
    async fn test_recv_code_happy_path() {
        let state = AuthState::new();
        let listener = CallbackListener::bind(0).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let expected = state.clone();
        let server = tokio::spawn(async move { listener.recv_code(&expected).await });

        let url = format!(
            "http://{}/callback?code=the-code&state={}",
            addr, state.state
        );
        let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert!(body.contains("Authorization complete"));

        let code = server.await.unwrap().unwrap();
        assert_eq!(code, "the-code");
    }

    #[tokio::test]
    async fn test_recv_code_ignores_other_paths() {
        let state = AuthState::new();
        let listener = CallbackListener::bind(0).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let expected = state.clone();
        let server = tokio::spawn(async move { listener.recv_code(&expected).await });

        // Favicon probe gets a 404 and the listener keeps waiting.
        let resp = reqwest::get(&format!("http://{}/favicon.ico", addr))
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 404);

        let url = format!(
            "http://{}/oauth2callback?code=ok&state={}",
            addr, state.state
        );
        reqwest::get(&url).await.unwrap();

        assert_eq!(server.await.unwrap().unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_recv_code_state_mismatch() {
        let state = AuthState::new();
        let listener = CallbackListener::bind(0).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let expected = state.clone();
        let server = tokio::spawn(async move { listener.recv_code(&expected).await });

        let url = format!("http://{}/callback?code=x&state=wrong", addr);
        reqwest::get(&url).await.unwrap();

        let err = server.await.unwrap().unwrap_err();
        assert!(matches!(err, AuthError::StateMismatch));
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "refresh"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ProviderConfig::new(Provider::Custom, "id", "secret", "http://localhost/cb")
            .with_token_url(format!("{}/token", server.uri()));

        let cred = exchange_code(&config, "the-code", None).await.unwrap();
        assert_eq!(cred.access_token, "access");
        assert_eq!(cred.refresh_token, Some("refresh".to_string()));
    }

    #[tokio::test]
    async fn test_exchange_code_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "invalid_request"})),
            )
            .mount(&server)
            .await;

        let config = ProviderConfig::new(Provider::Custom, "id", "secret", "http://localhost/cb")
            .with_token_url(format!("{}/token", server.uri()));

        let err = exchange_code(&config, "bad", None).await.unwrap_err();
        match err {
            AuthError::ExchangeFailed { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("invalid_request"));
            }
            other => panic!("expected ExchangeFailed, got {:?}", other),
        }
    }
}
