//! Broker Authorization Redirect and Code Exchange
//!
//! The two halves of the broker's OAuth-style handshake:
//!
//! - [`AuthRedirectBuilder`] creates a login attempt: a fresh state nonce,
//!   persisted as the pending nonce, and the broker `generate-authcode` URL.
//! - [`TokenExchangeClient`] verifies the callback `state` against that
//!   pending nonce and trades the authorization code for a [`Session`].
//!
//! # Security
//!
//! - The state nonce comes from [`rand::rngs::SmallRng`], a fast
//!   **non-cryptographic** generator seeded from OS entropy. It rejects
//!   accidental or stale callbacks but is not a strong CSRF secret; swapping in
//!   `rand::rngs::OsRng` is the fix if that matters for a deployment.
//! - No PKCE: the broker flow authenticates the exchange with the app secret.
//! - Tokens, codes and nonces are never logged.
//!
//! # Example
//!
//! ```no_run
//! use core_auth::credential_store::CredentialStore;
//! use core_auth::oauth::{AuthRedirectBuilder, TokenExchangeClient};
//! use core_runtime::config::BrokerConfig;
//! use std::sync::Arc;
//!
//! # async fn example(store: CredentialStore, http: Arc<dyn bridge_traits::HttpClient>) -> core_auth::Result<()> {
//! let config = Arc::new(BrokerConfig::new("APP-100", "secret"));
//! let redirect = AuthRedirectBuilder::new(config.clone(), store.clone());
//! let exchange = TokenExchangeClient::new(config, http, store.clone());
//!
//! let request = redirect.build_auth_url().await?;
//! // ... user logs in, broker redirects back with ?code=..&state=..
//! let session = exchange.exchange("code-from-callback", &request.nonce).await?;
//! store.save(&session).await?;
//! # Ok(())
//! # }
//! ```

use crate::credential_store::CredentialStore;
use crate::error::{AuthError, Result};
use crate::types::{AuthRequest, Session};
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::config::BrokerConfig;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

const AUTHORIZE_PATH: &str = "generate-authcode";
const TOKEN_PATH: &str = "token";

/// Random base-36 string from a non-cryptographic PRNG.
///
/// `SmallRng` output is predictable to anyone who can observe enough of it, so
/// the nonce only guards against accidental replays, not a determined attacker.
/// Never empty. Two consecutive calls return different values with
/// overwhelming probability.
pub fn generate_nonce() -> String {
    let mut rng = SmallRng::from_entropy();
    // Keep at least one non-zero bit so the rendering has a digit
    let value: u64 = rng.gen::<u64>() | 1;
    to_base36(value)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::with_capacity(13);
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Builds the broker login URL for a new login attempt.
pub struct AuthRedirectBuilder {
    config: Arc<BrokerConfig>,
    store: CredentialStore,
}

impl AuthRedirectBuilder {
    pub fn new(config: Arc<BrokerConfig>, store: CredentialStore) -> Self {
        Self { config, store }
    }

    /// Start a login attempt.
    ///
    /// The nonce is persisted as the pending nonce before the request is
    /// returned, replacing any earlier pending nonce, so only the most recent
    /// login can complete.
    ///
    /// # Errors
    ///
    /// - `Config` if the API base URL cannot be parsed
    /// - `StorageUnavailable` if the nonce cannot be persisted
    #[instrument(skip(self), fields(app_id = %self.config.app_id))]
    pub async fn build_auth_url(&self) -> Result<AuthRequest> {
        let nonce = generate_nonce();

        let mut url = Url::parse(&self.config.endpoint(AUTHORIZE_PATH))
            .map_err(|e| AuthError::Config(format!("Invalid authorize URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.app_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("state", &nonce);

        self.store.save_pending_nonce(&nonce).await?;

        debug!(host = ?url.host_str(), "Built broker authorization URL");

        Ok(AuthRequest {
            nonce,
            redirect_target: url,
        })
    }
}

/// JSON body of the code exchange
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

/// Trades an authorization code for a session.
pub struct TokenExchangeClient {
    config: Arc<BrokerConfig>,
    http_client: Arc<dyn HttpClient>,
    store: CredentialStore,
}

impl TokenExchangeClient {
    pub fn new(
        config: Arc<BrokerConfig>,
        http_client: Arc<dyn HttpClient>,
        store: CredentialStore,
    ) -> Self {
        Self {
            config,
            http_client,
            store,
        }
    }

    /// Exchange `code` for a session, provided `state` matches the pending nonce.
    ///
    /// The pending nonce is consumed before anything else happens, so every
    /// outcome ends the login attempt and a retry needs a fresh
    /// [`AuthRedirectBuilder::build_auth_url`]. Exactly one POST is sent when
    /// the state matches; none otherwise. The request is not retried. Nothing is written to storage here: the caller
    /// persists the returned session.
    ///
    /// # Errors
    ///
    /// - `StateMismatch` when `state` differs from the pending nonce or no
    ///   login is pending
    /// - `ExchangeFailed` for transport errors, non-2xx responses and bodies
    ///   without a usable access token or `expires_in`
    /// - `StorageUnavailable` if the pending nonce cannot be read or removed
    #[instrument(skip(self, code, state), fields(app_id = %self.config.app_id))]
    pub async fn exchange(&self, code: &str, state: &str) -> Result<Session> {
        let pending = self.store.take_pending_nonce().await?;

        let nonce = match pending {
            Some(nonce) if nonce == state => nonce,
            Some(_) => {
                warn!("OAuth state mismatch, rejecting callback");
                return Err(AuthError::StateMismatch);
            }
            None => {
                warn!("OAuth callback received with no login pending");
                return Err(AuthError::StateMismatch);
            }
        };

        let body = TokenRequest {
            grant_type: "authorization_code",
            code,
            client_id: &self.config.app_id,
            client_secret: &self.config.app_secret,
            redirect_uri: &self.config.redirect_uri,
        };

        let request = HttpRequest::post(self.config.endpoint(TOKEN_PATH))
            .header("Accept", "application/json")
            .json(&body)
            .map_err(|e| AuthError::ExchangeFailed {
                status: None,
                cause: e.to_string(),
            })?;

        debug!("Exchanging authorization code for tokens");

        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!(error = %e, "Token request did not reach the broker");
            AuthError::ExchangeFailed {
                status: None,
                cause: e.to_string(),
            }
        })?;

        if !response.is_success() {
            let status = response.status;
            let error_body = response.text_lossy();

            warn!(
                status = status,
                error = %error_body,
                "Token exchange rejected by broker"
            );

            return Err(AuthError::ExchangeFailed {
                status: Some(status),
                cause: format!("Token endpoint returned {}: {}", status, error_body),
            });
        }

        let token_response: TokenResponse =
            response.json().map_err(|e| AuthError::ExchangeFailed {
                status: Some(response.status),
                cause: format!("Failed to parse token response: {}", e),
            })?;

        if token_response.access_token.is_empty() {
            return Err(AuthError::ExchangeFailed {
                status: Some(response.status),
                cause: "Token response contained an empty access token".to_string(),
            });
        }

        let now_ms = self.store.now_ms();
        let expires_at_epoch_ms = now_ms.saturating_add(token_response.expires_in.saturating_mul(1000));

        info!(
            expires_in = token_response.expires_in,
            "Exchanged authorization code for tokens"
        );

        Ok(Session {
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token.unwrap_or_default(),
            expires_at_epoch_ms,
            nonce,
        })
    }
}
