use crate::error::{AuthError, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Broker session credentials.
///
/// Produced by a successful code exchange and owned by the
/// [`CredentialStore`](crate::credential_store::CredentialStore) once saved.
///
/// # Security
///
/// The `Debug` implementation redacts the tokens and the nonce.
///
/// # Examples
///
/// ```
/// use core_auth::Session;
///
/// let session = Session {
///     access_token: "T1".to_string(),
///     refresh_token: "R1".to_string(),
///     expires_at_epoch_ms: 4_600_000,
///     nonce: "abc123".to_string(),
/// };
///
/// assert!(session.is_valid_at(4_599_999));
/// assert!(!session.is_valid_at(4_600_000));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for broker API calls
    pub access_token: String,
    /// Issued by the broker; stored but never used for renewal
    pub refresh_token: String,
    /// Absolute expiry, Unix epoch milliseconds
    pub expires_at_epoch_ms: i64,
    /// The state nonce of the login that produced this session
    pub nonce: String,
}

impl Session {
    /// A session is valid iff it has a non-empty access token and `now_ms` is
    /// strictly before the expiry.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        !self.access_token.is_empty() && now_ms < self.expires_at_epoch_ms
    }

    /// Expiry as a UTC timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.expires_at_epoch_ms).single()
    }

    /// Time left before expiry, or `None` if already expired.
    pub fn time_until_expiry(&self, now_ms: i64) -> Option<chrono::Duration> {
        (now_ms < self.expires_at_epoch_ms)
            .then(|| chrono::Duration::milliseconds(self.expires_at_epoch_ms - now_ms))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at_epoch_ms", &self.expires_at_epoch_ms)
            .field("nonce", &"[REDACTED]")
            .finish()
    }
}

/// One login attempt: the nonce and the broker URL to send the user to.
///
/// Single use. The nonce must come back unchanged as the callback `state`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub nonce: String,
    pub redirect_target: Url,
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut target = self.redirect_target.clone();
        target.set_query(None);
        f.debug_struct("AuthRequest")
            .field("nonce", &"[REDACTED]")
            .field("redirect_target", &target.as_str())
            .finish()
    }
}

/// Authentication state of the session provider.
///
/// # State Transitions
///
/// ```text
/// Unauthenticated -> Authenticating -> Authenticated
///        ^                 |                |
///        +-----------------+----------------+
///           (failure)        (logout / expiry)
/// ```
///
/// # Examples
///
/// ```
/// use core_auth::AuthState;
///
/// assert!(!AuthState::Unauthenticated.is_authenticated());
/// assert!(AuthState::Authenticated.is_authenticated());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    /// Redirected to the broker, waiting for the callback
    Authenticating,
    Authenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, AuthState::Authenticating)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "Not connected"),
            AuthState::Authenticating => write!(f, "Connecting..."),
            AuthState::Authenticated => write!(f, "Connected"),
        }
    }
}

/// Read-only projection exposed to UI consumers.
///
/// Never holds credentials; the credential store stays the single owner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionStatus {
    pub state: AuthState,
    /// Last downstream fetch reached the broker
    pub is_connected: bool,
    /// An exchange or fetch is in flight
    pub is_loading: bool,
    /// Last user-visible error, cleared on success
    pub error: Option<String>,
}

impl SessionStatus {
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }
}

/// `code` and `state` from the broker redirect.
#[derive(Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

impl CallbackParams {
    /// Extract both parameters from a full callback URL.
    ///
    /// ```
    /// use core_auth::CallbackParams;
    /// use url::Url;
    ///
    /// let url = Url::parse("http://localhost:5173/auth-callback?code=C1&state=abc123").unwrap();
    /// let params = CallbackParams::from_url(&url).unwrap();
    /// assert_eq!(params.code, "C1");
    /// assert_eq!(params.state, "abc123");
    /// ```
    pub fn from_url(url: &Url) -> Result<Self> {
        let mut code = None;
        let mut state = None;
        let mut provider_error = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" | "auth_code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" | "message" => provider_error = Some(value.into_owned()),
                _ => {}
            }
        }

        let code = code.filter(|c| !c.is_empty()).ok_or_else(|| {
            AuthError::InvalidCallback(match provider_error {
                Some(message) => format!("broker returned no code: {}", message),
                None => "missing code parameter".to_string(),
            })
        })?;

        let state = state
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::InvalidCallback("missing state parameter".to_string()))?;

        Ok(Self { code, state })
    }
}

impl fmt::Debug for CallbackParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackParams")
            .field("code", &"[REDACTED]")
            .field("state", &"[REDACTED]")
            .finish()
    }
}
