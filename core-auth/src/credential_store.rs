//! Credential Store
//!
//! Persists the broker [`Session`] as four string entries in the host
//! [`SettingsStore`] and answers "is the session usable right now?".
//!
//! The pending login nonce shares the slot of the session `nonce` field: a
//! login writes it before redirecting, a successful exchange writes it again
//! as part of the session.

use crate::error::{AuthError, Result};
use crate::types::Session;
use bridge_traits::{BridgeError, Clock, SettingsStore};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Storage keys for one credential namespace.
///
/// ```
/// use core_auth::credential_store::CredentialKeys;
///
/// let keys = CredentialKeys::namespaced("fyers");
/// assert_eq!(keys.access_token, "fyers_access_token");
/// assert_eq!(keys.nonce, "fyers_auth_state");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialKeys {
    pub access_token: String,
    pub refresh_token: String,
    pub expiry: String,
    pub nonce: String,
}

impl CredentialKeys {
    pub fn namespaced(namespace: &str) -> Self {
        Self {
            access_token: format!("{}_access_token", namespace),
            refresh_token: format!("{}_refresh_token", namespace),
            expiry: format!("{}_token_expiry", namespace),
            nonce: format!("{}_auth_state", namespace),
        }
    }

    fn all(&self) -> [&str; 4] {
        [
            &self.access_token,
            &self.refresh_token,
            &self.expiry,
            &self.nonce,
        ]
    }
}

/// Session persistence over a [`SettingsStore`].
///
/// Cheap to clone; clones share the same backing store.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    keys: CredentialKeys,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn SettingsStore>, clock: Arc<dyn Clock>, namespace: &str) -> Self {
        Self {
            store,
            clock,
            keys: CredentialKeys::namespaced(namespace),
        }
    }

    pub fn keys(&self) -> &CredentialKeys {
        &self.keys
    }

    /// Current time in epoch milliseconds, from the injected clock
    pub fn now_ms(&self) -> i64 {
        self.clock.unix_timestamp_millis()
    }

    /// Write all four session fields, replacing whatever was stored.
    #[instrument(skip(self, session), fields(expires_at_ms = session.expires_at_epoch_ms))]
    pub async fn save(&self, session: &Session) -> Result<()> {
        self.put(&self.keys.access_token, &session.access_token).await?;
        self.put(&self.keys.refresh_token, &session.refresh_token)
            .await?;
        self.put(&self.keys.expiry, &session.expires_at_epoch_ms.to_string())
            .await?;
        self.put(&self.keys.nonce, &session.nonce).await?;

        info!("Saved broker session");
        Ok(())
    }

    /// Read the persisted session.
    ///
    /// Returns `Ok(None)` unless both the access token and the expiry are
    /// present. A missing refresh token or nonce loads as an empty string.
    ///
    /// # Errors
    ///
    /// - `SessionCorrupted` if the stored expiry is not an integer; all four
    ///   keys are removed before returning.
    /// - `StorageUnavailable` if the backing store fails.
    pub async fn load(&self) -> Result<Option<Session>> {
        let access_token = self.get(&self.keys.access_token).await?;
        let expiry = self.get(&self.keys.expiry).await?;

        let (Some(access_token), Some(expiry)) = (access_token, expiry) else {
            return Ok(None);
        };

        let expires_at_epoch_ms = match expiry.trim().parse::<i64>() {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Stored token expiry is not a number, clearing session");
                self.clear().await?;
                return Err(AuthError::SessionCorrupted(format!(
                    "token expiry is not an epoch-millisecond integer: {}",
                    e
                )));
            }
        };

        Ok(Some(Session {
            access_token,
            refresh_token: self.get(&self.keys.refresh_token).await?.unwrap_or_default(),
            expires_at_epoch_ms,
            nonce: self.get(&self.keys.nonce).await?.unwrap_or_default(),
        }))
    }

    /// Remove all four keys. Safe to call when nothing is stored.
    pub async fn clear(&self) -> Result<()> {
        for key in self.keys.all() {
            self.store.delete(key).await.map_err(storage_error)?;
        }

        info!("Cleared broker session");
        Ok(())
    }

    /// True iff a session is stored and `now < expires_at` (strict).
    ///
    /// Never fails: storage errors and corrupted data count as "not valid".
    pub async fn is_valid(&self) -> bool {
        match self.load().await {
            Ok(Some(session)) => session.is_valid_at(self.now_ms()),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Session check failed, treating as signed out");
                false
            }
        }
    }

    /// The access token for an authenticated request, checked against the
    /// clock immediately before use.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` when no valid session exists.
    pub async fn valid_access_token(&self) -> Result<String> {
        match self.load().await {
            Ok(Some(session)) if session.is_valid_at(self.now_ms()) => Ok(session.access_token),
            Ok(Some(_)) => {
                debug!("Stored session is expired");
                Err(AuthError::NotAuthenticated)
            }
            Ok(None) => Err(AuthError::NotAuthenticated),
            Err(e) => {
                warn!(error = %e, "Session unreadable, treating as signed out");
                Err(AuthError::NotAuthenticated)
            }
        }
    }

    /// Record the nonce of the login about to start, replacing any earlier one.
    ///
    /// A new login supersedes the stored session: its token and expiry are
    /// removed so the shared nonce slot belongs to the login in flight.
    pub async fn save_pending_nonce(&self, nonce: &str) -> Result<()> {
        if self.get(&self.keys.access_token).await?.is_some() {
            info!("New login started, dropping the stored session");
        }
        for key in [
            &self.keys.access_token,
            &self.keys.refresh_token,
            &self.keys.expiry,
        ] {
            self.store.delete(key).await.map_err(storage_error)?;
        }

        self.put(&self.keys.nonce, nonce).await?;
        debug!("Stored pending login nonce");
        Ok(())
    }

    /// The nonce of the login in flight, if any.
    ///
    /// `None` while an access token is stored: the slot then holds the nonce
    /// of the login that produced it, which must not be accepted again.
    pub async fn pending_nonce(&self) -> Result<Option<String>> {
        if self.get(&self.keys.access_token).await?.is_some() {
            return Ok(None);
        }

        Ok(self
            .get(&self.keys.nonce)
            .await?
            .filter(|nonce| !nonce.is_empty()))
    }

    /// Remove and return the pending nonce. A second call returns `None`.
    pub async fn take_pending_nonce(&self) -> Result<Option<String>> {
        let pending = self.pending_nonce().await?;
        if pending.is_some() {
            self.store
                .delete(&self.keys.nonce)
                .await
                .map_err(storage_error)?;
            debug!("Consumed pending login nonce");
        }
        Ok(pending)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.store
            .set_string(key, value)
            .await
            .map_err(storage_error)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.store.get_string(key).await.map_err(storage_error)
    }
}

fn storage_error(error: BridgeError) -> AuthError {
    AuthError::StorageUnavailable(error.to_string())
}
