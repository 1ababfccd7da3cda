//! # Session Manager
//!
//! Drives the broker login handshake and owns the read-only [`SessionStatus`]
//! projection that UI and CLI consumers observe.
//!
//! ## Overview
//!
//! ```text
//! login() ──> AuthRedirectBuilder ──> Navigator (broker login page)
//!                                          │
//! handle_redirect(url) <───────────────────┘
//!        │
//!        └──> complete_login(code, state)
//!                 ├── TokenExchangeClient::exchange
//!                 ├── CredentialStore::save
//!                 └── Navigator (home route)
//! ```
//!
//! The [`CredentialStore`] stays the single owner of the credentials; the
//! manager only mirrors the derived state. Downstream services call
//! [`SessionManager::ensure_authenticated`] before every broker call and
//! register their caches as [`SessionScopedCache`] so logout drops them.
//!
//! ## Usage
//!
//! ```no_run
//! use core_auth::SessionManager;
//! use core_runtime::config::CoreConfig;
//! use core_runtime::events::EventBus;
//!
//! # async fn example(config: CoreConfig) -> core_auth::Result<()> {
//! let events = EventBus::new(config.event_buffer_size);
//! let manager = SessionManager::new(&config, events);
//!
//! manager.initialize().await;
//! if !manager.status().await.is_authenticated() {
//!     manager.login().await?;
//! }
//! # Ok(())
//! # }
//! ```

use crate::credential_store::CredentialStore;
use crate::error::{AuthError, Result};
use crate::oauth::{AuthRedirectBuilder, TokenExchangeClient};
use crate::types::{AuthRequest, AuthState, CallbackParams, SessionStatus};
use async_trait::async_trait;
use bridge_traits::Navigator;
use core_runtime::config::{BrokerConfig, CoreConfig};
use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
use core_runtime::logging::redact_if_sensitive;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Data derived from the broker session that must not outlive it.
///
/// Implemented by downstream caches (market data). Registered with
/// [`SessionManager::register_scoped_cache`]; discarded on logout.
#[async_trait]
pub trait SessionScopedCache: Send + Sync {
    /// Drop everything cached for the current session.
    async fn discard(&self);
}

/// Session state provider.
///
/// Build once at start-up and share as `Arc<SessionManager>`.
pub struct SessionManager {
    config: Arc<BrokerConfig>,
    store: CredentialStore,
    redirect: AuthRedirectBuilder,
    exchange: TokenExchangeClient,
    navigator: Arc<dyn Navigator>,
    event_bus: EventBus,
    status: RwLock<SessionStatus>,
    scoped_caches: RwLock<Vec<Arc<dyn SessionScopedCache>>>,
}

impl SessionManager {
    /// Wire the handshake components from the injected bridges.
    pub fn new(config: &CoreConfig, event_bus: EventBus) -> Self {
        let broker = Arc::new(config.broker.clone());
        let store = CredentialStore::new(
            config.settings_store.clone(),
            config.clock.clone(),
            &broker.storage_namespace,
        );

        Self {
            redirect: AuthRedirectBuilder::new(broker.clone(), store.clone()),
            exchange: TokenExchangeClient::new(
                broker.clone(),
                config.http_client.clone(),
                store.clone(),
            ),
            config: broker,
            store,
            navigator: config.navigator.clone(),
            event_bus,
            status: RwLock::new(SessionStatus::default()),
            scoped_caches: RwLock::new(Vec::new()),
        }
    }

    /// Handle to the credential store, for authenticated downstream calls.
    pub fn credential_store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn broker_config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Snapshot of the current status
    pub async fn status(&self) -> SessionStatus {
        self.status.read().await.clone()
    }

    pub async fn state(&self) -> AuthState {
        self.status.read().await.state
    }

    /// Register a cache to be discarded on logout or disconnect.
    pub async fn register_scoped_cache(&self, cache: Arc<dyn SessionScopedCache>) {
        self.scoped_caches.write().await.push(cache);
    }

    /// Derive the initial state from the persisted session.
    ///
    /// A valid session means `Authenticated` and connected; anything else,
    /// including unreadable or corrupted storage, means `Unauthenticated`.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> AuthState {
        let now_ms = self.store.now_ms();

        let restored = match self.store.load().await {
            Ok(Some(session)) if session.is_valid_at(now_ms) => Some(session.expires_at_epoch_ms),
            Ok(Some(_)) => {
                debug!("Persisted session is expired");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Could not restore persisted session");
                None
            }
        };

        let mut status = self.status.write().await;
        match restored {
            Some(expires_at_ms) => {
                status.state = AuthState::Authenticated;
                status.is_connected = true;
                drop(status);

                info!(expires_at_ms, "Restored broker session");
                self.emit(SessionEvent::SessionRestored { expires_at_ms });
                AuthState::Authenticated
            }
            None => {
                status.state = AuthState::Unauthenticated;
                status.is_connected = false;
                AuthState::Unauthenticated
            }
        }
    }

    /// Start a login: persist a fresh nonce and send the user to the broker.
    ///
    /// # Errors
    ///
    /// - `NavigationFailed` if the host cannot open the login page; the
    ///   state reverts to `Unauthenticated`
    /// - errors from [`AuthRedirectBuilder::build_auth_url`]
    #[instrument(skip(self))]
    pub async fn login(&self) -> Result<AuthRequest> {
        let request = self.redirect.build_auth_url().await?;

        // Any stored session was superseded by the new pending login
        let was_authenticated = {
            let mut status = self.status.write().await;
            let was_authenticated = status.state.is_authenticated();
            status.state = AuthState::Authenticating;
            status.is_connected = false;
            status.error = None;
            was_authenticated
        };
        if was_authenticated {
            self.discard_scoped_caches().await;
        }
        self.emit(SessionEvent::LoginStarted);

        if let Err(e) = self.navigator.navigate(request.redirect_target.as_str()) {
            error!(error = %e, "Failed to open broker login page");
            let err = AuthError::NavigationFailed(e.to_string());
            self.update(|status| {
                status.state = AuthState::Unauthenticated;
                status.error = Some(err.user_message());
            })
            .await;
            return Err(err);
        }

        info!("Redirected to broker login");
        Ok(request)
    }

    /// Route an incoming URL.
    ///
    /// Returns `Ok(false)` for anything that is not the callback route, and
    /// `Ok(true)` once a callback completed the login.
    ///
    /// # Errors
    ///
    /// - `InvalidCallback` if the URL cannot be parsed or the callback lacks
    ///   `code` or `state`
    /// - errors from [`SessionManager::complete_login`]
    #[instrument(skip(self, url))]
    pub async fn handle_redirect(&self, url: &str) -> Result<bool> {
        let parsed = Url::parse(url)
            .map_err(|e| AuthError::InvalidCallback(format!("unparsable URL: {}", e)))?;

        if parsed.path() != self.config.callback_path() {
            debug!(path = parsed.path(), "Not a broker callback, ignoring");
            return Ok(false);
        }

        let query: Vec<String> = parsed
            .query_pairs()
            .map(|(k, v)| format!("{}={}", k, redact_if_sensitive(&k, &v)))
            .collect();
        debug!(query = %query.join("&"), "Broker callback received");

        let params = match CallbackParams::from_url(&parsed) {
            Ok(params) => params,
            Err(e) => {
                warn!(error = %e, "Malformed broker callback");
                self.fail_login(&e).await;
                return Err(e);
            }
        };

        self.complete_login(&params.code, &params.state).await?;
        Ok(true)
    }

    /// Finish a login with the `code` and `state` from the broker callback.
    ///
    /// Nothing is persisted unless the exchange fully succeeds.
    ///
    /// # Errors
    ///
    /// - `StateMismatch` / `ExchangeFailed` from the exchange
    /// - `StorageUnavailable` if the session cannot be persisted
    #[instrument(skip(self, code, state))]
    pub async fn complete_login(&self, code: &str, state: &str) -> Result<()> {
        self.update(|status| {
            status.is_loading = true;
            status.error = None;
        })
        .await;

        let outcome = match self.exchange.exchange(code, state).await {
            Ok(session) => self.store.save(&session).await.map(|_| session),
            Err(e) => Err(e),
        };

        let session = match outcome {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "Broker login failed");
                self.fail_login(&e).await;
                return Err(e);
            }
        };

        self.update(|status| {
            status.state = AuthState::Authenticated;
            status.is_connected = true;
            status.is_loading = false;
            status.error = None;
        })
        .await;

        info!(
            expires_at_ms = session.expires_at_epoch_ms,
            "Signed in to broker"
        );
        self.emit(SessionEvent::SignedIn {
            expires_at_ms: session.expires_at_epoch_ms,
        });

        if let Err(e) = self.navigator.navigate(&self.config.home_route) {
            warn!(error = %e, route = %self.config.home_route, "Navigation after login failed");
        }

        Ok(())
    }

    /// Clear the credentials and every session-scoped cache.
    ///
    /// The in-memory state is reset even if clearing storage fails; the
    /// storage error is still returned.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let cleared = self.store.clear().await;

        self.update(|status| {
            *status = SessionStatus::default();
        })
        .await;

        self.discard_scoped_caches().await;

        info!("Signed out from broker");
        self.emit(SessionEvent::SignedOut);

        cleared
    }

    /// Same as [`SessionManager::logout`]; the name used by the dashboard's
    /// "Disconnect" action.
    pub async fn disconnect(&self) -> Result<()> {
        debug!("Disconnect requested");
        self.logout().await
    }

    /// Guard for downstream broker calls.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` when no valid session exists. A session that was
    /// authenticated and has since expired moves the state to
    /// `Unauthenticated` and emits `SessionExpired`; other states are left as
    /// they are.
    pub async fn ensure_authenticated(&self) -> Result<()> {
        if self.store.is_valid().await {
            return Ok(());
        }

        // A login in flight keeps its `Authenticating` state
        let mut status = self.status.write().await;
        let was_authenticated = status.state.is_authenticated();
        if was_authenticated {
            status.state = AuthState::Unauthenticated;
        }
        status.is_connected = false;
        drop(status);

        if was_authenticated {
            info!("Broker session expired");
            self.emit(SessionEvent::SessionExpired);
        }

        Err(AuthError::NotAuthenticated)
    }

    pub async fn set_loading(&self, loading: bool) {
        self.update(|status| status.is_loading = loading).await;
    }

    pub async fn set_connected(&self, connected: bool) {
        self.update(|status| status.is_connected = connected).await;
    }

    /// Surface a user-visible error, or clear it with `None`.
    pub async fn report_error(&self, message: Option<String>) {
        self.update(|status| status.error = message).await;
    }

    /// Record a failed login attempt. The state is re-derived from storage,
    /// so a rejected callback leaves an existing session signed in.
    async fn fail_login(&self, err: &AuthError) {
        let session_valid = self.store.is_valid().await;

        self.update(|status| {
            if session_valid {
                status.state = AuthState::Authenticated;
            } else {
                status.state = AuthState::Unauthenticated;
                status.is_connected = false;
            }
            status.is_loading = false;
            status.error = Some(err.user_message());
        })
        .await;

        self.emit(SessionEvent::AuthError {
            message: err.user_message(),
            recoverable: err.is_recoverable(),
        });
    }

    async fn discard_scoped_caches(&self) {
        let caches = self.scoped_caches.read().await.clone();
        for cache in caches {
            cache.discard().await;
        }
    }

    async fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut SessionStatus),
    {
        let mut status = self.status.write().await;
        mutate(&mut status);
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.event_bus.emit(CoreEvent::Session(event));
    }
}
