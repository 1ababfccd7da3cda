//! # Broker Authentication
//!
//! Login handshake and session persistence for the Fyers broker API.
//!
//! ## Overview
//!
//! - [`credential_store`]: the four persisted session keys and the validity check
//! - [`oauth`]: the login redirect (state nonce) and the code-for-token exchange
//! - [`manager`]: the session state provider tying both to the host navigator
//!   and the event bus
//!
//! The broker issues a refresh token but no renewal flow is implemented: an
//! expired session means a fresh login.

pub mod credential_store;
pub mod error;
pub mod manager;
pub mod oauth;
pub mod types;

pub use credential_store::{CredentialKeys, CredentialStore};
pub use error::{AuthError, Result};
pub use manager::{SessionManager, SessionScopedCache};
pub use oauth::{generate_nonce, AuthRedirectBuilder, TokenExchangeClient};
pub use types::{AuthRequest, AuthState, CallbackParams, Session, SessionStatus};
