use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Callback `state` does not equal the pending nonce, or no login is pending.
    #[error("Invalid state parameter: callback does not belong to the pending login")]
    StateMismatch,

    /// Token endpoint unreachable, non-2xx, or returned an unusable body.
    #[error("Token exchange failed: {cause}")]
    ExchangeFailed { status: Option<u16>, cause: String },

    #[error("Not authenticated with broker")]
    NotAuthenticated,

    #[error("Invalid OAuth callback: {0}")]
    InvalidCallback(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Credential storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Stored session is corrupted: {0}")]
    SessionCorrupted(String),

    #[error("Invalid auth configuration: {0}")]
    Config(String),
}

impl AuthError {
    /// Whether starting a fresh login can resolve the error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AuthError::Config(_))
    }

    /// Short message suitable for a status line.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::StateMismatch => "Invalid state parameter".to_string(),
            AuthError::ExchangeFailed { .. } => "Failed to exchange auth code for token".to_string(),
            AuthError::NotAuthenticated => "Not authenticated with Fyers".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
