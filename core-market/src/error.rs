//! Error types for broker market data

use core_auth::AuthError;
use thiserror::Error;

/// Broker API and market data errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    /// No valid session, or the session guard failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Broker answered with a non-2xx status
    #[error("Broker API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Request never reached the broker
    #[error("Network error: {0}")]
    Network(String),

    /// Failed to parse API response
    #[error("Failed to parse broker response: {0}")]
    Parse(String),

    /// Order rejected before it was sent
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Quote request succeeded but returned nothing
    #[error("No market data available")]
    NoData,
}

impl MarketError {
    /// Text for the status projection.
    pub fn user_message(&self) -> String {
        match self {
            MarketError::Auth(e) => e.user_message(),
            MarketError::InvalidOrder(reason) => format!("Invalid order: {}", reason),
            _ => "Failed to fetch market data".to_string(),
        }
    }
}

/// Result type for market operations
pub type Result<T> = std::result::Result<T, MarketError>;
