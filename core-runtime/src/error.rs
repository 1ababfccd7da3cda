use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid settings, including log filters
    #[error("Configuration error: {0}")]
    Config(String),

    /// A host bridge was not injected and no platform default exists
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// A global tracing subscriber is already installed
    #[error("Logging already initialized: {0}")]
    LoggingInitialized(String),
}

pub type Result<T> = std::result::Result<T, Error>;
