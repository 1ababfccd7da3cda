//! # Core Configuration Module
//!
//! Broker credentials plus the bridge implementations the core runs on.
//!
//! ## Overview
//!
//! [`BrokerConfig`] describes the broker application (client id, secret,
//! redirect URI, API base). [`CoreConfig`] bundles it with the injected
//! bridges and is built through [`CoreConfigBuilder`], which fails fast with
//! an actionable error when a required capability is missing.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - Where the session credentials are persisted
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - Broker API calls (desktop default: reqwest)
//! - `Navigator` - Login redirect (desktop default: system browser)
//! - `Clock` - Expiry checks (default: system clock)
//!
//! Desktop defaults are only available with the `desktop-shims` feature.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{BrokerConfig, CoreConfig};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .broker(BrokerConfig::from_env()?)
//!     .settings_store(Arc::new(my_settings_store))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{Clock, HttpClient, Navigator, SettingsStore, SystemClock};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Production API root of the Fyers v2 REST interface
pub const DEFAULT_API_BASE_URL: &str = "https://api.fyers.in/api/v2";

/// Where the broker sends the browser back after login
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5173/auth-callback";

/// Prefix of the persisted credential keys
pub const DEFAULT_STORAGE_NAMESPACE: &str = "fyers";

/// In-app route shown after a completed login
pub const DEFAULT_HOME_ROUTE: &str = "/";

pub const ENV_APP_ID: &str = "FYERS_APP_ID";
pub const ENV_APP_SECRET: &str = "FYERS_APP_SECRET";
pub const ENV_REDIRECT_URI: &str = "FYERS_REDIRECT_URI";
pub const ENV_API_BASE_URL: &str = "FYERS_API_BASE_URL";
pub const ENV_STORAGE_NAMESPACE: &str = "FYERS_STORAGE_NAMESPACE";

/// Broker application settings.
///
/// # Security Note
///
/// `app_secret` is sent from the client during the code exchange, so it is
/// only as secret as the machine running this code. `Debug` output redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Client id issued by the broker (`FYERS_APP_ID`)
    pub app_id: String,
    /// Client secret issued by the broker (`FYERS_APP_SECRET`)
    pub app_secret: String,
    /// Registered redirect URI; its path is the callback route
    pub redirect_uri: String,
    /// REST API root without trailing slash
    pub api_base_url: String,
    /// Prefix for the persisted credential keys
    pub storage_namespace: String,
    /// Route to navigate to once login completes
    pub home_route: String,
}

impl BrokerConfig {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            storage_namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
            home_route: DEFAULT_HOME_ROUTE.to_string(),
        }
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_storage_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.storage_namespace = namespace.into();
        self
    }

    pub fn with_home_route(mut self, route: impl Into<String>) -> Self {
        self.home_route = route.into();
        self
    }

    /// Read the configuration from `FYERS_*` environment variables.
    ///
    /// `FYERS_APP_ID` and `FYERS_APP_SECRET` are required; the rest fall back
    /// to the defaults in this module.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} is not set", key)))
        };

        let mut config = Self::new(required(ENV_APP_ID)?, required(ENV_APP_SECRET)?);

        if let Some(redirect_uri) = lookup(ENV_REDIRECT_URI) {
            config = config.with_redirect_uri(redirect_uri);
        }
        if let Some(api_base_url) = lookup(ENV_API_BASE_URL) {
            config = config.with_api_base_url(api_base_url);
        }
        if let Some(namespace) = lookup(ENV_STORAGE_NAMESPACE) {
            config = config.with_storage_namespace(namespace);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(Error::Config("Broker app id cannot be empty".to_string()));
        }

        if self.app_secret.trim().is_empty() {
            return Err(Error::Config("Broker app secret cannot be empty".to_string()));
        }

        if self.storage_namespace.trim().is_empty() {
            return Err(Error::Config("Storage namespace cannot be empty".to_string()));
        }

        Url::parse(&self.api_base_url)
            .map_err(|e| Error::Config(format!("Invalid API base URL: {}", e)))?;

        let redirect = Url::parse(&self.redirect_uri)
            .map_err(|e| Error::Config(format!("Invalid redirect URI: {}", e)))?;
        if redirect.path() == "/" {
            return Err(Error::Config(
                "Redirect URI must include a callback path (e.g. /auth-callback)".to_string(),
            ));
        }

        Ok(())
    }

    /// Path component of the redirect URI (`/auth-callback` by default)
    pub fn callback_path(&self) -> String {
        Url::parse(&self.redirect_uri)
            .map(|url| url.path().to_string())
            .unwrap_or_else(|_| "/auth-callback".to_string())
    }

    /// Full URL of an API endpoint, e.g. `endpoint("token")`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("api_base_url", &self.api_base_url)
            .field("storage_namespace", &self.storage_namespace)
            .field("home_route", &self.home_route)
            .finish()
    }
}

/// Core configuration: broker settings plus injected bridges.
#[derive(Clone)]
pub struct CoreConfig {
    pub broker: BrokerConfig,
    pub http_client: Arc<dyn HttpClient>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub navigator: Arc<dyn Navigator>,
    pub clock: Arc<dyn Clock>,
    /// Capacity of the event bus channel
    pub event_buffer_size: usize,
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("broker", &self.broker)
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("navigator", &"Navigator { ... }")
            .field("clock", &"Clock { ... }")
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for session persistence. \
                 Desktop: open a bridge_desktop::SqliteSettingsStore. \
                 Tests: use bridge_traits::MemorySettingsStore."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new().map_err(|e| Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: format!("Default reqwest client could not be built: {}", e),
    })?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                 Desktop: enable the 'desktop-shims' feature. \
                 Other hosts: inject a platform-native adapter."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_navigator() -> Result<Arc<dyn Navigator>> {
    Ok(Arc::new(bridge_desktop::BrowserNavigator::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_navigator() -> Result<Arc<dyn Navigator>> {
    Err(Error::CapabilityMissing {
        capability: "Navigator".to_string(),
        message: "No Navigator implementation provided; login cannot leave the app. \
                 Desktop: enable the 'desktop-shims' feature. \
                 Web: inject a window.location based navigator."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    broker: Option<BrokerConfig>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    clock: Option<Arc<dyn Clock>>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the broker application settings (required).
    pub fn broker(mut self, broker: BrokerConfig) -> Self {
        self.broker = Some(broker);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the reqwest-based client is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the settings store implementation (required).
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the navigator implementation.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Sets the time source. Default: [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Event bus capacity. Default: [`DEFAULT_EVENT_BUFFER_SIZE`].
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - `Error::Config` when the broker settings are missing or invalid
    /// - `Error::CapabilityMissing` when a required bridge is missing and no
    ///   platform default exists
    pub fn build(self) -> Result<CoreConfig> {
        let broker = self.broker.ok_or_else(|| {
            Error::Config("Broker configuration is required. Use .broker() to set it.".to_string())
        })?;
        broker.validate()?;

        let settings_store = self.settings_store.ok_or_else(settings_store_missing_error)?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let navigator = match self.navigator {
            Some(navigator) => navigator,
            None => provide_default_navigator()?,
        };

        let event_buffer_size = self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        if event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(CoreConfig {
            broker,
            http_client,
            settings_store,
            navigator,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            event_buffer_size,
        })
    }
}
