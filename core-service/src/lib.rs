//! Core service façade and bootstrap helpers.
//!
//! [`TradeDesk`] wires the host-provided bridges (HTTP, settings storage,
//! navigation, clock) into the session manager and the market data service,
//! once, at start-up. Desktop hosts enable the `desktop-shims` feature and
//! call [`bootstrap_desktop`]; other hosts inject their own bridges through
//! [`CoreConfig::builder`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use core_auth::{AuthRequest, AuthState, SessionManager, SessionScopedCache, SessionStatus};
use core_market::{MarketData, MarketDataService, OrderRequest, Quote};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use tracing::info;

#[cfg(feature = "desktop-shims")]
use bridge_desktop::SqliteSettingsStore;
#[cfg(feature = "desktop-shims")]
use core_runtime::config::BrokerConfig;
#[cfg(feature = "desktop-shims")]
use std::path::PathBuf;

/// Primary façade exposed to host applications.
///
/// Cheap to clone; clones share the same session and cache.
#[derive(Clone)]
pub struct TradeDesk {
    session: Arc<SessionManager>,
    market: Arc<MarketDataService>,
    events: EventBus,
}

impl TradeDesk {
    /// Build the service graph from a validated configuration.
    pub async fn new(config: CoreConfig) -> Self {
        let events = EventBus::new(config.event_buffer_size);
        let session = Arc::new(SessionManager::new(&config, events.clone()));
        let market = Arc::new(MarketDataService::new(
            session.clone(),
            config.http_client.clone(),
            events.clone(),
        ));

        session
            .register_scoped_cache(market.clone() as Arc<dyn SessionScopedCache>)
            .await;

        info!(app_id = %config.broker.app_id, "Trade desk core initialized");

        Self {
            session,
            market,
            events,
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn market(&self) -> &Arc<MarketDataService> {
        &self.market
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to session and market events emitted from now on.
    pub fn subscribe(&self) -> EventStream {
        self.events.stream()
    }

    /// Restore the persisted session, if it is still valid.
    pub async fn start(&self) -> AuthState {
        self.session.initialize().await
    }

    pub async fn status(&self) -> SessionStatus {
        self.session.status().await
    }

    pub async fn login(&self) -> Result<AuthRequest> {
        Ok(self.session.login().await?)
    }

    /// Feed a URL the host was redirected to. `Ok(false)` if it was not the
    /// broker callback.
    pub async fn handle_redirect(&self, url: &str) -> Result<bool> {
        Ok(self.session.handle_redirect(url).await?)
    }

    pub async fn logout(&self) -> Result<()> {
        Ok(self.session.logout().await?)
    }

    pub async fn fetch_market_data(&self) -> Result<MarketData> {
        Ok(self.market.fetch_market_data().await?)
    }

    pub async fn quotes(&self, symbols: &[&str]) -> Result<Vec<Quote>> {
        self.session.ensure_authenticated().await?;
        Ok(self.market.client().get_quotes(symbols).await?)
    }

    pub async fn positions(&self) -> Result<serde_json::Value> {
        self.session.ensure_authenticated().await?;
        Ok(self.market.client().get_positions().await?)
    }

    pub async fn place_order(&self, order: &OrderRequest) -> Result<serde_json::Value> {
        self.session.ensure_authenticated().await?;
        Ok(self.market.client().place_order(order).await?)
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Persists the session in `local_storage.db` under the user data directory,
/// talks to the broker over reqwest and opens the login page in the system
/// browser.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_runtime::config::BrokerConfig;
/// use core_service::bootstrap_desktop;
///
/// let desk = bootstrap_desktop(BrokerConfig::new("APP-100", "secret")).await?;
/// desk.start().await;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(broker: BrokerConfig) -> Result<TradeDesk> {
    let path = SqliteSettingsStore::default_path()
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    bootstrap_desktop_at(broker, path).await
}

/// Like [`bootstrap_desktop`] with an explicit settings database path.
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop_at(broker: BrokerConfig, db_path: PathBuf) -> Result<TradeDesk> {
    let store = SqliteSettingsStore::new(db_path)
        .await
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

    let config = CoreConfig::builder()
        .broker(broker)
        .settings_store(Arc::new(store))
        .build()?;

    Ok(TradeDesk::new(config).await)
}
