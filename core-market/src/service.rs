//! Market Data Service
//!
//! Feeds the market overview panel: index quotes from the broker plus the
//! fixed movers list, cached until the next fetch or logout.

use crate::client::BrokerApiClient;
use crate::error::{MarketError, Result};
use crate::fixtures;
use crate::types::{MarketData, BANK_NIFTY_SYMBOL, NIFTY_SYMBOL};
use async_trait::async_trait;
use bridge_traits::http::HttpClient;
use core_auth::{SessionManager, SessionScopedCache};
use core_runtime::events::{CoreEvent, EventBus, MarketEvent};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

/// Market overview fetcher and cache.
///
/// Register it with [`SessionManager::register_scoped_cache`] so logout
/// drops the cached snapshot.
pub struct MarketDataService {
    session: Arc<SessionManager>,
    client: BrokerApiClient,
    cache: RwLock<Option<MarketData>>,
    event_bus: EventBus,
}

impl MarketDataService {
    pub fn new(
        session: Arc<SessionManager>,
        http_client: Arc<dyn HttpClient>,
        event_bus: EventBus,
    ) -> Self {
        let client = BrokerApiClient::new(
            Arc::new(session.broker_config().clone()),
            http_client,
            session.credential_store().clone(),
        );

        Self {
            session,
            client,
            cache: RwLock::new(None),
            event_bus,
        }
    }

    /// The underlying broker client, for positions and orders.
    pub fn client(&self) -> &BrokerApiClient {
        &self.client
    }

    /// Last successfully fetched snapshot
    pub async fn market_data(&self) -> Option<MarketData> {
        self.cache.read().await.clone()
    }

    /// Fetch index quotes and refresh the cached overview.
    ///
    /// Drives the session status: loading while in flight, connected on
    /// success, and "Failed to fetch market data" with connected off on any
    /// broker failure. The previous snapshot is kept when a fetch fails.
    ///
    /// # Errors
    ///
    /// - `Auth(NotAuthenticated)` without a valid session; no request is sent
    /// - `NoData` when the broker returns no quotes
    /// - `Api`, `Network` or `Parse` from the broker call
    #[instrument(skip(self))]
    pub async fn fetch_market_data(&self) -> Result<MarketData> {
        if let Err(e) = self.session.ensure_authenticated().await {
            self.session.report_error(Some(e.user_message())).await;
            return Err(e.into());
        }

        self.session.set_loading(true).await;
        self.session.report_error(None).await;

        let outcome = self.fetch_snapshot().await;

        self.session.set_loading(false).await;

        match outcome {
            Ok(data) => {
                *self.cache.write().await = Some(data.clone());
                self.session.set_connected(true).await;

                info!(indices = data.index_count(), "Market data updated");
                self.emit(MarketEvent::SnapshotUpdated {
                    index_count: data.index_count(),
                    nifty_ltp: data.nifty.as_ref().map(|n| n.price),
                });
                Ok(data)
            }
            Err(e) => {
                warn!(error = %e, "Error fetching market data");
                self.session.report_error(Some(e.user_message())).await;
                self.session.set_connected(false).await;
                self.emit(MarketEvent::FetchFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn fetch_snapshot(&self) -> Result<MarketData> {
        let quotes = self
            .client
            .get_quotes(&[NIFTY_SYMBOL, BANK_NIFTY_SYMBOL])
            .await?;

        if quotes.is_empty() {
            return Err(MarketError::NoData);
        }

        Ok(MarketData::from_quotes(
            &quotes,
            fixtures::top_gainers(),
            fixtures::top_losers(),
        ))
    }

    fn emit(&self, event: MarketEvent) {
        let _ = self.event_bus.emit(CoreEvent::Market(event));
    }
}

#[async_trait]
impl SessionScopedCache for MarketDataService {
    async fn discard(&self) {
        let had_data = self.cache.write().await.take().is_some();
        if had_data {
            info!("Discarded cached market data");
            self.emit(MarketEvent::CacheCleared);
        }
    }
}
