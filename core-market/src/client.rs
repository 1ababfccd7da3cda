//! Authenticated broker REST client
//!
//! Every call reads a valid access token from the [`CredentialStore`] right
//! before sending, so an expired session fails fast with
//! `AuthError::NotAuthenticated` and no request leaves the process.

use crate::error::{MarketError, Result};
use crate::types::{OrderPayload, OrderRequest, Quote, QuotesEnvelope};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_auth::CredentialStore;
use core_runtime::config::BrokerConfig;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

/// Broker API client for quotes, positions and orders
pub struct BrokerApiClient {
    config: Arc<BrokerConfig>,
    http_client: Arc<dyn HttpClient>,
    store: CredentialStore,
}

impl BrokerApiClient {
    pub fn new(
        config: Arc<BrokerConfig>,
        http_client: Arc<dyn HttpClient>,
        store: CredentialStore,
    ) -> Self {
        Self {
            config,
            http_client,
            store,
        }
    }

    /// Quotes for `symbols`, in the order the broker returns them.
    #[instrument(skip(self), fields(count = symbols.len()))]
    pub async fn get_quotes(&self, symbols: &[&str]) -> Result<Vec<Quote>> {
        let mut url = Url::parse(&self.config.endpoint("quotes"))
            .map_err(|e| MarketError::Network(format!("Invalid quotes URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("symbols", &symbols.join(","));

        let response = self.send(HttpRequest::get(url.as_str())).await?;

        let envelope: QuotesEnvelope = response
            .json()
            .map_err(|e| MarketError::Parse(e.to_string()))?;
        let quotes = envelope.into_quotes();

        debug!(received = quotes.len(), "Fetched quotes");
        Ok(quotes)
    }

    /// Open positions, as returned by the broker.
    #[instrument(skip(self))]
    pub async fn get_positions(&self) -> Result<serde_json::Value> {
        let response = self
            .send(HttpRequest::get(self.config.endpoint("positions")))
            .await?;

        response
            .json()
            .map_err(|e| MarketError::Parse(e.to_string()))
    }

    /// Submit an order. The broker's acknowledgement is returned unchanged.
    ///
    /// # Errors
    ///
    /// `InvalidOrder` before any request when the order is incomplete.
    #[instrument(skip(self, order), fields(symbol = %order.symbol, side = ?order.side))]
    pub async fn place_order(&self, order: &OrderRequest) -> Result<serde_json::Value> {
        order.validate().map_err(MarketError::InvalidOrder)?;

        let request = HttpRequest::post(self.config.endpoint("orders"))
            .json(&OrderPayload::from(order))
            .map_err(|e| MarketError::Parse(e.to_string()))?;

        let response = self.send(request).await?;

        response
            .json()
            .map_err(|e| MarketError::Parse(e.to_string()))
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let token = self.store.valid_access_token().await?;
        let request = request
            .bearer_token(token)
            .header("Accept", "application/json");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        if !response.is_success() {
            let message = response.text_lossy();
            warn!(status = response.status, error = %message, "Broker API call failed");
            return Err(MarketError::Api {
                status: response.status,
                message,
            });
        }

        Ok(response)
    }
}
