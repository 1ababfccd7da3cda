//! Broker market data types
//!
//! Wire shapes for the quotes, positions and orders endpoints, plus the
//! market overview built from them.

use serde::{Deserialize, Serialize};

/// Symbol of the NIFTY 50 index quote
pub const NIFTY_SYMBOL: &str = "NSE:NIFTY50-INDEX";

/// Symbol of the NIFTY BANK index quote
pub const BANK_NIFTY_SYMBOL: &str = "NSE:BANKNIFTY-INDEX";

/// One instrument quote.
///
/// Only `symbol` and `ltp` are required; the broker omits the other fields
/// for some instruments, so they default to zero. The short field names of
/// the v2 quote payload are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(alias = "n")]
    pub symbol: String,
    /// Last traded price
    #[serde(alias = "lp")]
    pub ltp: f64,
    #[serde(default, alias = "ch")]
    pub change: f64,
    #[serde(default, alias = "chp")]
    pub change_percentage: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default, alias = "open_price")]
    pub open: f64,
    #[serde(default, alias = "high_price")]
    pub high: f64,
    #[serde(default, alias = "low_price")]
    pub low: f64,
    #[serde(default, alias = "prev_close_price")]
    pub close: f64,
}

/// Body of `GET /quotes`: either the provider envelope or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum QuotesEnvelope {
    Wrapped { d: Vec<Quote> },
    Bare(Vec<Quote>),
}

impl QuotesEnvelope {
    pub(crate) fn into_quotes(self) -> Vec<Quote> {
        match self {
            QuotesEnvelope::Wrapped { d } => d,
            QuotesEnvelope::Bare(quotes) => quotes,
        }
    }
}

/// Headline numbers for one index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub price: f64,
    pub change: f64,
    pub percent_change: f64,
}

impl From<&Quote> for IndexSnapshot {
    fn from(quote: &Quote) -> Self {
        Self {
            price: quote.ltp,
            change: quote.change,
            percent_change: quote.change_percentage,
        }
    }
}

/// A top gainer or loser, `change` in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub symbol: String,
    pub change: f64,
}

impl Mover {
    pub fn new(symbol: impl Into<String>, change: f64) -> Self {
        Self {
            symbol: symbol.into(),
            change,
        }
    }
}

/// Market overview panel data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketData {
    pub nifty: Option<IndexSnapshot>,
    pub bank_nifty: Option<IndexSnapshot>,
    pub top_gainers: Vec<Mover>,
    pub top_losers: Vec<Mover>,
}

impl MarketData {
    /// Build the overview from index quotes; unknown symbols are ignored.
    pub fn from_quotes(quotes: &[Quote], top_gainers: Vec<Mover>, top_losers: Vec<Mover>) -> Self {
        let find = |symbol: &str| {
            quotes
                .iter()
                .find(|q| q.symbol == symbol)
                .map(IndexSnapshot::from)
        };

        Self {
            nifty: find(NIFTY_SYMBOL),
            bank_nifty: find(BANK_NIFTY_SYMBOL),
            top_gainers,
            top_losers,
        }
    }

    /// Number of index snapshots present
    pub fn index_count(&self) -> usize {
        usize::from(self.nifty.is_some()) + usize::from(self.bank_nifty.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Broker encoding: 1 buy, -1 sell
    pub fn code(&self) -> i8 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    /// Broker encoding: 1 limit, 2 market
    pub fn code(&self) -> u8 {
        match self {
            OrderType::Limit => 1,
            OrderType::Market => 2,
        }
    }
}

/// A single-leg order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub quantity: u32,
    pub side: OrderSide,
    pub order_type: OrderType,
    /// Required for limit orders, ignored for market orders
    pub limit_price: Option<f64>,
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, quantity: u32, side: OrderSide) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            side,
            order_type: OrderType::Market,
            limit_price: None,
        }
    }

    pub fn limit(symbol: impl Into<String>, quantity: u32, side: OrderSide, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            side,
            order_type: OrderType::Limit,
            limit_price: Some(price),
        }
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.symbol.trim().is_empty() {
            return Err("symbol is empty".to_string());
        }
        if self.quantity == 0 {
            return Err("quantity must be positive".to_string());
        }
        match (self.order_type, self.limit_price) {
            (OrderType::Limit, None) => Err("limit order without a limit price".to_string()),
            (OrderType::Limit, Some(price)) if !(price.is_finite() && price > 0.0) => {
                Err(format!("limit price {} is not positive", price))
            }
            _ => Ok(()),
        }
    }
}

/// `POST /orders` body in the broker's field names.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderPayload<'a> {
    symbol: &'a str,
    qty: u32,
    #[serde(rename = "type")]
    order_type: u8,
    side: i8,
    product_type: &'static str,
    limit_price: f64,
    stop_price: f64,
    validity: &'static str,
    disclosed_qty: u32,
    offline_order: bool,
}

impl<'a> From<&'a OrderRequest> for OrderPayload<'a> {
    fn from(order: &'a OrderRequest) -> Self {
        Self {
            symbol: &order.symbol,
            qty: order.quantity,
            order_type: order.order_type.code(),
            side: order.side.code(),
            product_type: "INTRADAY",
            limit_price: match order.order_type {
                OrderType::Limit => order.limit_price.unwrap_or_default(),
                OrderType::Market => 0.0,
            },
            stop_price: 0.0,
            validity: "DAY",
            disclosed_qty: 0,
            offline_order: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_accept_envelope_and_bare_array() {
        let wrapped: QuotesEnvelope = serde_json::from_str(
            r#"{"s":"ok","d":[{"symbol":"NSE:NIFTY50-INDEX","ltp":22000.5,"change":110.0,"change_percentage":0.5}]}"#,
        )
        .unwrap();
        let bare: QuotesEnvelope =
            serde_json::from_str(r#"[{"symbol":"NSE:SBIN-EQ","ltp":812.3}]"#).unwrap();

        let wrapped = wrapped.into_quotes();
        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped[0].change_percentage, 0.5);

        let bare = bare.into_quotes();
        assert_eq!(bare[0].symbol, "NSE:SBIN-EQ");
        assert_eq!(bare[0].volume, 0.0);
    }

    #[test]
    fn test_quote_short_field_names() {
        let quote: Quote =
            serde_json::from_str(r#"{"n":"NSE:SBIN-EQ","lp":812.3,"ch":-4.1,"chp":-0.5}"#)
                .unwrap();
        assert_eq!(quote.symbol, "NSE:SBIN-EQ");
        assert_eq!(quote.ltp, 812.3);
        assert_eq!(quote.change, -4.1);
    }

    #[test]
    fn test_market_data_from_quotes() {
        let quotes = vec![Quote {
            symbol: BANK_NIFTY_SYMBOL.to_string(),
            ltp: 48000.0,
            change: -120.0,
            change_percentage: -0.25,
            volume: 0.0,
            open: 0.0,
            high: 0.0,
            low: 0.0,
            close: 0.0,
        }];

        let data = MarketData::from_quotes(&quotes, vec![], vec![]);
        assert!(data.nifty.is_none());
        assert_eq!(data.bank_nifty.as_ref().map(|s| s.price), Some(48000.0));
        assert_eq!(data.index_count(), 1);
    }

    #[test]
    fn test_order_validation() {
        assert!(OrderRequest::market("NSE:SBIN-EQ", 10, OrderSide::Buy)
            .validate()
            .is_ok());
        assert!(OrderRequest::market("NSE:SBIN-EQ", 0, OrderSide::Buy)
            .validate()
            .is_err());

        let mut limit = OrderRequest::limit("NSE:SBIN-EQ", 1, OrderSide::Sell, 800.0);
        assert!(limit.validate().is_ok());
        limit.limit_price = None;
        assert!(limit.validate().is_err());
    }

    #[test]
    fn test_order_payload_encoding() {
        let order = OrderRequest::limit("NSE:SBIN-EQ", 5, OrderSide::Sell, 812.5);
        let json = serde_json::to_value(OrderPayload::from(&order)).unwrap();

        assert_eq!(json["symbol"], "NSE:SBIN-EQ");
        assert_eq!(json["qty"], 5);
        assert_eq!(json["type"], 1);
        assert_eq!(json["side"], -1);
        assert_eq!(json["limitPrice"], 812.5);
        assert_eq!(json["productType"], "INTRADAY");
    }
}
