//! # Broker Market Data
//!
//! Authenticated calls to the Fyers REST API and the market overview built
//! on top of them.
//!
//! - [`BrokerApiClient`]: quotes, positions and orders with bearer auth
//! - [`MarketDataService`]: index snapshot cache that lives and dies with the
//!   broker session

pub mod client;
pub mod error;
pub mod fixtures;
pub mod service;
pub mod types;

pub use client::BrokerApiClient;
pub use error::{MarketError, Result};
pub use service::MarketDataService;
pub use types::{
    IndexSnapshot, MarketData, Mover, OrderRequest, OrderSide, OrderType, Quote,
    BANK_NIFTY_SYMBOL, NIFTY_SYMBOL,
};
