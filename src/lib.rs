//! TradeDesk: broker session core for the trading dashboard.
//!
//! Re-exports the workspace crates so hosts can depend on `tradedesk` alone,
//! and hosts the command-line front end used by the `tradedesk` binary.
//! Enable `desktop-shims` (default) for the SQLite, reqwest and system
//! browser bridges.

pub mod cli;

pub use core_auth as auth;
pub use core_market as market;
pub use core_runtime as runtime;
pub use core_service as service;

pub use core_auth::{AuthError, AuthState, SessionStatus};
pub use core_market::{MarketData, MarketError, Quote};
pub use core_service::{CoreError, TradeDesk};
