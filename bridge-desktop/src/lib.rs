//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! - `HttpClient` using `reqwest`, one attempt per request
//! - `SettingsStore` using a SQLite-backed key-value table
//! - `Navigator` opening absolute URLs in the system browser
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{BrowserNavigator, ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let settings = SqliteSettingsStore::new(SqliteSettingsStore::default_path()?).await?;
//!     let navigator = BrowserNavigator::new();
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod http;
mod navigation;
mod settings;

pub use http::ReqwestHttpClient;
pub use navigation::BrowserNavigator;
pub use settings::SqliteSettingsStore;
