//! # Host Bridge Traits
//!
//! Capability seams the broker core needs from its host.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - One-shot async HTTP requests to the broker API
//! - [`SettingsStore`](storage::SettingsStore) - Persistent string key-value storage
//! - [`Clock`](time::Clock) - Time source for expiry checks and deterministic testing
//! - [`Navigator`](navigation::Navigator) - Leave the app for the broker login page and come back
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | Web      | TBD                 | 📋 Planned |
//!
//! The core fails fast with `CapabilityMissing` when a required bridge is not
//! injected; see `core_runtime::config::CoreConfigBuilder`.
//!
//! ## Error Handling
//!
//! All bridge traits return [`BridgeError`](error::BridgeError). Implementations
//! convert platform errors into it and keep messages actionable.
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync` so implementations can be shared as
//! `Arc<dyn Trait>` across async tasks.

pub mod error;
pub mod http;
pub mod navigation;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use navigation::Navigator;
pub use storage::{MemorySettingsStore, SettingsStore};
pub use time::{Clock, ManualClock, SystemClock};
