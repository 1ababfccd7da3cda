//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the broker core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! Every other core crate builds on the conventions set here: `tracing` for
//! diagnostics, [`CoreConfig`](config::CoreConfig) for dependency injection,
//! and [`EventBus`](events::EventBus) for status notifications.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
