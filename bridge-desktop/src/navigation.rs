//! Navigation via the system browser

use bridge_traits::{
    error::{BridgeError, Result},
    navigation::Navigator,
};
use tracing::{debug, info};

/// Opens absolute `http(s)` URLs in the default browser.
///
/// In-app routes (`/`, `/dashboard`) have no browser equivalent on desktop;
/// they are recorded and acknowledged so the caller's flow continues.
#[derive(Debug, Clone, Default)]
pub struct BrowserNavigator;

impl BrowserNavigator {
    pub fn new() -> Self {
        Self
    }

    fn is_external(target: &str) -> bool {
        target.starts_with("https://") || target.starts_with("http://")
    }
}

impl Navigator for BrowserNavigator {
    fn navigate(&self, target: &str) -> Result<()> {
        if !Self::is_external(target) {
            debug!(route = target, "In-app route requested");
            return Ok(());
        }

        info!("Opening broker login page in the system browser");
        webbrowser::open(target).map_err(|e| {
            BridgeError::NotAvailable(format!("Failed to open browser: {}", e))
        })
    }
}
