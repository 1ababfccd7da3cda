//! Navigation Abstraction
//!
//! Full-page navigation out of the app (to the broker login page) and back to
//! in-app routes after a completed login.

use crate::error::Result;

/// Host navigation trait
///
/// - Desktop: open absolute URLs in the system browser
/// - Web: assign `window.location`
///
/// `target` is either an absolute URL or an in-app route such as `/`.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str) -> Result<()>;
}
