//! # Event Bus System
//!
//! Typed broadcast events for the broker core, built on `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: [`SessionEvent`] for the login handshake and session
//!   lifecycle, [`MarketEvent`] for the market data panel.
//! - **EventBus**: Central broadcast channel for publishing events.
//! - **EventStream**: Receiver wrapper with optional filtering.
//!
//! ```text
//! ┌────────────────┐   emit   ┌──────────┐  subscribe  ┌────────────┐
//! │ SessionManager ├─────────>│          ├────────────>│ UI / CLI   │
//! └────────────────┘          │ EventBus │             └────────────┘
//! ┌────────────────┐   emit   │          │  subscribe  ┌────────────┐
//! │ MarketData     ├─────────>│          ├────────────>│ Subscriber │
//! └────────────────┘          └──────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(16);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Session(SessionEvent::SignedOut))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event, CoreEvent::Session(SessionEvent::SignedOut));
//! # }
//! ```
//!
//! Events never carry tokens or nonces.
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; it can keep going.
//! - **`RecvError::Closed`**: every sender is gone; treat as shutdown.
//!
//! `emit` fails only when nobody is subscribed. Publishers ignore that case.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published through the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Session lifecycle events
    Session(SessionEvent),
    /// Market data events
    Market(MarketEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Market(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Session(SessionEvent::AuthError { .. }) => EventSeverity::Error,
            CoreEvent::Market(MarketEvent::FetchFailed { .. }) => EventSeverity::Error,
            CoreEvent::Session(SessionEvent::SessionExpired) => EventSeverity::Warning,
            CoreEvent::Session(SessionEvent::SignedIn { .. })
            | CoreEvent::Session(SessionEvent::SignedOut) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Session Events
// ============================================================================

/// Events emitted by the session state provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// A valid persisted session was found at start-up.
    SessionRestored {
        /// Expiry of the restored session (Unix epoch milliseconds).
        expires_at_ms: i64,
    },
    /// The user is being sent to the broker login page.
    LoginStarted,
    /// Code exchange succeeded and the session was persisted.
    SignedIn {
        /// Expiry of the new session (Unix epoch milliseconds).
        expires_at_ms: i64,
    },
    /// Credentials were cleared by logout or disconnect.
    SignedOut,
    /// A downstream fetch found the session past its expiry.
    SessionExpired,
    /// The login handshake failed.
    AuthError {
        /// Human-readable error message.
        message: String,
        /// Whether starting a new login can fix it.
        recoverable: bool,
    },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::SessionRestored { .. } => "Persisted session restored",
            SessionEvent::LoginStarted => "Redirecting to broker login",
            SessionEvent::SignedIn { .. } => "Signed in to broker",
            SessionEvent::SignedOut => "Signed out from broker",
            SessionEvent::SessionExpired => "Broker session expired",
            SessionEvent::AuthError { .. } => "Authentication error",
        }
    }
}

// ============================================================================
// Market Events
// ============================================================================

/// Events emitted by the market data service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum MarketEvent {
    /// A fresh market overview snapshot is cached.
    SnapshotUpdated {
        /// Number of index quotes in the snapshot.
        index_count: usize,
        /// Latest NIFTY 50 price, when quoted.
        nifty_ltp: Option<f64>,
    },
    /// Fetching market data failed.
    FetchFailed {
        /// Human-readable error message.
        message: String,
    },
    /// Cached market data was discarded (logout).
    CacheCleared,
}

impl MarketEvent {
    fn description(&self) -> &str {
        match self {
            MarketEvent::SnapshotUpdated { .. } => "Market data updated",
            MarketEvent::FetchFailed { .. } => "Market data fetch failed",
            MarketEvent::CacheCleared => "Market data cleared",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Clone it to share a producer handle; every `subscribe()` is an independent
/// receiver that sees events emitted after it was created.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// Subscribers falling more than `capacity` events behind receive
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Subscribe and wrap the receiver in an [`EventStream`].
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` that can skip events not matching a predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus};
///
/// let event_bus = EventBus::new(16);
/// let session_only = event_bus
///     .stream()
///     .filter(|event| matches!(event, CoreEvent::Session(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`/`try_recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without blocking.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}
