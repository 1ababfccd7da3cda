//! Full login → callback → logout cycle over in-memory bridges.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    HttpClient, HttpRequest, HttpResponse, ManualClock, MemorySettingsStore, Navigator,
    SettingsStore,
};
use core_auth::{AuthState, SessionManager};
use core_runtime::config::{BrokerConfig, CoreConfig};
use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
use std::sync::{Arc, Mutex};

struct FakeBroker;

#[async_trait]
impl HttpClient for FakeBroker {
    async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
        Ok(HttpResponse::new(
            200,
            r#"{"access_token":"T1","refresh_token":"R1","expires_in":3600}"#,
        ))
    }
}

/// Remembers where the app tried to go.
#[derive(Default)]
struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) -> BridgeResult<()> {
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(target.to_string());
        }
        Ok(())
    }
}

#[tokio::test]
async fn login_callback_logout_cycle() {
    let storage = MemorySettingsStore::new();
    let clock = Arc::new(ManualClock::at_millis(1_000_000));
    let navigator = Arc::new(RecordingNavigator::default());
    let events = EventBus::new(16);
    let mut stream = events.stream();

    let config = CoreConfig::builder()
        .broker(BrokerConfig::new("APP-100", "secret"))
        .settings_store(Arc::new(storage.clone()))
        .http_client(Arc::new(FakeBroker))
        .navigator(navigator.clone())
        .clock(clock.clone())
        .build()
        .unwrap();
    let manager = SessionManager::new(&config, events);

    assert_eq!(manager.initialize().await, AuthState::Unauthenticated);

    let request = manager.login().await.unwrap();
    let callback = format!(
        "http://localhost:5173/auth-callback?code=C1&state={}",
        request.nonce
    );
    assert!(manager.handle_redirect(&callback).await.unwrap());

    assert_eq!(
        storage.get_string("fyers_access_token").await.unwrap(),
        Some("T1".to_string())
    );
    assert_eq!(
        storage.get_string("fyers_token_expiry").await.unwrap(),
        Some("4600000".to_string())
    );
    {
        let visited = navigator.visited.lock().unwrap();
        assert_eq!(visited.len(), 2);
        assert!(visited[0].contains("generate-authcode"));
        assert_eq!(visited[1], "/");
    }

    // A restart picks the session back up
    let restarted = SessionManager::new(&config, EventBus::new(4));
    assert_eq!(restarted.initialize().await, AuthState::Authenticated);

    manager.logout().await.unwrap();
    assert_eq!(manager.credential_store().load().await.unwrap(), None);
    assert!(storage.is_empty().await);

    let mut seen = Vec::new();
    while let Some(Ok(event)) = stream.try_recv() {
        seen.push(event);
    }
    assert_eq!(
        seen,
        vec![
            CoreEvent::Session(SessionEvent::LoginStarted),
            CoreEvent::Session(SessionEvent::SignedIn {
                expires_at_ms: 4_600_000
            }),
            CoreEvent::Session(SessionEvent::SignedOut),
        ]
    );
}

#[tokio::test]
async fn session_expires_one_millisecond_after_deadline() {
    let clock = Arc::new(ManualClock::at_millis(1_000_000));
    let config = CoreConfig::builder()
        .broker(BrokerConfig::new("APP-100", "secret"))
        .settings_store(Arc::new(MemorySettingsStore::new()))
        .http_client(Arc::new(FakeBroker))
        .navigator(Arc::new(RecordingNavigator::default()))
        .clock(clock.clone())
        .build()
        .unwrap();
    let manager = SessionManager::new(&config, EventBus::default());

    let request = manager.login().await.unwrap();
    manager.complete_login("C1", &request.nonce).await.unwrap();
    assert!(manager.credential_store().is_valid().await);

    clock.set_millis(4_600_001);
    assert!(!manager.credential_store().is_valid().await);

    // Expired sessions are not restored
    assert_eq!(manager.initialize().await, AuthState::Unauthenticated);
}
