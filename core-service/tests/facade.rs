use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    HttpClient, HttpRequest, HttpResponse, ManualClock, MemorySettingsStore, Navigator,
};
use core_auth::{AuthError, AuthState};
use core_runtime::config::{BrokerConfig, CoreConfig};
use core_service::{CoreError, TradeDesk};
use std::sync::Arc;

/// Serves the token and quotes endpoints like the broker would.
struct FakeBroker;

#[async_trait]
impl HttpClient for FakeBroker {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let body = if request.url.ends_with("/token") {
            r#"{"access_token":"T1","refresh_token":"R1","expires_in":3600}"#
        } else if request.url.contains("/quotes") {
            r#"{"d":[{"symbol":"NSE:NIFTY50-INDEX","ltp":22150.4,"change":85.2,"change_percentage":0.39}]}"#
        } else {
            r#"{"s":"ok","netPositions":[]}"#
        };
        Ok(HttpResponse::new(200, body))
    }
}

struct StayPut;

impl Navigator for StayPut {
    fn navigate(&self, _target: &str) -> BridgeResult<()> {
        Ok(())
    }
}

async fn desk() -> TradeDesk {
    let config = CoreConfig::builder()
        .broker(BrokerConfig::new("APP-100", "secret"))
        .settings_store(Arc::new(MemorySettingsStore::new()))
        .http_client(Arc::new(FakeBroker))
        .navigator(Arc::new(StayPut))
        .clock(Arc::new(ManualClock::at_millis(1_000_000)))
        .build()
        .unwrap();
    TradeDesk::new(config).await
}

#[tokio::test]
async fn end_to_end_session() {
    let desk = desk().await;
    assert_eq!(desk.start().await, AuthState::Unauthenticated);

    let request = desk.login().await.unwrap();
    let callback = format!(
        "http://localhost:5173/auth-callback?code=C1&state={}",
        request.nonce
    );
    assert!(desk.handle_redirect(&callback).await.unwrap());
    assert!(desk.status().await.is_authenticated());

    let data = desk.fetch_market_data().await.unwrap();
    assert!(data.nifty.is_some());
    assert!(data.bank_nifty.is_none());

    let positions = desk.positions().await.unwrap();
    assert_eq!(positions["s"], "ok");

    desk.logout().await.unwrap();
    assert_eq!(desk.market().market_data().await, None);
    assert_eq!(desk.status().await.state, AuthState::Unauthenticated);
}

#[tokio::test]
async fn downstream_calls_require_login() {
    let desk = desk().await;
    desk.start().await;

    let result = desk.quotes(&["NSE:SBIN-EQ"]).await;
    assert!(matches!(
        result,
        Err(CoreError::Auth(AuthError::NotAuthenticated))
    ));
}

#[tokio::test]
async fn missing_settings_store_fails_fast() {
    let result = CoreConfig::builder()
        .broker(BrokerConfig::new("APP-100", "secret"))
        .http_client(Arc::new(FakeBroker))
        .navigator(Arc::new(StayPut))
        .build()
        .map_err(CoreError::from);

    assert!(matches!(
        result,
        Err(CoreError::CapabilityMissing { ref capability, .. }) if capability == "SettingsStore"
    ));
}

#[cfg(feature = "desktop-shims")]
#[tokio::test]
async fn desktop_bootstrap_uses_sqlite_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("local_storage.db");

    let desk = core_service::bootstrap_desktop_at(BrokerConfig::new("APP-100", "secret"), db_path.clone())
        .await
        .unwrap();

    assert_eq!(desk.start().await, AuthState::Unauthenticated);
    assert!(db_path.exists());
}
