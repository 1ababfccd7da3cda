use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    BridgeError, HttpClient, HttpMethod, HttpRequest, HttpResponse, ManualClock,
    MemorySettingsStore,
};
use core_auth::{AuthError, CredentialStore, TokenExchangeClient};
use core_runtime::config::BrokerConfig;
use mockall::mock;
use std::sync::Arc;

mock! {
    pub Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

fn store_at(now_ms: i64) -> CredentialStore {
    CredentialStore::new(
        Arc::new(MemorySettingsStore::new()),
        Arc::new(ManualClock::at_millis(now_ms)),
        "fyers",
    )
}

fn client(http: MockHttp, store: &CredentialStore) -> TokenExchangeClient {
    TokenExchangeClient::new(
        Arc::new(BrokerConfig::new("APP-100", "secret")),
        Arc::new(http),
        store.clone(),
    )
}

#[tokio::test]
async fn mismatched_state_makes_no_request() {
    let store = store_at(1_000_000);
    store.save_pending_nonce("abc123").await.unwrap();

    let mut http = MockHttp::new();
    http.expect_execute().never();

    let result = client(http, &store).exchange("C1", "xyz").await;

    assert_eq!(result, Err(AuthError::StateMismatch));
    assert_eq!(store.load().await.unwrap(), None);
}

#[tokio::test]
async fn no_pending_login_is_a_mismatch() {
    let store = store_at(1_000_000);

    let mut http = MockHttp::new();
    http.expect_execute().never();

    let result = client(http, &store).exchange("C1", "abc123").await;
    assert_eq!(result, Err(AuthError::StateMismatch));
}

#[tokio::test]
async fn matching_state_yields_session() {
    let store = store_at(1_000_000);
    store.save_pending_nonce("abc123").await.unwrap();

    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(|request| {
            let body: serde_json::Value = request
                .body
                .as_ref()
                .and_then(|b| serde_json::from_slice(b).ok())
                .unwrap_or_default();

            request.method == HttpMethod::Post
                && request.url == "https://api.fyers.in/api/v2/token"
                && body["grant_type"] == "authorization_code"
                && body["code"] == "C1"
                && body["client_id"] == "APP-100"
                && body["client_secret"] == "secret"
                && body["redirect_uri"] == "http://localhost:5173/auth-callback"
        })
        .times(1)
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"access_token":"T1","refresh_token":"R1","expires_in":3600}"#,
            ))
        });

    let session = client(http, &store)
        .exchange("C1", "abc123")
        .await
        .expect("exchange");

    assert_eq!(session.access_token, "T1");
    assert_eq!(session.refresh_token, "R1");
    assert_eq!(session.expires_at_epoch_ms, 4_600_000);
    assert_eq!(session.nonce, "abc123");

    // Persisting is the caller's job
    assert_eq!(store.load().await.unwrap(), None);
}

#[tokio::test]
async fn missing_refresh_token_is_empty() {
    let store = store_at(0);
    store.save_pending_nonce("n1").await.unwrap();

    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(200, r#"{"access_token":"T1","expires_in":60}"#)));

    let session = client(http, &store).exchange("C1", "n1").await.unwrap();
    assert_eq!(session.refresh_token, "");
    assert_eq!(session.expires_at_epoch_ms, 60_000);
}

#[tokio::test]
async fn rejected_exchange_reports_status() {
    let store = store_at(1_000_000);
    store.save_pending_nonce("abc123").await.unwrap();

    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(401, r#"{"s":"error","message":"invalid code"}"#)));

    let result = client(http, &store).exchange("C1", "abc123").await;

    match result {
        Err(AuthError::ExchangeFailed { status, cause }) => {
            assert_eq!(status, Some(401));
            assert!(cause.contains("invalid code"));
        }
        other => panic!("expected ExchangeFailed, got {:?}", other),
    }
    assert_eq!(store.load().await.unwrap(), None);
}

#[tokio::test]
async fn network_failure_is_exchange_failure() {
    let store = store_at(1_000_000);
    store.save_pending_nonce("abc123").await.unwrap();

    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Err(BridgeError::OperationFailed("connection refused".into())));

    let result = client(http, &store).exchange("C1", "abc123").await;

    assert!(matches!(
        result,
        Err(AuthError::ExchangeFailed { status: None, .. })
    ));
}

#[tokio::test]
async fn body_without_expiry_is_rejected() {
    let store = store_at(1_000_000);
    store.save_pending_nonce("abc123").await.unwrap();

    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(200, r#"{"access_token":"T1"}"#)));

    let result = client(http, &store).exchange("C1", "abc123").await;

    assert!(matches!(
        result,
        Err(AuthError::ExchangeFailed {
            status: Some(200),
            ..
        })
    ));
}

#[tokio::test]
async fn failed_exchange_cannot_be_retried_with_same_state() {
    let store = store_at(1_000_000);
    store.save_pending_nonce("abc123").await.unwrap();

    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(502, "bad gateway")));
    let client = client(http, &store);

    assert!(matches!(
        client.exchange("C1", "abc123").await,
        Err(AuthError::ExchangeFailed { .. })
    ));
    assert_eq!(
        client.exchange("C1", "abc123").await,
        Err(AuthError::StateMismatch)
    );
    assert_eq!(store.pending_nonce().await.unwrap(), None);
}

#[tokio::test]
async fn replayed_callback_after_success_is_rejected() {
    let store = store_at(1_000_000);
    store.save_pending_nonce("abc123").await.unwrap();

    let mut http = MockHttp::new();
    http.expect_execute().times(1).returning(|_| {
        Ok(HttpResponse::new(
            200,
            r#"{"access_token":"T1","refresh_token":"R1","expires_in":3600}"#,
        ))
    });
    let client = client(http, &store);

    let session = client.exchange("C1", "abc123").await.unwrap();
    store.save(&session).await.unwrap();

    assert_eq!(
        client.exchange("C1", "abc123").await,
        Err(AuthError::StateMismatch)
    );
    assert_eq!(store.load().await.unwrap(), Some(session));
}

#[tokio::test]
async fn mismatch_ends_the_pending_login() {
    let store = store_at(1_000_000);
    store.save_pending_nonce("abc123").await.unwrap();

    let mut http = MockHttp::new();
    http.expect_execute().never();
    let client = client(http, &store);

    assert_eq!(
        client.exchange("C1", "forged").await,
        Err(AuthError::StateMismatch)
    );
    assert_eq!(
        client.exchange("C1", "abc123").await,
        Err(AuthError::StateMismatch)
    );
}
