use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::path::Path;
use token_relay::{router, RelayConfig};
use tower::ServiceExt;

fn config_in(dir: &Path) -> RelayConfig {
    RelayConfig {
        token_file: dir.join("access_token.txt"),
        login_script: dir.join("login_gui_new.py"),
        ..RelayConfig::default()
    }
}

async fn call(config: RelayConfig, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(config).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn check_token_without_file_is_null() {
    let dir = tempfile::tempdir().unwrap();

    let (status, body) = call(config_in(dir.path()), get("/api/token-server/check-token")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "token": null }));
}

#[tokio::test]
async fn check_token_trims_content() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    std::fs::write(&config.token_file, "  T1\n").unwrap();

    let (_, body) = call(config, get("/api/token-server/check-token")).await;
    assert_eq!(body, json!({ "token": "T1" }));
}

#[tokio::test]
async fn blank_token_file_is_null() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    std::fs::write(&config.token_file, "\n  \n").unwrap();

    let (_, body) = call(config, get("/api/token-server/check-token")).await;
    assert_eq!(body, json!({ "token": null }));
}

#[tokio::test]
async fn create_test_token_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let (status, body) = call(
        config.clone(),
        post_json("/api/token-server/create-test-token", json!({ "token": "T9" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(std::fs::read_to_string(&config.token_file).unwrap(), "T9");

    let (_, body) = call(config, get("/api/token-server/check-token")).await;
    assert_eq!(body, json!({ "token": "T9" }));
}

#[tokio::test]
async fn create_test_token_requires_token() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    for payload in [json!({}), json!({ "token": "" })] {
        let (status, body) = call(
            config.clone(),
            post_json("/api/token-server/create-test-token", payload),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "success": false, "message": "Token is required" })
        );
    }
    assert!(!config.token_file.exists());
}

#[tokio::test]
async fn create_test_token_without_json_body_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let requests = [
        Request::builder()
            .method("POST")
            .uri("/api/token-server/create-test-token")
            .body(Body::empty())
            .unwrap(),
        Request::builder()
            .method("POST")
            .uri("/api/token-server/create-test-token")
            .header("content-type", "text/plain")
            .body(Body::from("T9"))
            .unwrap(),
        Request::builder()
            .method("POST")
            .uri("/api/token-server/create-test-token")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    ];

    for request in requests {
        let (status, body) = call(config.clone(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "success": false, "message": "Token is required" })
        );
    }
    assert!(!config.token_file.exists());
}

#[tokio::test]
async fn launch_without_script_is_not_found() {
    let dir = tempfile::tempdir().unwrap();

    let (status, body) = call(
        config_in(dir.path()),
        get("/api/token-server/launch-login-tool"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn launch_with_missing_interpreter_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = RelayConfig {
        python: dir
            .path()
            .join("no-such-python")
            .to_string_lossy()
            .into_owned(),
        ..config_in(dir.path())
    };
    std::fs::write(&config.login_script, "print('hi')\n").unwrap();

    let (status, body) = call(config, get("/api/token-server/launch-login-tool")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to launch login tool"));
}

#[cfg(unix)]
#[tokio::test]
async fn launch_runs_script() {
    let dir = tempfile::tempdir().unwrap();
    let config = RelayConfig {
        python: "sh".to_string(),
        ..config_in(dir.path())
    };
    std::fs::write(&config.login_script, "echo launched\n").unwrap();

    let (status, body) = call(config, get("/api/token-server/launch-login-tool")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "message": "Login tool launched successfully" })
    );
}
