//! HTTP handlers for the token relay.

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use core_runtime::logging::{mask_secret, strip_path};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Shared handler state
#[derive(Clone)]
pub struct RelayState {
    pub config: Arc<RelayConfig>,
}

impl RelayState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTokenRequest {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

impl StatusResponse {
    fn ok(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
        })
    }
}

/// `GET /api/token-server/check-token`
///
/// The trimmed token file content, or `null` when the file is absent or
/// blank.
pub async fn check_token(State(state): State<RelayState>) -> Result<Json<TokenResponse>> {
    let token = match tokio::fs::read_to_string(&state.config.token_file).await {
        Ok(content) => Some(content.trim().to_string()).filter(|t| !t.is_empty()),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(RelayError::ReadToken(e)),
    };

    debug!(present = token.is_some(), "Token check");
    Ok(Json(TokenResponse { token }))
}

/// `POST /api/token-server/create-test-token`
///
/// Development helper: overwrite the token file with the posted token.
/// A missing or unreadable body counts as a missing token.
pub async fn create_test_token(
    State(state): State<RelayState>,
    body: std::result::Result<Json<CreateTokenRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>> {
    let body = body.unwrap_or_else(|rejection| {
        debug!(error = %rejection, "Unreadable token request body");
        Json(CreateTokenRequest { token: None })
    });

    let token = body
        .0
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RelayError::BadRequest("Token is required".to_string()))?;

    tokio::fs::write(&state.config.token_file, &token)
        .await
        .map_err(RelayError::WriteToken)?;

    info!(token = %mask_secret(&token), "Test token written");
    Ok(StatusResponse::ok("Test token created successfully"))
}

/// `GET /api/token-server/launch-login-tool`
///
/// Starts the desktop login tool and returns without waiting for it. Its
/// output is forwarded to the relay log.
pub async fn launch_login_tool(State(state): State<RelayState>) -> Result<Json<StatusResponse>> {
    let script = &state.config.login_script;

    let exists = tokio::fs::try_exists(script).await.unwrap_or(false);
    if !exists {
        warn!(script = %script.display(), "Login script missing");
        return Err(RelayError::NotFound(
            "Login script not found. Please check your installation.".to_string(),
        ));
    }

    let mut child = Command::new(&state.config.python)
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(RelayError::Launch)?;

    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_output(stdout, false));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_output(stderr, true));
    }

    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => debug!("Login tool exited"),
            Ok(status) => warn!(%status, "Login tool exited with failure"),
            Err(e) => warn!(error = %e, "Failed to wait for login tool"),
        }
    });

    let script_name = script.to_string_lossy();
    info!(script = strip_path(&script_name), "Login tool launched");
    Ok(StatusResponse::ok("Login tool launched successfully"))
}

async fn forward_output<R>(stream: R, is_stderr: bool)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if is_stderr {
            warn!(output = %line, "Login tool stderr");
        } else {
            info!(output = %line, "Login tool stdout");
        }
    }
}
