use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Relay endpoint failures, rendered as `{ success: false, message }`.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Failed to check token: {0}")]
    ReadToken(std::io::Error),

    #[error("Failed to create test token: {0}")]
    WriteToken(std::io::Error),

    #[error("Failed to launch login tool: {0}")]
    Launch(std::io::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::NotFound(_) => StatusCode::NOT_FOUND,
            RelayError::ReadToken(_) | RelayError::WriteToken(_) | RelayError::Launch(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Token relay request failed");
        }

        (
            status,
            Json(json!({
                "success": false,
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
