use crate::api::AppState;
use crate::config::AvatarConfig;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigApiError {
    #[error("configuration writes are disabled")]
    WritesDisabled,
    #[error("missing or invalid bearer token")]
    Unauthorized,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ConfigApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ConfigApiError::WritesDisabled => StatusCode::FORBIDDEN,
            ConfigApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub live_count: usize,
}

pub async fn get_config(State(state): State<AppState>) -> Json<AvatarConfig> {
    Json(state.avatar.read().await.clone())
}

pub async fn put_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<AvatarConfig>,
) -> Result<Json<AvatarConfig>, ConfigApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(ConfigApiError::WritesDisabled);
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let authorized = presented.is_some_and(|token| tokens_match(token, expected));
    if !authorized {
        warn!("Rejected configuration write with bad credentials");
        return Err(ConfigApiError::Unauthorized);
    }

    let mut avatar = state.avatar.write().await;
    *avatar = update;
    info!(model_url = %avatar.model_url, scale = avatar.scale, "Avatar configuration updated");

    Ok(Json(avatar.clone()))
}

/// Compares without short-circuiting on the first differing byte.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        live_count: state.relay.live_count(),
    })
}
