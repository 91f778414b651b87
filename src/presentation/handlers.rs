// HTTP request handlers
use crate::domain::telemetry::{hour_minute_label, normalize, now_ms};
use crate::infrastructure::error::ProviderError;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const HISTORY_LIMIT: u32 = 200;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all devices. Upstream failure degrades to an empty list so the
/// presentation layer still renders.
pub async fn list_devices(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.provider.list_devices().await {
        Ok(devices) => Json(devices).into_response(),
        Err(e) => {
            tracing::error!("device listing failed: {e}");
            Json(Vec::<crate::domain::device::Device>::new()).into_response()
        }
    }
}

/// Fetch one device; unknown ids are a 404, not a failure.
pub async fn get_device(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state.provider.get_device(&id).await {
        Ok(Some(device)) => Json(device).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Device not found" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("device lookup failed for {id}: {e}");
            provider_error_response(&e).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct AlarmQuery {
    #[serde(rename = "deviceId")]
    pub device_id: Option<String>,
}

pub async fn list_alarms(
    Query(query): Query<AlarmQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state.provider.list_alarms(query.device_id.as_deref()).await {
        Ok(alarms) => Json(alarms).into_response(),
        Err(e) => {
            tracing::error!("alarm listing failed: {e}");
            Json(Vec::<crate::domain::alarm::Alarm>::new()).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct TelemetryQuery {
    #[serde(rename = "deviceId")]
    pub device_id: Option<String>,
    /// "latest" (default) or "series"
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Latest telemetry map or the normalized 24-hour series for one device.
pub async fn get_telemetry(
    Query(query): Query<TelemetryQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let Some(device_id) = query.device_id.as_deref() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "deviceId is required" })),
        )
            .into_response();
    };

    if query.kind.as_deref() == Some("series") {
        let now = now_ms();
        match state
            .provider
            .telemetry_history(device_id, now - DAY_MS, now, HISTORY_LIMIT)
            .await
        {
            Ok(record) => Json(normalize(&record, hour_minute_label)).into_response(),
            Err(e) => {
                tracing::error!("series telemetry failed for {device_id}: {e}");
                provider_error_response(&e).into_response()
            }
        }
    } else {
        match state.provider.latest_telemetry(device_id).await {
            Ok(latest) => Json(latest).into_response(),
            Err(e) => {
                tracing::error!("latest telemetry failed for {device_id}: {e}");
                provider_error_response(&e).into_response()
            }
        }
    }
}

/// Full dashboard snapshot. Never fails: the aggregation facade degrades or
/// falls back internally.
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.dashboard_service.fetch_snapshot().await)
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Exchange user credentials for an upstream session token. The token gates
/// control actions; storing it is the client's concern.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> impl IntoResponse {
    let (Some(username), Some(password)) = (body.username, body.password) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Username and password are required" })),
        )
            .into_response();
    };

    match state.provider.login(&username, &password).await {
        Ok(token) => Json(json!({ "ok": true, "token": token })).into_response(),
        Err(ProviderError::Auth { status, body }) => {
            tracing::warn!("login rejected by upstream ({status})");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": if body.is_empty() { "Login failed".to_string() } else { body } })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("login failed: {e}");
            provider_error_response(&e).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct ControlRequest {
    #[serde(rename = "deviceId")]
    pub device_id: Option<String>,
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// Forward a device control RPC. Requires a session token; authorization is
/// the upstream's server-side validation of that token.
pub async fn control(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ControlRequest>,
) -> impl IntoResponse {
    let Some(session_token) = bearer_token(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized: login required for control actions" })),
        )
            .into_response();
    };

    let (Some(device_id), Some(method)) = (body.device_id, body.method) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "deviceId and method are required" })),
        )
            .into_response();
    };

    let params = body.params.unwrap_or_else(|| json!({}));
    match state
        .provider
        .invoke_rpc(&device_id, &method, params, &session_token)
        .await
    {
        Ok(result) => Json(result).into_response(),
        Err(ProviderError::Upstream { status, body }) => {
            tracing::error!("control RPC failed for {device_id} ({status}): {body}");
            (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                Json(json!({ "error": body, "status": status })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("control RPC failed for {device_id}: {e}");
            provider_error_response(&e).into_response()
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}

fn provider_error_response(error: &ProviderError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match error {
        ProviderError::Auth { .. } | ProviderError::MissingCredentials => {
            StatusCode::UNAUTHORIZED
        }
        ProviderError::Upstream { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        ProviderError::Transport(_) => StatusCode::BAD_GATEWAY,
        ProviderError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.to_string() })))
}
