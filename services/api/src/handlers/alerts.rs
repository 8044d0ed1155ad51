//! Scheduled alert triggers, guarded by the internal API key.

use axum::{Json, extract::State, http::HeaderMap};
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::state::AppState;
use crate::usecase::notify::{AutoAlertReport, AutoAlertUseCase};

pub const X_API_KEY: &str = "x-api-key";

/// Accept only a request whose `X-API-Key` equals the configured key.
pub fn check_api_key(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ApiError> {
    let provided = headers.get(X_API_KEY).and_then(|v| v.to_str().ok());
    match (expected, provided) {
        (Some(expected), Some(provided)) if expected == provided => Ok(()),
        _ => Err(ApiError::InvalidApiKey),
    }
}

fn summary(kind: &str, report: AutoAlertReport) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": format!(
            "{kind} alerts processed. {} sent, {} failed.",
            report.successful_alerts, report.failed_alerts
        ),
        "total_users": report.total_users,
        "successful_alerts": report.successful_alerts,
        "failed_alerts": report.failed_alerts,
        "failures": report.failures,
    }))
}

// ── POST /auto-alerts/weather ────────────────────────────────────────────────

pub async fn weather_alerts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    check_api_key(&headers, state.internal_api_key.as_deref())?;
    let usecase = AutoAlertUseCase {
        users: state.user_repo(),
        dispatcher: state.dispatcher(),
    };
    Ok(summary("Weather", usecase.run_weather().await?))
}

// ── POST /auto-alerts/crop-health ────────────────────────────────────────────

pub async fn crop_health_alerts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    check_api_key(&headers, state.internal_api_key.as_deref())?;
    let usecase = AutoAlertUseCase {
        users: state.user_repo(),
        dispatcher: state.dispatcher(),
    };
    Ok(summary("Crop health", usecase.run_crop_health().await?))
}
