use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;


use crate::domain::types::{AlertPreferences, RecipientFilter};
use crate::error::ApiError;
use crate::handlers::extract::ApiJson;
use crate::handlers::profile::WhatsAppView;
use crate::handlers::session::CurrentSession;
use crate::state::AppState;
use crate::usecase::notify::{
    AlertData, BulkAlertInput, BulkAlertUseCase, SendAlertInput, SendAlertUseCase,
};
use crate::usecase::whatsapp::{
    ConfirmVerificationUseCase, SendTestUseCase, StartVerificationUseCase,
    UpdatePreferencesInput, UpdatePreferencesUseCase, WhatsAppStatusUseCase,
};

// ── POST /whatsapp/update-preferences ────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdatePreferencesRequest {
    pub whatsapp_number: Option<String>,
    pub enabled: Option<bool>,
    pub alert_preferences: Option<AlertPreferences>,
}

pub async fn update_preferences(
    session: CurrentSession,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpdatePreferencesRequest>,
) -> Result<Json<Value>, ApiError> {
    let usecase = UpdatePreferencesUseCase {
        users: state.user_repo(),
    };
    let settings = usecase
        .execute(
            session.user_id,
            UpdatePreferencesInput {
                whatsapp_number: body.whatsapp_number,
                enabled: body.enabled,
                alert_preferences: body.alert_preferences,
            },
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "WhatsApp preferences updated",
        "whatsapp": WhatsAppView::from(settings),
    })))
}

// ── POST /whatsapp/verify ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StartVerificationRequest {
    #[serde(default)]
    pub whatsapp_number: String,
}

pub async fn start_verification(
    session: CurrentSession,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<StartVerificationRequest>,
) -> Result<Json<Value>, ApiError> {
    let usecase = StartVerificationUseCase {
        users: state.user_repo(),
        dispatcher: state.dispatcher(),
    };
    usecase
        .execute(session.user_id, &body.whatsapp_number)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Verification code sent to WhatsApp",
    })))
}

// ── POST /whatsapp/confirm ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ConfirmVerificationRequest {
    #[serde(default)]
    pub verification_code: String,
}

pub async fn confirm_verification(
    session: CurrentSession,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ConfirmVerificationRequest>,
) -> Result<Json<Value>, ApiError> {
    let usecase = ConfirmVerificationUseCase {
        users: state.user_repo(),
    };
    let settings = usecase
        .execute(session.user_id, &body.verification_code)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "WhatsApp number verified successfully",
        "whatsapp": WhatsAppView::from(settings),
    })))
}

// ── GET /whatsapp/status ─────────────────────────────────────────────────────

pub async fn status(
    session: CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let usecase = WhatsAppStatusUseCase {
        users: state.user_repo(),
        provider: state.messaging.clone(),
    };
    let status = usecase.execute(session.user_id).await?;
    let settings = WhatsAppView::from(status.settings);
    Ok(Json(json!({
        "success": true,
        "configured": status.configured,
        "number": settings.number,
        "enabled": settings.enabled,
        "verified": settings.verified,
        "alert_preferences": settings.alert_preferences,
    })))
}

// ── POST /whatsapp/test ──────────────────────────────────────────────────────

pub async fn send_test(
    session: CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let usecase = SendTestUseCase {
        users: state.user_repo(),
        dispatcher: state.dispatcher(),
    };
    let report = usecase.execute(session.user_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Test message sent successfully",
        "result": report,
    })))
}

// ── POST /whatsapp/send-alert ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SendAlertRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub alert_type: String,
    #[serde(default)]
    pub alert_data: AlertData,
}

pub async fn send_alert(
    session: CurrentSession,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SendAlertRequest>,
) -> Result<Json<Value>, ApiError> {
    let usecase = SendAlertUseCase {
        users: state.user_repo(),
        dispatcher: state.dispatcher(),
    };
    let report = usecase
        .execute(
            session.user_id,
            SendAlertInput {
                user_id: body.user_id,
                alert_type: body.alert_type,
                alert_data: body.alert_data,
            },
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "WhatsApp alert sent successfully",
        "result": report,
    })))
}

// ── POST /whatsapp/bulk-alert ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BulkAlertRequest {
    #[serde(default)]
    pub alert_type: String,
    #[serde(default)]
    pub alert_data: AlertData,
    #[serde(default)]
    pub filter: RecipientFilter,
}

pub async fn bulk_alert(
    session: CurrentSession,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<BulkAlertRequest>,
) -> Result<Json<Value>, ApiError> {
    let usecase = BulkAlertUseCase {
        users: state.user_repo(),
        dispatcher: state.dispatcher(),
    };
    let report = usecase
        .execute(
            session.user_id,
            BulkAlertInput {
                alert_type: body.alert_type,
                alert_data: body.alert_data,
                filter: body.filter,
            },
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Bulk alert processed. {} sent, {} failed.",
            report.successful_alerts, report.failed_alerts
        ),
        "total_users": report.total_users,
        "successful_alerts": report.successful_alerts,
        "failed_alerts": report.failed_alerts,
        "results": report.results,
    })))
}
