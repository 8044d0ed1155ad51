use axum::{Json, extract::State};
use chrono::SecondsFormat;
use serde::Deserialize;
use serde_json::{Value, json};

use agriguru_domain::limit::Limit;

use crate::error::ApiError;
use crate::handlers::extract::{ApiJson, ApiQuery};
use crate::state::AppState;
use crate::usecase::advisory::{AdviseUseCase, HISTORY_CAPACITY, model_info};

const DEFAULT_HISTORY_PAGE: u64 = 10;

// ── POST /chat ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ChatContext {
    pub user_name: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub context: Option<ChatContext>,
}

pub async fn chat(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ChatRequest>,
) -> Result<Json<Value>, ApiError> {
    let usecase = AdviseUseCase {
        responder: state.responder.clone(),
        history: state.history.clone(),
    };
    let user_name = body.context.as_ref().and_then(|c| c.user_name.as_deref());
    let output = usecase.execute(&body.message, user_name).await?;
    Ok(Json(json!({
        "success": true,
        "advice": output.advice.text,
        "provider": output.advice.provider,
        "fallback_used": output.advice.fallback_used,
        "language_info": output.language_info,
        "timestamp": output.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
    })))
}

// ── GET /conversation-history ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u64>,
}

pub async fn conversation_history(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HistoryParams>,
) -> Json<Value> {
    let limit = Limit::resolve(params.limit, DEFAULT_HISTORY_PAGE, HISTORY_CAPACITY as u64);
    let history = state.history.recent(limit.get() as usize).await;
    Json(json!({
        "success": true,
        "total_conversations": state.history.count().await,
        "history": history,
    }))
}

// ── POST /clear-history ──────────────────────────────────────────────────────

pub async fn clear_history(State(state): State<AppState>) -> Json<Value> {
    state.history.clear().await;
    Json(json!({
        "success": true,
        "message": "Conversation history cleared",
    }))
}

// ── GET /model-info ──────────────────────────────────────────────────────────

pub async fn model(State(state): State<AppState>) -> Json<Value> {
    let info = model_info(&state.responder, &state.history).await;
    Json(json!({ "success": true, "model_info": info }))
}
