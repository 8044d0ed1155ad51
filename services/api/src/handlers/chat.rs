//! Farmer-to-farmer chat over HTTP plus the relay WebSocket.

use axum::{
    Json,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use agriguru_core::serde::to_rfc3339_ms;

use crate::domain::types::ChatMessage;
use crate::error::ApiError;
use crate::handlers::extract::{ApiJson, ApiQuery};
use crate::handlers::session::CurrentSession;
use crate::state::AppState;
use crate::usecase::chat::{ClientEvent, DirectMessageInput, HistoryQuery, ServerEvent};

/// Events buffered per connection before the hub starts dropping them.
const OUTBOX_CAPACITY: usize = 64;

#[derive(Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub room: String,
    pub username: String,
    pub message: Option<String>,
    pub image: Option<String>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub timestamp: DateTime<Utc>,
}

impl From<ChatMessage> for MessageView {
    fn from(m: ChatMessage) -> Self {
        Self {
            id: m.id,
            room: m.room,
            username: m.username,
            message: m.message,
            image: m.image,
            timestamp: m.created_at,
        }
    }
}

// ── GET /chat/messages ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MessagesParams {
    pub room: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<u64>,
}

impl MessagesParams {
    fn into_query(self) -> HistoryQuery {
        match self.room {
            Some(room) => HistoryQuery::Room {
                room,
                limit: self.limit,
            },
            None => HistoryQuery::Pair {
                from: self.from.unwrap_or_default(),
                to: self.to.unwrap_or_default(),
                limit: self.limit,
            },
        }
    }
}

pub async fn messages(
    _session: CurrentSession,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<MessagesParams>,
) -> Result<Json<Value>, ApiError> {
    let messages: Vec<MessageView> = state
        .chat_relay()
        .history(params.into_query())
        .await?
        .into_iter()
        .map(MessageView::from)
        .collect();
    Ok(Json(json!({ "success": true, "messages": messages })))
}

// ── POST /chat/send ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

pub async fn send(
    _session: CurrentSession,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SendMessageRequest>,
) -> Result<Json<Value>, ApiError> {
    let record = state
        .chat_relay()
        .post_direct(DirectMessageInput {
            text: body.text,
            sender: body.sender,
            from: body.from,
            to: body.to,
        })
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": MessageView::from(record),
    })))
}

// ── GET /chat/ws ─────────────────────────────────────────────────────────────

pub async fn ws(
    session: CurrentSession,
    State(state): State<AppState>,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade.on_upgrade(move |socket| relay(socket, state, session))
}

async fn relay(socket: WebSocket, state: AppState, session: CurrentSession) {
    let conn = Uuid::new_v4();
    let relay = state.chat_relay();
    let (outbox, mut inbox) = mpsc::channel::<ServerEvent>(OUTBOX_CAPACITY);
    let (mut sink, mut stream) = socket.split();
    info!(%conn, user_id = %session.user_id, "chat connected");

    // Forward hub events and direct replies to the socket.
    let writer = tokio::spawn(async move {
        while let Some(event) = inbox.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(%conn, error = %e, "failed to encode chat event");
                    continue;
                }
            };
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    if outbox
        .send(ServerEvent::Connected {
            connection_id: conn,
        })
        .await
        .is_err()
    {
        writer.abort();
        return;
    }

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(%conn, error = %e, "chat socket error");
                break;
            }
        };
        let outcome = match serde_json::from_str::<ClientEvent>(text.as_str()) {
            Ok(event) => relay.handle(conn, &outbox, event).await,
            Err(e) => Err(ApiError::validation(format!("Malformed event: {e}"))),
        };
        if let Err(e) = outcome {
            if let ApiError::Internal(cause) = &e {
                warn!(%conn, error = %cause, "chat event failed");
            }
            let reply = ServerEvent::Error {
                message: e.to_string(),
            };
            if outbox.send(reply).await.is_err() {
                break;
            }
        }
    }

    relay.disconnect(conn).await;
    drop(outbox);
    writer.abort();
    info!(%conn, "chat disconnected");
}
