//! Farmer chat: room events over the relay plus direct messages over HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use agriguru_core::serde::to_rfc3339_ms;
use agriguru_domain::limit::Limit;

use crate::domain::repository::ChatMessageRepository;
use crate::domain::types::{ChatMessage, direct_room};
use crate::error::ApiError;
use crate::infra::chat_hub::{ChatHub, ConnectionId};

pub const DEFAULT_HISTORY_LIMIT: u64 = 50;
pub const MAX_HISTORY_LIMIT: u64 = 200;

/// Frames a client sends over the relay socket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    Join {
        room: String,
        username: String,
    },
    Leave {
        room: String,
        username: String,
    },
    ChatMessage {
        room: String,
        username: String,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        image: Option<String>,
    },
    Typing {
        room: String,
        username: String,
    },
}

/// Frames the relay pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    Connected {
        connection_id: ConnectionId,
    },
    UserJoined {
        room: String,
        username: String,
    },
    UserLeft {
        room: String,
        username: String,
    },
    ChatMessage {
        id: Uuid,
        room: String,
        username: String,
        message: Option<String>,
        image: Option<String>,
        #[serde(serialize_with = "to_rfc3339_ms")]
        timestamp: DateTime<Utc>,
    },
    Typing {
        room: String,
        username: String,
    },
    Error {
        message: String,
    },
}

impl From<&ChatMessage> for ServerEvent {
    fn from(m: &ChatMessage) -> Self {
        Self::ChatMessage {
            id: m.id,
            room: m.room.clone(),
            username: m.username.clone(),
            message: m.message.clone(),
            image: m.image.clone(),
            timestamp: m.created_at,
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require_room_and_user(room: &str, username: &str) -> Result<(), ApiError> {
    if room.trim().is_empty() || username.trim().is_empty() {
        return Err(ApiError::validation("room and username are required"));
    }
    Ok(())
}

pub struct DirectMessageInput {
    pub text: String,
    pub sender: String,
    pub from: String,
    pub to: String,
}

pub enum HistoryQuery {
    Room { room: String, limit: Option<u64> },
    Pair { from: String, to: String, limit: Option<u64> },
}

/// Room membership, persistence and fan-out for farmer chat.
pub struct ChatRelay<R: ChatMessageRepository> {
    pub messages: R,
    pub hub: ChatHub<ServerEvent>,
}

impl<R: ChatMessageRepository> ChatRelay<R> {
    /// Apply one client frame from connection `conn`, whose own outbox is `outbox`.
    pub async fn handle(
        &self,
        conn: ConnectionId,
        outbox: &mpsc::Sender<ServerEvent>,
        event: ClientEvent,
    ) -> Result<(), ApiError> {
        match event {
            ClientEvent::Join { room, username } => {
                require_room_and_user(&room, &username)?;
                if self.hub.join(&room, conn, &username, outbox.clone()).await {
                    self.hub
                        .publish(&room, ServerEvent::UserJoined { room: room.clone(), username }, Some(conn))
                        .await;
                }
            }
            ClientEvent::Leave { room, username } => {
                require_room_and_user(&room, &username)?;
                if self.hub.leave(&room, conn).await {
                    self.hub
                        .publish(&room, ServerEvent::UserLeft { room: room.clone(), username }, None)
                        .await;
                }
            }
            ClientEvent::ChatMessage {
                room,
                username,
                message,
                image,
            } => {
                require_room_and_user(&room, &username)?;
                let record = self.store(room, username, present(message), present(image)).await?;
                let event = ServerEvent::from(&record);
                let member = self.hub.is_member(&record.room, conn).await;
                self.hub.publish(&record.room, event.clone(), None).await;
                if !member && outbox.try_send(event).is_err() {
                    warn!(conn = %conn, "could not echo chat message to sender");
                }
            }
            ClientEvent::Typing { room, username } => {
                require_room_and_user(&room, &username)?;
                self.hub
                    .publish(&room, ServerEvent::Typing { room: room.clone(), username }, Some(conn))
                    .await;
            }
        }
        Ok(())
    }

    /// Drop every membership of `conn` and tell the rooms it left.
    pub async fn disconnect(&self, conn: ConnectionId) {
        for (room, username) in self.hub.leave_all(conn).await {
            self.hub
                .publish(&room, ServerEvent::UserLeft { room: room.clone(), username }, None)
                .await;
        }
    }

    /// Persist and broadcast a message between two farmers.
    pub async fn post_direct(&self, input: DirectMessageInput) -> Result<ChatMessage, ApiError> {
        let blank = |s: &str| s.trim().is_empty();
        if blank(&input.text) || blank(&input.sender) || blank(&input.from) || blank(&input.to) {
            return Err(ApiError::validation("text, sender, from and to are required"));
        }
        let room = direct_room(input.from.trim(), input.to.trim());
        let record = self
            .store(room, input.sender.trim().to_owned(), Some(input.text), None)
            .await?;
        self.hub
            .publish(&record.room, ServerEvent::from(&record), None)
            .await;
        Ok(record)
    }

    /// Stored messages, oldest first.
    pub async fn history(&self, query: HistoryQuery) -> Result<Vec<ChatMessage>, ApiError> {
        let (room, limit) = match query {
            HistoryQuery::Room { room, limit } => {
                if room.trim().is_empty() {
                    return Err(ApiError::validation("room is required"));
                }
                (room, limit)
            }
            HistoryQuery::Pair { from, to, limit } => {
                if from.trim().is_empty() || to.trim().is_empty() {
                    return Err(ApiError::validation("from and to required"));
                }
                (direct_room(from.trim(), to.trim()), limit)
            }
        };
        let limit = Limit::resolve(limit, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT);
        self.messages.list_room(&room, limit.get()).await
    }

    async fn store(
        &self,
        room: String,
        username: String,
        message: Option<String>,
        image: Option<String>,
    ) -> Result<ChatMessage, ApiError> {
        if message.is_none() && image.is_none() {
            return Err(ApiError::validation("message or image is required"));
        }
        let record = ChatMessage {
            id: Uuid::now_v7(),
            room,
            username,
            message,
            image,
            created_at: Utc::now(),
        };
        self.messages.append(&record).await?;
        Ok(record)
    }
}
