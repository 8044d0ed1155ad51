use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use agriguru_core::health::ReadinessProbe;
use agriguru_session::cookie::CookieSettings;

use crate::infra::cache::RedisSessionStore;
use crate::infra::chat_hub::ChatHub;
use crate::infra::db::{
    DbChatMessageRepository, DbContractRepository, DbOtpRepository, DbUserRepository,
};
use crate::infra::google::GoogleSignIn;
use crate::infra::mail::MailTransport;
use crate::infra::messaging::Messaging;
use crate::usecase::advisory::{ConversationHistory, Responder};
use crate::usecase::chat::{ChatRelay, ServerEvent};
use crate::usecase::notify::AlertDispatcher;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub cookies: CookieSettings,
    pub mailer: MailTransport,
    pub messaging: Messaging,
    pub google: GoogleSignIn,
    pub responder: Responder,
    pub history: ConversationHistory,
    pub hub: ChatHub<ServerEvent>,
    /// Shared secret for the scheduled alert endpoints; those endpoints reject everything when unset.
    pub internal_api_key: Option<String>,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn otp_repo(&self) -> DbOtpRepository {
        DbOtpRepository {
            db: self.db.clone(),
        }
    }

    pub fn chat_repo(&self) -> DbChatMessageRepository {
        DbChatMessageRepository {
            db: self.db.clone(),
        }
    }

    pub fn contract_repo(&self) -> DbContractRepository {
        DbContractRepository {
            db: self.db.clone(),
        }
    }

    pub fn sessions(&self) -> RedisSessionStore {
        RedisSessionStore {
            pool: self.redis.clone(),
        }
    }

    pub fn dispatcher(&self) -> AlertDispatcher<Messaging> {
        AlertDispatcher {
            provider: self.messaging.clone(),
        }
    }

    pub fn chat_relay(&self) -> ChatRelay<DbChatMessageRepository> {
        ChatRelay {
            messages: self.chat_repo(),
            hub: self.hub.clone(),
        }
    }
}

impl ReadinessProbe for AppState {
    async fn is_ready(&self) -> bool {
        self.db.ping().await.is_ok()
    }
}
