use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;

use agriguru_session::cookie::SESSION_TTL_SECS;
use agriguru_session::session::{SessionData, new_session_id};

use crate::domain::repository::SessionStore;
use crate::error::ApiError;

#[derive(Clone)]
pub struct RedisSessionStore {
    pub pool: Pool,
}

fn session_key(session_id: &str) -> String {
    format!("session:{session_id}")
}

impl SessionStore for RedisSessionStore {
    async fn create(&self, data: &SessionData) -> Result<String, ApiError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;
        let session_id = new_session_id();
        let payload = data.to_json().context("encode session")?;
        let (): () = conn
            .set_ex(session_key(&session_id), payload, SESSION_TTL_SECS)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| ApiError::Internal(e.into()))?;
        Ok(session_id)
    }

    async fn load(&self, session_id: &str) -> Result<Option<SessionData>, ApiError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;
        let raw: Option<String> = conn
            .get(session_key(session_id))
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;
        match raw {
            None => Ok(None),
            // An unreadable payload is treated as no session rather than a server error.
            Some(raw) => Ok(SessionData::from_json(&raw).ok()),
        }
    }

    async fn destroy(&self, session_id: &str) -> Result<(), ApiError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;
        let _: i64 = conn
            .del(session_key(session_id))
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;
        Ok(())
    }
}
