use agriguru_session::session::SessionData;

use crate::domain::repository::SessionStore;
use crate::domain::types::User;
use crate::error::ApiError;

/// Open a session for `user` and return its id.
pub async fn open_session<S: SessionStore>(sessions: &S, user: &User) -> Result<String, ApiError> {
    sessions
        .create(&SessionData::new(user.id, user.email.clone()))
        .await
}

// ── CheckAuth ────────────────────────────────────────────────────────────────

pub struct CheckAuthUseCase<S: SessionStore> {
    pub sessions: S,
}

impl<S: SessionStore> CheckAuthUseCase<S> {
    /// The identity behind `session_id`, or `None` when absent or expired.
    pub async fn execute(&self, session_id: Option<&str>) -> Result<Option<SessionData>, ApiError> {
        match session_id {
            Some(id) => self.sessions.load(id).await,
            None => Ok(None),
        }
    }
}

// ── Logout ───────────────────────────────────────────────────────────────────

pub struct LogoutUseCase<S: SessionStore> {
    pub sessions: S,
}

impl<S: SessionStore> LogoutUseCase<S> {
    /// Destroy the server-side session. A store failure is logged, never returned:
    /// the caller always clears the cookie.
    pub async fn execute(&self, session_id: Option<&str>) {
        let Some(id) = session_id else {
            return;
        };
        if let Err(e) = self.sessions.destroy(id).await {
            tracing::warn!(error = %e, "failed to destroy session on logout");
        }
    }
}
