//! Server-side session payload.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity stored for an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: Uuid,
    pub user_email: String,
}

impl SessionData {
    pub fn new(user_id: Uuid, user_email: impl Into<String>) -> Self {
        Self {
            user_id,
            user_email: user_email.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Generate an unguessable session id (two v4 UUIDs, 64 hex chars).
pub fn new_session_id() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
