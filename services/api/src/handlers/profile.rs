use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use agriguru_core::serde::{opt_to_rfc3339_ms, to_rfc3339_ms};

use crate::domain::types::{AlertPreferences, Profile, User, WhatsAppSettings};
use crate::error::ApiError;
use crate::handlers::extract::ApiJson;
use crate::handlers::session::CurrentSession;
use crate::state::AppState;
use crate::usecase::account::{
    GetProfileUseCase, ListFarmersUseCase, UpdateProfileInput, UpdateProfileUseCase,
};

// ── GET /profile ─────────────────────────────────────────────────────────────

/// WhatsApp settings as shown to their owner.
#[derive(Serialize)]
pub struct WhatsAppView {
    pub number: Option<String>,
    pub enabled: bool,
    pub verified: bool,
    pub alert_preferences: AlertPreferences,
}

impl From<WhatsAppSettings> for WhatsAppView {
    fn from(s: WhatsAppSettings) -> Self {
        Self {
            number: s.number,
            enabled: s.enabled,
            verified: s.verified,
            alert_preferences: s.alert_preferences,
        }
    }
}

/// Account details without credentials or pending verification codes.
#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub email_verified: bool,
    pub profile_image: Option<String>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "opt_to_rfc3339_ms")]
    pub last_login: Option<DateTime<Utc>>,
    pub profile: Profile,
    pub whatsapp: WhatsAppView,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            is_active: user.is_active,
            is_admin: user.is_admin,
            email_verified: user.email_verified,
            profile_image: user.profile_image,
            created_at: user.created_at,
            last_login: user.last_login,
            profile: user.profile,
            whatsapp: WhatsAppView::from(user.whatsapp),
        }
    }
}

pub async fn get_profile(
    session: CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let usecase = GetProfileUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(session.user_id).await?;
    Ok(Json(json!({
        "success": true,
        "user": ProfileResponse::from(user),
    })))
}

// ── PUT /profile ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub farm_location: Option<String>,
    pub farm_size: Option<f64>,
    pub crops: Option<Vec<String>>,
    pub language_preference: Option<String>,
}

pub async fn update_profile(
    session: CurrentSession,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    let usecase = UpdateProfileUseCase {
        users: state.user_repo(),
    };
    let profile = usecase
        .execute(
            session.user_id,
            UpdateProfileInput {
                farm_location: body.farm_location,
                farm_size: body.farm_size,
                crops: body.crops,
                language_preference: body.language_preference,
            },
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "profile": profile,
    })))
}

// ── GET /users ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct FarmerEntry {
    pub id: Uuid,
    pub name: String,
}

pub async fn list_farmers(
    _session: CurrentSession,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let usecase = ListFarmersUseCase {
        users: state.user_repo(),
    };
    let users: Vec<FarmerEntry> = usecase
        .execute()
        .await?
        .into_iter()
        .map(|u| FarmerEntry {
            id: u.id,
            name: u.full_name,
        })
        .collect();
    Ok(Json(json!({ "success": true, "users": users })))
}
