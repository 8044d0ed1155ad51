use sea_orm::entity::prelude::*;

/// Farmer account. Profile and WhatsApp settings are stored inline.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    /// `None` for accounts created through Google login.
    pub password_hash: Option<String>,
    pub full_name: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub email_verified: bool,
    #[sea_orm(unique)]
    pub google_id: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub password_changed_at: Option<chrono::DateTime<chrono::Utc>>,
    // profile
    pub farm_location: Option<String>,
    pub farm_size: Option<f64>,
    #[sea_orm(column_type = "JsonBinary")]
    pub crops: Json,
    pub language_preference: String,
    // whatsapp
    pub whatsapp_number: Option<String>,
    pub whatsapp_enabled: bool,
    pub whatsapp_verified: bool,
    pub alert_weather: bool,
    pub alert_market_prices: bool,
    pub alert_crop_diseases: bool,
    pub whatsapp_code: Option<String>,
    pub whatsapp_code_expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
