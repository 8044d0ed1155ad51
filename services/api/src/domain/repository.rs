#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use agriguru_domain::alert::AlertType;
use agriguru_domain::contract::{ContractId, ContractStatus};
use agriguru_session::session::SessionData;

use crate::domain::types::{
    ChatMessage, CompletionError, ContractApplication, DeliveryError, GoogleIdentity,
    NewContractApplication, OtpPurpose, OtpRecord, Profile, ProviderReceipt, RecipientFilter, User,
    WhatsAppSettings,
};
use crate::error::ApiError;

/// Repository for farmer accounts.
pub trait UserRepository: Send + Sync {
    /// Lookup by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;

    /// Insert a new user. A duplicate email yields `AccountExists`.
    async fn create(&self, user: &User) -> Result<(), ApiError>;

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), ApiError>;

    async fn link_google(&self, id: Uuid, google_id: &str) -> Result<(), ApiError>;

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ApiError>;

    async fn update_profile(&self, id: Uuid, profile: &Profile) -> Result<(), ApiError>;

    async fn update_whatsapp(&self, id: Uuid, settings: &WhatsAppSettings)
    -> Result<(), ApiError>;

    /// Users whose WhatsApp settings accept `alert_type` and whose profile matches `filter`.
    async fn list_alert_recipients(
        &self,
        alert_type: AlertType,
        filter: &RecipientFilter,
    ) -> Result<Vec<User>, ApiError>;

    /// Active accounts, for the farmer directory.
    async fn list_active(&self) -> Result<Vec<User>, ApiError>;
}

/// Repository for email one-time codes.
pub trait OtpRepository: Send + Sync {
    /// Delete every record for the record's (email, purpose) and insert it, atomically.
    async fn replace(&self, record: &OtpRecord) -> Result<(), ApiError>;

    /// Mark the matching unused, unexpired record used.
    ///
    /// Returns `false` when nothing matched. Two concurrent calls for the same
    /// code never both return `true`.
    async fn consume(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> Result<bool, ApiError>;
}

/// Server-side session storage keyed by opaque id.
pub trait SessionStore: Send + Sync {
    /// Store `data` under a fresh id and return the id.
    async fn create(&self, data: &SessionData) -> Result<String, ApiError>;

    async fn load(&self, session_id: &str) -> Result<Option<SessionData>, ApiError>;

    async fn destroy(&self, session_id: &str) -> Result<(), ApiError>;
}

/// Append-only chat history.
pub trait ChatMessageRepository: Send + Sync {
    async fn append(&self, message: &ChatMessage) -> Result<(), ApiError>;

    /// The newest `limit` messages of `room`, oldest first.
    async fn list_room(&self, room: &str, limit: u64) -> Result<Vec<ChatMessage>, ApiError>;
}

/// Repository for contract-farming applications.
pub trait ContractRepository: Send + Sync {
    /// Store a new application; storage assigns the sequential id.
    async fn insert(&self, new: &NewContractApplication) -> Result<ContractApplication, ApiError>;

    /// Every application, newest first.
    async fn list(&self) -> Result<Vec<ContractApplication>, ApiError>;

    async fn find(&self, id: ContractId) -> Result<Option<ContractApplication>, ApiError>;

    /// Set status, and remarks when given. Returns `None` when the id is unknown.
    async fn update_status(
        &self,
        id: ContractId,
        status: ContractStatus,
        remarks: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Option<ContractApplication>, ApiError>;
}

/// Port for delivering OTP email.
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<(), ApiError>;
}

/// Port for the WhatsApp messaging provider.
pub trait MessagingProvider: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Send `body` to `to` (E.164 with leading `+`).
    async fn send(&self, to: &str, body: &str) -> Result<ProviderReceipt, DeliveryError>;
}

/// Port for verifying third-party identity tokens.
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, ApiError>;
}

/// Port for a hosted chat-completion model.
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, system_prompt: &str, user_prompt: &str)
    -> Result<String, CompletionError>;
}
