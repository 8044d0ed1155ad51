use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::repository::{MessagingProvider, UserRepository};
use crate::domain::types::{AlertPreferences, CODE_LEN, User, WHATSAPP_CODE_TTL_SECS, WhatsAppSettings};
use crate::error::ApiError;
use crate::infra::messaging::normalize_phone;
use crate::usecase::notify::{AlertDispatcher, DeliveryReport};
use crate::usecase::otp::generate_numeric_code;

async fn load_user<U: UserRepository>(users: &U, user_id: Uuid) -> Result<User, ApiError> {
    users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::UserNotFound)
}

fn same_number(a: Option<&str>, b: Option<&str>) -> bool {
    a.map(normalize_phone) == b.map(normalize_phone)
}

// ── UpdatePreferences ────────────────────────────────────────────────────────

pub struct UpdatePreferencesInput {
    pub whatsapp_number: Option<String>,
    pub enabled: Option<bool>,
    pub alert_preferences: Option<AlertPreferences>,
}

pub struct UpdatePreferencesUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> UpdatePreferencesUseCase<U> {
    /// Overwrite number, enabled flag and preferences. A new number must be verified again.
    pub async fn execute(
        &self,
        user_id: Uuid,
        input: UpdatePreferencesInput,
    ) -> Result<WhatsAppSettings, ApiError> {
        let user = load_user(&self.users, user_id).await?;
        let number = input
            .whatsapp_number
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());

        let mut settings = user.whatsapp;
        if !same_number(settings.number.as_deref(), number.as_deref()) {
            settings.verified = false;
            settings.verification_code = None;
            settings.code_expires_at = None;
        }
        settings.number = number;
        settings.enabled = input.enabled.unwrap_or(false);
        settings.alert_preferences = input.alert_preferences.unwrap_or_default();

        self.users.update_whatsapp(user_id, &settings).await?;
        Ok(settings)
    }
}

// ── StartVerification ────────────────────────────────────────────────────────

pub fn verification_message(code: &str) -> String {
    format!("Your AgriGuru verification code is: {code}. Valid for 15 minutes.")
}

pub struct StartVerificationUseCase<U: UserRepository, M: MessagingProvider> {
    pub users: U,
    pub dispatcher: AlertDispatcher<M>,
}

impl<U: UserRepository, M: MessagingProvider> StartVerificationUseCase<U, M> {
    /// Store a fresh code against `number` and send it there.
    pub async fn execute(&self, user_id: Uuid, number: &str) -> Result<(), ApiError> {
        let number = number.trim();
        if number.is_empty() {
            return Err(ApiError::validation("WhatsApp number is required"));
        }
        let user = load_user(&self.users, user_id).await?;

        let code = generate_numeric_code(CODE_LEN);
        let mut settings = user.whatsapp;
        if !same_number(settings.number.as_deref(), Some(number)) {
            settings.verified = false;
        }
        settings.number = Some(number.to_owned());
        settings.verification_code = Some(code.clone());
        settings.code_expires_at = Some(Utc::now() + Duration::seconds(WHATSAPP_CODE_TTL_SECS));
        self.users.update_whatsapp(user_id, &settings).await?;

        let report = self
            .dispatcher
            .send(number, &verification_message(&code))
            .await;
        if let Some(error) = report.error.filter(|_| !report.success) {
            return Err(ApiError::Upstream(format!(
                "Error sending verification: {error}"
            )));
        }
        Ok(())
    }
}

// ── ConfirmVerification ──────────────────────────────────────────────────────

pub struct ConfirmVerificationUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ConfirmVerificationUseCase<U> {
    pub async fn execute(&self, user_id: Uuid, code: &str) -> Result<WhatsAppSettings, ApiError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ApiError::validation("Verification code is required"));
        }
        let user = load_user(&self.users, user_id).await?;
        let mut settings = user.whatsapp;
        let Some(expected) = settings.verification_code.as_deref() else {
            return Err(ApiError::NoVerificationPending);
        };
        let expired = settings.code_expires_at.is_some_and(|at| at <= Utc::now());
        if expected != code || expired {
            return Err(ApiError::InvalidVerificationCode);
        }

        settings.verified = true;
        settings.enabled = true;
        settings.verification_code = None;
        settings.code_expires_at = None;
        self.users.update_whatsapp(user_id, &settings).await?;
        Ok(settings)
    }
}

// ── Status ───────────────────────────────────────────────────────────────────

pub struct WhatsAppStatus {
    pub configured: bool,
    pub settings: WhatsAppSettings,
}

pub struct WhatsAppStatusUseCase<U: UserRepository, M: MessagingProvider> {
    pub users: U,
    pub provider: M,
}

impl<U: UserRepository, M: MessagingProvider> WhatsAppStatusUseCase<U, M> {
    pub async fn execute(&self, user_id: Uuid) -> Result<WhatsAppStatus, ApiError> {
        let user = load_user(&self.users, user_id).await?;
        Ok(WhatsAppStatus {
            configured: self.provider.is_configured(),
            settings: user.whatsapp,
        })
    }
}

// ── SendTest ─────────────────────────────────────────────────────────────────

pub struct SendTestUseCase<U: UserRepository, M: MessagingProvider> {
    pub users: U,
    pub dispatcher: AlertDispatcher<M>,
}

impl<U: UserRepository, M: MessagingProvider> SendTestUseCase<U, M> {
    pub async fn execute(&self, user_id: Uuid) -> Result<DeliveryReport, ApiError> {
        let user = load_user(&self.users, user_id).await?;
        let whatsapp = &user.whatsapp;
        let Some(number) = whatsapp.number.as_deref().filter(|_| whatsapp.verified) else {
            return Err(ApiError::WhatsAppNotVerified);
        };
        self.dispatcher.send_test(number).await.into_result()
    }
}
