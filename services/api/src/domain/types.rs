use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agriguru_domain::alert::AlertType;
use agriguru_domain::contract::{ContractId, ContractStatus, ContractTerms};

/// Length of email OTPs and WhatsApp verification codes.
pub const CODE_LEN: usize = 6;

/// OTP validity window in seconds (10 minutes).
pub const OTP_TTL_SECS: i64 = 600;

/// WhatsApp verification code validity window in seconds (15 minutes).
pub const WHATSAPP_CODE_TTL_SECS: i64 = 900;

pub const DEFAULT_LANGUAGE: &str = "en";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static email pattern")
});

/// Trim and lower-case an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

// ── OTP ──────────────────────────────────────────────────────────────────────

/// What an email OTP authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    #[default]
    Login,
    Signup,
    Reset,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown OTP purpose: {0}")]
pub struct UnknownPurpose(pub String);

impl OtpPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Signup => "signup",
            Self::Reset => "reset",
        }
    }
}

impl FromStr for OtpPurpose {
    type Err = UnknownPurpose;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Self::Login),
            "signup" => Ok(Self::Signup),
            "reset" => Ok(Self::Reset),
            other => Err(UnknownPurpose(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl OtpRecord {
    /// A fresh, unused record expiring `OTP_TTL_SECS` after `now`.
    pub fn issue(email: String, code: String, purpose: OtpPurpose, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            email,
            code,
            purpose,
            created_at: now,
            expires_at: now + Duration::seconds(OTP_TTL_SECS),
            used: false,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }
}

// ── User ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub farm_location: Option<String>,
    pub farm_size: Option<f64>,
    pub crops: Vec<String>,
    pub language_preference: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            farm_location: None,
            farm_size: None,
            crops: Vec::new(),
            language_preference: DEFAULT_LANGUAGE.to_owned(),
        }
    }
}

/// Per-type WhatsApp opt-ins. Every flag defaults to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPreferences {
    pub weather: bool,
    pub market_prices: bool,
    pub crop_diseases: bool,
}

impl Default for AlertPreferences {
    fn default() -> Self {
        Self {
            weather: true,
            market_prices: true,
            crop_diseases: true,
        }
    }
}

impl AlertPreferences {
    /// Generic alerts have no opt-out.
    pub fn allows(&self, alert_type: AlertType) -> bool {
        match alert_type {
            AlertType::Weather => self.weather,
            AlertType::MarketPrices => self.market_prices,
            AlertType::CropDiseases => self.crop_diseases,
            AlertType::Generic => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WhatsAppSettings {
    pub number: Option<String>,
    pub enabled: bool,
    pub verified: bool,
    pub alert_preferences: AlertPreferences,
    pub verification_code: Option<String>,
    pub code_expires_at: Option<DateTime<Utc>>,
}

impl WhatsAppSettings {
    pub fn for_phone(phone: Option<String>) -> Self {
        Self {
            number: phone,
            ..Self::default()
        }
    }

    /// Verified, enabled, has a number, and accepts `alert_type`.
    pub fn accepts(&self, alert_type: AlertType) -> bool {
        self.verified
            && self.enabled
            && self.number.is_some()
            && self.alert_preferences.allows(alert_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// `None` for accounts created through Google sign-in.
    pub password_hash: Option<String>,
    pub full_name: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub email_verified: bool,
    pub google_id: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub profile: Profile,
    pub whatsapp: WhatsAppSettings,
}

impl User {
    /// An active, non-admin account with default profile and WhatsApp settings.
    pub fn new(
        email: String,
        full_name: String,
        phone: Option<String>,
        password_hash: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            email,
            password_hash,
            full_name,
            whatsapp: WhatsAppSettings::for_phone(phone.clone()),
            phone,
            is_active: true,
            is_admin: false,
            email_verified: false,
            google_id: None,
            profile_image: None,
            created_at: now,
            last_login: None,
            password_changed_at: None,
            profile: Profile::default(),
        }
    }
}

/// Optional profile constraints narrowing a bulk alert audience. Unset fields match everyone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecipientFilter {
    /// Recipient must list this crop.
    pub crop: Option<String>,
    pub farm_location: Option<String>,
    pub language_preference: Option<String>,
}

impl RecipientFilter {
    pub fn matches(&self, profile: &Profile) -> bool {
        let crop_ok = self
            .crop
            .as_ref()
            .is_none_or(|crop| profile.crops.iter().any(|c| c == crop));
        let location_ok = self
            .farm_location
            .as_ref()
            .is_none_or(|loc| profile.farm_location.as_ref() == Some(loc));
        let language_ok = self
            .language_preference
            .as_ref()
            .is_none_or(|lang| &profile.language_preference == lang);
        crop_ok && location_ok && language_ok
    }
}

/// Claims taken from a verified Google ID token.
#[derive(Debug, Clone)]
pub struct GoogleIdentity {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

// ── Messaging ────────────────────────────────────────────────────────────────

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReceipt {
    pub message_sid: String,
    pub status: String,
}

/// Provider-side failure; the text is surfaced to callers unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct DeliveryError(pub String);

/// Language-model call failure, described for logs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct CompletionError(pub String);

// ── Chat ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub room: String,
    pub username: String,
    pub message: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Room shared by two farmers for direct messages. Order of the ids does not matter.
pub fn direct_room(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("dm:{lo}:{hi}")
}

// ── Contract farming ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub full_name: String,
    pub father_name: String,
    pub phone_number: String,
    pub email_address: Option<String>,
    pub aadhar_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub village: String,
    pub district: String,
    pub state: String,
    pub pin_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandDetails {
    pub land_area_satak: f64,
    pub land_location: String,
    pub soil_type: String,
    pub water_source: String,
    pub previous_crop: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankingDetails {
    pub bank_name: String,
    pub account_number: String,
    pub ifsc_code: String,
}

/// Derived terms plus the farmer's acceptance of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAgreement {
    #[serde(flatten)]
    pub terms: ContractTerms,
    pub agree_terms: bool,
    pub agree_training: bool,
    pub agree_wages: bool,
}

/// Application details before storage assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContractApplication {
    pub submitted_at: DateTime<Utc>,
    pub status: ContractStatus,
    pub personal_info: PersonalInfo,
    pub address: Address,
    pub land_details: LandDetails,
    pub banking_details: BankingDetails,
    pub contract_terms: ContractAgreement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractApplication {
    pub id: ContractId,
    pub submitted_at: DateTime<Utc>,
    pub status: ContractStatus,
    pub personal_info: PersonalInfo,
    pub address: Address,
    pub land_details: LandDetails,
    pub banking_details: BankingDetails,
    pub contract_terms: ContractAgreement,
    pub remarks: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl ContractApplication {
    pub fn from_new(id: ContractId, new: NewContractApplication) -> Self {
        Self {
            id,
            submitted_at: new.submitted_at,
            status: new.status,
            personal_info: new.personal_info,
            address: new.address,
            land_details: new.land_details,
            banking_details: new.banking_details,
            contract_terms: new.contract_terms,
            remarks: None,
            last_updated: None,
        }
    }
}
