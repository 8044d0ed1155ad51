use chrono::Utc;
use rand::RngExt;

use crate::domain::repository::{Mailer, OtpRepository, SessionStore, UserRepository};
use crate::domain::types::{
    CODE_LEN, OTP_TTL_SECS, OtpPurpose, OtpRecord, User, is_valid_email, normalize_email,
};
use crate::error::ApiError;
use crate::usecase::session::open_session;

/// Random numeric code of `len` digits; leading zeros allowed.
pub fn generate_numeric_code(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Normalize and validate an email address from a request.
pub fn checked_email(raw: &str) -> Result<String, ApiError> {
    let email = normalize_email(raw);
    if email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::validation("Invalid email format"));
    }
    Ok(email)
}

// ── RequestOtp ───────────────────────────────────────────────────────────────

pub struct RequestOtpInput {
    pub email: String,
    pub purpose: OtpPurpose,
}

#[derive(Debug)]
pub struct RequestOtpOutput {
    pub email: String,
    pub expires_in: i64,
}

pub struct RequestOtpUseCase<U: UserRepository, O: OtpRepository, M: Mailer> {
    pub users: U,
    pub otps: O,
    pub mailer: M,
}

impl<U: UserRepository, O: OtpRepository, M: Mailer> RequestOtpUseCase<U, O, M> {
    pub async fn execute(&self, input: RequestOtpInput) -> Result<RequestOtpOutput, ApiError> {
        let email = checked_email(&input.email)?;
        let exists = self.users.find_by_email(&email).await?.is_some();
        match input.purpose {
            OtpPurpose::Login | OtpPurpose::Reset if !exists => return Err(ApiError::UserNotFound),
            OtpPurpose::Signup if exists => return Err(ApiError::AccountExists),
            _ => {}
        }

        let code = generate_numeric_code(CODE_LEN);
        let record = OtpRecord::issue(email.clone(), code.clone(), input.purpose, Utc::now());
        self.otps.replace(&record).await?;
        self.mailer.send_otp(&email, &code, input.purpose).await?;

        Ok(RequestOtpOutput {
            email,
            expires_in: OTP_TTL_SECS,
        })
    }
}

// ── VerifyOtp ────────────────────────────────────────────────────────────────

/// Consume a code. Every failure is `InvalidOrExpiredOtp`, whatever the cause.
pub async fn consume_otp<O: OtpRepository>(
    otps: &O,
    email: &str,
    code: &str,
    purpose: OtpPurpose,
) -> Result<(), ApiError> {
    let email = normalize_email(email);
    let code = code.trim();
    if email.is_empty() || code.is_empty() {
        return Err(ApiError::validation("Email and OTP are required"));
    }
    if otps.consume(&email, code, purpose, Utc::now()).await? {
        Ok(())
    } else {
        Err(ApiError::InvalidOrExpiredOtp)
    }
}

pub struct VerifyOtpUseCase<O: OtpRepository> {
    pub otps: O,
}

impl<O: OtpRepository> VerifyOtpUseCase<O> {
    pub async fn execute(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<(), ApiError> {
        consume_otp(&self.otps, email, code, purpose).await
    }
}

// ── OtpLogin ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    pub session_id: String,
}

/// Login-purpose verification: consume the code, then sign the user in.
pub struct OtpLoginUseCase<U: UserRepository, O: OtpRepository, S: SessionStore> {
    pub users: U,
    pub otps: O,
    pub sessions: S,
}

impl<U: UserRepository, O: OtpRepository, S: SessionStore> OtpLoginUseCase<U, O, S> {
    pub async fn execute(&self, email: &str, code: &str) -> Result<LoginOutput, ApiError> {
        consume_otp(&self.otps, email, code, OtpPurpose::Login).await?;

        let mut user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if !user.is_active {
            return Err(ApiError::AccountDeactivated);
        }
        let now = Utc::now();
        self.users.touch_last_login(user.id, now).await?;
        user.last_login = Some(now);
        let session_id = open_session(&self.sessions, &user).await?;
        Ok(LoginOutput { user, session_id })
    }
}
