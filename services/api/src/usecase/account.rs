use chrono::Utc;
use uuid::Uuid;

use crate::domain::password::{check_strength, hash_password, verify_password};
use crate::domain::repository::{IdentityVerifier, OtpRepository, SessionStore, UserRepository};
use crate::domain::types::{DEFAULT_LANGUAGE, OtpPurpose, Profile, User, normalize_email};
use crate::error::ApiError;
use crate::usecase::otp::{LoginOutput, checked_email, consume_otp};
use crate::usecase::session::open_session;

fn require_strong(password: &str) -> Result<(), ApiError> {
    check_strength(password).map_err(ApiError::validation)
}

fn hash(password: &str) -> Result<String, ApiError> {
    hash_password(password).map_err(|e| ApiError::Internal(anyhow::anyhow!("hash password: {e}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

// ── Signup ───────────────────────────────────────────────────────────────────

pub struct SignupInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

pub struct SignupUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> SignupUseCase<U> {
    pub async fn execute(&self, input: SignupInput) -> Result<User, ApiError> {
        if input.email.trim().is_empty()
            || input.password.is_empty()
            || input.full_name.trim().is_empty()
        {
            return Err(ApiError::validation(
                "Email, password, and full name are required",
            ));
        }
        let email = checked_email(&input.email)?;
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ApiError::AccountExists);
        }
        require_strong(&input.password)?;

        let user = User::new(
            email,
            input.full_name.trim().to_owned(),
            non_blank(input.phone),
            Some(hash(&input.password)?),
            Utc::now(),
        );
        self.users.create(&user).await?;
        Ok(user)
    }
}

// ── SignupWithOtp ────────────────────────────────────────────────────────────

pub struct SignupWithOtpInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub otp: String,
}

pub struct SignupWithOtpUseCase<U: UserRepository, O: OtpRepository, S: SessionStore> {
    pub users: U,
    pub otps: O,
    pub sessions: S,
}

impl<U: UserRepository, O: OtpRepository, S: SessionStore> SignupWithOtpUseCase<U, O, S> {
    pub async fn execute(&self, input: SignupWithOtpInput) -> Result<LoginOutput, ApiError> {
        if input.email.trim().is_empty()
            || input.password.is_empty()
            || input.full_name.trim().is_empty()
            || input.otp.trim().is_empty()
        {
            return Err(ApiError::validation(
                "Email, password, full name, and OTP are required",
            ));
        }
        let email = checked_email(&input.email)?;
        require_strong(&input.password)?;

        consume_otp(&self.otps, &email, &input.otp, OtpPurpose::Signup).await?;
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ApiError::AccountExists);
        }

        let now = Utc::now();
        let mut user = User::new(
            email,
            input.full_name.trim().to_owned(),
            non_blank(input.phone),
            Some(hash(&input.password)?),
            now,
        );
        user.email_verified = true;
        user.last_login = Some(now);
        self.users.create(&user).await?;
        let session_id = open_session(&self.sessions, &user).await?;
        Ok(LoginOutput { user, session_id })
    }
}

// ── PasswordLogin ────────────────────────────────────────────────────────────

pub struct PasswordLoginUseCase<U: UserRepository, S: SessionStore> {
    pub users: U,
    pub sessions: S,
}

impl<U: UserRepository, S: SessionStore> PasswordLoginUseCase<U, S> {
    pub async fn execute(&self, email: &str, password: &str) -> Result<LoginOutput, ApiError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::validation("Email and password are required"));
        }
        let mut user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;
        let stored = user
            .password_hash
            .as_deref()
            .ok_or(ApiError::InvalidCredentials)?;
        let matches = verify_password(password, stored)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored password hash: {e}")))?;
        if !matches {
            return Err(ApiError::InvalidCredentials);
        }
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

// ── GoogleLogin ──────────────────────────────────────────────────────────────

pub struct GoogleLoginUseCase<U: UserRepository, G: IdentityVerifier, S: SessionStore> {
    pub users: U,
    pub google: G,
    pub sessions: S,
}

impl<U: UserRepository, G: IdentityVerifier, S: SessionStore> GoogleLoginUseCase<U, G, S> {
    pub async fn execute(&self, id_token: &str) -> Result<LoginOutput, ApiError> {
        if id_token.trim().is_empty() {
            return Err(ApiError::validation("ID token is required"));
        }
        let identity = self.google.verify(id_token.trim()).await?;
        let now = Utc::now();

        let user = match self.users.find_by_email(&identity.email).await? {
            Some(mut user) => {
                if !user.is_active {
                    return Err(ApiError::AccountDeactivated);
                }
                if user.google_id.is_none() {
                    self.users.link_google(user.id, &identity.subject).await?;
                    user.google_id = Some(identity.subject);
                }
                self.users.touch_last_login(user.id, now).await?;
                user.last_login = Some(now);
                user
            }
            None => {
                let full_name = identity
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| {
                        identity
                            .email
                            .split('@')
                            .next()
                            .unwrap_or_default()
                            .to_owned()
                    });
                let mut user = User::new(identity.email, full_name, None, None, now);
                user.email_verified = true;
                user.google_id = Some(identity.subject);
                user.profile_image = identity.picture;
                user.last_login = Some(now);
                self.users.create(&user).await?;
                user
            }
        };

        let session_id = open_session(&self.sessions, &user).await?;
        Ok(LoginOutput { user, session_id })
    }
}

// ── ChangePassword ───────────────────────────────────────────────────────────

pub struct ChangePasswordUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ChangePasswordUseCase<U> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        if old_password.is_empty() || new_password.is_empty() {
            return Err(ApiError::validation(
                "Old password and new password are required",
            ));
        }
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        let stored = user.password_hash.as_deref().ok_or_else(|| {
            ApiError::validation("This account signs in with Google and has no password")
        })?;
        let matches = verify_password(old_password, stored)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored password hash: {e}")))?;
        if !matches {
            return Err(ApiError::validation("Current password is incorrect"));
        }
        require_strong(new_password)?;
        self.users
            .update_password(user.id, &hash(new_password)?, Utc::now())
            .await
    }
}

// ── ResetPassword ────────────────────────────────────────────────────────────

pub struct ResetPasswordUseCase<U: UserRepository, O: OtpRepository> {
    pub users: U,
    pub otps: O,
}

impl<U: UserRepository, O: OtpRepository> ResetPasswordUseCase<U, O> {
    pub async fn execute(&self, email: &str, otp: &str, new_password: &str) -> Result<(), ApiError> {
        if email.trim().is_empty() || otp.trim().is_empty() || new_password.is_empty() {
            return Err(ApiError::validation(
                "Email, OTP, and new password are required",
            ));
        }
        let email = checked_email(email)?;
        require_strong(new_password)?;
        consume_otp(&self.otps, &email, otp, OtpPurpose::Reset).await?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        self.users
            .update_password(user.id, &hash(new_password)?, Utc::now())
            .await
    }
}

// ── Profile ──────────────────────────────────────────────────────────────────

pub struct GetProfileUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetProfileUseCase<U> {
    pub async fn execute(&self, user_id: Uuid) -> Result<User, ApiError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}

pub struct UpdateProfileInput {
    pub farm_location: Option<String>,
    pub farm_size: Option<f64>,
    pub crops: Option<Vec<String>>,
    pub language_preference: Option<String>,
}

pub struct UpdateProfileUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> UpdateProfileUseCase<U> {
    /// Replace the profile wholesale; omitted fields reset to their defaults.
    pub async fn execute(&self, user_id: Uuid, input: UpdateProfileInput) -> Result<Profile, ApiError> {
        if input
            .farm_size
            .is_some_and(|size| !size.is_finite() || size < 0.0)
        {
            return Err(ApiError::validation("Farm size must be a non-negative number"));
        }
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(ApiError::UserNotFound);
        }
        let profile = Profile {
            farm_location: non_blank(input.farm_location),
            farm_size: input.farm_size,
            crops: input
                .crops
                .unwrap_or_default()
                .into_iter()
                .filter_map(|c| non_blank(Some(c)))
                .collect(),
            language_preference: non_blank(input.language_preference)
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()),
        };
        self.users.update_profile(user_id, &profile).await?;
        Ok(profile)
    }
}

// ── Directory ────────────────────────────────────────────────────────────────

pub struct ListFarmersUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ListFarmersUseCase<U> {
    pub async fn execute(&self) -> Result<Vec<User>, ApiError> {
        self.users.list_active().await
    }
}
