use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use agriguru_session::cookie::session_id;

use crate::domain::types::{OtpPurpose, Profile, User};
use crate::error::ApiError;
use crate::handlers::extract::ApiJson;
use crate::handlers::session::{CurrentSession, with_session, without_session};
use crate::state::AppState;
use crate::usecase::account::{
    ChangePasswordUseCase, GoogleLoginUseCase, PasswordLoginUseCase, ResetPasswordUseCase,
    SignupInput, SignupUseCase, SignupWithOtpInput, SignupWithOtpUseCase,
};
use crate::usecase::otp::{
    OtpLoginUseCase, RequestOtpInput, RequestOtpUseCase, VerifyOtpUseCase,
};
use crate::usecase::session::{CheckAuthUseCase, LogoutUseCase};

/// Public view of a signed-in user.
#[derive(Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub profile: Profile,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            profile: user.profile,
        }
    }
}

fn parse_purpose(raw: Option<&str>) -> Result<OtpPurpose, ApiError> {
    match raw.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(OtpPurpose::default()),
        Some(p) => p
            .parse()
            .map_err(|_| ApiError::validation("Purpose must be one of login, signup or reset")),
    }
}

// ── POST /signup ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    pub phone: Option<String>,
}

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = SignupUseCase {
        users: state.user_repo(),
    };
    let user = usecase
        .execute(SignupInput {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            phone: body.phone,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "user_id": user.id,
        })),
    ))
}

// ── POST /send-otp ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub email: String,
    pub purpose: Option<String>,
}

pub async fn send_otp(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SendOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = RequestOtpUseCase {
        users: state.user_repo(),
        otps: state.otp_repo(),
        mailer: state.mailer.clone(),
    };
    let output = usecase
        .execute(RequestOtpInput {
            email: body.email,
            purpose: parse_purpose(body.purpose.as_deref())?,
        })
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("OTP sent to {}", output.email),
        "email": output.email,
        "expires_in": output.expires_in,
    })))
}

// ── POST /verify-otp ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
    pub purpose: Option<String>,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<VerifyOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let purpose = parse_purpose(body.purpose.as_deref())?;
    if purpose != OtpPurpose::Login {
        let usecase = VerifyOtpUseCase {
            otps: state.otp_repo(),
        };
        usecase.execute(&body.email, &body.otp, purpose).await?;
        let body = json!({
            "success": true,
            "message": "OTP verified successfully",
            "email": body.email.trim().to_lowercase(),
        });
        return Ok((jar, Json(body)));
    }

    let usecase = OtpLoginUseCase {
        users: state.user_repo(),
        otps: state.otp_repo(),
        sessions: state.sessions(),
    };
    let output = usecase.execute(&body.email, &body.otp).await?;
    let jar = with_session(&state, jar, output.session_id);
    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Login successful",
            "user": UserSummary::from(output.user),
        })),
    ))
}

// ── POST /signup-with-otp ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignupWithOtpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub otp: String,
    pub phone: Option<String>,
}

pub async fn signup_with_otp(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<SignupWithOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = SignupWithOtpUseCase {
        users: state.user_repo(),
        otps: state.otp_repo(),
        sessions: state.sessions(),
    };
    let output = usecase
        .execute(SignupWithOtpInput {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            phone: body.phone,
            otp: body.otp,
        })
        .await?;
    let jar = with_session(&state, jar, output.session_id);
    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({
            "success": true,
            "message": "Account created successfully",
            "user": UserSummary::from(output.user),
        })),
    ))
}

// ── POST /reset-password ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
    #[serde(default)]
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = ResetPasswordUseCase {
        users: state.user_repo(),
        otps: state.otp_repo(),
    };
    usecase
        .execute(&body.email, &body.otp, &body.new_password)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Password reset successfully",
    })))
}

// ── POST /login ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = PasswordLoginUseCase {
        users: state.user_repo(),
        sessions: state.sessions(),
    };
    let output = usecase.execute(&body.email, &body.password).await?;
    let jar = with_session(&state, jar, output.session_id);
    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Login successful",
            "user": UserSummary::from(output.user),
        })),
    ))
}

// ── POST /google-login ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GoogleLoginRequest {
    #[serde(default, rename = "idToken", alias = "id_token")]
    pub id_token: String,
}

pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<GoogleLoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = GoogleLoginUseCase {
        users: state.user_repo(),
        google: state.google.clone(),
        sessions: state.sessions(),
    };
    let output = usecase.execute(&body.id_token).await?;
    let profile_image = output.user.profile_image.clone();
    let jar = with_session(&state, jar, output.session_id);
    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Google login successful",
            "user": UserSummary::from(output.user),
            "profile_image": profile_image,
        })),
    ))
}

// ── POST /logout ─────────────────────────────────────────────────────────────

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let usecase = LogoutUseCase {
        sessions: state.sessions(),
    };
    usecase.execute(session_id(&jar).as_deref()).await;
    let jar = without_session(&state, jar);
    (
        jar,
        Json(json!({ "success": true, "message": "Logged out successfully" })),
    )
}

// ── GET /check-auth ──────────────────────────────────────────────────────────

pub async fn check_auth(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = CheckAuthUseCase {
        sessions: state.sessions(),
    };
    let body = match usecase.execute(session_id(&jar).as_deref()).await? {
        Some(data) => json!({
            "authenticated": true,
            "user_id": data.user_id,
            "user_email": data.user_email,
        }),
        None => json!({ "authenticated": false }),
    };
    Ok(Json(body))
}

// ── POST /change-password ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

pub async fn change_password(
    session: CurrentSession,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = ChangePasswordUseCase {
        users: state.user_repo(),
    };
    usecase
        .execute(session.user_id, &body.old_password, &body.new_password)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Password changed successfully",
    })))
}
