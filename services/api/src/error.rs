use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use agriguru_core::error::error_response;
use agriguru_domain::alert::AlertType;

/// API service error variants.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Account is deactivated")]
    AccountDeactivated,
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Invalid or expired OTP")]
    InvalidOrExpiredOtp,
    #[error("Admin access required")]
    Forbidden,
    #[error("User not found")]
    UserNotFound,
    #[error("No users found matching criteria")]
    NoRecipients,
    #[error("Contract application not found")]
    ContractNotFound,
    #[error("User already exists")]
    AccountExists,
    #[error("No verification in progress")]
    NoVerificationPending,
    #[error("Invalid or expired verification code")]
    InvalidVerificationCode,
    #[error("User has not verified WhatsApp number")]
    WhatsAppNotVerified,
    #[error("User has disabled {0} alerts")]
    AlertTypeDisabled(AlertType),
    #[error("{0}")]
    Upstream(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::InvalidOrExpiredOtp => "INVALID_OR_EXPIRED",
            Self::Forbidden => "FORBIDDEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::NoRecipients => "NO_RECIPIENTS",
            Self::ContractNotFound => "CONTRACT_NOT_FOUND",
            Self::AccountExists => "ACCOUNT_EXISTS",
            Self::NoVerificationPending => "NO_VERIFICATION_PENDING",
            Self::InvalidVerificationCode => "INVALID_VERIFICATION_CODE",
            Self::WhatsAppNotVerified => "WHATSAPP_NOT_VERIFIED",
            Self::AlertTypeDisabled(_) => "ALERT_TYPE_DISABLED",
            Self::Upstream(_) => "UPSTREAM_FAILURE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::InvalidOrExpiredOtp
            | Self::NoVerificationPending
            | Self::InvalidVerificationCode
            | Self::WhatsAppNotVerified
            | Self::AlertTypeDisabled(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated
            | Self::InvalidCredentials
            | Self::AccountDeactivated
            | Self::InvalidApiKey => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UserNotFound | Self::NoRecipients | Self::ContractNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::AccountExists => StatusCode::CONFLICT,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = %e, kind = "INTERNAL", "internal error");
            }
            Self::Upstream(message) => {
                tracing::warn!(error = %message, kind = "UPSTREAM_FAILURE", "upstream call failed");
            }
            _ => {}
        }
        error_response(self.status(), self.kind(), &self.to_string())
    }
}
