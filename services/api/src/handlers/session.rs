//! Session cookie extractor and helpers shared by handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use agriguru_session::cookie::{clear_session_cookie, session_id, set_session_cookie};

use crate::error::ApiError;
use crate::state::AppState;
use crate::usecase::session::CheckAuthUseCase;

/// Identity of the signed-in caller, resolved from the session cookie.
///
/// Rejects with `UNAUTHENTICATED` when the cookie is missing or the session has expired.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub session_id: String,
    pub user_id: Uuid,
    pub user_email: String,
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    // Read the cookie synchronously and hand an owned future back, so the
    // future does not borrow `parts`.
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let cookie = session_id(&CookieJar::from_headers(&parts.headers));
        let usecase = CheckAuthUseCase {
            sessions: state.sessions(),
        };

        async move {
            let session_id = cookie.ok_or(ApiError::Unauthenticated)?;
            let data = usecase
                .execute(Some(&session_id))
                .await?
                .ok_or(ApiError::Unauthenticated)?;
            Ok(Self {
                session_id,
                user_id: data.user_id,
                user_email: data.user_email,
            })
        }
    }
}

pub fn with_session(state: &AppState, jar: CookieJar, session_id: String) -> CookieJar {
    set_session_cookie(jar, session_id, &state.cookies)
}

pub fn without_session(state: &AppState, jar: CookieJar) -> CookieJar {
    clear_session_cookie(jar, &state.cookies)
}
