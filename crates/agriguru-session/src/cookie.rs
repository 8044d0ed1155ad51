//! Cookie builders for the session id.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie name carrying the opaque session id.
pub const SESSION_COOKIE: &str = "agriguru_session";

/// Session lifetime in seconds (7 days). Used for both the cookie Max-Age and the store TTL.
pub const SESSION_TTL_SECS: u64 = 604800;

/// Cookie attributes that vary per deployment.
#[derive(Debug, Clone, Default)]
pub struct CookieSettings {
    /// `Domain` attribute; host-only cookie when `None`.
    pub domain: Option<String>,
    /// `Secure` attribute. Disable only for local plain-http development.
    pub secure: bool,
}

fn base_cookie(value: String, settings: &CookieSettings, max_age: Duration) -> Cookie<'static> {
    let mut builder = Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax);
    if let Some(domain) = &settings.domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

/// Set the session cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use agriguru_session::cookie::{set_session_cookie, CookieSettings, SESSION_COOKIE};
///
/// let settings = CookieSettings { domain: Some("example.com".to_string()), secure: true };
/// let jar = set_session_cookie(CookieJar::new(), "sid".to_string(), &settings);
/// let cookie = jar.get(SESSION_COOKIE).unwrap();
/// assert_eq!(cookie.value(), "sid");
/// assert_eq!(cookie.path(), Some("/"));
/// assert_eq!(cookie.domain(), Some("example.com"));
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604800)));
/// assert!(cookie.http_only().unwrap_or(false));
/// assert!(cookie.secure().unwrap_or(false));
/// ```
pub fn set_session_cookie(jar: CookieJar, session_id: String, settings: &CookieSettings) -> CookieJar {
    jar.add(base_cookie(
        session_id,
        settings,
        Duration::seconds(SESSION_TTL_SECS as i64),
    ))
}

/// Expire the session cookie by setting Max-Age to 0.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use agriguru_session::cookie::{
///     clear_session_cookie, set_session_cookie, CookieSettings, SESSION_COOKIE,
/// };
///
/// let settings = CookieSettings::default();
/// let jar = set_session_cookie(CookieJar::new(), "sid".to_string(), &settings);
/// let jar = clear_session_cookie(jar, &settings);
/// let cookie = jar.get(SESSION_COOKIE).unwrap();
/// assert_eq!(cookie.value(), "");
/// assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
/// ```
pub fn clear_session_cookie(jar: CookieJar, settings: &CookieSettings) -> CookieJar {
    jar.add(base_cookie(String::new(), settings, Duration::ZERO))
}

/// Read the session id from the jar, ignoring empty values.
pub fn session_id(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
}
