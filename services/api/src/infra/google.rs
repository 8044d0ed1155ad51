use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::repository::IdentityVerifier;
use crate::domain::types::{GoogleIdentity, normalize_email};
use crate::error::ApiError;

const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
/// Tokens naming an unknown `kid` trigger at most one key fetch per interval.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct GoogleClaims {
    sub: String,
    email: String,
    #[serde(default)]
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Default)]
struct KeyCache {
    set: Option<JwkSet>,
    last_fetch: Option<Instant>,
}

fn refresh_due(last_fetch: Option<Instant>, now: Instant) -> bool {
    last_fetch.is_none_or(|at| now.saturating_duration_since(at) >= MIN_REFRESH_INTERVAL)
}

fn invalid_token() -> ApiError {
    ApiError::validation("Invalid Google token")
}

/// Verifies Google ID tokens locally against Google's published signing keys.
#[derive(Clone)]
pub struct GoogleVerifier {
    http: reqwest::Client,
    client_id: String,
    keys: Arc<RwLock<KeyCache>>,
}

impl GoogleVerifier {
    pub fn new(client_id: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build Google HTTP client")?;
        Ok(Self {
            http,
            client_id,
            keys: Arc::new(RwLock::new(KeyCache::default())),
        })
    }

    async fn fetch_keys(&self) -> Result<JwkSet, ApiError> {
        let set: JwkSet = self
            .http
            .get(GOOGLE_CERTS_URL)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ApiError::Upstream(format!("Failed to fetch Google signing keys: {e}")))?
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("Unreadable Google signing keys: {e}")))?;
        debug!(keys = set.keys.len(), "refreshed Google signing keys");
        self.keys.write().await.set = Some(set.clone());
        Ok(set)
    }

    /// Reserve the next key fetch, or `false` while the last one is too recent.
    async fn claim_refresh(&self) -> bool {
        let mut cache = self.keys.write().await;
        let now = Instant::now();
        if !refresh_due(cache.last_fetch, now) {
            return false;
        }
        cache.last_fetch = Some(now);
        true
    }

    /// Key for `kid`. An unknown `kid` refreshes the cached set (key rotation), throttled.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, ApiError> {
        let cached = self
            .keys
            .read()
            .await
            .set
            .as_ref()
            .and_then(|set| set.find(kid))
            .cloned();
        let jwk = match cached {
            Some(jwk) => jwk,
            None => {
                if !self.claim_refresh().await {
                    debug!(kid, "unknown Google key id, refresh throttled");
                    return Err(invalid_token());
                }
                self.fetch_keys()
                    .await?
                    .find(kid)
                    .cloned()
                    .ok_or_else(invalid_token)?
            }
        };
        DecodingKey::from_jwk(&jwk).map_err(|e| ApiError::Internal(e.into()))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation
    }
}

impl IdentityVerifier for GoogleVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, ApiError> {
        let header = decode_header(id_token).map_err(|_| invalid_token())?;
        let kid = header.kid.ok_or_else(invalid_token)?;
        let key = self.decoding_key(&kid).await?;
        let claims = decode::<GoogleClaims>(id_token, &key, &self.validation())
            .map_err(|e| {
                warn!(error = %e, "rejected Google ID token");
                invalid_token()
            })?
            .claims;
        if claims.email_verified == Some(false) {
            return Err(ApiError::validation("Google account email is not verified"));
        }
        Ok(GoogleIdentity {
            subject: claims.sub,
            email: normalize_email(&claims.email),
            name: claims.name,
            picture: claims.picture,
        })
    }
}

/// Rejects every token. Used when `GOOGLE_CLIENT_ID` is absent.
#[derive(Clone, Default)]
pub struct DisabledGoogle;

impl IdentityVerifier for DisabledGoogle {
    async fn verify(&self, _id_token: &str) -> Result<GoogleIdentity, ApiError> {
        Err(ApiError::Upstream("Google login is not configured".to_owned()))
    }
}

/// Google sign-in verifier selected at startup.
#[derive(Clone)]
pub enum GoogleSignIn {
    Enabled(GoogleVerifier),
    Disabled(DisabledGoogle),
}

impl IdentityVerifier for GoogleSignIn {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, ApiError> {
        match self {
            Self::Enabled(v) => v.verify(id_token).await,
            Self::Disabled(v) => v.verify(id_token).await,
        }
    }
}
