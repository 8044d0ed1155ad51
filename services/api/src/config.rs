use serde::Deserialize;

use agriguru_core::config::Config;

/// API service configuration loaded from environment variables.
///
/// Capability groups (SMTP, Twilio, Groq, Google, internal key) are optional;
/// a missing group selects the degraded adapter at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis URL for the session store.
    pub redis_url: String,
    /// HTTP port (default 5000). Env var: `API_PORT`.
    #[serde(default = "default_port")]
    pub api_port: u16,
    pub cookie_domain: Option<String>,
    #[serde(default = "default_true")]
    pub cookie_secure: bool,
    /// Timeout for messaging, Google and SMTP calls.
    #[serde(default = "default_outbound_timeout")]
    pub outbound_timeout_secs: u64,
    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_secs: u64,

    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    /// Sender address; falls back to `SMTP_USERNAME`.
    pub smtp_from: Option<String>,

    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_whatsapp_number: Option<String>,

    pub groq_api_key: Option<String>,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,

    pub google_client_id: Option<String>,

    /// Shared secret for the cron-triggered alert endpoints.
    pub internal_api_key: Option<String>,
}

impl Config for ApiConfig {}

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_outbound_timeout() -> u64 {
    10
}

fn default_llm_timeout() -> u64 {
    30
}

fn default_smtp_port() -> u16 {
    587
}

fn default_groq_model() -> String {
    "llama-3.1-8b-instant".to_owned()
}

/// SMTP settings, present only when host and credentials are all configured.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// Twilio settings, present only when every credential is configured.
#[derive(Debug, Clone)]
pub struct TwilioSettings {
    pub account_sid: String,
    pub auth_token: String,
    pub whatsapp_number: String,
}

impl ApiConfig {
    pub fn smtp(&self) -> Option<SmtpSettings> {
        let host = non_empty(&self.smtp_host)?;
        let username = non_empty(&self.smtp_username)?;
        let password = non_empty(&self.smtp_password)?;
        let from = non_empty(&self.smtp_from).unwrap_or_else(|| username.clone());
        Some(SmtpSettings {
            host,
            port: self.smtp_port,
            username,
            password,
            from,
        })
    }

    pub fn twilio(&self) -> Option<TwilioSettings> {
        Some(TwilioSettings {
            account_sid: non_empty(&self.twilio_account_sid)?,
            auth_token: non_empty(&self.twilio_auth_token)?,
            whatsapp_number: non_empty(&self.twilio_whatsapp_number)?,
        })
    }

    pub fn groq_api_key(&self) -> Option<String> {
        non_empty(&self.groq_api_key)
    }

    pub fn google_client_id(&self) -> Option<String> {
        non_empty(&self.google_client_id)
    }

    pub fn internal_api_key(&self) -> Option<String> {
        non_empty(&self.internal_api_key)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
