use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::TwilioSettings;
use crate::domain::repository::MessagingProvider;
use crate::domain::types::{DeliveryError, ProviderReceipt};

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

pub const NOT_CONFIGURED: &str = "WhatsApp credentials not configured";

/// Prefix `+` when the number lacks one.
pub fn normalize_phone(number: &str) -> String {
    let trimmed = number.trim();
    if trimmed.starts_with('+') {
        trimmed.to_owned()
    } else {
        format!("+{trimmed}")
    }
}

fn whatsapp_address(number: &str) -> String {
    format!("whatsapp:{}", normalize_phone(number))
}

// ── Twilio ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct TwilioClient {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from: String,
}

#[derive(Deserialize)]
struct MessageResource {
    sid: String,
    status: String,
}

#[derive(Deserialize)]
struct ErrorResource {
    message: String,
    code: Option<i64>,
}

impl TwilioClient {
    pub fn new(settings: &TwilioSettings, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build Twilio HTTP client")?;
        Ok(Self {
            http,
            account_sid: settings.account_sid.clone(),
            auth_token: settings.auth_token.clone(),
            from: whatsapp_address(&settings.whatsapp_number),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{TWILIO_API_BASE}/Accounts/{}/Messages.json",
            self.account_sid
        )
    }
}

impl MessagingProvider for TwilioClient {
    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, to: &str, body: &str) -> Result<ProviderReceipt, DeliveryError> {
        let to = whatsapp_address(to);
        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("From", self.from.as_str()), ("To", to.as_str()), ("Body", body)])
            .send()
            .await
            .map_err(|e| DeliveryError(format!("Failed to send WhatsApp message: {e}")))?;

        let status = response.status();
        if status.is_success() {
            let resource: MessageResource = response
                .json()
                .await
                .map_err(|e| DeliveryError(format!("Unreadable Twilio response: {e}")))?;
            debug!(to = %to, sid = %resource.sid, "WhatsApp message accepted");
            return Ok(ProviderReceipt {
                message_sid: resource.sid,
                status: resource.status,
            });
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_owned());
        warn!(status = status.as_u16(), body = %text, "Twilio API returned error");
        let message = match serde_json::from_str::<ErrorResource>(&text) {
            Ok(ErrorResource {
                message,
                code: Some(code),
            }) => format!("Twilio error {code}: {message}"),
            Ok(ErrorResource { message, code: None }) => format!("Twilio error: {message}"),
            Err(_) => format!("Twilio error (HTTP {}): {text}", status.as_u16()),
        };
        Err(DeliveryError(message))
    }
}

// ── Degraded mode ────────────────────────────────────────────────────────────

/// Fails every send. Used when Twilio credentials are absent.
#[derive(Clone, Default)]
pub struct DisabledMessaging;

impl MessagingProvider for DisabledMessaging {
    fn is_configured(&self) -> bool {
        false
    }

    async fn send(&self, _to: &str, _body: &str) -> Result<ProviderReceipt, DeliveryError> {
        Err(DeliveryError(NOT_CONFIGURED.to_owned()))
    }
}

/// Messaging provider selected at startup.
#[derive(Clone)]
pub enum Messaging {
    Twilio(TwilioClient),
    Disabled(DisabledMessaging),
}

impl MessagingProvider for Messaging {
    fn is_configured(&self) -> bool {
        match self {
            Self::Twilio(c) => c.is_configured(),
            Self::Disabled(c) => c.is_configured(),
        }
    }

    async fn send(&self, to: &str, body: &str) -> Result<ProviderReceipt, DeliveryError> {
        match self {
            Self::Twilio(c) => c.send(to, body).await,
            Self::Disabled(c) => c.send(to, body).await,
        }
    }
}
