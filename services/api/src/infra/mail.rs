use std::time::Duration;

use anyhow::Context as _;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::config::SmtpSettings;
use crate::domain::repository::Mailer;
use crate::domain::types::{OTP_TTL_SECS, OtpPurpose};
use crate::error::ApiError;

const OTP_SUBJECT: &str = "AgriGuru - Your Verification Code";

fn purpose_phrase(purpose: OtpPurpose) -> &'static str {
    match purpose {
        OtpPurpose::Login => "sign in to",
        OtpPurpose::Signup => "finish creating",
        OtpPurpose::Reset => "reset the password of",
    }
}

/// Plain-text OTP email.
pub fn otp_email_body(code: &str, purpose: OtpPurpose) -> String {
    format!(
        "Hello,\n\n\
         Use the code below to {} your AgriGuru account:\n\n\
         {code}\n\n\
         The code is valid for {} minutes and can be used once. \
         If you did not ask for it, you can ignore this email.\n\n\
         AgriGuru",
        purpose_phrase(purpose),
        OTP_TTL_SECS / 60,
    )
}

// ── SMTP ─────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings, timeout: Duration) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .context("build SMTP transport")?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(timeout))
            .build();
        let from = settings.from.parse::<Mailbox>().context("parse SMTP_FROM")?;
        Ok(Self { transport, from })
    }

    async fn deliver(&self, email: &str, code: &str, purpose: OtpPurpose) -> anyhow::Result<()> {
        let to = email.parse::<Mailbox>().context("parse recipient")?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(OTP_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(otp_email_body(code, purpose))
            .context("build OTP email")?;
        self.transport.send(message).await.context("send OTP email")?;
        Ok(())
    }
}

impl Mailer for SmtpMailer {
    async fn send_otp(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<(), ApiError> {
        self.deliver(email, code, purpose).await.map_err(|e| {
            ApiError::Upstream(format!("Failed to send OTP email: {e:#}"))
        })?;
        info!(email, purpose = purpose.as_str(), "OTP email sent");
        Ok(())
    }
}

// ── Degraded mode ────────────────────────────────────────────────────────────

/// Logs codes instead of sending them. Used when SMTP is not configured.
#[derive(Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send_otp(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<(), ApiError> {
        warn!(
            email,
            code,
            purpose = purpose.as_str(),
            "SMTP not configured, OTP logged instead of mailed"
        );
        Ok(())
    }
}

/// Mail transport selected at startup.
#[derive(Clone)]
pub enum MailTransport {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl Mailer for MailTransport {
    async fn send_otp(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<(), ApiError> {
        match self {
            Self::Smtp(m) => m.send_otp(email, code, purpose).await,
            Self::Log(m) => m.send_otp(email, code, purpose).await,
        }
    }
}
