use std::time::Duration;

use anyhow::Context as _;
use sea_orm::Database;
use tracing::{info, warn};

use agriguru_core::config::Config;
use agriguru_core::tracing::init_tracing;
use agriguru_session::cookie::CookieSettings;

use agriguru_api::config::ApiConfig;
use agriguru_api::infra::chat_hub::ChatHub;
use agriguru_api::infra::google::{DisabledGoogle, GoogleSignIn, GoogleVerifier};
use agriguru_api::infra::llm::GroqClient;
use agriguru_api::infra::mail::{LogMailer, MailTransport, SmtpMailer};
use agriguru_api::infra::messaging::{DisabledMessaging, Messaging, TwilioClient};
use agriguru_api::router::build_router;
use agriguru_api::state::AppState;
use agriguru_api::usecase::advisory::{
    ConversationHistory, LlmResponder, Responder, RuleResponder,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ApiConfig::from_env().context("load configuration")?;
    let outbound = Duration::from_secs(config.outbound_timeout_secs);

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;

    let redis = deadpool_redis::Config::from_url(&config.redis_url)
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .context("create Redis pool")?;

    let mailer = match config.smtp() {
        Some(smtp) => MailTransport::Smtp(SmtpMailer::new(&smtp, outbound)?),
        None => {
            warn!("SMTP not configured; OTP codes will only be logged");
            MailTransport::Log(LogMailer)
        }
    };

    let messaging = match config.twilio() {
        Some(twilio) => Messaging::Twilio(TwilioClient::new(&twilio, outbound)?),
        None => {
            warn!("Twilio not configured; WhatsApp sends will fail");
            Messaging::Disabled(DisabledMessaging)
        }
    };

    let google = match config.google_client_id() {
        Some(client_id) => GoogleSignIn::Enabled(GoogleVerifier::new(client_id, outbound)?),
        None => {
            warn!("GOOGLE_CLIENT_ID not set; Google login disabled");
            GoogleSignIn::Disabled(DisabledGoogle)
        }
    };

    let responder = match config.groq_api_key() {
        Some(api_key) => Responder::Llm(LlmResponder {
            model: GroqClient::new(
                api_key,
                config.groq_model.clone(),
                Duration::from_secs(config.llm_timeout_secs),
            )?,
        }),
        None => {
            warn!("GROQ_API_KEY not set; advisory uses the rule responder");
            Responder::Rules(RuleResponder)
        }
    };

    let internal_api_key = config.internal_api_key();
    if internal_api_key.is_none() {
        warn!("INTERNAL_API_KEY not set; scheduled alert endpoints will reject every call");
    }

    let state = AppState {
        db,
        redis,
        cookies: CookieSettings {
            domain: config.cookie_domain.clone(),
            secure: config.cookie_secure,
        },
        mailer,
        messaging,
        google,
        responder,
        history: ConversationHistory::default(),
        hub: ChatHub::new(),
        internal_api_key,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.api_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!("agriguru api listening on {addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
