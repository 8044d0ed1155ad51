//! WhatsApp alert formatting and dispatch, single and bulk.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use agriguru_domain::alert::AlertType;

use crate::domain::repository::{MessagingProvider, UserRepository};
use crate::domain::types::{RecipientFilter, User};
use crate::error::ApiError;
use crate::infra::messaging::normalize_phone;
use crate::usecase::weather::{Location, crop_health, current_weather};

pub const BANNER: &str = "🌾 *AgriGuru Farming Assistant* 🌾\n\n";
pub const TEST_MESSAGE: &str = "🌾 AgriGuru Test Message - WhatsApp alerts are working!";
const GENERIC_FALLBACK: &str = "Alert from AgriGuru";

/// Accepts JSON strings and numbers alike; `null` reads as absent.
fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    use serde::de::Error as _;
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        serde_json::Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!("expected text, got {other}"))),
    }
}

/// Caller-supplied alert fields. Which ones matter depends on the alert type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AlertData {
    #[serde(deserialize_with = "lenient_text")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub condition: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub temperature: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub crop: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub price: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub market: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub disease: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub action: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub message: Option<String>,
}

fn or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    value.as_deref().unwrap_or(fallback)
}

/// Message body for `alert_type`, without the banner.
pub fn format_alert(alert_type: AlertType, data: &AlertData) -> String {
    match alert_type {
        AlertType::Weather => format!(
            "🌤️ Weather Alert for {}: {}, {}°C",
            or(&data.location, "your area"),
            or(&data.condition, "changing weather"),
            or(&data.temperature, "25"),
        ),
        AlertType::MarketPrices => format!(
            "💰 Market Alert - {}: ₹{}/quintal at {}",
            or(&data.crop, "your crop"),
            or(&data.price, "0"),
            or(&data.market, "local market"),
        ),
        AlertType::CropDiseases => format!(
            "🦠 Crop Alert - {}: {}. Action: {}",
            or(&data.crop, "your crop"),
            or(&data.disease, "potential disease"),
            or(&data.action, "consult an expert"),
        ),
        AlertType::Generic => or(&data.message, GENERIC_FALLBACK).to_owned(),
    }
}

/// Outcome of one provider send. Failures carry the provider text unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryReport {
    /// Convert a failed report into an upstream error.
    pub fn into_result(self) -> Result<Self, ApiError> {
        match (&self.error, self.success) {
            (Some(error), false) => Err(ApiError::Upstream(format!("Error sending alert: {error}"))),
            _ => Ok(self),
        }
    }
}

// ── Dispatcher ───────────────────────────────────────────────────────────────

/// Sends branded messages through a [`MessagingProvider`]. Never retries.
pub struct AlertDispatcher<M: MessagingProvider> {
    pub provider: M,
}

impl<M: MessagingProvider> AlertDispatcher<M> {
    pub async fn send(&self, number: &str, message: &str) -> DeliveryReport {
        let to = normalize_phone(number);
        let body = format!("{BANNER}{message}");
        match self.provider.send(&to, &body).await {
            Ok(receipt) => {
                info!(to = %to, sid = %receipt.message_sid, "whatsapp message accepted");
                DeliveryReport {
                    success: true,
                    message_sid: Some(receipt.message_sid),
                    status: Some(receipt.status),
                    error: None,
                }
            }
            Err(e) => {
                warn!(to = %to, error = %e, "whatsapp send failed");
                DeliveryReport {
                    success: false,
                    message_sid: None,
                    status: None,
                    error: Some(e.0),
                }
            }
        }
    }

    pub async fn send_alert(&self, number: &str, alert_type: AlertType, data: &AlertData) -> DeliveryReport {
        self.send(number, &format_alert(alert_type, data)).await
    }

    pub async fn send_test(&self, number: &str) -> DeliveryReport {
        self.send(number, TEST_MESSAGE).await
    }
}

/// Parse a caller-supplied alert type.
pub fn parse_alert_type(raw: &str) -> Result<AlertType, ApiError> {
    raw.trim().parse().map_err(|_| {
        ApiError::validation("alert_type must be one of weather, market_prices, crop_diseases or generic")
    })
}

/// The caller must be an existing admin account.
pub async fn require_admin<U: UserRepository>(users: &U, caller: Uuid) -> Result<User, ApiError> {
    let user = users
        .find_by_id(caller)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    if !user.is_admin {
        return Err(ApiError::Forbidden);
    }
    Ok(user)
}

// ── SendAlert ────────────────────────────────────────────────────────────────

pub struct SendAlertInput {
    pub user_id: Uuid,
    pub alert_type: String,
    pub alert_data: AlertData,
}

pub struct SendAlertUseCase<U: UserRepository, M: MessagingProvider> {
    pub users: U,
    pub dispatcher: AlertDispatcher<M>,
}

impl<U: UserRepository, M: MessagingProvider> SendAlertUseCase<U, M> {
    pub async fn execute(&self, caller: Uuid, input: SendAlertInput) -> Result<DeliveryReport, ApiError> {
        require_admin(&self.users, caller).await?;
        let alert_type = parse_alert_type(&input.alert_type)?;
        let recipient = self
            .users
            .find_by_id(input.user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        let whatsapp = &recipient.whatsapp;
        let Some(number) = whatsapp.number.as_deref().filter(|_| whatsapp.verified) else {
            return Err(ApiError::WhatsAppNotVerified);
        };
        if !whatsapp.enabled || !whatsapp.alert_preferences.allows(alert_type) {
            return Err(ApiError::AlertTypeDisabled(alert_type));
        }
        self.dispatcher
            .send_alert(number, alert_type, &input.alert_data)
            .await
            .into_result()
    }
}

// ── BulkAlert ────────────────────────────────────────────────────────────────

pub struct BulkAlertInput {
    pub alert_type: String,
    pub alert_data: AlertData,
    pub filter: RecipientFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipientResult {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub report: DeliveryReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkAlertReport {
    pub total_users: usize,
    pub successful_alerts: usize,
    pub failed_alerts: usize,
    pub results: Vec<RecipientResult>,
}

pub struct BulkAlertUseCase<U: UserRepository, M: MessagingProvider> {
    pub users: U,
    pub dispatcher: AlertDispatcher<M>,
}

impl<U: UserRepository, M: MessagingProvider> BulkAlertUseCase<U, M> {
    /// One send per matching recipient; a failed send never stops the batch.
    pub async fn execute(&self, caller: Uuid, input: BulkAlertInput) -> Result<BulkAlertReport, ApiError> {
        require_admin(&self.users, caller).await?;
        let alert_type = parse_alert_type(&input.alert_type)?;
        let recipients = self
            .users
            .list_alert_recipients(alert_type, &input.filter)
            .await?;
        if recipients.is_empty() {
            return Err(ApiError::NoRecipients);
        }

        let mut results = Vec::with_capacity(recipients.len());
        for user in &recipients {
            let Some(number) = user.whatsapp.number.as_deref() else {
                continue;
            };
            let report = self
                .dispatcher
                .send_alert(number, alert_type, &input.alert_data)
                .await;
            results.push(RecipientResult {
                user_id: user.id,
                report,
            });
        }

        let successful_alerts = results.iter().filter(|r| r.report.success).count();
        info!(
            %alert_type,
            total = results.len(),
            successful_alerts,
            "bulk alert finished"
        );
        Ok(BulkAlertReport {
            total_users: results.len(),
            successful_alerts,
            failed_alerts: results.len() - successful_alerts,
            results,
        })
    }
}

// ── AutoAlert ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoAlertFailure {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AutoAlertReport {
    pub total_users: usize,
    pub successful_alerts: usize,
    pub failed_alerts: usize,
    pub failures: Vec<AutoAlertFailure>,
}

impl AutoAlertReport {
    fn record(&mut self, user_id: Uuid, crop: Option<&str>, report: DeliveryReport) {
        if report.success {
            self.successful_alerts += 1;
        } else {
            self.failed_alerts += 1;
            self.failures.push(AutoAlertFailure {
                user_id,
                crop: crop.map(str::to_owned),
                error: report.error.unwrap_or_default(),
            });
        }
    }
}

/// Scheduled alerts driven by the mock weather and crop-health tables.
pub struct AutoAlertUseCase<U: UserRepository, M: MessagingProvider> {
    pub users: U,
    pub dispatcher: AlertDispatcher<M>,
}

impl<U: UserRepository, M: MessagingProvider> AutoAlertUseCase<U, M> {
    /// Current conditions at each weather subscriber's farm location.
    pub async fn run_weather(&self) -> Result<AutoAlertReport, ApiError> {
        let recipients = self
            .users
            .list_alert_recipients(AlertType::Weather, &RecipientFilter::default())
            .await?;
        let mut report = AutoAlertReport {
            total_users: recipients.len(),
            ..AutoAlertReport::default()
        };
        for user in &recipients {
            let Some(number) = user.whatsapp.number.as_deref() else {
                continue;
            };
            let place = user
                .profile
                .farm_location
                .clone()
                .unwrap_or_else(|| "your area".to_owned());
            let weather = current_weather(&Location::City(place.clone()));
            let data = AlertData {
                location: Some(place),
                condition: Some(weather.conditions.condition),
                temperature: Some(weather.conditions.temperature.to_string()),
                ..AlertData::default()
            };
            let sent = self
                .dispatcher
                .send_alert(number, AlertType::Weather, &data)
                .await;
            report.record(user.id, None, sent);
        }
        info!(
            successful = report.successful_alerts,
            failed = report.failed_alerts,
            "weather auto-alerts processed"
        );
        Ok(report)
    }

    /// One alert per listed crop that currently shows disease.
    pub async fn run_crop_health(&self) -> Result<AutoAlertReport, ApiError> {
        let recipients = self
            .users
            .list_alert_recipients(AlertType::CropDiseases, &RecipientFilter::default())
            .await?;
        let mut report = AutoAlertReport {
            total_users: recipients.len(),
            ..AutoAlertReport::default()
        };
        for user in &recipients {
            let Some(number) = user.whatsapp.number.as_deref() else {
                continue;
            };
            for crop in &user.profile.crops {
                let health = crop_health(crop, user.profile.farm_location.as_deref());
                let (Some(disease), Some(action)) = (health.disease, health.recommended_action)
                else {
                    continue;
                };
                let data = AlertData {
                    crop: Some(health.crop),
                    disease: Some(disease.to_owned()),
                    action: Some(action.to_owned()),
                    ..AlertData::default()
                };
                let sent = self
                    .dispatcher
                    .send_alert(number, AlertType::CropDiseases, &data)
                    .await;
                report.record(user.id, Some(crop.as_str()), sent);
            }
        }
        info!(
            successful = report.successful_alerts,
            failed = report.failed_alerts,
            "crop-health auto-alerts processed"
        );
        Ok(report)
    }
}
