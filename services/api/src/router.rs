use axum::{
    Router,
    routing::{get, post, put},
};
use tower::ServiceBuilder;

use agriguru_core::health::{healthz, readyz};
use agriguru_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    advisory::{chat, clear_history, conversation_history, model},
    alerts::{crop_health_alerts, weather_alerts},
    auth::{
        change_password, check_auth, google_login, login, logout, reset_password, send_otp,
        signup, signup_with_otp, verify_otp,
    },
    chat::{messages, send, ws},
    contract::{application, applications, calculate_terms, stats, submit, update_status},
    profile::{get_profile, list_farmers, update_profile},
    weather::{advisory, current, forecast_days},
    whatsapp::{
        bulk_alert, confirm_verification, send_alert, send_test, start_verification, status,
        update_preferences,
    },
};
use crate::state::AppState;

/// Every endpoint is served under `/api`; probes stay at the root.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Accounts
        .route("/signup", post(signup))
        .route("/send-otp", post(send_otp))
        .route("/verify-otp", post(verify_otp))
        .route("/signup-with-otp", post(signup_with_otp))
        .route("/reset-password", post(reset_password))
        .route("/login", post(login))
        .route("/google-login", post(google_login))
        .route("/logout", post(logout))
        .route("/check-auth", get(check_auth))
        .route("/change-password", post(change_password))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/users", get(list_farmers))
        // WhatsApp
        .route("/whatsapp/update-preferences", post(update_preferences))
        .route("/whatsapp/verify", post(start_verification))
        .route("/whatsapp/confirm", post(confirm_verification))
        .route("/whatsapp/status", get(status))
        .route("/whatsapp/test", post(send_test))
        .route("/whatsapp/send-alert", post(send_alert))
        .route("/whatsapp/bulk-alert", post(bulk_alert))
        // Scheduled alerts
        .route("/auto-alerts/weather", post(weather_alerts))
        .route("/auto-alerts/crop-health", post(crop_health_alerts))
        // Weather
        .route("/weather/current", get(current))
        .route("/weather/forecast", get(forecast_days))
        .route("/weather/farming-advisory", get(advisory))
        // Advisory
        .route("/chat", post(chat))
        .route("/conversation-history", get(conversation_history))
        .route("/clear-history", post(clear_history))
        .route("/model-info", get(model))
        // Farmer chat
        .route("/chat/messages", get(messages))
        .route("/chat/send", post(send))
        .route("/chat/ws", get(ws))
        // Contract farming
        .route("/contract-farming/submit", post(submit))
        .route("/contract-farming/applications", get(applications))
        .route("/contract-farming/application/{id}", get(application))
        .route("/contract-farming/application/{id}/status", put(update_status))
        .route("/contract-farming/calculate", post(calculate_terms))
        .route("/contract-farming/stats", get(stats));

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz::<AppState>))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(trace_layer())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
