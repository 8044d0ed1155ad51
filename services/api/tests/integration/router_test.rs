use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

use agriguru_api::infra::chat_hub::ChatHub;
use agriguru_api::infra::google::{DisabledGoogle, GoogleSignIn};
use agriguru_api::infra::mail::{LogMailer, MailTransport};
use agriguru_api::infra::messaging::{DisabledMessaging, Messaging};
use agriguru_api::router::build_router;
use agriguru_api::state::AppState;
use agriguru_api::usecase::advisory::{ConversationHistory, Responder, RuleResponder};
use agriguru_session::cookie::CookieSettings;

/// Router over degraded adapters. Neither store is reachable; the pool connects lazily.
fn offline_server() -> TestServer {
    let redis = deadpool_redis::Config::from_url("redis://127.0.0.1:6379")
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .unwrap();
    let state = AppState {
        db: DatabaseConnection::default(),
        redis,
        cookies: CookieSettings {
            domain: None,
            secure: false,
        },
        mailer: MailTransport::Log(LogMailer),
        messaging: Messaging::Disabled(DisabledMessaging),
        google: GoogleSignIn::Disabled(DisabledGoogle),
        responder: Responder::Rules(RuleResponder),
        history: ConversationHistory::default(),
        hub: ChatHub::new(),
        internal_api_key: Some("cron-secret".to_owned()),
    };
    TestServer::new(build_router(state)).unwrap()
}

#[tokio::test]
async fn should_report_live_but_not_ready_without_database() {
    let server = offline_server();
    let live = server.get("/healthz").await;
    live.assert_status_ok();
    assert!(live.headers().get("x-request-id").is_some());
    server
        .get("/readyz")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_require_place_for_current_weather() {
    let server = offline_server();

    let missing = server.get("/api/weather/current").await;
    missing.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = missing.json();
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Please provide either city name or coordinates (lat, lon)"
    );

    let found = server
        .get("/api/weather/current")
        .add_query_param("city", "Thrissur")
        .await;
    found.assert_status_ok();
    let body: Value = found.json();
    assert_eq!(body["weather"]["location"], "Thrissur");
    assert_eq!(body["weather"]["temperature"], 28.0);
    assert!(body["weather"]["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn should_clamp_forecast_and_default_location() {
    let server = offline_server();
    let response = server
        .get("/api/weather/forecast")
        .add_query_param("days", 3)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["location"], "Your Area");
    assert_eq!(body["forecast"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn should_preview_contract_terms() {
    let server = offline_server();
    let response = server
        .post("/api/contract-farming/calculate")
        .json(&json!({ "landAreaSatak": "8" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["calculations"]["yearlyPayment"], 4000.0);
    assert_eq!(body["calculations"]["contractDuration"], 5);

    server
        .post("/api/contract-farming/calculate")
        .json(&json!({ "landAreaSatak": 0 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_answer_advisory_from_rules() {
    let server = offline_server();
    let response = server
        .post("/api/chat")
        .json(&json!({
            "message": "How much urea for paddy?",
            "context": { "user_name": "Meena" }
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["provider"], "rules");
    assert_eq!(body["fallback_used"], false);
    assert!(body["advice"].as_str().is_some_and(|a| a.contains("Meena")));
    assert_eq!(body["language_info"]["language"], "english");

    let info: Value = server.get("/api/model-info").await.json();
    assert_eq!(info["model_info"]["conversation_count"], 1);
}

#[tokio::test]
async fn should_refuse_scheduled_alerts_without_key() {
    let server = offline_server();
    let response = server.post("/api/auto-alerts/weather").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["kind"], "INVALID_API_KEY");
}

#[tokio::test]
async fn should_report_anonymous_caller() {
    let server = offline_server();
    let body: Value = server.get("/api/check-auth").await.json();
    assert_eq!(body, json!({ "authenticated": false }));

    server
        .get("/api/whatsapp/status")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_expire_cookie_even_when_session_store_is_down() {
    let server = offline_server();
    let response = server
        .post("/api/logout")
        .add_header(
            header::COOKIE,
            HeaderValue::from_static("agriguru_session=abc"),
        )
        .await;

    response.assert_status_ok();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(cookie.starts_with("agriguru_session=;"), "{cookie}");
    assert!(cookie.contains("Max-Age=0"), "{cookie}");
    let body: Value = response.json();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn should_wrap_mistyped_body_in_error_envelope() {
    let server = offline_server();

    for (path, body) in [
        ("/api/contract-farming/calculate", json!({ "landAreaSatak": [10] })),
        ("/api/chat", json!({ "message": 42 })),
    ] {
        let response = server.post(path).json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false, "{path}");
        assert_eq!(body["kind"], "VALIDATION", "{path}");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }
}

#[tokio::test]
async fn should_wrap_malformed_json_and_query_in_error_envelope() {
    let server = offline_server();

    let response = server
        .post("/api/contract-farming/calculate")
        .content_type("application/json")
        .bytes("{\"landAreaSatak\":".into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "VALIDATION");

    let response = server
        .get("/api/weather/forecast")
        .add_query_param("days", "soon")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "VALIDATION");
}
