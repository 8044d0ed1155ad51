use agriguru_api::domain::types::{AlertPreferences, RecipientFilter};
use agriguru_api::error::ApiError;
use agriguru_api::usecase::notify::{
    AlertData, AutoAlertUseCase, BANNER, BulkAlertInput, BulkAlertUseCase, SendAlertInput,
    SendAlertUseCase,
};

use crate::helpers::{
    MockMessaging, MockUserRepo, dispatcher, subscribed_farmer, test_admin, test_user,
};

fn market_data() -> AlertData {
    serde_json::from_value(serde_json::json!({
        "crop": "onion",
        "price": 2450,
        "market": "Lasalgaon",
    }))
    .unwrap()
}

// ── Single alert ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_send_branded_alert_to_verified_farmer() {
    let admin = test_admin();
    let farmer = subscribed_farmer("ravi@example.com", "919876543210", &["onion"], "Nashik");
    let messaging = MockMessaging::new();
    let sent = messaging.sent_handle();

    let uc = SendAlertUseCase {
        users: MockUserRepo::new(vec![admin.clone(), farmer.clone()]),
        dispatcher: dispatcher(messaging),
    };
    let report = uc
        .execute(
            admin.id,
            SendAlertInput {
                user_id: farmer.id,
                alert_type: "market_prices".into(),
                alert_data: market_data(),
            },
        )
        .await
        .unwrap();

    assert!(report.success);
    assert!(report.message_sid.is_some());
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "+919876543210", "number is normalized with a leading plus");
    assert!(sent[0].1.starts_with(BANNER));
    assert!(sent[0].1.contains("onion: ₹2450/quintal at Lasalgaon"));
}

#[tokio::test]
async fn should_require_admin_caller() {
    let caller = test_user("ravi@example.com");
    let farmer = subscribed_farmer("meena@example.com", "+919812345678", &[], "Pune");
    let uc = SendAlertUseCase {
        users: MockUserRepo::new(vec![caller.clone(), farmer.clone()]),
        dispatcher: dispatcher(MockMessaging::new()),
    };
    let result = uc
        .execute(
            caller.id,
            SendAlertInput {
                user_id: farmer.id,
                alert_type: "generic".into(),
                alert_data: AlertData::default(),
            },
        )
        .await;
    assert!(matches!(result, Err(ApiError::Forbidden)));
}

#[tokio::test]
async fn should_check_admin_before_alert_type() {
    let caller = test_user("ravi@example.com");
    let admin = test_admin();
    let farmer = subscribed_farmer("meena@example.com", "+919812345678", &[], "Pune");
    let users = MockUserRepo::new(vec![caller.clone(), admin.clone(), farmer.clone()]);
    let single = SendAlertUseCase {
        users: users.clone(),
        dispatcher: dispatcher(MockMessaging::new()),
    };
    let bulk = BulkAlertUseCase {
        users,
        dispatcher: dispatcher(MockMessaging::new()),
    };
    let input = || SendAlertInput {
        user_id: farmer.id,
        alert_type: "hailstorm".into(),
        alert_data: AlertData::default(),
    };
    let bulk_input = || BulkAlertInput {
        alert_type: "hailstorm".into(),
        alert_data: AlertData::default(),
        filter: RecipientFilter::default(),
    };

    let result = single.execute(caller.id, input()).await;
    assert!(matches!(result, Err(ApiError::Forbidden)), "got {result:?}");
    let result = bulk.execute(caller.id, bulk_input()).await;
    assert!(matches!(result, Err(ApiError::Forbidden)), "got {result:?}");

    let result = single.execute(admin.id, input()).await;
    assert!(matches!(result, Err(ApiError::Validation(_))), "got {result:?}");
    let result = bulk.execute(admin.id, bulk_input()).await;
    assert!(matches!(result, Err(ApiError::Validation(_))), "got {result:?}");
}

#[tokio::test]
async fn should_refuse_unverified_recipient() {
    let admin = test_admin();
    let farmer = test_user("ravi@example.com");
    let messaging = MockMessaging::new();
    let sent = messaging.sent_handle();
    let uc = SendAlertUseCase {
        users: MockUserRepo::new(vec![admin.clone(), farmer.clone()]),
        dispatcher: dispatcher(messaging),
    };
    let result = uc
        .execute(
            admin.id,
            SendAlertInput {
                user_id: farmer.id,
                alert_type: "weather".into(),
                alert_data: AlertData::default(),
            },
        )
        .await;
    assert!(matches!(result, Err(ApiError::WhatsAppNotVerified)));
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_respect_recipient_opt_out() {
    let admin = test_admin();
    let mut farmer = subscribed_farmer("ravi@example.com", "+919876543210", &[], "Nashik");
    farmer.whatsapp.alert_preferences = AlertPreferences {
        market_prices: false,
        ..AlertPreferences::default()
    };
    let uc = SendAlertUseCase {
        users: MockUserRepo::new(vec![admin.clone(), farmer.clone()]),
        dispatcher: dispatcher(MockMessaging::new()),
    };
    let result = uc
        .execute(
            admin.id,
            SendAlertInput {
                user_id: farmer.id,
                alert_type: "market_prices".into(),
                alert_data: market_data(),
            },
        )
        .await;
    match result {
        Err(e @ ApiError::AlertTypeDisabled(_)) => {
            assert_eq!(e.to_string(), "User has disabled market_prices alerts")
        }
        other => panic!("expected AlertTypeDisabled, got {other:?}"),
    }
}

#[tokio::test]
async fn should_report_provider_text_on_failed_send() {
    let admin = test_admin();
    let farmer = subscribed_farmer("ravi@example.com", "+919876543210", &[], "Nashik");
    let uc = SendAlertUseCase {
        users: MockUserRepo::new(vec![admin.clone(), farmer.clone()]),
        dispatcher: dispatcher(MockMessaging::failing_for(&["+919876543210"])),
    };
    let result = uc
        .execute(
            admin.id,
            SendAlertInput {
                user_id: farmer.id,
                alert_type: "generic".into(),
                alert_data: AlertData::default(),
            },
        )
        .await;
    match result {
        Err(ApiError::Upstream(message)) => {
            assert!(message.starts_with("Error sending alert: "), "{message}");
            assert!(message.contains("21211"));
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
}

// ── Bulk ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_continue_bulk_send_past_one_failure() {
    let admin = test_admin();
    let farmers = [
        subscribed_farmer("a@example.com", "+911111111111", &["rice"], "Thrissur"),
        subscribed_farmer("b@example.com", "+912222222222", &["rice"], "Thrissur"),
        subscribed_farmer("c@example.com", "+913333333333", &["rice"], "Thrissur"),
    ];
    let mut users = vec![admin.clone()];
    users.extend(farmers.iter().cloned());
    let messaging = MockMessaging::failing_for(&["+912222222222"]);
    let sent = messaging.sent_handle();

    let uc = BulkAlertUseCase {
        users: MockUserRepo::new(users),
        dispatcher: dispatcher(messaging),
    };
    let report = uc
        .execute(
            admin.id,
            BulkAlertInput {
                alert_type: "weather".into(),
                alert_data: AlertData::default(),
                filter: RecipientFilter::default(),
            },
        )
        .await
        .unwrap();

    assert_eq!(report.total_users, 3);
    assert_eq!(report.successful_alerts, 2);
    assert_eq!(report.failed_alerts, 1);
    let failed: Vec<_> = report.results.iter().filter(|r| !r.report.success).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].user_id, farmers[1].id);
    assert!(failed[0].report.error.is_some());
    assert_eq!(sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn should_narrow_bulk_audience_by_filter() {
    let admin = test_admin();
    let rice = subscribed_farmer("a@example.com", "+911111111111", &["rice"], "Thrissur");
    let wheat = subscribed_farmer("b@example.com", "+912222222222", &["wheat"], "Ludhiana");
    let uc = BulkAlertUseCase {
        users: MockUserRepo::new(vec![admin.clone(), rice.clone(), wheat]),
        dispatcher: dispatcher(MockMessaging::new()),
    };
    let report = uc
        .execute(
            admin.id,
            BulkAlertInput {
                alert_type: "crop_diseases".into(),
                alert_data: AlertData::default(),
                filter: RecipientFilter {
                    crop: Some("rice".to_owned()),
                    ..RecipientFilter::default()
                },
            },
        )
        .await
        .unwrap();
    assert_eq!(report.total_users, 1);
    assert_eq!(report.results[0].user_id, rice.id);
}

#[tokio::test]
async fn should_report_no_recipients() {
    let admin = test_admin();
    let uc = BulkAlertUseCase {
        users: MockUserRepo::new(vec![admin.clone(), test_user("ravi@example.com")]),
        dispatcher: dispatcher(MockMessaging::new()),
    };
    let result = uc
        .execute(
            admin.id,
            BulkAlertInput {
                alert_type: "generic".into(),
                alert_data: AlertData::default(),
                filter: RecipientFilter::default(),
            },
        )
        .await;
    assert!(matches!(result, Err(ApiError::NoRecipients)));
}

// ── Scheduled ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_send_weather_for_each_farm_location() {
    let pune = subscribed_farmer("a@example.com", "+911111111111", &[], "Pune");
    let mut nowhere = subscribed_farmer("b@example.com", "+912222222222", &[], "x");
    nowhere.profile.farm_location = None;
    let messaging = MockMessaging::new();
    let sent = messaging.sent_handle();

    let uc = AutoAlertUseCase {
        users: MockUserRepo::new(vec![pune, nowhere]),
        dispatcher: dispatcher(messaging),
    };
    let report = uc.run_weather().await.unwrap();

    assert_eq!(report.total_users, 2);
    assert_eq!(report.successful_alerts, 2);
    assert!(report.failures.is_empty());
    let sent = sent.lock().unwrap();
    assert!(sent.iter().any(|(_, body)| body.contains("Weather Alert for Pune")));
    assert!(sent.iter().any(|(_, body)| body.contains("Weather Alert for your area")));
}

#[tokio::test]
async fn should_alert_only_for_diseased_crops() {
    let farmer = subscribed_farmer(
        "a@example.com",
        "+911111111111",
        &["rice", "sugarcane", "tomato"],
        "Mandya",
    );
    let messaging = MockMessaging::new();
    let sent = messaging.sent_handle();
    let uc = AutoAlertUseCase {
        users: MockUserRepo::new(vec![farmer]),
        dispatcher: dispatcher(messaging),
    };

    let report = uc.run_crop_health().await.unwrap();
    assert_eq!(report.successful_alerts, 2, "sugarcane has no listed disease");
    let sent = sent.lock().unwrap();
    assert!(sent.iter().any(|(_, body)| body.contains("Blast")));
    assert!(sent.iter().any(|(_, body)| body.contains("Early blight")));
}

#[tokio::test]
async fn should_name_crop_in_scheduled_failure() {
    let farmer = subscribed_farmer("a@example.com", "+911111111111", &["potato"], "Agra");
    let uc = AutoAlertUseCase {
        users: MockUserRepo::new(vec![farmer.clone()]),
        dispatcher: dispatcher(MockMessaging::failing_for(&["+911111111111"])),
    };
    let report = uc.run_crop_health().await.unwrap();
    assert_eq!(report.failed_alerts, 1);
    assert_eq!(report.failures[0].user_id, farmer.id);
    assert_eq!(report.failures[0].crop.as_deref(), Some("potato"));
}
