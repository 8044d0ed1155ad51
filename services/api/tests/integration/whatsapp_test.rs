use chrono::{Duration, Utc};

use agriguru_api::domain::types::AlertPreferences;
use agriguru_api::error::ApiError;
use agriguru_api::usecase::notify::TEST_MESSAGE;
use agriguru_api::usecase::whatsapp::{
    ConfirmVerificationUseCase, SendTestUseCase, StartVerificationUseCase, UpdatePreferencesInput,
    UpdatePreferencesUseCase, WhatsAppStatusUseCase,
};

use crate::helpers::{MockMessaging, MockUserRepo, dispatcher, subscribed_farmer, test_user};

#[tokio::test]
async fn should_verify_number_with_texted_code() {
    let user = test_user("ravi@example.com");
    let users = MockUserRepo::new(vec![user.clone()]);
    let messaging = MockMessaging::new();
    let sent = messaging.sent_handle();

    StartVerificationUseCase {
        users: users.clone(),
        dispatcher: dispatcher(messaging),
    }
    .execute(user.id, "919812345678")
    .await
    .unwrap();

    let pending = users.get(user.id).whatsapp;
    let code = pending.verification_code.clone().unwrap();
    assert_eq!(code.len(), 6);
    assert!(!pending.verified);
    assert!(pending.code_expires_at.unwrap() > Utc::now() + Duration::minutes(14));
    {
        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].0, "+919812345678");
        assert!(sent[0].1.contains(&format!("verification code is: {code}")));
    }

    let settings = ConfirmVerificationUseCase {
        users: users.clone(),
    }
    .execute(user.id, &code)
    .await
    .unwrap();
    assert!(settings.verified);
    assert!(settings.enabled);
    assert_eq!(settings.number.as_deref(), Some("919812345678"));
    assert!(users.get(user.id).whatsapp.verification_code.is_none());
}

#[tokio::test]
async fn should_reject_wrong_or_missing_code() {
    let user = test_user("ravi@example.com");
    let users = MockUserRepo::new(vec![user.clone()]);
    let confirm = ConfirmVerificationUseCase {
        users: users.clone(),
    };

    let none_pending = confirm.execute(user.id, "123456").await;
    assert!(
        matches!(none_pending, Err(ApiError::NoVerificationPending)),
        "expected NoVerificationPending, got {none_pending:?}"
    );

    StartVerificationUseCase {
        users: users.clone(),
        dispatcher: dispatcher(MockMessaging::new()),
    }
    .execute(user.id, "+919812345678")
    .await
    .unwrap();
    let code = users.get(user.id).whatsapp.verification_code.unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let result = confirm.execute(user.id, wrong).await;
    assert!(matches!(result, Err(ApiError::InvalidVerificationCode)));
    assert!(!users.get(user.id).whatsapp.verified);

    let blank = confirm.execute(user.id, "  ").await;
    assert!(matches!(blank, Err(ApiError::Validation(_))));
}

#[tokio::test]
async fn should_reject_expired_code() {
    let mut user = test_user("ravi@example.com");
    user.whatsapp.number = Some("+919812345678".to_owned());
    user.whatsapp.verification_code = Some("424242".to_owned());
    user.whatsapp.code_expires_at = Some(Utc::now() - Duration::seconds(1));
    let uc = ConfirmVerificationUseCase {
        users: MockUserRepo::new(vec![user.clone()]),
    };
    let result = uc.execute(user.id, "424242").await;
    assert!(matches!(result, Err(ApiError::InvalidVerificationCode)));
}

#[tokio::test]
async fn should_keep_code_stored_when_send_fails() {
    let user = test_user("ravi@example.com");
    let users = MockUserRepo::new(vec![user.clone()]);
    let result = StartVerificationUseCase {
        users: users.clone(),
        dispatcher: dispatcher(MockMessaging::failing_for(&["+910000000000"])),
    }
    .execute(user.id, "+910000000000")
    .await;

    match result {
        Err(ApiError::Upstream(message)) => {
            assert!(message.starts_with("Error sending verification: "), "{message}")
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
    assert!(users.get(user.id).whatsapp.verification_code.is_some());
}

#[tokio::test]
async fn should_require_fresh_verification_after_number_change() {
    let farmer = subscribed_farmer("ravi@example.com", "+919876543210", &[], "Nashik");
    let users = MockUserRepo::new(vec![farmer.clone()]);
    let uc = UpdatePreferencesUseCase {
        users: users.clone(),
    };

    let same = uc
        .execute(
            farmer.id,
            UpdatePreferencesInput {
                whatsapp_number: Some("919876543210".to_owned()),
                enabled: Some(true),
                alert_preferences: Some(AlertPreferences {
                    weather: false,
                    ..AlertPreferences::default()
                }),
            },
        )
        .await
        .unwrap();
    assert!(same.verified, "same number after normalizing keeps verification");
    assert!(!same.alert_preferences.weather);

    let changed = uc
        .execute(
            farmer.id,
            UpdatePreferencesInput {
                whatsapp_number: Some("+919000000001".to_owned()),
                enabled: None,
                alert_preferences: None,
            },
        )
        .await
        .unwrap();
    assert!(!changed.verified);
    assert!(!changed.enabled, "omitted flag reads as disabled");
    assert!(changed.alert_preferences.weather, "omitted preferences reset to defaults");
    assert_eq!(users.get(farmer.id).whatsapp, changed);
}

#[tokio::test]
async fn should_report_provider_configuration_in_status() {
    let user = test_user("ravi@example.com");
    let unconfigured = MockMessaging {
        unconfigured: true,
        ..MockMessaging::new()
    };
    let status = WhatsAppStatusUseCase {
        users: MockUserRepo::new(vec![user.clone()]),
        provider: unconfigured,
    }
    .execute(user.id)
    .await
    .unwrap();
    assert!(!status.configured);
    assert_eq!(status.settings.number.as_deref(), Some("+919876543210"));
    assert!(!status.settings.verified);
}

#[tokio::test]
async fn should_send_test_message_only_to_verified_number() {
    let unverified = test_user("ravi@example.com");
    let farmer = subscribed_farmer("meena@example.com", "+919812345678", &[], "Pune");
    let messaging = MockMessaging::new();
    let sent = messaging.sent_handle();
    let uc = SendTestUseCase {
        users: MockUserRepo::new(vec![unverified.clone(), farmer.clone()]),
        dispatcher: dispatcher(messaging),
    };

    let refused = uc.execute(unverified.id).await;
    assert!(matches!(refused, Err(ApiError::WhatsAppNotVerified)));

    let report = uc.execute(farmer.id).await.unwrap();
    assert_eq!(report.status.as_deref(), Some("queued"));
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.ends_with(TEST_MESSAGE));
}
