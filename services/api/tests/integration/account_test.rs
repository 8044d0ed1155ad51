use chrono::Utc;

use agriguru_api::domain::password::verify_password;
use agriguru_api::domain::types::{GoogleIdentity, OtpPurpose, OtpRecord};
use agriguru_api::error::ApiError;
use agriguru_api::usecase::account::{
    ChangePasswordUseCase, GoogleLoginUseCase, ListFarmersUseCase, PasswordLoginUseCase,
    ResetPasswordUseCase, SignupInput, SignupUseCase, SignupWithOtpInput, SignupWithOtpUseCase,
    UpdateProfileInput, UpdateProfileUseCase,
};
use agriguru_api::usecase::session::{CheckAuthUseCase, LogoutUseCase};

use crate::helpers::{
    MockIdentity, MockOtpRepo, MockSessionStore, MockUserRepo, TEST_PASSWORD, test_user,
};

fn signup_input(email: &str, password: &str) -> SignupInput {
    SignupInput {
        email: email.to_owned(),
        password: password.to_owned(),
        full_name: " Meena Devi ".to_owned(),
        phone: Some("+919812345678".to_owned()),
    }
}

// ── Signup ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_unverified_account_with_defaults() {
    let users = MockUserRepo::empty();
    let uc = SignupUseCase {
        users: users.clone(),
    };
    let user = uc
        .execute(signup_input("Meena@Example.com", "Kharif2025"))
        .await
        .unwrap();

    assert_eq!(user.email, "meena@example.com");
    assert_eq!(user.full_name, "Meena Devi");
    assert!(user.is_active);
    assert!(!user.email_verified);
    assert_eq!(user.profile.language_preference, "en");
    assert!(user.profile.crops.is_empty());
    assert_eq!(user.whatsapp.number.as_deref(), Some("+919812345678"));
    assert!(!user.whatsapp.enabled);
    assert!(!user.whatsapp.verified);
    assert!(user.whatsapp.alert_preferences.weather);

    let stored = users.get(user.id);
    let hash = stored.password_hash.unwrap();
    assert_ne!(hash, "Kharif2025", "password must not be stored in clear");
    assert!(verify_password("Kharif2025", &hash).unwrap());
}

#[tokio::test]
async fn should_reject_duplicate_email() {
    let uc = SignupUseCase {
        users: MockUserRepo::new(vec![test_user("meena@example.com")]),
    };
    let result = uc.execute(signup_input("meena@example.com", "Kharif2025")).await;
    assert!(matches!(result, Err(ApiError::AccountExists)));
}

#[tokio::test]
async fn should_reject_weak_password_with_first_unmet_rule() {
    let uc = SignupUseCase {
        users: MockUserRepo::empty(),
    };
    let result = uc.execute(signup_input("meena@example.com", "kharif2025")).await;
    match result {
        Err(ApiError::Validation(message)) => assert_eq!(
            message,
            "Password must contain at least one uppercase letter"
        ),
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn should_create_verified_account_and_session_with_signup_code() {
    let users = MockUserRepo::empty();
    let sessions = MockSessionStore::empty();
    let stored = sessions.sessions_handle();
    let record = OtpRecord::issue(
        "meena@example.com".to_owned(),
        "908172".to_owned(),
        OtpPurpose::Signup,
        Utc::now(),
    );
    let uc = SignupWithOtpUseCase {
        users: users.clone(),
        otps: MockOtpRepo::new(vec![record]),
        sessions,
    };

    let output = uc
        .execute(SignupWithOtpInput {
            email: "meena@example.com".to_owned(),
            password: "Kharif2025".to_owned(),
            full_name: "Meena Devi".to_owned(),
            phone: None,
            otp: "908172".to_owned(),
        })
        .await
        .unwrap();

    assert!(output.user.email_verified);
    assert!(users.get(output.user.id).email_verified);
    assert_eq!(stored.lock().unwrap()[0].0, output.session_id);
}

#[tokio::test]
async fn should_not_create_account_with_wrong_signup_code() {
    let users = MockUserRepo::empty();
    let handle = users.users_handle();
    let uc = SignupWithOtpUseCase {
        users,
        otps: MockOtpRepo::empty(),
        sessions: MockSessionStore::empty(),
    };
    let result = uc
        .execute(SignupWithOtpInput {
            email: "meena@example.com".to_owned(),
            password: "Kharif2025".to_owned(),
            full_name: "Meena Devi".to_owned(),
            phone: None,
            otp: "000000".to_owned(),
        })
        .await;
    assert!(matches!(result, Err(ApiError::InvalidOrExpiredOtp)));
    assert!(handle.lock().unwrap().is_empty());
}

// ── Login ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_log_in_with_correct_password() {
    let user = test_user("ravi@example.com");
    let uc = PasswordLoginUseCase {
        users: MockUserRepo::new(vec![user.clone()]),
        sessions: MockSessionStore::empty(),
    };
    let output = uc.execute("ravi@example.com", TEST_PASSWORD).await.unwrap();
    assert_eq!(output.user.id, user.id);
    assert!(!output.session_id.is_empty());
}

#[tokio::test]
async fn should_give_same_error_for_unknown_email_and_wrong_password() {
    let uc = PasswordLoginUseCase {
        users: MockUserRepo::new(vec![test_user("ravi@example.com")]),
        sessions: MockSessionStore::empty(),
    };
    let unknown = uc.execute("nobody@example.com", TEST_PASSWORD).await;
    let wrong = uc.execute("ravi@example.com", "Wrong12345").await;
    assert!(matches!(unknown, Err(ApiError::InvalidCredentials)));
    assert!(matches!(wrong, Err(ApiError::InvalidCredentials)));
}

#[tokio::test]
async fn should_refuse_password_login_for_google_only_account() {
    let mut user = test_user("ravi@example.com");
    user.password_hash = None;
    let uc = PasswordLoginUseCase {
        users: MockUserRepo::new(vec![user]),
        sessions: MockSessionStore::empty(),
    };
    let result = uc.execute("ravi@example.com", TEST_PASSWORD).await;
    assert!(matches!(result, Err(ApiError::InvalidCredentials)));
}

#[tokio::test]
async fn should_refuse_login_for_deactivated_account() {
    let mut user = test_user("ravi@example.com");
    user.is_active = false;
    let uc = PasswordLoginUseCase {
        users: MockUserRepo::new(vec![user]),
        sessions: MockSessionStore::empty(),
    };
    let result = uc.execute("ravi@example.com", TEST_PASSWORD).await;
    assert!(matches!(result, Err(ApiError::AccountDeactivated)));
}

// ── Google ───────────────────────────────────────────────────────────────────

fn google(email: &str) -> MockIdentity {
    MockIdentity {
        token: "google-token".to_owned(),
        identity: GoogleIdentity {
            subject: "1098765".to_owned(),
            email: email.to_owned(),
            name: Some("Lakshmi Rao".to_owned()),
            picture: Some("https://example.com/lakshmi.png".to_owned()),
        },
    }
}

#[tokio::test]
async fn should_create_passwordless_account_on_first_google_login() {
    let users = MockUserRepo::empty();
    let uc = GoogleLoginUseCase {
        users: users.clone(),
        google: google("lakshmi@example.com"),
        sessions: MockSessionStore::empty(),
    };
    let output = uc.execute("google-token").await.unwrap();

    let stored = users.get(output.user.id);
    assert!(stored.password_hash.is_none());
    assert!(stored.email_verified);
    assert_eq!(stored.google_id.as_deref(), Some("1098765"));
    assert_eq!(
        stored.profile_image.as_deref(),
        Some("https://example.com/lakshmi.png")
    );
    assert_eq!(stored.full_name, "Lakshmi Rao");
}

#[tokio::test]
async fn should_link_google_id_to_existing_account_once() {
    let mut linked = test_user("lakshmi@example.com");
    linked.google_id = Some("original-subject".to_owned());
    let users = MockUserRepo::new(vec![linked.clone()]);
    let uc = GoogleLoginUseCase {
        users: users.clone(),
        google: google("lakshmi@example.com"),
        sessions: MockSessionStore::empty(),
    };
    uc.execute("google-token").await.unwrap();
    assert_eq!(
        users.get(linked.id).google_id.as_deref(),
        Some("original-subject"),
        "an existing link is never overwritten"
    );
    assert_eq!(users.users_handle().lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_reject_unverifiable_google_token() {
    let uc = GoogleLoginUseCase {
        users: MockUserRepo::empty(),
        google: google("lakshmi@example.com"),
        sessions: MockSessionStore::empty(),
    };
    assert!(uc.execute("forged").await.is_err());
    assert!(matches!(
        uc.execute("  ").await,
        Err(ApiError::Validation(_))
    ));
}

// ── Passwords ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_change_password_after_checking_old_one() {
    let user = test_user("ravi@example.com");
    let users = MockUserRepo::new(vec![user.clone()]);
    let uc = ChangePasswordUseCase {
        users: users.clone(),
    };

    let wrong = uc.execute(user.id, "NotIt12345", "Rabi2026x").await;
    match wrong {
        Err(ApiError::Validation(message)) => assert_eq!(message, "Current password is incorrect"),
        other => panic!("expected Validation, got {other:?}"),
    }

    uc.execute(user.id, TEST_PASSWORD, "Rabi2026x").await.unwrap();
    let stored = users.get(user.id);
    assert!(verify_password("Rabi2026x", stored.password_hash.as_deref().unwrap()).unwrap());
    assert!(stored.password_changed_at.is_some());
}

#[tokio::test]
async fn should_reset_password_with_reset_code() {
    let user = test_user("ravi@example.com");
    let users = MockUserRepo::new(vec![user.clone()]);
    let record = OtpRecord::issue(
        user.email.clone(),
        "424242".to_owned(),
        OtpPurpose::Reset,
        Utc::now(),
    );
    let uc = ResetPasswordUseCase {
        users: users.clone(),
        otps: MockOtpRepo::new(vec![record]),
    };

    uc.execute("ravi@example.com", "424242", "Monsoon2025")
        .await
        .unwrap();
    let stored = users.get(user.id);
    assert!(verify_password("Monsoon2025", stored.password_hash.as_deref().unwrap()).unwrap());

    let replay = uc.execute("ravi@example.com", "424242", "Monsoon2026").await;
    assert!(matches!(replay, Err(ApiError::InvalidOrExpiredOtp)));
}

// ── Sessions ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_forget_session_after_logout() {
    let user = test_user("ravi@example.com");
    let sessions = MockSessionStore::empty();
    let login = PasswordLoginUseCase {
        users: MockUserRepo::new(vec![user.clone()]),
        sessions: sessions.clone(),
    };
    let session_id = login
        .execute("ravi@example.com", TEST_PASSWORD)
        .await
        .unwrap()
        .session_id;

    let check = CheckAuthUseCase {
        sessions: sessions.clone(),
    };
    let data = check.execute(Some(&session_id)).await.unwrap().unwrap();
    assert_eq!(data.user_id, user.id);
    assert_eq!(data.user_email, "ravi@example.com");

    LogoutUseCase {
        sessions: sessions.clone(),
    }
    .execute(Some(&session_id))
    .await;
    assert!(check.execute(Some(&session_id)).await.unwrap().is_none());
    assert!(check.execute(None).await.unwrap().is_none());
}

// ── Profile ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_replace_profile_and_default_language() {
    let user = test_user("ravi@example.com");
    let users = MockUserRepo::new(vec![user.clone()]);
    let uc = UpdateProfileUseCase {
        users: users.clone(),
    };
    let profile = uc
        .execute(
            user.id,
            UpdateProfileInput {
                farm_location: Some("Nashik".to_owned()),
                farm_size: Some(2.5),
                crops: Some(vec!["onion".to_owned(), " ".to_owned(), "grapes".to_owned()]),
                language_preference: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(profile.crops, vec!["onion", "grapes"]);
    assert_eq!(profile.language_preference, "en");
    assert_eq!(users.get(user.id).profile, profile);
}

#[tokio::test]
async fn should_list_only_active_farmers() {
    let active = test_user("ravi@example.com");
    let mut inactive = test_user("old@example.com");
    inactive.is_active = false;
    let uc = ListFarmersUseCase {
        users: MockUserRepo::new(vec![active.clone(), inactive]),
    };
    let farmers = uc.execute().await.unwrap();
    assert_eq!(farmers.len(), 1);
    assert_eq!(farmers[0].id, active.id);
}
