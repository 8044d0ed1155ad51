use chrono::{Duration, Utc};

use agriguru_api::domain::types::{OtpPurpose, OtpRecord};
use agriguru_api::error::ApiError;
use agriguru_api::usecase::otp::{
    OtpLoginUseCase, RequestOtpInput, RequestOtpUseCase, VerifyOtpUseCase,
};

use crate::helpers::{MockMailer, MockOtpRepo, MockSessionStore, MockUserRepo, test_user};

#[tokio::test]
async fn should_store_and_mail_login_code_for_known_user() {
    let user = test_user("ravi@example.com");
    let otps = MockOtpRepo::empty();
    let records = otps.records_handle();
    let mailer = MockMailer::new();
    let sent = mailer.sent_handle();

    let uc = RequestOtpUseCase {
        users: MockUserRepo::new(vec![user]),
        otps,
        mailer,
    };
    let output = uc
        .execute(RequestOtpInput {
            email: "  Ravi@Example.com ".to_owned(),
            purpose: OtpPurpose::Login,
        })
        .await
        .unwrap();

    assert_eq!(output.email, "ravi@example.com");
    assert_eq!(output.expires_in, 600);

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 1);
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "ravi@example.com");
    assert_eq!(sent[0].1, records[0].code, "mailed code must match stored code");
}

#[tokio::test]
async fn should_replace_previous_code_for_same_purpose() {
    let user = test_user("ravi@example.com");
    let otps = MockOtpRepo::empty();
    let records = otps.records_handle();
    let uc = RequestOtpUseCase {
        users: MockUserRepo::new(vec![user]),
        otps,
        mailer: MockMailer::new(),
    };

    for _ in 0..3 {
        uc.execute(RequestOtpInput {
            email: "ravi@example.com".to_owned(),
            purpose: OtpPurpose::Login,
        })
        .await
        .unwrap();
    }
    assert_eq!(records.lock().unwrap().len(), 1, "only the newest code survives");
}

#[tokio::test]
async fn should_reject_login_code_for_unknown_email() {
    let uc = RequestOtpUseCase {
        users: MockUserRepo::empty(),
        otps: MockOtpRepo::empty(),
        mailer: MockMailer::new(),
    };
    let result = uc
        .execute(RequestOtpInput {
            email: "nobody@example.com".to_owned(),
            purpose: OtpPurpose::Login,
        })
        .await;
    assert!(
        matches!(result, Err(ApiError::UserNotFound)),
        "expected UserNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_signup_code_for_existing_account() {
    let uc = RequestOtpUseCase {
        users: MockUserRepo::new(vec![test_user("ravi@example.com")]),
        otps: MockOtpRepo::empty(),
        mailer: MockMailer::new(),
    };
    let result = uc
        .execute(RequestOtpInput {
            email: "ravi@example.com".to_owned(),
            purpose: OtpPurpose::Signup,
        })
        .await;
    assert!(matches!(result, Err(ApiError::AccountExists)));
}

#[tokio::test]
async fn should_surface_mail_failure() {
    let uc = RequestOtpUseCase {
        users: MockUserRepo::empty(),
        otps: MockOtpRepo::empty(),
        mailer: MockMailer::failing(),
    };
    let result = uc
        .execute(RequestOtpInput {
            email: "new@example.com".to_owned(),
            purpose: OtpPurpose::Signup,
        })
        .await;
    assert!(matches!(result, Err(ApiError::Upstream(_))));
}

#[tokio::test]
async fn should_accept_code_exactly_once() {
    let record = OtpRecord::issue(
        "ravi@example.com".to_owned(),
        "123456".to_owned(),
        OtpPurpose::Signup,
        Utc::now(),
    );
    let uc = VerifyOtpUseCase {
        otps: MockOtpRepo::new(vec![record]),
    };

    uc.execute("ravi@example.com", "123456", OtpPurpose::Signup)
        .await
        .unwrap();
    let replay = uc
        .execute("ravi@example.com", "123456", OtpPurpose::Signup)
        .await;
    assert!(
        matches!(replay, Err(ApiError::InvalidOrExpiredOtp)),
        "expected InvalidOrExpiredOtp, got {replay:?}"
    );
}

#[tokio::test]
async fn should_not_accept_code_for_other_purpose_or_after_expiry() {
    let issued = Utc::now() - Duration::minutes(11);
    let stale = OtpRecord::issue(
        "ravi@example.com".to_owned(),
        "111111".to_owned(),
        OtpPurpose::Login,
        issued,
    );
    let fresh = OtpRecord::issue(
        "ravi@example.com".to_owned(),
        "222222".to_owned(),
        OtpPurpose::Reset,
        Utc::now(),
    );
    let uc = VerifyOtpUseCase {
        otps: MockOtpRepo::new(vec![stale, fresh]),
    };

    let expired = uc.execute("ravi@example.com", "111111", OtpPurpose::Login).await;
    assert!(matches!(expired, Err(ApiError::InvalidOrExpiredOtp)));
    let wrong_purpose = uc.execute("ravi@example.com", "222222", OtpPurpose::Login).await;
    assert!(matches!(wrong_purpose, Err(ApiError::InvalidOrExpiredOtp)));
}

#[tokio::test]
async fn should_open_session_on_login_code() {
    let user = test_user("ravi@example.com");
    let users = MockUserRepo::new(vec![user.clone()]);
    let record = OtpRecord::issue(
        user.email.clone(),
        "654321".to_owned(),
        OtpPurpose::Login,
        Utc::now(),
    );
    let sessions = MockSessionStore::empty();
    let stored = sessions.sessions_handle();

    let uc = OtpLoginUseCase {
        users: users.clone(),
        otps: MockOtpRepo::new(vec![record]),
        sessions,
    };
    let output = uc.execute("RAVI@example.com", "654321").await.unwrap();

    assert_eq!(output.user.id, user.id);
    assert!(output.user.last_login.is_some());
    assert!(users.get(user.id).last_login.is_some());

    let stored = stored.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].0, output.session_id);
    assert_eq!(stored[0].1.user_id, user.id);
}

#[tokio::test]
async fn should_refuse_login_code_for_deactivated_account() {
    let mut user = test_user("ravi@example.com");
    user.is_active = false;
    let record = OtpRecord::issue(
        user.email.clone(),
        "654321".to_owned(),
        OtpPurpose::Login,
        Utc::now(),
    );
    let sessions = MockSessionStore::empty();
    let stored = sessions.sessions_handle();
    let uc = OtpLoginUseCase {
        users: MockUserRepo::new(vec![user]),
        otps: MockOtpRepo::new(vec![record]),
        sessions,
    };

    let result = uc.execute("ravi@example.com", "654321").await;
    assert!(matches!(result, Err(ApiError::AccountDeactivated)));
    assert!(stored.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_not_reveal_whether_account_exists_on_wrong_code() {
    for users in [
        MockUserRepo::empty(),
        MockUserRepo::new(vec![test_user("a@b.com")]),
    ] {
        let sessions = MockSessionStore::empty();
        let stored = sessions.sessions_handle();
        let uc = OtpLoginUseCase {
            users,
            otps: MockOtpRepo::empty(),
            sessions,
        };

        let result = uc.execute("a@b.com", "000000").await;
        assert!(
            matches!(result, Err(ApiError::InvalidOrExpiredOtp)),
            "got {result:?}"
        );
        assert!(stored.lock().unwrap().is_empty());
    }
}
