use agriguru_api::error::ApiError;
use agriguru_api::usecase::contract::{
    ContractForm, ContractStatsUseCase, GetContractUseCase, ListContractsUseCase,
    SubmitContractUseCase, UpdateContractStatusUseCase,
};
use agriguru_domain::contract::{ContractId, ContractStatus};
use agriguru_testing::fixture::Fixture;

use crate::helpers::{MockContractRepo, MockUserRepo, test_admin, test_user};

fn application_form() -> ContractForm {
    serde_json::from_value(Fixture::load("tests/fixtures/contract_application.json")).unwrap()
}

async fn submitted(contracts: &MockContractRepo) -> ContractId {
    SubmitContractUseCase {
        contracts: contracts.clone(),
    }
    .execute(application_form())
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn should_store_application_pending_verification() {
    let contracts = MockContractRepo::empty();
    let stored = SubmitContractUseCase {
        contracts: contracts.clone(),
    }
    .execute(application_form())
    .await
    .unwrap();

    assert_eq!(stored.id.to_string(), "CF1000");
    assert_eq!(stored.status, ContractStatus::PendingVerification);
    assert_eq!(stored.contract_terms.terms.yearly_payment, 6000.0);
    assert_eq!(stored.contract_terms.terms.total_contract_value, 30000.0);
    assert_eq!(stored.banking_details.ifsc_code, "SBIN0070123");
    assert_eq!(stored.land_details.previous_crop.as_deref(), Some("Paddy"));
    assert!(stored.remarks.is_none());
    assert_eq!(contracts.applications_handle().lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_name_missing_fields_and_store_nothing() {
    let contracts = MockContractRepo::empty();
    let form = ContractForm {
        father_name: Some("  ".into()),
        land_area_satak: None,
        agree_training: None,
        ..application_form()
    };
    let result = SubmitContractUseCase {
        contracts: contracts.clone(),
    }
    .execute(form)
    .await;

    match result {
        Err(ApiError::Validation(message)) => assert_eq!(
            message,
            "Missing required fields: fatherName, landAreaSatak, agreeTraining"
        ),
        other => panic!("expected Validation, got {other:?}"),
    }
    assert!(contracts.applications_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_malformed_pin_code() {
    let form = ContractForm {
        pin_code: Some("68850".into()),
        ..application_form()
    };
    let result = SubmitContractUseCase {
        contracts: MockContractRepo::empty(),
    }
    .execute(form)
    .await;
    assert!(matches!(result, Err(ApiError::Validation(m)) if m == "PIN code must be 6 digits"));
}

#[tokio::test]
async fn should_find_application_by_display_id() {
    let contracts = MockContractRepo::empty();
    let id = submitted(&contracts).await;
    let uc = GetContractUseCase {
        contracts: contracts.clone(),
    };

    assert_eq!(uc.execute("CF1000").await.unwrap().id, id);
    for unknown in ["CF1001", "1000", "cf1000", ""] {
        let result = uc.execute(unknown).await;
        assert!(
            matches!(result, Err(ApiError::ContractNotFound)),
            "expected ContractNotFound for {unknown:?}, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_list_newest_first() {
    let contracts = MockContractRepo::empty();
    submitted(&contracts).await;
    submitted(&contracts).await;
    let list = ListContractsUseCase {
        contracts: contracts.clone(),
    }
    .execute()
    .await
    .unwrap();
    let ids: Vec<String> = list.iter().map(|a| a.id.to_string()).collect();
    assert_eq!(ids, ["CF1001", "CF1000"]);
}

#[tokio::test]
async fn should_let_only_admins_change_status() {
    let contracts = MockContractRepo::empty();
    submitted(&contracts).await;
    let farmer = test_user("ravi@example.com");
    let admin = test_admin();
    let uc = UpdateContractStatusUseCase {
        contracts: contracts.clone(),
        users: MockUserRepo::new(vec![farmer.clone(), admin.clone()]),
    };

    let refused = uc.execute(farmer.id, "CF1000", "approved", None).await;
    assert!(matches!(refused, Err(ApiError::Forbidden)), "got {refused:?}");

    let updated = uc
        .execute(admin.id, "CF1000", "under_review", Some(" Land records requested "))
        .await
        .unwrap();
    assert_eq!(updated.status, ContractStatus::UnderReview);
    assert_eq!(updated.remarks.as_deref(), Some("Land records requested"));
    assert!(updated.last_updated.is_some());

    let approved = uc.execute(admin.id, "CF1000", "approved", None).await.unwrap();
    assert_eq!(approved.status, ContractStatus::Approved);
    assert_eq!(
        approved.remarks.as_deref(),
        Some("Land records requested"),
        "omitted remarks keep the earlier ones"
    );

    let reopened = uc
        .execute(admin.id, "CF1000", "pending_verification", None)
        .await
        .unwrap();
    assert_eq!(reopened.status, ContractStatus::PendingVerification);
}

#[tokio::test]
async fn should_list_valid_options_for_unknown_status() {
    let contracts = MockContractRepo::empty();
    submitted(&contracts).await;
    let admin = test_admin();
    let uc = UpdateContractStatusUseCase {
        contracts,
        users: MockUserRepo::new(vec![admin.clone()]),
    };

    match uc.execute(admin.id, "CF1000", "archived", None).await {
        Err(ApiError::Validation(message)) => assert_eq!(
            message,
            "Invalid status. Valid options: pending_verification, under_review, approved, rejected, active, completed"
        ),
        other => panic!("expected Validation, got {other:?}"),
    }
    let missing = uc.execute(admin.id, "CF2000", "approved", None).await;
    assert!(matches!(missing, Err(ApiError::ContractNotFound)));
}

#[tokio::test]
async fn should_summarize_applications_by_status() {
    let contracts = MockContractRepo::empty();
    submitted(&contracts).await;
    submitted(&contracts).await;
    let admin = test_admin();
    UpdateContractStatusUseCase {
        contracts: contracts.clone(),
        users: MockUserRepo::new(vec![admin.clone()]),
    }
    .execute(admin.id, "CF1001", "approved", None)
    .await
    .unwrap();

    let stats = ContractStatsUseCase { contracts }.execute().await.unwrap();
    assert_eq!(stats.total_applications, 2);
    assert_eq!(stats.status_breakdown.get("approved"), Some(&1));
    assert_eq!(stats.status_breakdown.get("pending_verification"), Some(&1));
    assert_eq!(stats.total_land_area_satak, 24.0);
    assert_eq!(stats.total_contract_value, 60000.0);
    assert_eq!(stats.average_contract_value, 30000.0);
}
