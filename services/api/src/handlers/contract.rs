use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use agriguru_core::serde::{opt_to_rfc3339_ms, to_rfc3339_ms};
use agriguru_domain::contract::{ContractId, ContractStatus};

use crate::domain::types::{
    Address, BankingDetails, ContractAgreement, ContractApplication, LandDetails, PersonalInfo,
};
use crate::error::ApiError;
use crate::handlers::extract::ApiJson;
use crate::handlers::session::CurrentSession;
use crate::state::AppState;
use crate::usecase::contract::{
    ContractForm, ContractStatsUseCase, GetContractUseCase, LandArea, ListContractsUseCase,
    SubmitContractUseCase, UpdateContractStatusUseCase, calculate,
};

/// Stored application in the shape the contract-farming UI reads.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub contract_id: ContractId,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub submitted_at: DateTime<Utc>,
    pub status: ContractStatus,
    pub personal_info: PersonalInfo,
    pub address: Address,
    pub land_details: LandDetails,
    pub banking_details: BankingDetails,
    pub contract_terms: ContractAgreement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(
        serialize_with = "opt_to_rfc3339_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<ContractApplication> for ApplicationView {
    fn from(app: ContractApplication) -> Self {
        Self {
            contract_id: app.id,
            submitted_at: app.submitted_at,
            status: app.status,
            personal_info: app.personal_info,
            address: app.address,
            land_details: app.land_details,
            banking_details: app.banking_details,
            contract_terms: app.contract_terms,
            remarks: app.remarks,
            last_updated: app.last_updated,
        }
    }
}

// ── POST /contract-farming/submit ────────────────────────────────────────────

pub async fn submit(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<ContractForm>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = SubmitContractUseCase {
        contracts: state.contract_repo(),
    };
    let application = usecase.execute(form).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Contract application submitted successfully!",
            "contractId": application.id,
            "contractDetails": application.contract_terms,
        })),
    ))
}

// ── GET /contract-farming/applications ───────────────────────────────────────

pub async fn applications(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let usecase = ListContractsUseCase {
        contracts: state.contract_repo(),
    };
    let applications: Vec<ApplicationView> = usecase
        .execute()
        .await?
        .into_iter()
        .map(ApplicationView::from)
        .collect();
    Ok(Json(json!({
        "success": true,
        "total": applications.len(),
        "applications": applications,
    })))
}

// ── GET /contract-farming/application/{id} ───────────────────────────────────

pub async fn application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let usecase = GetContractUseCase {
        contracts: state.contract_repo(),
    };
    let application = usecase.execute(&id).await?;
    Ok(Json(json!({
        "success": true,
        "application": ApplicationView::from(application),
    })))
}

// ── PUT /contract-farming/application/{id}/status ────────────────────────────

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
    pub remarks: Option<String>,
}

pub async fn update_status(
    session: CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    let usecase = UpdateContractStatusUseCase {
        contracts: state.contract_repo(),
        users: state.user_repo(),
    };
    let application = usecase
        .execute(session.user_id, &id, &body.status, body.remarks.as_deref())
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Contract status updated to {}", application.status),
        "application": ApplicationView::from(application),
    })))
}

// ── POST /contract-farming/calculate ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    #[serde(default)]
    pub land_area_satak: Option<LandArea>,
}

pub async fn calculate_terms(ApiJson(body): ApiJson<CalculateRequest>) -> Result<Json<Value>, ApiError> {
    let terms = calculate(body.land_area_satak.as_ref())?;
    Ok(Json(json!({ "success": true, "calculations": terms })))
}

// ── GET /contract-farming/stats ──────────────────────────────────────────────

pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let usecase = ContractStatsUseCase {
        contracts: state.contract_repo(),
    };
    Ok(Json(json!({
        "success": true,
        "stats": usecase.execute().await?,
    })))
}
