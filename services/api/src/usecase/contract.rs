use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use agriguru_domain::contract::{ContractId, ContractStatus, ContractTerms};

use crate::domain::repository::{ContractRepository, UserRepository};
use crate::domain::types::{
    Address, BankingDetails, ContractAgreement, ContractApplication, LandDetails,
    NewContractApplication, PersonalInfo,
};
use crate::error::ApiError;
use crate::usecase::notify::require_admin;

/// Land area as sent by forms: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LandArea {
    Number(f64),
    Text(String),
}

impl LandArea {
    fn parse(&self) -> Result<f64, ApiError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| ApiError::validation("Invalid land area format")),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Self::Number(n) => *n == 0.0,
            Self::Text(s) => s.trim().is_empty(),
        }
    }
}

/// Flat submission form, exactly as the client posts it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractForm {
    pub full_name: Option<String>,
    pub father_name: Option<String>,
    pub phone_number: Option<String>,
    pub email_address: Option<String>,
    pub aadhar_number: Option<String>,
    pub village: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub pin_code: Option<String>,
    pub land_area_satak: Option<LandArea>,
    pub land_location: Option<String>,
    pub soil_type: Option<String>,
    pub water_source: Option<String>,
    pub previous_crop: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub agree_terms: Option<bool>,
    pub agree_training: Option<bool>,
    pub agree_wages: Option<bool>,
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_owned()).unwrap_or_default()
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn digits_exactly(value: &str, len: usize) -> bool {
    let compact: String = value.chars().filter(|c| *c != ' ').collect();
    compact.len() == len && compact.bytes().all(|b| b.is_ascii_digit())
}

impl ContractForm {
    /// Names of required fields that are absent, blank, zero or not agreed.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let checks = [
            ("fullName", filled(&self.full_name)),
            ("fatherName", filled(&self.father_name)),
            ("phoneNumber", filled(&self.phone_number)),
            ("aadharNumber", filled(&self.aadhar_number)),
            ("village", filled(&self.village)),
            ("district", filled(&self.district)),
            ("state", filled(&self.state)),
            ("pinCode", filled(&self.pin_code)),
            (
                "landAreaSatak",
                self.land_area_satak.as_ref().is_some_and(|a| !a.is_blank()),
            ),
            ("landLocation", filled(&self.land_location)),
            ("soilType", filled(&self.soil_type)),
            ("waterSource", filled(&self.water_source)),
            ("bankName", filled(&self.bank_name)),
            ("accountNumber", filled(&self.account_number)),
            ("ifscCode", filled(&self.ifsc_code)),
            ("agreeTerms", self.agree_terms == Some(true)),
            ("agreeTraining", self.agree_training == Some(true)),
            ("agreeWages", self.agree_wages == Some(true)),
        ];
        checks
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect()
    }

    /// Check the form and shape it into a pending application.
    pub fn validate(self) -> Result<NewContractApplication, ApiError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ApiError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
        let phone = text(self.phone_number);
        if !digits_exactly(&phone, 10) {
            return Err(ApiError::validation("Phone number must be 10 digits"));
        }
        let aadhar = text(self.aadhar_number);
        if !digits_exactly(&aadhar, 12) {
            return Err(ApiError::validation("Aadhar number must be 12 digits"));
        }
        let pin_code = text(self.pin_code);
        if pin_code.len() != 6 || !pin_code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ApiError::validation("PIN code must be 6 digits"));
        }
        let land_area = match &self.land_area_satak {
            Some(area) => area.parse()?,
            None => 0.0,
        };
        let terms =
            ContractTerms::for_land_area(land_area).map_err(|e| ApiError::validation(e.to_string()))?;

        Ok(NewContractApplication {
            submitted_at: Utc::now(),
            status: ContractStatus::PendingVerification,
            personal_info: PersonalInfo {
                full_name: text(self.full_name),
                father_name: text(self.father_name),
                phone_number: phone,
                email_address: optional(self.email_address),
                aadhar_number: aadhar,
            },
            address: Address {
                village: text(self.village),
                district: text(self.district),
                state: text(self.state),
                pin_code,
            },
            land_details: LandDetails {
                land_area_satak: land_area,
                land_location: text(self.land_location),
                soil_type: text(self.soil_type),
                water_source: text(self.water_source),
                previous_crop: optional(self.previous_crop),
            },
            banking_details: BankingDetails {
                bank_name: text(self.bank_name),
                account_number: text(self.account_number),
                ifsc_code: text(self.ifsc_code).to_uppercase(),
            },
            contract_terms: ContractAgreement {
                terms,
                agree_terms: true,
                agree_training: true,
                agree_wages: true,
            },
        })
    }
}

// ── Calculate ────────────────────────────────────────────────────────────────

/// Preview the terms for a land area without storing anything.
pub fn calculate(land_area: Option<&LandArea>) -> Result<ContractTerms, ApiError> {
    let area = match land_area {
        Some(area) => area.parse()?,
        None => 0.0,
    };
    ContractTerms::for_land_area(area).map_err(|e| ApiError::validation(e.to_string()))
}

// ── Submit ───────────────────────────────────────────────────────────────────

pub struct SubmitContractUseCase<C: ContractRepository> {
    pub contracts: C,
}

impl<C: ContractRepository> SubmitContractUseCase<C> {
    pub async fn execute(&self, form: ContractForm) -> Result<ContractApplication, ApiError> {
        let new = form.validate()?;
        let stored = self.contracts.insert(&new).await?;
        info!(
            contract_id = %stored.id,
            land_area = stored.land_details.land_area_satak,
            "contract application submitted"
        );
        Ok(stored)
    }
}

// ── Read ─────────────────────────────────────────────────────────────────────

pub struct ListContractsUseCase<C: ContractRepository> {
    pub contracts: C,
}

impl<C: ContractRepository> ListContractsUseCase<C> {
    pub async fn execute(&self) -> Result<Vec<ContractApplication>, ApiError> {
        self.contracts.list().await
    }
}

pub struct GetContractUseCase<C: ContractRepository> {
    pub contracts: C,
}

impl<C: ContractRepository> GetContractUseCase<C> {
    pub async fn execute(&self, id: &str) -> Result<ContractApplication, ApiError> {
        let id: ContractId = id.parse().map_err(|_| ApiError::ContractNotFound)?;
        self.contracts
            .find(id)
            .await?
            .ok_or(ApiError::ContractNotFound)
    }
}

// ── UpdateStatus ─────────────────────────────────────────────────────────────

pub struct UpdateContractStatusUseCase<C: ContractRepository, U: UserRepository> {
    pub contracts: C,
    pub users: U,
}

impl<C: ContractRepository, U: UserRepository> UpdateContractStatusUseCase<C, U> {
    /// Any status may follow any other; only admins may change it.
    pub async fn execute(
        &self,
        caller: Uuid,
        id: &str,
        status: &str,
        remarks: Option<&str>,
    ) -> Result<ContractApplication, ApiError> {
        require_admin(&self.users, caller).await?;
        let status: ContractStatus = status.trim().parse().map_err(|_| {
            ApiError::validation(format!(
                "Invalid status. Valid options: {}",
                ContractStatus::valid_options()
            ))
        })?;
        let id: ContractId = id.parse().map_err(|_| ApiError::ContractNotFound)?;
        let remarks = remarks.map(str::trim).filter(|r| !r.is_empty());

        let updated = self
            .contracts
            .update_status(id, status, remarks, Utc::now())
            .await?
            .ok_or(ApiError::ContractNotFound)?;
        info!(contract_id = %id, status = %status, "contract status updated");
        Ok(updated)
    }
}

// ── Stats ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractStats {
    pub total_applications: usize,
    pub status_breakdown: BTreeMap<&'static str, usize>,
    pub total_land_area_satak: f64,
    pub total_contract_value: f64,
    pub average_land_area: f64,
    pub average_contract_value: f64,
}

pub fn summarize(applications: &[ContractApplication]) -> ContractStats {
    let mut status_breakdown = BTreeMap::new();
    let mut total_land_area_satak = 0.0;
    let mut total_contract_value = 0.0;
    for app in applications {
        *status_breakdown.entry(app.status.as_str()).or_insert(0) += 1;
        total_land_area_satak += app.land_details.land_area_satak;
        total_contract_value += app.contract_terms.terms.total_contract_value;
    }
    let count = applications.len();
    let average = |total: f64| if count == 0 { 0.0 } else { total / count as f64 };
    ContractStats {
        total_applications: count,
        status_breakdown,
        total_land_area_satak,
        total_contract_value,
        average_land_area: average(total_land_area_satak),
        average_contract_value: average(total_contract_value),
    }
}

pub struct ContractStatsUseCase<C: ContractRepository> {
    pub contracts: C,
}

impl<C: ContractRepository> ContractStatsUseCase<C> {
    pub async fn execute(&self) -> Result<ContractStats, ApiError> {
        Ok(summarize(&self.contracts.list().await?))
    }
}
