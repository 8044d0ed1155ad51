//! Contract-farming vocabulary and term arithmetic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Yearly payment per satak of leased land, in rupees.
pub const RATE_PER_SATAK: f64 = 500.0;

/// Contract length in years.
pub const CONTRACT_DURATION_YEARS: u32 = 5;

/// One-time training allowance, in rupees.
pub const TRAINING_ALLOWANCE: f64 = 5000.0;

/// Monthly wage paid to the farmer, in rupees.
pub const MONTHLY_WAGES: f64 = 3000.0;

/// Review state of a contract application.
///
/// Transitions are admin-driven; any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    PendingVerification,
    UnderReview,
    Approved,
    Rejected,
    Active,
    Completed,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown contract status: {0}")]
pub struct UnknownStatus(pub String);

impl ContractStatus {
    pub const ALL: [ContractStatus; 6] = [
        Self::PendingVerification,
        Self::UnderReview,
        Self::Approved,
        Self::Rejected,
        Self::Active,
        Self::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingVerification => "pending_verification",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Comma-separated list of every wire name, for error messages.
    pub fn valid_options() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_owned()))
    }
}

/// Human-readable contract identifier backed by a storage-generated sequence number.
///
/// Rendered as `CF` followed by the number, zero-padded to four digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContractId(pub i64);

#[derive(Debug, thiserror::Error)]
#[error("malformed contract id: {0}")]
pub struct MalformedContractId(pub String);

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CF{:04}", self.0)
    }
}

impl FromStr for ContractId {
    type Err = MalformedContractId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("CF")
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<i64>().ok())
            .map(Self)
            .ok_or_else(|| MalformedContractId(s.to_owned()))
    }
}

impl Serialize for ContractId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// Financial terms derived from the leased land area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTerms {
    pub land_area_satak: f64,
    pub rate_per_satak: f64,
    pub yearly_payment: f64,
    pub contract_duration: u32,
    pub total_contract_value: f64,
    pub training_allowance: f64,
    pub monthly_wages: f64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("Land area must be greater than 0")]
pub struct InvalidLandArea;

impl ContractTerms {
    /// Compute the terms for `land_area_satak` satak. Rejects non-positive or non-finite areas.
    pub fn for_land_area(land_area_satak: f64) -> Result<Self, InvalidLandArea> {
        if !land_area_satak.is_finite() || land_area_satak <= 0.0 {
            return Err(InvalidLandArea);
        }
        let yearly_payment = land_area_satak * RATE_PER_SATAK;
        Ok(Self {
            land_area_satak,
            rate_per_satak: RATE_PER_SATAK,
            yearly_payment,
            contract_duration: CONTRACT_DURATION_YEARS,
            total_contract_value: yearly_payment * f64::from(CONTRACT_DURATION_YEARS),
            training_allowance: TRAINING_ALLOWANCE,
            monthly_wages: MONTHLY_WAGES,
        })
    }
}
