//! WhatsApp alert categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of an outbound alert.
///
/// Every category except `Generic` has a per-user opt-in flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Weather,
    MarketPrices,
    CropDiseases,
    Generic,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown alert type: {0}")]
pub struct UnknownAlertType(pub String);

impl AlertType {
    pub const ALL: [AlertType; 4] = [
        Self::Weather,
        Self::MarketPrices,
        Self::CropDiseases,
        Self::Generic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::MarketPrices => "market_prices",
            Self::CropDiseases => "crop_diseases",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = UnknownAlertType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownAlertType(s.to_owned()))
    }
}
