//! Fixed-table weather lookups and the threshold rules that turn conditions
//! into farming advice and alerts. No forecast model is involved; the tables
//! stand in for a weather provider.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::error::ApiError;

pub const MAX_FORECAST_DAYS: u32 = 7;
const DEFAULT_AREA: &str = "Your Area";

const FORECAST_CONDITIONS: [&str; 7] = [
    "Sunny",
    "Partly Cloudy",
    "Cloudy",
    "Light Rain",
    "Sunny",
    "Partly Cloudy",
    "Sunny",
];
const FORECAST_MAX_TEMPS: [f64; 7] = [28.0, 26.0, 24.0, 22.0, 30.0, 29.0, 31.0];

#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

impl Location {
    /// City wins over coordinates; `None` when neither is usable.
    pub fn from_query(city: Option<&str>, lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (city.map(str::trim).filter(|c| !c.is_empty()), lat, lon) {
            (Some(city), _, _) => Some(Self::City(city.to_owned())),
            (None, Some(lat), Some(lon)) => Some(Self::Coordinates { lat, lon }),
            _ => None,
        }
    }

    /// Like [`Location::from_query`] but rejecting requests that name no place.
    pub fn required(city: Option<&str>, lat: Option<f64>, lon: Option<f64>) -> Result<Self, ApiError> {
        Self::from_query(city, lat, lon).ok_or_else(|| {
            ApiError::validation("Please provide either city name or coordinates (lat, lon)")
        })
    }

    pub fn label(&self) -> String {
        match self {
            Self::City(city) => city.clone(),
            Self::Coordinates { lat, lon } => format!("Lat: {lat}, Lon: {lon}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conditions {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub condition: String,
    pub rainfall_last_24h: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentWeather {
    pub location: String,
    #[serde(flatten)]
    pub conditions: Conditions,
    pub description: &'static str,
}

/// Conditions reported for `location`.
pub fn current_weather(location: &Location) -> CurrentWeather {
    match location {
        Location::City(_) => CurrentWeather {
            location: location.label(),
            conditions: Conditions {
                temperature: 28.0,
                humidity: 65.0,
                wind_speed: 12.0,
                condition: "Partly Cloudy".to_owned(),
                rainfall_last_24h: 0.0,
            },
            description: "Good weather for farming activities",
        },
        Location::Coordinates { .. } => CurrentWeather {
            location: location.label(),
            conditions: Conditions {
                temperature: 26.0,
                humidity: 70.0,
                wind_speed: 8.0,
                condition: "Sunny".to_owned(),
                rainfall_last_24h: 0.0,
            },
            description: "Ideal conditions for crop cultivation",
        },
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub day_name: String,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub condition: &'static str,
    pub humidity: f64,
    pub rainfall_probability: u8,
    pub farming_activity: &'static str,
}

/// Daily outlook starting at `today`. `days` is clamped to `1..=7` (default 7).
pub fn forecast(days: Option<u32>, today: NaiveDate) -> Vec<ForecastDay> {
    let days = days.unwrap_or(MAX_FORECAST_DAYS).clamp(1, MAX_FORECAST_DAYS) as usize;
    FORECAST_CONDITIONS
        .iter()
        .zip(FORECAST_MAX_TEMPS)
        .take(days)
        .enumerate()
        .map(|(i, (&condition, max))| {
            let date = today + Duration::days(i as i64);
            ForecastDay {
                date,
                day_name: date.format("%A").to_string(),
                temperature_max: max,
                temperature_min: max - 8.0,
                condition,
                humidity: 60.0 + 2.0 * i as f64,
                rainfall_probability: if condition.contains("Rain") { 20 } else { 5 },
                farming_activity: activity_suggestion(condition, max),
            }
        })
        .collect()
}

pub const WEEKLY_ADVICE: &str =
    "Schedule irrigation on the days with the lowest chance of rain and hold off spraying when it is windy.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Caution,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherAlert {
    #[serde(rename = "type")]
    pub level: AlertLevel,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FarmingAdvisory {
    pub location: String,
    pub date: NaiveDate,
    pub current_conditions: Conditions,
    pub advice: Vec<&'static str>,
    pub alerts: Vec<WeatherAlert>,
    pub next_24_hours: &'static str,
}

/// Advisory for `location` (defaults to a generic area label).
pub fn farming_advisory(location: Option<&Location>, today: NaiveDate) -> FarmingAdvisory {
    let conditions = Conditions {
        temperature: 27.0,
        humidity: 68.0,
        wind_speed: 10.0,
        condition: "Partly Cloudy".to_owned(),
        rainfall_last_24h: 2.5,
    };
    FarmingAdvisory {
        location: location.map_or_else(|| DEFAULT_AREA.to_owned(), Location::label),
        date: today,
        advice: farming_advice(&conditions),
        alerts: weather_alerts(&conditions),
        current_conditions: conditions,
        next_24_hours: "Partly cloudy, 25-30°C, light winds.",
    }
}

/// Threshold rules over temperature, humidity and sky condition.
pub fn farming_advice(conditions: &Conditions) -> Vec<&'static str> {
    let mut advice = Vec::new();
    let sky = conditions.condition.to_lowercase();

    if conditions.temperature > 35.0 {
        advice.push("🌡️ Heat stress risk: irrigate more often");
        advice.push("🌳 Shade sensitive crops during the afternoon");
    } else if conditions.temperature < 15.0 {
        advice.push("❄️ Cold spell: protect crops against frost");
        advice.push("🔥 Cover young plants overnight");
    } else {
        advice.push("🌟 Temperature suits most field work");
    }

    if conditions.humidity > 80.0 {
        advice.push("💨 Humid air favours fungal disease, scout the crop");
        advice.push("🌬️ Keep canopies open for air movement");
    } else if conditions.humidity < 40.0 {
        advice.push("💧 Dry air: step up irrigation");
        advice.push("🌿 Mulch to hold soil moisture");
    }

    if sky.contains("rain") {
        advice.push("🌧️ Postpone spraying until the rain stops");
        advice.push("🚜 Keep heavy machinery off wet fields");
    } else if sky.contains("sunny") {
        advice.push("☀️ Good window for harvesting");
        advice.push("🌾 Good drying weather for harvested produce");
    }

    advice
}

pub fn activity_suggestion(condition: &str, temperature: f64) -> &'static str {
    let sky = condition.to_lowercase();
    if sky.contains("rain") {
        "Indoor work and drainage checks"
    } else if sky.contains("sunny") && temperature > 30.0 {
        "Irrigate early in the morning and avoid midday field work"
    } else if sky.contains("sunny") {
        "Harvesting and field preparation"
    } else if sky.contains("cloudy") {
        "Transplanting and spraying"
    } else {
        "Routine field work, keep an eye on the weather"
    }
}

/// Alerts raised by extreme readings; a single informational alert when none apply.
pub fn weather_alerts(conditions: &Conditions) -> Vec<WeatherAlert> {
    let rules: [(bool, AlertLevel, &'static str); 5] = [
        (
            conditions.temperature > 40.0,
            AlertLevel::Warning,
            "Extreme heat: protect livestock and field workers",
        ),
        (
            conditions.temperature < 5.0,
            AlertLevel::Warning,
            "Frost risk: protect sensitive crops",
        ),
        (
            conditions.wind_speed > 25.0,
            AlertLevel::Caution,
            "Strong winds: do not spray",
        ),
        (
            conditions.rainfall_last_24h > 50.0,
            AlertLevel::Info,
            "Heavy rainfall: check field drainage",
        ),
        (
            conditions.humidity > 90.0,
            AlertLevel::Caution,
            "Very high humidity: watch for plant disease",
        ),
    ];
    let mut alerts: Vec<WeatherAlert> = rules
        .into_iter()
        .filter(|(hit, _, _)| *hit)
        .map(|(_, level, message)| WeatherAlert { level, message })
        .collect();
    if alerts.is_empty() {
        alerts.push(WeatherAlert {
            level: AlertLevel::Info,
            message: "Weather conditions are favourable for farming",
        });
    }
    alerts
}

// ── Crop health ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropHealth {
    pub crop: String,
    pub disease: Option<&'static str>,
    pub recommended_action: Option<&'static str>,
}

/// Known seasonal disease pressure per crop. Crops not listed report healthy.
const DISEASE_TABLE: [(&str, &str, &str); 6] = [
    ("rice", "Blast", "Spray tricyclazole and avoid excess nitrogen"),
    ("wheat", "Leaf rust", "Spray propiconazole at first sign of pustules"),
    ("tomato", "Early blight", "Remove lower infected leaves and apply mancozeb"),
    ("potato", "Late blight", "Apply a protective fungicide before rain"),
    ("banana", "Sigatoka leaf spot", "Prune affected leaves and apply fungicide"),
    ("chilli", "Leaf curl", "Control whitefly and remove infected plants"),
];

pub fn crop_health(crop: &str, _location: Option<&str>) -> CropHealth {
    let key = crop.trim().to_lowercase();
    let hit = DISEASE_TABLE.iter().find(|(name, _, _)| *name == key);
    CropHealth {
        crop: crop.trim().to_owned(),
        disease: hit.map(|(_, disease, _)| *disease),
        recommended_action: hit.map(|(_, _, action)| *action),
    }
}
