use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::handlers::extract::ApiQuery;
use crate::usecase::weather::{
    Location, WEEKLY_ADVICE, current_weather, farming_advice, farming_advisory, forecast,
};

const DEFAULT_AREA: &str = "Your Area";

#[derive(Debug, Default, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
    /// Free-text place name; used when `city` is absent.
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub days: Option<u32>,
}

impl WeatherQuery {
    fn place(&self) -> Option<&str> {
        self.city.as_deref().or(self.location.as_deref())
    }

    fn location(&self) -> Option<Location> {
        Location::from_query(self.place(), self.lat, self.lon)
    }
}

// ── GET /weather/current ─────────────────────────────────────────────────────

pub async fn current(ApiQuery(query): ApiQuery<WeatherQuery>) -> Result<Json<Value>, ApiError> {
    let location = Location::required(query.place(), query.lat, query.lon)?;
    let weather = current_weather(&location);
    let advice = farming_advice(&weather.conditions);
    let mut weather = serde_json::to_value(&weather).map_err(anyhow::Error::from)?;
    weather["timestamp"] = json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
    Ok(Json(json!({
        "success": true,
        "weather": weather,
        "farming_advice": advice,
    })))
}

// ── GET /weather/forecast ────────────────────────────────────────────────────

pub async fn forecast_days(ApiQuery(query): ApiQuery<WeatherQuery>) -> Json<Value> {
    let location = query
        .location()
        .map_or_else(|| DEFAULT_AREA.to_owned(), |l| l.label());
    Json(json!({
        "success": true,
        "location": location,
        "forecast": forecast(query.days, Utc::now().date_naive()),
        "weekly_advice": WEEKLY_ADVICE,
    }))
}

// ── GET /weather/farming-advisory ────────────────────────────────────────────

pub async fn advisory(ApiQuery(query): ApiQuery<WeatherQuery>) -> Json<Value> {
    let location = query.location();
    Json(json!({
        "success": true,
        "advisory": farming_advisory(location.as_ref(), Utc::now().date_naive()),
    }))
}
