//! Weather adapter backed by Open-Meteo.
//!
//! Two-step request: geocode the location name to coordinates, then fetch
//! the daily forecast for the requested date. Open-Meteo serves forecasts,
//! not live observations; the composer's disclaimer reflects that.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use travel_agent_core::{Tool, ToolError, ToolInput, ToolOutput};
use travel_agent_config::ToolSettings;

/// Normalized forecast for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherForecast {
    /// Resolved location, e.g. "Paris, France"
    pub location: String,
    /// IANA timezone the forecast is local to
    pub timezone: String,
    /// Forecast date
    pub date: NaiveDate,
    /// Daily minimum temperature, Celsius
    pub low_c: f64,
    /// Daily maximum temperature, Celsius
    pub high_c: f64,
    /// Daily precipitation sum, millimetres
    pub precipitation_mm: f64,
}

#[derive(Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    timezone: String,
    daily: DailyForecast,
}

#[derive(Deserialize)]
struct DailyForecast {
    time: Vec<String>,
    temperature_2m_min: Vec<f64>,
    temperature_2m_max: Vec<f64>,
    precipitation_sum: Vec<f64>,
}

/// Open-Meteo forecast adapter
pub struct WeatherTool {
    client: reqwest::Client,
    geocoding_endpoint: String,
    forecast_endpoint: String,
    timeout_secs: u64,
}

impl WeatherTool {
    pub fn new(settings: &ToolSettings) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ToolError::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            geocoding_endpoint: settings.geocoding_endpoint.clone(),
            forecast_endpoint: settings.forecast_endpoint.clone(),
            timeout_secs: settings.timeout_secs,
        })
    }

    /// Fetch the forecast for a location on a date
    pub async fn forecast(
        &self,
        location: &str,
        date: NaiveDate,
    ) -> Result<WeatherForecast, ToolError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ToolError::InvalidArguments("empty location".to_string()));
        }

        let geo = self.geocode(location).await?;

        let resolved = match &geo.country {
            Some(country) => format!("{}, {}", geo.name, country),
            None => geo.name.clone(),
        };

        let date_str = date.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(&self.forecast_endpoint)
            .query(&[
                ("latitude", geo.latitude.to_string()),
                ("longitude", geo.longitude.to_string()),
                (
                    "daily",
                    "temperature_2m_max,temperature_2m_min,precipitation_sum".to_string(),
                ),
                ("timezone", "auto".to_string()),
                ("start_date", date_str.clone()),
                ("end_date", date_str),
            ])
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(ToolError::Upstream(format!(
                "forecast request failed: {}",
                response.status()
            )));
        }

        let payload: ForecastResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Upstream(format!("bad forecast payload: {e}")))?;

        let daily = &payload.daily;
        if daily.time.is_empty()
            || daily.temperature_2m_min.is_empty()
            || daily.temperature_2m_max.is_empty()
            || daily.precipitation_sum.is_empty()
        {
            return Err(ToolError::Upstream("no daily forecast returned".to_string()));
        }

        tracing::debug!(location = %resolved, date = %date, "fetched forecast");

        Ok(WeatherForecast {
            location: resolved,
            timezone: payload.timezone,
            date,
            low_c: daily.temperature_2m_min[0],
            high_c: daily.temperature_2m_max[0],
            precipitation_mm: daily.precipitation_sum[0],
        })
    }

    async fn geocode(&self, name: &str) -> Result<GeocodingResult, ToolError> {
        let response = self
            .client
            .get(&self.geocoding_endpoint)
            .query(&[
                ("name", name),
                ("count", "1"),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(ToolError::Upstream(format!(
                "geocoding request failed: {}",
                response.status()
            )));
        }

        let payload: GeocodingResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Upstream(format!("bad geocoding payload: {e}")))?;

        payload
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }
}

fn map_request_error(err: reqwest::Error) -> ToolError {
    if err.is_timeout() {
        ToolError::Timeout
    } else {
        ToolError::Upstream(err.to_string())
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Daily forecast (low/high temperature, precipitation) for a location and date"
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let location = input.str_arg("location")?;
        let date = input.str_arg("date")?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| ToolError::InvalidArguments(format!("bad date: {e}")))?;

        let forecast = self.forecast(location, date).await?;
        Ok(ToolOutput::new(json!(forecast)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocoding_payload_parsing() {
        let raw = r#"{"results":[{"name":"Paris","latitude":48.85341,"longitude":2.3488,"country":"France"}],"generationtime_ms":0.6}"#;
        let parsed: GeocodingResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.results[0].name, "Paris");
        assert_eq!(parsed.results[0].country.as_deref(), Some("France"));
    }

    #[test]
    fn test_geocoding_payload_empty() {
        let raw = r#"{"generationtime_ms":0.4}"#;
        let parsed: GeocodingResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.results.is_empty());
    }

    #[test]
    fn test_forecast_payload_parsing() {
        let raw = r#"{
            "timezone": "Europe/Paris",
            "daily": {
                "time": ["2025-12-30"],
                "temperature_2m_min": [2.1],
                "temperature_2m_max": [7.4],
                "precipitation_sum": [0.3]
            }
        }"#;
        let parsed: ForecastResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.timezone, "Europe/Paris");
        assert_eq!(parsed.daily.temperature_2m_min[0], 2.1);
        assert_eq!(parsed.daily.precipitation_sum[0], 0.3);
    }

    #[test]
    fn test_forecast_roundtrip_serialization() {
        let forecast = WeatherForecast {
            location: "Paris, France".to_string(),
            timezone: "Europe/Paris".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 12, 30).unwrap(),
            low_c: 2.1,
            high_c: 7.4,
            precipitation_mm: 0.3,
        };
        let value = json!(forecast);
        let back: WeatherForecast = serde_json::from_value(value).unwrap();
        assert_eq!(back.location, forecast.location);
        assert_eq!(back.high_c, forecast.high_c);
    }
}
