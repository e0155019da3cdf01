//! Environmental signal provider
//!
//! Hourly weather for one local date from Open-Meteo. Callers fall back to
//! neutral defaults when a fetch fails.

use crate::config::WeatherConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use wellness_tracker_shared::environment::HOURS_PER_DAY;
use wellness_tracker_shared::{EnvironmentalForecast, EnvironmentalSignal, GeoLocation};

const HOURLY_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,wind_speed_10m,uv_index,cloud_cover,precipitation,is_day";

#[async_trait]
pub trait EnvironmentProvider: Send + Sync {
    async fn forecast(&self, location: GeoLocation, date: NaiveDate) -> Result<EnvironmentalForecast>;
}

/// Always returns the default signal
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackEnvironment;

#[async_trait]
impl EnvironmentProvider for FallbackEnvironment {
    async fn forecast(&self, _location: GeoLocation, date: NaiveDate) -> Result<EnvironmentalForecast> {
        Ok(EnvironmentalForecast::fallback(date))
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlySeries,
}

#[derive(Debug, Deserialize)]
struct HourlySeries {
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    uv_index: Vec<Option<f64>>,
    #[serde(default)]
    cloud_cover: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
    #[serde(default)]
    is_day: Vec<Option<f64>>,
}

impl HourlySeries {
    /// One signal per hour; gaps take the default value of that field
    fn into_signals(self) -> Vec<EnvironmentalSignal> {
        let defaults = EnvironmentalSignal::default();
        let at = |series: &[Option<f64>], hour: usize, fallback: f64| {
            series.get(hour).copied().flatten().unwrap_or(fallback)
        };

        (0..HOURS_PER_DAY)
            .map(|h| EnvironmentalSignal {
                temperature: at(&self.temperature_2m, h, defaults.temperature),
                humidity: at(&self.relative_humidity_2m, h, defaults.humidity),
                wind_speed: at(&self.wind_speed_10m, h, defaults.wind_speed),
                uv_index: at(&self.uv_index, h, defaults.uv_index),
                cloud_cover: at(&self.cloud_cover, h, defaults.cloud_cover),
                precipitation: at(&self.precipitation, h, defaults.precipitation),
                is_day: at(&self.is_day, h, 1.0) >= 0.5,
            })
            .collect()
    }
}

/// Open-Meteo forecast API client
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
    timezone: String,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timezone: config.timezone.clone(),
        })
    }
}

#[async_trait]
impl EnvironmentProvider for OpenMeteoClient {
    async fn forecast(&self, location: GeoLocation, date: NaiveDate) -> Result<EnvironmentalForecast> {
        let day = date.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("wind_speed_unit", "ms".to_string()),
                ("timezone", self.timezone.clone()),
                ("start_date", day.clone()),
                ("end_date", day),
            ])
            .send()
            .await
            .context("weather request failed")?
            .error_for_status()
            .context("weather provider returned an error")?;

        let body: ForecastResponse = response.json().await.context("invalid weather response")?;
        Ok(EnvironmentalForecast::from_hourly(date, body.hourly.into_signals()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gaps_use_field_defaults() {
        let series: HourlySeries = serde_json::from_value(json!({
            "temperature_2m": [31.0, null],
            "is_day": [0, 1]
        }))
        .unwrap();
        let signals = series.into_signals();
        assert_eq!(signals.len(), 24);
        assert_eq!(signals[0].temperature, 31.0);
        assert!(!signals[0].is_day);
        assert_eq!(signals[1].temperature, 20.0);
        assert_eq!(signals[5].humidity, 50.0);
        assert!(signals[5].is_day);
    }
}
