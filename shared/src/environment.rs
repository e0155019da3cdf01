//! Environmental signals that drive the water interval model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Hourly samples per forecast
pub const HOURS_PER_DAY: usize = 24;

/// Temperature (°C) above which an hour counts as critical
pub const CRITICAL_TEMPERATURE: f64 = 28.0;
/// Relative humidity (%) above which an hour counts as critical
pub const CRITICAL_HUMIDITY: f64 = 75.0;
/// UV index above which an hour counts as critical
pub const CRITICAL_UV_INDEX: f64 = 6.0;
/// Wind speed (m/s) above which an hour counts as critical
pub const CRITICAL_WIND_SPEED: f64 = 15.0;

/// One weather-like observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalSignal {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub uv_index: f64,
    pub cloud_cover: f64,
    pub precipitation: f64,
    pub is_day: bool,
}

impl Default for EnvironmentalSignal {
    /// Neutral values used whenever the provider cannot be reached
    fn default() -> Self {
        Self {
            temperature: 20.0,
            humidity: 50.0,
            wind_speed: 10.0,
            uv_index: 3.0,
            cloud_cover: 50.0,
            precipitation: 0.0,
            is_day: true,
        }
    }
}

impl EnvironmentalSignal {
    /// Any single threshold breach makes the hour critical
    pub fn is_critical(&self) -> bool {
        self.temperature > CRITICAL_TEMPERATURE
            || self.humidity > CRITICAL_HUMIDITY
            || self.uv_index > CRITICAL_UV_INDEX
            || self.wind_speed > CRITICAL_WIND_SPEED
    }

    /// Mean of each field; `is_day` follows the majority
    pub fn average(samples: &[EnvironmentalSignal]) -> EnvironmentalSignal {
        if samples.is_empty() {
            return EnvironmentalSignal::default();
        }
        let n = samples.len() as f64;
        let mean = |f: fn(&EnvironmentalSignal) -> f64| samples.iter().map(f).sum::<f64>() / n;
        let day_hours = samples.iter().filter(|s| s.is_day).count();

        EnvironmentalSignal {
            temperature: mean(|s| s.temperature),
            humidity: mean(|s| s.humidity),
            wind_speed: mean(|s| s.wind_speed),
            uv_index: mean(|s| s.uv_index),
            cloud_cover: mean(|s| s.cloud_cover),
            precipitation: mean(|s| s.precipitation),
            is_day: day_hours * 2 >= samples.len(),
        }
    }
}

/// Daily average plus hourly samples for one local date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalForecast {
    pub date: NaiveDate,
    pub daily: EnvironmentalSignal,
    pub hourly: Vec<EnvironmentalSignal>,
}

impl EnvironmentalForecast {
    /// Defaults for every hour
    pub fn fallback(date: NaiveDate) -> Self {
        Self {
            date,
            daily: EnvironmentalSignal::default(),
            hourly: vec![EnvironmentalSignal::default(); HOURS_PER_DAY],
        }
    }

    /// Build from hourly samples, averaging them into the daily signal
    pub fn from_hourly(date: NaiveDate, hourly: Vec<EnvironmentalSignal>) -> Self {
        let daily = EnvironmentalSignal::average(&hourly);
        Self {
            date,
            daily,
            hourly,
        }
    }

    pub fn sample_at(&self, hour: u32) -> Option<&EnvironmentalSignal> {
        self.hourly.get(hour as usize)
    }

    pub fn is_critical_hour(&self, hour: u32) -> bool {
        self.sample_at(hour).map(|s| s.is_critical()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_signal() {
        let s = EnvironmentalSignal::default();
        assert_eq!(s.temperature, 20.0);
        assert_eq!(s.humidity, 50.0);
        assert_eq!(s.wind_speed, 10.0);
        assert_eq!(s.uv_index, 3.0);
        assert_eq!(s.cloud_cover, 50.0);
        assert_eq!(s.precipitation, 0.0);
        assert!(s.is_day);
        assert!(!s.is_critical());
    }

    #[rstest]
    #[case(EnvironmentalSignal { temperature: 29.0, ..Default::default() })]
    #[case(EnvironmentalSignal { humidity: 76.0, ..Default::default() })]
    #[case(EnvironmentalSignal { uv_index: 7.0, ..Default::default() })]
    #[case(EnvironmentalSignal { wind_speed: 16.0, ..Default::default() })]
    fn test_single_breach_is_critical(#[case] signal: EnvironmentalSignal) {
        assert!(signal.is_critical());
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let signal = EnvironmentalSignal {
            temperature: 28.0,
            humidity: 75.0,
            uv_index: 6.0,
            wind_speed: 15.0,
            ..Default::default()
        };
        assert!(!signal.is_critical());
    }

    #[test]
    fn test_average_of_hourly() {
        let hot = EnvironmentalSignal {
            temperature: 30.0,
            is_day: true,
            ..Default::default()
        };
        let cool = EnvironmentalSignal {
            temperature: 10.0,
            is_day: false,
            ..Default::default()
        };
        let avg = EnvironmentalSignal::average(&[hot, cool, cool]);
        assert!((avg.temperature - 50.0 / 3.0).abs() < 1e-9);
        assert!(!avg.is_day);
    }

    #[test]
    fn test_fallback_has_full_day() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let forecast = EnvironmentalForecast::fallback(date);
        assert_eq!(forecast.hourly.len(), HOURS_PER_DAY);
        assert!(!forecast.is_critical_hour(13));
        assert!(forecast.sample_at(24).is_none());
    }
}
