//! Water target and reminder interval model
//!
//! The daily target is `BMR × factor`, where `factor` is a product of
//! environmental and behavioural multipliers around a base of 1.4.

use crate::environment::EnvironmentalSignal;
use crate::health_metrics::ActivityLevel;

/// Base hydration factor applied to BMR
pub const BASE_HYDRATION_FACTOR: f64 = 1.4;
/// Shortest regular interval between water reminders (minutes)
pub const MIN_BASE_INTERVAL_MINUTES: i64 = 15;
/// Shortest interval during a critical hour (minutes)
pub const MIN_CRITICAL_INTERVAL_MINUTES: i64 = 10;

/// Individual multipliers that make up the hydration factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydrationMultipliers {
    pub weather: f64,
    pub humidity: f64,
    pub activity: f64,
    pub wind: f64,
    pub uv: f64,
    pub cloud: f64,
    pub precipitation: f64,
    pub day_night: f64,
}

impl HydrationMultipliers {
    pub fn from_signal(signal: &EnvironmentalSignal, activity: ActivityLevel) -> Self {
        Self {
            weather: 1.0 + (signal.temperature - 20.0) / 100.0,
            humidity: 1.0 + (50.0 - signal.humidity).abs() / 200.0,
            activity: activity.multiplier(),
            wind: 1.0 + (signal.wind_speed - 10.0).max(0.0) / 100.0,
            uv: 1.0 + (signal.uv_index - 3.0).max(0.0) / 20.0,
            cloud: 1.0 - signal.cloud_cover / 200.0,
            precipitation: if signal.precipitation > 0.0 { 0.9 } else { 1.0 },
            day_night: if signal.is_day { 1.1 } else { 0.9 },
        }
    }

    /// Product of the base factor and every multiplier
    pub fn factor(&self) -> f64 {
        BASE_HYDRATION_FACTOR
            * self.weather
            * self.humidity
            * self.activity
            * self.wind
            * self.uv
            * self.cloud
            * self.precipitation
            * self.day_night
    }
}

/// `round(BMR × factor)` in millilitres
pub fn daily_water_target(bmr: f64, signal: &EnvironmentalSignal, activity: ActivityLevel) -> i64 {
    let factor = HydrationMultipliers::from_signal(signal, activity).factor();
    (bmr * factor).round() as i64
}

/// Glasses still needed to cover `remaining_ml`
pub fn glass_count(remaining_ml: i64, glass_size_ml: i64) -> i64 {
    if remaining_ml <= 0 {
        return 0;
    }
    let glass = glass_size_ml.max(1);
    (remaining_ml + glass - 1) / glass
}

/// Regular spacing between reminders, at least [`MIN_BASE_INTERVAL_MINUTES`]
pub fn base_interval_minutes(remaining_window_minutes: i64, glasses: i64) -> i64 {
    let per_glass = remaining_window_minutes.max(0) / glasses.max(1);
    per_glass.max(MIN_BASE_INTERVAL_MINUTES)
}

/// Halved spacing for critical hours, at least [`MIN_CRITICAL_INTERVAL_MINUTES`]
pub fn critical_interval_minutes(base_minutes: i64) -> i64 {
    (base_minutes / 2).max(MIN_CRITICAL_INTERVAL_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_neutral_signal_factor() {
        // Defaults: weather 1, humidity 1, wind 1, uv 1, cloud 0.75, precip 1, day 1.1
        let m = HydrationMultipliers::from_signal(&EnvironmentalSignal::default(), ActivityLevel::Light);
        let expected = 1.4 * 1.1 * 0.75 * 1.1;
        assert!((m.factor() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_multiplier_components() {
        let signal = EnvironmentalSignal {
            temperature: 30.0,
            humidity: 90.0,
            wind_speed: 20.0,
            uv_index: 8.0,
            cloud_cover: 0.0,
            precipitation: 1.2,
            is_day: false,
        };
        let m = HydrationMultipliers::from_signal(&signal, ActivityLevel::VeryActive);
        assert!((m.weather - 1.1).abs() < 1e-12);
        assert!((m.humidity - 1.2).abs() < 1e-12);
        assert!((m.wind - 1.1).abs() < 1e-12);
        assert!((m.uv - 1.25).abs() < 1e-12);
        assert_eq!(m.cloud, 1.0);
        assert_eq!(m.precipitation, 0.9);
        assert_eq!(m.day_night, 0.9);
        assert_eq!(m.activity, 1.4);
    }

    #[test]
    fn test_daily_target_rounds() {
        let target = daily_water_target(1972.5, &EnvironmentalSignal::default(), ActivityLevel::Light);
        let expected = (1972.5 * 1.4 * 1.1 * 0.75 * 1.1_f64).round() as i64;
        assert_eq!(target, expected);
    }

    #[test]
    fn test_glass_count_ceil() {
        assert_eq!(glass_count(1000, 250), 4);
        assert_eq!(glass_count(1001, 250), 5);
        assert_eq!(glass_count(0, 250), 0);
        assert_eq!(glass_count(-50, 250), 0);
    }

    #[test]
    fn test_base_interval_floor() {
        assert_eq!(base_interval_minutes(600, 8), 75);
        assert_eq!(base_interval_minutes(60, 10), MIN_BASE_INTERVAL_MINUTES);
        assert_eq!(base_interval_minutes(600, 0), 600);
    }

    // Feature: wellness-tracker, Property 3: Interval floors
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_interval_floors_hold(
            window_minutes in 0i64..1440,
            glasses in 0i64..40
        ) {
            let base = base_interval_minutes(window_minutes, glasses);
            let critical = critical_interval_minutes(base);
            prop_assert!(base >= MIN_BASE_INTERVAL_MINUTES);
            prop_assert!(critical >= MIN_CRITICAL_INTERVAL_MINUTES);
            prop_assert!(critical <= base);
        }

        #[test]
        fn test_target_grows_with_activity(bmr in 1000.0f64..3000.0) {
            let signal = EnvironmentalSignal::default();
            let sedentary = daily_water_target(bmr, &signal, ActivityLevel::Sedentary);
            let very_active = daily_water_target(bmr, &signal, ActivityLevel::VeryActive);
            prop_assert!(sedentary < very_active);
        }
    }
}
