//! Health metrics calculations module
//!
//! Basal metabolic rate and the activity table used by the water target.
//! All calculations are pure.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Weight assumed when the profile has none (kg)
pub const DEFAULT_WEIGHT_KG: f64 = 93.0;
/// Height assumed when the profile has none (cm)
pub const DEFAULT_HEIGHT_CM: f64 = 190.0;
/// Age assumed when the profile has neither age nor birth date
pub const DEFAULT_AGE_YEARS: i32 = 30;

/// Biological sex for physiological calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BiologicalSex {
    #[default]
    Male,
    Female,
}

impl BiologicalSex {
    /// Parse a free-form gender field; anything unrecognised counts as male
    pub fn from_profile(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "female" || v == "f" || v == "kadın" || v == "kadin" => {
                BiologicalSex::Female
            }
            _ => BiologicalSex::Male,
        }
    }
}

/// Activity level used by the hydration multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    #[default]
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    /// Multiplier applied to the daily water target
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.0,
            ActivityLevel::Light => 1.1,
            ActivityLevel::Moderate => 1.2,
            ActivityLevel::Active => 1.3,
            ActivityLevel::VeryActive => 1.4,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Little or no exercise",
            ActivityLevel::Light => "Light exercise 1-3 days/week",
            ActivityLevel::Moderate => "Moderate exercise 3-5 days/week",
            ActivityLevel::Active => "Hard exercise 6-7 days/week",
            ActivityLevel::VeryActive => "Very hard exercise or physical job",
        }
    }
}

/// Profile values as stored on the user document; every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub age: Option<i32>,
}

/// Profile with every gap filled in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthProfile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: i32,
    pub sex: BiologicalSex,
}

impl HealthProfile {
    /// Resolve stored profile values against `today`, applying defaults
    pub fn resolve(profile: Option<&UserProfile>, today: NaiveDate) -> Self {
        let profile = profile.cloned().unwrap_or_default();
        let positive = |v: Option<f64>| v.filter(|x| x.is_finite() && *x > 0.0);

        let age_years = profile
            .age
            .filter(|a| *a > 0)
            .or_else(|| profile.birth_date.map(|b| age_on(b, today)))
            .filter(|a| *a > 0)
            .unwrap_or(DEFAULT_AGE_YEARS);

        Self {
            weight_kg: positive(profile.weight).unwrap_or(DEFAULT_WEIGHT_KG),
            height_cm: positive(profile.height).unwrap_or(DEFAULT_HEIGHT_CM),
            age_years,
            sex: BiologicalSex::from_profile(profile.gender.as_deref()),
        }
    }

    pub fn bmr(&self) -> f64 {
        calculate_bmr_mifflin(self.weight_kg, self.height_cm, self.age_years, self.sex)
    }
}

/// Whole years between `birth_date` and `today`
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

/// Calculate BMR using the Mifflin-St Jeor equation
///
/// Men: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) + 5
/// Women: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) - 161
pub fn calculate_bmr_mifflin(weight_kg: f64, height_cm: f64, age_years: i32, sex: BiologicalSex) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years as f64;
    match sex {
        BiologicalSex::Male => base + 5.0,
        BiologicalSex::Female => base - 161.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_bmr_male_known_value() {
        // 10*80 + 6.25*180 - 5*30 + 5 = 1780
        let bmr = calculate_bmr_mifflin(80.0, 180.0, 30, BiologicalSex::Male);
        assert!((bmr - 1780.0).abs() < 1e-9);
    }

    #[test]
    fn test_bmr_female_known_value() {
        // 10*60 + 6.25*165 - 5*25 - 161 = 1345.25
        let bmr = calculate_bmr_mifflin(60.0, 165.0, 25, BiologicalSex::Female);
        assert!((bmr - 1345.25).abs() < 1e-9);
    }

    #[test]
    fn test_defaults_applied_for_missing_profile() {
        let profile = HealthProfile::resolve(None, date(2024, 1, 1));
        assert_eq!(profile.weight_kg, DEFAULT_WEIGHT_KG);
        assert_eq!(profile.height_cm, DEFAULT_HEIGHT_CM);
        assert_eq!(profile.age_years, DEFAULT_AGE_YEARS);
        assert_eq!(profile.sex, BiologicalSex::Male);
        // 930 + 1187.5 - 150 + 5
        assert!((profile.bmr() - 1972.5).abs() < 1e-9);
    }

    #[test]
    fn test_age_from_birth_date() {
        let profile = UserProfile {
            birth_date: Some(date(1990, 6, 15)),
            ..Default::default()
        };
        assert_eq!(HealthProfile::resolve(Some(&profile), date(2024, 6, 14)).age_years, 33);
        assert_eq!(HealthProfile::resolve(Some(&profile), date(2024, 6, 15)).age_years, 34);
    }

    #[test]
    fn test_explicit_age_wins_over_birth_date() {
        let profile = UserProfile {
            age: Some(41),
            birth_date: Some(date(2000, 1, 1)),
            ..Default::default()
        };
        assert_eq!(HealthProfile::resolve(Some(&profile), date(2024, 1, 1)).age_years, 41);
    }

    #[rstest]
    #[case(Some("female"), BiologicalSex::Female)]
    #[case(Some("Female "), BiologicalSex::Female)]
    #[case(Some("male"), BiologicalSex::Male)]
    #[case(Some("other"), BiologicalSex::Male)]
    #[case(None, BiologicalSex::Male)]
    fn test_gender_parsing(#[case] input: Option<&str>, #[case] expected: BiologicalSex) {
        assert_eq!(BiologicalSex::from_profile(input), expected);
    }

    #[rstest]
    #[case("\"sedentary\"", 1.0)]
    #[case("\"light\"", 1.1)]
    #[case("\"moderate\"", 1.2)]
    #[case("\"active\"", 1.3)]
    #[case("\"very_active\"", 1.4)]
    fn test_activity_table(#[case] json: &str, #[case] multiplier: f64) {
        let level: ActivityLevel = serde_json::from_str(json).unwrap();
        assert_eq!(level.multiplier(), multiplier);
    }

    #[test]
    fn test_default_activity_is_light() {
        assert_eq!(ActivityLevel::default().multiplier(), 1.1);
    }

    // Feature: wellness-tracker, Property 2: BMR monotonicity
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_bmr_increases_with_weight(
            weight in 40.0f64..200.0,
            height in 140.0f64..210.0,
            age in 18i32..90
        ) {
            let lighter = calculate_bmr_mifflin(weight, height, age, BiologicalSex::Male);
            let heavier = calculate_bmr_mifflin(weight + 1.0, height, age, BiologicalSex::Male);
            prop_assert!(heavier > lighter);
        }

        #[test]
        fn test_female_bmr_is_166_below_male(
            weight in 40.0f64..200.0,
            height in 140.0f64..210.0,
            age in 18i32..90
        ) {
            let male = calculate_bmr_mifflin(weight, height, age, BiologicalSex::Male);
            let female = calculate_bmr_mifflin(weight, height, age, BiologicalSex::Female);
            prop_assert!((male - female - 166.0).abs() < 1e-9);
        }
    }
}
