//! Week keys: every stored plan is keyed by the Sunday that starts its week.

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlannerError;

const KEY_PREFIX: &str = "meal_plan_";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Days in plan order, Sunday first.
pub const WEEK_DAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Lowercase day name as used in the plan document (`"sunday"` ...).
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "sunday",
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
    }
}

/// Inverse of [`day_name`], case-insensitive.
pub fn parse_day(name: &str) -> Option<Weekday> {
    let lower = name.trim().to_ascii_lowercase();
    WEEK_DAYS.into_iter().find(|day| day_name(*day) == lower)
}

/// Day name with a leading capital, for prompts and SMS text.
pub fn display_day(day: Weekday) -> String {
    let name = day_name(day);
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekKey(NaiveDate);

impl WeekKey {
    /// The key for the week containing `date`. A Sunday starts its own week.
    pub fn for_date(date: NaiveDate) -> Self {
        let offset = date.weekday().num_days_from_sunday();
        Self(date - Duration::days(i64::from(offset)))
    }

    pub fn current() -> Self {
        Self::for_date(Local::now().date_naive())
    }

    pub fn start_date(&self) -> NaiveDate {
        self.0
    }

    /// `YYYY-MM-DD` without the prefix; used for backup file names.
    pub fn date_string(&self) -> String {
        self.0.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{KEY_PREFIX}{}", self.date_string())
    }
}

impl FromStr for WeekKey {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let date_part = trimmed.strip_prefix(KEY_PREFIX).unwrap_or(trimmed);
        let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT)
            .map_err(|_| PlannerError::InvalidWeekKey(s.to_string()))?;
        if date.weekday() != Weekday::Sun {
            return Err(PlannerError::InvalidWeekKey(s.to_string()));
        }
        Ok(Self(date))
    }
}

impl TryFrom<String> for WeekKey {
    type Error = PlannerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekKey> for String {
    fn from(key: WeekKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn midweek_maps_to_previous_sunday() {
        // 2025-03-12 is a Wednesday
        let key = WeekKey::for_date(date(2025, 3, 12));
        assert_eq!(key.start_date(), date(2025, 3, 9));
        assert_eq!(key.to_string(), "meal_plan_2025-03-09");
    }

    #[test]
    fn sunday_starts_its_own_week() {
        let key = WeekKey::for_date(date(2025, 3, 9));
        assert_eq!(key.start_date(), date(2025, 3, 9));
    }

    #[test]
    fn saturday_belongs_to_the_sunday_before() {
        let key = WeekKey::for_date(date(2025, 3, 15));
        assert_eq!(key.start_date(), date(2025, 3, 9));
    }

    #[test]
    fn week_spanning_new_year() {
        // 2025-01-01 is a Wednesday
        let key = WeekKey::for_date(date(2025, 1, 1));
        assert_eq!(key.to_string(), "meal_plan_2024-12-29");
    }

    #[test]
    fn parses_prefixed_and_bare_forms() {
        let a: WeekKey = "meal_plan_2025-03-09".parse().unwrap();
        let b: WeekKey = "2025-03-09".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_non_sundays_and_garbage() {
        assert!(matches!(
            "2025-03-10".parse::<WeekKey>(),
            Err(PlannerError::InvalidWeekKey(_))
        ));
        assert!("meal_plan_tomorrow".parse::<WeekKey>().is_err());
    }

    #[test]
    fn serde_uses_display_form() {
        let key: WeekKey = "2025-03-09".parse().unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"meal_plan_2025-03-09\"");
        let back: WeekKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn day_names_round_trip() {
        for day in WEEK_DAYS {
            assert_eq!(parse_day(day_name(day)), Some(day));
        }
        assert_eq!(parse_day("WEDNESDAY"), Some(Weekday::Wed));
        assert_eq!(parse_day("someday"), None);
        assert_eq!(display_day(Weekday::Thu), "Thursday");
    }
}
