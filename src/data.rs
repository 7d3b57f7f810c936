use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Datetime layouts accepted for temporal cells, tried in order after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Date-only layouts, tried after every datetime layout.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Magnitude below which whole numbers render exactly.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// A single cell of a [`crate::table::Table`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Missing,
    Boolean(bool),
    Number(f64),
    String(String),
    Temporal(NaiveDateTime),
}

impl Value {
    /// Builds a cell from raw text, mapping blanks and placeholder tokens to
    /// [`Value::Missing`].
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || is_missing_token(trimmed) {
            Value::Missing
        } else {
            Value::String(trimmed.to_string())
        }
    }

    /// NaN numbers count as missing, matching how typed sources encode gaps.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Temporal(dt) => format_instant(dt),
        }
    }

    /// Interprets the cell as a number, re-parsing string cells.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::String(s) => parse_number(s),
            _ => None,
        }
    }

    /// Interprets the cell as a boolean, re-parsing string cells.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::String(s) => parse_boolean(s),
            _ => None,
        }
    }

    /// Interprets the cell as an instant, re-parsing string cells.
    pub fn as_instant(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Temporal(dt) => Some(*dt),
            Value::String(s) => parse_instant(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Temporal(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Missing, Into::into)
    }
}

pub fn is_missing_token(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    let stripped = lowered.trim_start_matches('#');
    matches!(
        stripped,
        "na" | "n/a" | "n.a." | "nan" | "null" | "none" | "missing" | "-"
    )
}

/// Parses a finite number, rejecting trailing characters and `inf`/`nan`.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub fn parse_instant(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(parsed);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(parsed.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Renders whole numbers without a fractional part and everything else in
/// shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < EXACT_INTEGER_LIMIT {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

pub fn is_midnight(instant: &NaiveDateTime) -> bool {
    instant.time().num_seconds_from_midnight() == 0 && instant.time().nanosecond() == 0
}

pub fn format_instant(instant: &NaiveDateTime) -> String {
    if is_midnight(instant) {
        instant.format("%Y-%m-%d").to_string()
    } else {
        instant.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_maps_blanks_and_placeholders_to_missing() {
        assert_eq!(Value::from_raw(""), Value::Missing);
        assert_eq!(Value::from_raw("   "), Value::Missing);
        assert_eq!(Value::from_raw("N/A"), Value::Missing);
        assert_eq!(Value::from_raw("#NA"), Value::Missing);
        assert_eq!(Value::from_raw(" null "), Value::Missing);
        assert_eq!(Value::from_raw(" red "), Value::String("red".to_string()));
    }

    #[test]
    fn nan_numbers_are_missing() {
        assert!(Value::Number(f64::NAN).is_missing());
        assert!(!Value::Number(0.0).is_missing());
        assert!(!Value::String(String::new()).is_missing());
    }

    #[test]
    fn parse_number_rejects_trailing_text_and_non_finite() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number(" -3.5 "), Some(-3.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn parse_boolean_accepts_fixed_tokens_case_insensitively() {
        assert_eq!(parse_boolean("Yes"), Some(true));
        assert_eq!(parse_boolean("FALSE"), Some(false));
        assert_eq!(parse_boolean("1"), Some(true));
        assert_eq!(parse_boolean("0"), Some(false));
        assert_eq!(parse_boolean("y"), None);
        assert_eq!(parse_boolean("maybe"), None);
    }

    #[test]
    fn parse_instant_supports_date_and_datetime_layouts() {
        let midnight = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_time(NaiveTime::MIN);
        assert_eq!(parse_instant("2024-05-06"), Some(midnight));
        assert_eq!(parse_instant("2024/05/06"), Some(midnight));
        assert_eq!(parse_instant("05/06/2024"), Some(midnight));

        let afternoon = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(parse_instant("2024-05-06T14:30:00"), Some(afternoon));
        assert_eq!(parse_instant("2024-05-06 14:30"), Some(afternoon));
        assert_eq!(parse_instant("2024-05-06T16:30:00+02:00"), Some(afternoon));
        assert_eq!(parse_instant("06.05.2024"), None);
    }

    #[test]
    fn format_number_drops_integral_fraction() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.1), "0.1");
    }

    #[test]
    fn format_instant_omits_midnight_time() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 10).unwrap();
        assert_eq!(format_instant(&date.and_time(NaiveTime::MIN)), "2021-01-10");
        assert_eq!(
            format_instant(&date.and_hms_opt(8, 5, 9).unwrap()),
            "2021-01-10T08:05:09"
        );
    }
}
