//! # Slot Values
//!
//! Typed values attached to the positional slots of a prepared procedure
//! call. Every semantic type a parameter can declare maps to exactly one
//! variant here.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The semantic type of a parameter. Drives string-to-value conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// 32-bit signed integer
    Integer,
    /// Text, passed through unchanged
    String,
    /// Calendar date
    Date,
    /// Date and time of day, no zone
    DateTime,
    /// Exact decimal currency amount
    Money,
}

impl SemanticType {
    /// Short input hint for prompts and API consumers
    pub fn format_hint(self) -> &'static str {
        match self {
            SemanticType::Integer => "whole number",
            SemanticType::String => "text",
            SemanticType::Date => "YYYY-MM-DD",
            SemanticType::DateTime => "YYYY-MM-DD HH:MM:SS",
            SemanticType::Money => "amount, e.g. 19.99",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SemanticType::Integer => "integer",
            SemanticType::String => "string",
            SemanticType::Date => "date",
            SemanticType::DateTime => "datetime",
            SemanticType::Money => "money",
        };
        f.write_str(name)
    }
}

/// A converted value ready to be bound to a procedure slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Integer(i32),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Money(Decimal),
}

impl SqlValue {
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            SqlValue::Integer(_) => SemanticType::Integer,
            SqlValue::Text(_) => SemanticType::String,
            SqlValue::Date(_) => SemanticType::Date,
            SqlValue::DateTime(_) => SemanticType::DateTime,
            SqlValue::Money(_) => SemanticType::Money,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Integer(i) => write!(f, "{i}"),
            SqlValue::Text(s) => write!(f, "{s}"),
            SqlValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            SqlValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            SqlValue::Money(m) => write!(f, "{m}"),
        }
    }
}

/// Parse an ISO calendar date (`YYYY-MM-DD`)
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse an ISO date and time. Accepts a space or `T` separator, optional
/// seconds and optional fractional seconds.
pub(crate) fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-01"), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_datetime_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1).and_then(|d| d.and_hms_opt(9, 5, 0));
        assert_eq!(parse_datetime("2024-01-01 09:05:00"), expected);
        assert_eq!(parse_datetime("2024-01-01T09:05:00"), expected);
        assert_eq!(parse_datetime("2024-01-01 09:05"), expected);
        assert!(parse_datetime("2024-01-01 09:05:00.125").is_some());
        assert_eq!(parse_datetime("2024-01-01"), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(SqlValue::Integer(-5).to_string(), "-5");
        assert_eq!(SqlValue::Text("alice".into()).to_string(), "alice");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(SqlValue::Date(date).to_string(), "2024-03-09");
        let money = Decimal::from_str("19.90").unwrap();
        assert_eq!(SqlValue::Money(money).to_string(), "19.90");
    }

    #[test]
    fn test_semantic_type_of_value() {
        assert_eq!(SqlValue::Integer(1).semantic_type(), SemanticType::Integer);
        assert_eq!(SqlValue::Text(String::new()).semantic_type(), SemanticType::String);
    }

    #[test]
    fn test_semantic_type_serde() {
        let json = serde_json::to_string(&SemanticType::DateTime).unwrap();
        assert_eq!(json, "\"date_time\"");
        let json = serde_json::to_string(&SemanticType::Money).unwrap();
        assert_eq!(json, "\"money\"");
    }
}
