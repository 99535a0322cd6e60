//! Forgiving serde field helpers.
//!
//! The exports are inconsistent about value types (`totalSpent` arrives as
//! `"26.00"`, counts sometimes as `5.0`). Each helper coerces what it can and
//! turns anything else into `None` with a warning, so one bad field never
//! costs the whole record.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::constants::TIMESTAMP_FORMAT;

use super::receipt::ReceiptItem;

/// Epoch milliseconds (UTC) to a naive UTC timestamp
pub fn timestamp_from_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

/// Parse a normalized `YYYY-MM-DD HH:MM:SS` timestamp
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => {
            warn!(value = %other, "Expected a text value, treating as null");
            None
        }
    })
}

pub fn decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                warn!(value = %s, "Unparseable decimal, treating as null");
                None
            }
        },
        Some(other) => {
            warn!(value = %other, "Expected a decimal value, treating as null");
            None
        }
    })
}

pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => {
            let parsed = n.as_i64().or_else(|| n.as_f64().and_then(integral));
            if parsed.is_none() {
                warn!(value = %n, "Non-integral number, treating as null");
            }
            parsed
        }
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            let parsed = trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral));
            if parsed.is_none() {
                warn!(value = %s, "Unparseable integer, treating as null");
            }
            parsed
        }
        Some(other) => {
            warn!(value = %other, "Expected an integer value, treating as null");
            None
        }
    })
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 {
        Some(v as i64)
    } else {
        None
    }
}

pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => {
                warn!(value = %s, "Unparseable boolean, treating as null");
                None
            }
        },
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => {
                warn!(value = %n, "Numeric boolean outside 0/1, treating as null");
                None
            }
        },
        Some(other) => {
            warn!(value = %other, "Expected a boolean value, treating as null");
            None
        }
    })
}

/// Normalized timestamp strings, with bare epoch milliseconds accepted too
pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            let parsed = parse_timestamp(&s);
            if parsed.is_none() {
                warn!(value = %s, "Unparseable timestamp, treating as null");
            }
            parsed
        }
        Some(Value::Number(n)) => {
            let parsed = n.as_i64().and_then(timestamp_from_millis);
            if parsed.is_none() {
                warn!(value = %n, "Unreadable epoch timestamp, treating as null");
            }
            parsed
        }
        Some(other) => {
            warn!(value = %other, "Expected a timestamp value, treating as null");
            None
        }
    })
}

pub fn items<'de, D>(deserializer: D) -> Result<Option<Vec<ReceiptItem>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Array(entries)) => Some(
            entries
                .into_iter()
                .filter_map(|entry| match serde_json::from_value::<ReceiptItem>(entry) {
                    Ok(item) => Some(item),
                    Err(e) => {
                        warn!(error = %e, "Dropping unreadable receipt item");
                        None
                    }
                })
                .collect(),
        ),
        Some(other) => {
            warn!(value = %other, "Expected an item list, treating as null");
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "decimal")]
        amount: Option<f64>,
        #[serde(default, deserialize_with = "integer")]
        count: Option<i64>,
        #[serde(default, deserialize_with = "flag")]
        enabled: Option<bool>,
        #[serde(default, deserialize_with = "timestamp")]
        at: Option<NaiveDateTime>,
        #[serde(default, deserialize_with = "text")]
        label: Option<String>,
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let fields: Fields = serde_json::from_value(json!({
            "amount": "26.00",
            "count": "5",
            "enabled": "True",
            "label": 42
        }))
        .unwrap();
        assert_eq!(fields.amount, Some(26.0));
        assert_eq!(fields.count, Some(5));
        assert_eq!(fields.enabled, Some(true));
        assert_eq!(fields.label.as_deref(), Some("42"));
        assert!(fields.at.is_none());
    }

    #[test]
    fn test_unparseable_values_become_null() {
        let fields: Fields = serde_json::from_value(json!({
            "amount": "n/a",
            "count": 2.5,
            "enabled": "maybe",
            "at": "yesterday",
            "label": {"nested": true}
        }))
        .unwrap();
        assert!(fields.amount.is_none());
        assert!(fields.count.is_none());
        assert!(fields.enabled.is_none());
        assert!(fields.at.is_none());
        assert!(fields.label.is_none());
    }

    #[test]
    fn test_integral_floats_are_integers() {
        let fields: Fields = serde_json::from_value(json!({ "count": 7.0 })).unwrap();
        assert_eq!(fields.count, Some(7));
    }

    #[test]
    fn test_timestamp_accepts_normalized_string_and_millis() {
        let fields: Fields =
            serde_json::from_value(json!({ "at": "2021-01-03 15:25:31" })).unwrap();
        assert_eq!(
            fields.at.unwrap().format(TIMESTAMP_FORMAT).to_string(),
            "2021-01-03 15:25:31"
        );

        let fields: Fields = serde_json::from_value(json!({ "at": 1609687531000_i64 })).unwrap();
        assert_eq!(
            fields.at.unwrap().format(TIMESTAMP_FORMAT).to_string(),
            "2021-01-03 15:25:31"
        );
    }

    #[test]
    fn test_unreadable_epoch_numbers_become_null() {
        let fields: Fields = serde_json::from_value(json!({ "at": 1.5 })).unwrap();
        assert!(fields.at.is_none());

        let fields: Fields = serde_json::from_value(json!({ "at": i64::MAX })).unwrap();
        assert!(fields.at.is_none());
    }
}
