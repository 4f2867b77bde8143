//! Wire representation of catalog entries
//!
//! The catalog service serializes shapes loosely: absent stencils come back as
//! `""`, counts may be missing or null, ids may be numbers or strings, and
//! dates use whatever format the server framework chose (HTTP-date in
//! practice, RFC 3339 from newer deployments). The helpers here accept all of
//! those and never fail on a malformed optional field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A shape exactly as it travels over the wire
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireShape {
    #[serde(deserialize_with = "required_id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub upload_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: String,
    #[serde(default, deserialize_with = "optional_id")]
    pub stencil_id: Option<u64>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub stencil_file_name: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub stencil_title: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_name: String,
    #[serde(default, deserialize_with = "optional_id")]
    pub team_id: Option<u64>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub team_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub download_count: u64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rating: Option<f64>,
}

/// Parse a timestamp in any of the formats the catalog service has produced.
///
/// Accepts RFC 3339, RFC 2822 / HTTP-date (`Tue, 14 Jan 2025 10:00:00 GMT`),
/// naive `YYYY-MM-DD HH:MM:SS[.f]` / `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC)
/// and bare dates.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn id_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn required_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value).ok_or_else(|| de::Error::custom(format!("invalid shape id: {}", value)))
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => parse_timestamp(&s),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    })
}
