//! Date and timestamp field resolvers.
//!
//! Both normalize a stored value into the `DateTime` scalar: an RFC 3339 UTC
//! string with millisecond precision. `null` in, `null` out.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::Resolver;
use crate::error::{ApiError, ApiResult};
use crate::store::Document;

/// Resolver for a stored date: an RFC 3339 / ISO-8601 string or epoch milliseconds.
pub fn date_resolver<F>(extract: F) -> Resolver
where
    F: Fn(&Document) -> Option<Value> + Send + Sync + 'static,
{
    Resolver::new(move |parent, _args| {
        let normalized = extract(parent).map_or(Ok(Value::Null), |v| normalize_date(&v));
        async move { normalized }
    })
}

/// Resolver for a stored numeric timestamp in epoch milliseconds.
pub fn timestamp_resolver<F>(extract: F) -> Resolver
where
    F: Fn(&Document) -> Option<Value> + Send + Sync + 'static,
{
    Resolver::new(move |parent, _args| {
        let normalized = extract(parent).map_or(Ok(Value::Null), |v| normalize_timestamp(&v));
        async move { normalized }
    })
}

pub fn normalize_date(value: &Value) -> ApiResult<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Number(_) => normalize_timestamp(value),
        Value::String(s) => parse_date(s)
            .map(format)
            .ok_or_else(|| ApiError::InvalidValue(format!("unparseable date: {}", s))),
        other => Err(ApiError::InvalidValue(format!("not a date: {}", other))),
    }
}

pub fn normalize_timestamp(value: &Value) -> ApiResult<Value> {
    let millis = match value {
        Value::Null => return Ok(Value::Null),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    millis
        .and_then(DateTime::from_timestamp_millis)
        .map(format)
        .ok_or_else(|| ApiError::InvalidValue(format!("not an epoch-millisecond timestamp: {}", value)))
}

/// Validator for the `DateTime` scalar.
pub fn is_date_time(value: &async_graphql::Value) -> bool {
    matches!(value, async_graphql::Value::String(s) if DateTime::parse_from_rfc3339(s).is_ok())
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Zone-less ISO forms are taken as UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn format(dt: DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}
