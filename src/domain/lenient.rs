//! Forgiving field decoders.
//!
//! The bond dataset is assembled from several public sources and arrives with
//! mixed types (numbers as strings, `null` issuers, numeric ids). These helpers
//! degrade bad values to empty/`None` instead of rejecting the whole payload.

use chrono::{DateTime, NaiveDate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::ImpactSource;

/// Strings pass through; anything else becomes `""`.
pub fn string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

/// Identifier: strings pass through, numbers are rendered, anything else is `""`.
pub fn key<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

pub fn opt_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Numbers and numeric strings; non-finite or unparsable values are `None`.
pub fn opt_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(d)?))
}

pub fn f64_or_zero<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(d)?).unwrap_or(0.0))
}

pub fn opt_source<'de, D>(d: D) -> Result<Option<ImpactSource>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) => match s.as_str() {
            "rule" => Some(ImpactSource::Rule),
            "ml" => Some(ImpactSource::Ml),
            "ml_fallback" => Some(ImpactSource::MlFallback),
            _ => None,
        },
        _ => None,
    })
}

/// Calendar date from unix seconds (integer or float), an ISO date, or an
/// RFC 3339 timestamp. Anything else is an error.
pub fn date<'de, D>(d: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    to_date(&v).ok_or_else(|| D::Error::custom(format!("expected a date or unix seconds, got {v}")))
}

/// Like [`date`], but unusable values become `None`.
pub fn opt_date<'de, D>(d: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(to_date(&Value::deserialize(d)?))
}

fn to_date(v: &Value) -> Option<NaiveDate> {
    match v {
        Value::Number(n) => {
            let secs = match n.as_i64() {
                Some(secs) => secs,
                None => {
                    let x = n.as_f64()?;
                    if !x.is_finite() {
                        return None;
                    }
                    x.floor() as i64
                }
            };
            DateTime::from_timestamp(secs, 0).map(|t| t.date_naive())
        }
        Value::String(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|t| t.date_naive()))
        }
        _ => None,
    }
}

fn number(v: &Value) -> Option<f64> {
    let x = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    x.is_finite().then_some(x)
}
