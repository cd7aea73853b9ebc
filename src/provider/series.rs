// =============================================================================
// Provider response schema and latest-value extraction
// =============================================================================
//
// Every provider function has exactly one payload key and one value field the
// scanner reads. A response is accepted only when it carries the payload key
// of the function that was requested.
//
// Payload layout (all values are strings on the wire):
//
//   { "Meta Data": {...},
//     "Technical Analysis: EMA": { "2024-01-03": { "EMA": "123.45" }, ... } }
// =============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::error::{Result, ScannerError};

/// Date key -> field name -> raw numeric string.
///
/// A `BTreeMap` keeps date keys ordered; ISO dates sort chronologically, so
/// the last entry is the most recent one.
pub type IndicatorSeries = BTreeMap<String, BTreeMap<String, String>>;

const ERROR_FIELD: &str = "Error Message";
const ADVISORY_FIELDS: [&str; 2] = ["Note", "Information"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFunction {
    TimeSeriesDaily,
    Ema,
    Rsi,
    Stoch,
}

impl ProviderFunction {
    /// Value of the `function` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::TimeSeriesDaily => "TIME_SERIES_DAILY",
            Self::Ema => "EMA",
            Self::Rsi => "RSI",
            Self::Stoch => "STOCH",
        }
    }

    /// Top-level key the series is nested under.
    pub fn payload_key(&self) -> &'static str {
        match self {
            Self::TimeSeriesDaily => "Time Series (Daily)",
            Self::Ema => "Technical Analysis: EMA",
            Self::Rsi => "Technical Analysis: RSI",
            Self::Stoch => "Technical Analysis: STOCH",
        }
    }

    /// Field read by [`latest_value`]. For STOCH this is %K only; `SlowD` is
    /// returned by the provider but not used.
    pub fn value_field(&self) -> &'static str {
        match self {
            Self::TimeSeriesDaily => "4. close",
            Self::Ema => "EMA",
            Self::Rsi => "RSI",
            Self::Stoch => "SlowK",
        }
    }
}

impl std::fmt::Display for ProviderFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_param())
    }
}

/// A validated provider response: the untouched body plus its parsed series.
#[derive(Debug, Clone)]
pub struct IndicatorResponse {
    pub function: ProviderFunction,
    pub raw: Value,
    pub series: IndicatorSeries,
}

impl IndicatorResponse {
    /// Most recent value of this function's value field.
    pub fn latest_value(&self) -> Option<f64> {
        latest_value(&self.series, self.function.value_field())
    }
}

/// Validate `body` against the schema of `function`.
///
/// Fails on an explicit provider error, a missing payload key, or a payload
/// that is not a date -> record object. Advisories are logged and otherwise
/// ignored.
pub fn parse_response(function: ProviderFunction, body: Value) -> Result<IndicatorResponse> {
    let obj = body
        .as_object()
        .ok_or_else(|| ScannerError::Decode(format!("{function} response is not a JSON object")))?;

    if let Some(msg) = obj.get(ERROR_FIELD) {
        return Err(ScannerError::Provider(value_text(msg)));
    }

    let advisory = ADVISORY_FIELDS
        .iter()
        .find_map(|field| obj.get(*field).map(value_text));
    if let Some(note) = &advisory {
        warn!(function = %function, note = %note, "provider advisory");
    }

    let payload = match obj.get(function.payload_key()) {
        Some(p) => p,
        None => {
            let detail = advisory.unwrap_or_else(|| {
                format!("unexpected response format: missing '{}'", function.payload_key())
            });
            return Err(ScannerError::Provider(detail));
        }
    };

    let series = parse_series(function, payload)?;
    Ok(IndicatorResponse {
        function,
        raw: body,
        series,
    })
}

fn parse_series(function: ProviderFunction, payload: &Value) -> Result<IndicatorSeries> {
    let entries = payload.as_object().ok_or_else(|| {
        ScannerError::Decode(format!("'{}' is not an object", function.payload_key()))
    })?;

    let mut series = IndicatorSeries::new();
    for (date, record) in entries {
        let fields = record.as_object().ok_or_else(|| {
            ScannerError::Decode(format!("{function} record for {date} is not an object"))
        })?;
        let fields = fields
            .iter()
            .map(|(name, v)| (name.clone(), value_text(v)))
            .collect();
        series.insert(date.clone(), fields);
    }
    Ok(series)
}

/// Read `field` from the most recent date of `series`.
///
/// Absence is data: an empty series, a missing field, an unparsable number
/// and a non-finite value (`NaN`, `inf`) all yield `None`.
pub fn latest_value(series: &IndicatorSeries, field: &str) -> Option<f64> {
    let (_, record) = series.iter().next_back()?;
    record
        .get(field)?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
