// =============================================================================
// In-memory IndicatorSource for tests
// =============================================================================
//
// Each symbol carries the latest EMA (by period), RSI and %K values. Responses
// are built as provider-shaped JSON and pushed through `parse_response`, so
// the scanner and the router see exactly what the real client would return.
// Unknown symbols answer with a provider "Error Message".
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{Result, ScannerError};
use crate::provider::client::{IndicatorSource, PeriodParams, StochParams};
use crate::provider::series::{parse_response, IndicatorResponse, ProviderFunction};

const LATEST: &str = "2024-01-03";
const PREVIOUS: &str = "2024-01-02";

#[derive(Debug, Clone, Default)]
pub struct Fixture {
    pub ema: HashMap<u32, f64>,
    pub rsi: Option<f64>,
    pub stoch_k: Option<f64>,
    pub close: Option<f64>,
    pub stoch_error: Option<String>,
}

#[derive(Debug, Default)]
pub struct StubSource {
    fixtures: HashMap<String, Fixture>,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a symbol with all five scan values present.
    pub fn with_symbol(mut self, symbol: &str, emas: [f64; 3], rsi: f64, stoch_k: f64) -> Self {
        let fixture = Fixture {
            ema: HashMap::from([(10, emas[0]), (20, emas[1]), (50, emas[2])]),
            rsi: Some(rsi),
            stoch_k: Some(stoch_k),
            close: Some(emas[0]),
            stoch_error: None,
        };
        self.fixtures.insert(symbol.to_string(), fixture);
        self
    }

    pub fn with_fixture(mut self, symbol: &str, fixture: Fixture) -> Self {
        self.fixtures.insert(symbol.to_string(), fixture);
        self
    }

    /// Number of provider calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fixture(&self, symbol: &str) -> Result<&Fixture> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fixtures.get(symbol).ok_or_else(|| {
            ScannerError::Provider(format!(
                "Invalid API call. Please retry or visit the documentation for {symbol}."
            ))
        })
    }

    /// Provider-shaped body: the value on the latest date (if any) plus an
    /// older record that must never be picked.
    fn body(function: ProviderFunction, value: Option<f64>) -> Value {
        let field = function.value_field();
        let mut series = serde_json::Map::new();
        series.insert(PREVIOUS.to_string(), json!({ field: "-1.0" }));
        if let Some(v) = value {
            let mut record = serde_json::Map::new();
            record.insert(field.to_string(), Value::String(format!("{v:.4}")));
            if function == ProviderFunction::Stoch {
                record.insert("SlowD".to_string(), Value::String("50.0000".into()));
            }
            series.insert(LATEST.to_string(), Value::Object(record));
        } else {
            series.insert(LATEST.to_string(), json!({}));
        }

        let mut body = serde_json::Map::new();
        body.insert("Meta Data".to_string(), json!({ "1: Symbol": "stub" }));
        body.insert(function.payload_key().to_string(), Value::Object(series));
        Value::Object(body)
    }
}

#[async_trait]
impl IndicatorSource for StubSource {
    async fn daily_series(&self, symbol: &str, _output_size: &str) -> Result<IndicatorResponse> {
        let f = self.fixture(symbol)?;
        let function = ProviderFunction::TimeSeriesDaily;
        parse_response(function, Self::body(function, f.close))
    }

    async fn ema(&self, symbol: &str, params: &PeriodParams) -> Result<IndicatorResponse> {
        let f = self.fixture(symbol)?;
        let function = ProviderFunction::Ema;
        let value = f.ema.get(&params.time_period).copied();
        parse_response(function, Self::body(function, value))
    }

    async fn rsi(&self, symbol: &str, _params: &PeriodParams) -> Result<IndicatorResponse> {
        let f = self.fixture(symbol)?;
        let function = ProviderFunction::Rsi;
        parse_response(function, Self::body(function, f.rsi))
    }

    async fn stoch(&self, symbol: &str, _params: &StochParams) -> Result<IndicatorResponse> {
        let f = self.fixture(symbol)?;
        if let Some(msg) = &f.stoch_error {
            return Err(ScannerError::Provider(msg.clone()));
        }
        let function = ProviderFunction::Stoch;
        parse_response(function, Self::body(function, f.stoch_k))
    }
}
