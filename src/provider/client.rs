// =============================================================================
// Indicator Provider Client - parameterised GET requests, validated responses
// =============================================================================
//
// One network call per indicator request. The credential is checked before
// any request is built; a client without one fails every call with a
// configuration error. No retry or backoff.
//
// SECURITY: the API key is sent as a query parameter (the provider requires
// it) but is never logged. `Debug` redacts it.
// =============================================================================

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::ScannerConfig;
use crate::error::{Result, ScannerError};
use crate::provider::series::{parse_response, IndicatorResponse, ProviderFunction};

/// Parameters shared by the period-based indicators (EMA, RSI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodParams {
    pub time_period: u32,
    pub interval: String,
    pub series_type: String,
}

impl PeriodParams {
    /// Daily bars over closing prices.
    pub fn daily_close(time_period: u32) -> Self {
        Self {
            time_period,
            interval: "daily".to_string(),
            series_type: "close".to_string(),
        }
    }
}

fn default_interval() -> String {
    "daily".to_string()
}

fn default_fastk_period() -> u32 {
    5
}

fn default_slow_period() -> u32 {
    3
}

/// Stochastic oscillator parameters. Field names match the provider's query
/// parameters so the struct doubles as the HTTP query extractor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StochParams {
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_fastk_period", rename = "fastkperiod")]
    pub fastk_period: u32,
    #[serde(default = "default_slow_period", rename = "slowkperiod")]
    pub slowk_period: u32,
    #[serde(default = "default_slow_period", rename = "slowdperiod")]
    pub slowd_period: u32,
    #[serde(default, rename = "slowkmatype")]
    pub slowk_ma_type: u8,
    #[serde(default, rename = "slowdmatype")]
    pub slowd_ma_type: u8,
}

impl Default for StochParams {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            fastk_period: default_fastk_period(),
            slowk_period: default_slow_period(),
            slowd_period: default_slow_period(),
            slowk_ma_type: 0,
            slowd_ma_type: 0,
        }
    }
}

/// Source of indicator series. The scanner and the HTTP layer only see this
/// trait, so tests can swap in an in-memory source.
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    async fn daily_series(&self, symbol: &str, output_size: &str) -> Result<IndicatorResponse>;

    async fn ema(&self, symbol: &str, params: &PeriodParams) -> Result<IndicatorResponse>;

    async fn rsi(&self, symbol: &str, params: &PeriodParams) -> Result<IndicatorResponse>;

    async fn stoch(&self, symbol: &str, params: &StochParams) -> Result<IndicatorResponse>;
}

/// HTTP client for the indicator provider.
#[derive(Clone)]
pub struct IndicatorClient {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl IndicatorClient {
    pub fn new(config: &ScannerConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build provider HTTP client")?;

        debug!(base_url = %config.base_url, "IndicatorClient initialised");

        Ok(Self {
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            base_url: config.base_url.clone(),
            client,
        })
    }

    /// Build the full query for `function` (without the credential).
    fn query(
        function: ProviderFunction,
        symbol: &str,
        extra: Vec<(&'static str, String)>,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("function", function.as_param().to_string()),
            ("symbol", symbol.to_string()),
        ];
        params.extend(extra);
        params
    }

    fn period_query(params: &PeriodParams) -> Vec<(&'static str, String)> {
        vec![
            ("time_period", params.time_period.to_string()),
            ("interval", params.interval.clone()),
            ("series_type", params.series_type.clone()),
        ]
    }

    fn stoch_query(params: &StochParams) -> Vec<(&'static str, String)> {
        vec![
            ("interval", params.interval.clone()),
            ("fastkperiod", params.fastk_period.to_string()),
            ("slowkperiod", params.slowk_period.to_string()),
            ("slowdperiod", params.slowd_period.to_string()),
            ("slowkmatype", params.slowk_ma_type.to_string()),
            ("slowdmatype", params.slowd_ma_type.to_string()),
        ]
    }

    /// Issue one GET for `function` and validate the body against its schema.
    async fn fetch(
        &self,
        function: ProviderFunction,
        symbol: &str,
        extra: Vec<(&'static str, String)>,
    ) -> Result<IndicatorResponse> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ScannerError::Configuration("provider API key is not configured".to_string())
        })?;

        let mut params = Self::query(function, symbol, extra);
        debug!(function = %function, symbol, params = ?params, "provider request");
        params.push(("apikey", api_key.to_string()));

        let resp = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(ScannerError::transport)?;

        let status = resp.status();
        let text = resp.text().await.map_err(ScannerError::transport)?;

        if !status.is_success() {
            return Err(ScannerError::Provider(format!(
                "{function} request returned {status}: {text}"
            )));
        }

        let body: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ScannerError::Decode(format!("{function}: {e}")))?;

        let parsed = parse_response(function, body)?;
        debug!(function = %function, symbol, points = parsed.series.len(), "provider response validated");
        Ok(parsed)
    }
}

#[async_trait]
impl IndicatorSource for IndicatorClient {
    #[instrument(skip(self), name = "provider::daily_series")]
    async fn daily_series(&self, symbol: &str, output_size: &str) -> Result<IndicatorResponse> {
        self.fetch(
            ProviderFunction::TimeSeriesDaily,
            symbol,
            vec![("outputsize", output_size.to_string())],
        )
        .await
    }

    #[instrument(skip(self), name = "provider::ema")]
    async fn ema(&self, symbol: &str, params: &PeriodParams) -> Result<IndicatorResponse> {
        self.fetch(ProviderFunction::Ema, symbol, Self::period_query(params))
            .await
    }

    #[instrument(skip(self), name = "provider::rsi")]
    async fn rsi(&self, symbol: &str, params: &PeriodParams) -> Result<IndicatorResponse> {
        self.fetch(ProviderFunction::Rsi, symbol, Self::period_query(params))
            .await
    }

    #[instrument(skip(self), name = "provider::stoch")]
    async fn stoch(&self, symbol: &str, params: &StochParams) -> Result<IndicatorResponse> {
        self.fetch(ProviderFunction::Stoch, symbol, Self::stoch_query(params))
            .await
    }
}

impl std::fmt::Debug for IndicatorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatorClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}
