// =============================================================================
// REST API Endpoints - Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/`. Every other path is served from the
// public directory (the browser form UI).
//
// Single-symbol endpoints pass the provider payload through untouched and
// turn any failure into a uniform 500. The scan endpoint only fails at the
// request level (400 for missing symbols or an unknown setup type);
// per-symbol failures are reported inside the body.
//
// CORS is configured permissively.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::app_state::AppState;
use crate::error::ScannerError;
use crate::provider::{IndicatorResponse, PeriodParams, StochParams};
use crate::types::{ScanReport, ScanRequest, SetupType};

const DEFAULT_EMA_PERIOD: u32 = 10;
const DEFAULT_RSI_PERIOD: u32 = 14;
const DEFAULT_OUTPUT_SIZE: &str = "compact";

// =============================================================================
// Router construction
// =============================================================================

/// Build the full router with CORS middleware, static fallback and state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(&state.public_dir);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/scan", get(scan))
        .route("/api/stocks/:symbol/daily", get(stock_daily))
        .route("/api/stocks/:symbol/ema", get(stock_ema))
        .route("/api/stocks/:symbol/rsi", get(stock_rsi))
        .route("/api/stocks/:symbol/stoch", get(stock_stoch))
        .fallback_service(static_files)
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    uptime_secs: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "UP",
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// =============================================================================
// Scan
// =============================================================================

#[derive(Debug, Deserialize)]
struct ScanQuery {
    #[serde(default)]
    symbols: Option<String>,
    #[serde(default, rename = "setupType")]
    setup_type: Option<String>,
}

async fn scan(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<ScanReport>, ScannerError> {
    // Validated once, before any provider call.
    let setup = match query.setup_type.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw.parse::<SetupType>()?,
        _ => SetupType::default(),
    };
    let request = ScanRequest::parse(query.symbols.as_deref().unwrap_or(""), setup)?;

    info!(symbols = ?request.symbols, setup = %setup, "scan requested");
    Ok(Json(state.scanner.scan(request).await))
}

// =============================================================================
// Single-symbol passthrough
// =============================================================================

#[derive(Debug, Deserialize)]
struct DailyQuery {
    #[serde(default)]
    outputsize: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PeriodQuery {
    #[serde(default)]
    time_period: Option<u32>,
    #[serde(default)]
    interval: Option<String>,
    #[serde(default)]
    series_type: Option<String>,
}

impl PeriodQuery {
    fn into_params(self, default_period: u32) -> PeriodParams {
        let defaults = PeriodParams::daily_close(default_period);
        PeriodParams {
            time_period: self.time_period.unwrap_or(defaults.time_period),
            interval: self.interval.unwrap_or(defaults.interval),
            series_type: self.series_type.unwrap_or(defaults.series_type),
        }
    }
}

/// Log a provider failure and hand back the raw payload on success.
fn passthrough(
    endpoint: &'static str,
    symbol: &str,
    result: Result<IndicatorResponse, ScannerError>,
) -> Result<Json<serde_json::Value>, ScannerError> {
    match result {
        Ok(resp) => Ok(Json(resp.raw)),
        Err(e) => {
            error!(endpoint, symbol, error = %e, "provider request failed");
            Err(e)
        }
    }
}

async fn stock_daily(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<DailyQuery>,
) -> Result<Json<serde_json::Value>, ScannerError> {
    let symbol = symbol.to_uppercase();
    let output_size = query.outputsize.as_deref().unwrap_or(DEFAULT_OUTPUT_SIZE);
    let result = state.source.daily_series(&symbol, output_size).await;
    passthrough("daily", &symbol, result)
}

async fn stock_ema(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<serde_json::Value>, ScannerError> {
    let symbol = symbol.to_uppercase();
    let params = query.into_params(DEFAULT_EMA_PERIOD);
    let result = state.source.ema(&symbol, &params).await;
    passthrough("ema", &symbol, result)
}

async fn stock_rsi(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<serde_json::Value>, ScannerError> {
    let symbol = symbol.to_uppercase();
    let params = query.into_params(DEFAULT_RSI_PERIOD);
    let result = state.source.rsi(&symbol, &params).await;
    passthrough("rsi", &symbol, result)
}

async fn stock_stoch(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<StochParams>,
) -> Result<Json<serde_json::Value>, ScannerError> {
    let symbol = symbol.to_uppercase();
    let result = state.source.stoch(&symbol, &params).await;
    passthrough("stoch", &symbol, result)
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::stub::StubSource;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(source: StubSource) -> Router {
        router(Arc::new(AppState::new(Arc::new(source), "public")))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn two_symbol_source() -> StubSource {
        StubSource::new()
            .with_symbol("AAA", [12.0, 11.0, 10.0], 60.0, 70.0)
            .with_symbol("BBB", [9.0, 11.0, 10.0], 60.0, 70.0)
    }

    #[tokio::test]
    async fn health_reports_up_with_iso_timestamp() {
        let (status, body) = get_json(app(StubSource::new()), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "UP");
        let ts = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "{ts}");
    }

    #[tokio::test]
    async fn scan_end_to_end_bullish() {
        let (status, body) = get_json(
            app(two_symbol_source()),
            "/api/scan?symbols=AAA,BBB&setupType=bullish",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scanParameters"]["setupType"], "bullish");
        assert_eq!(body["scanParameters"]["symbols"], serde_json::json!(["AAA", "BBB"]));

        let matches = body["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["symbol"], "AAA");
        assert_eq!(matches[0]["ema10"], 12.0);
        assert_eq!(matches[0]["ema20"], 11.0);
        assert_eq!(matches[0]["ema50"], 10.0);
        assert_eq!(matches[0]["rsi"], 60.0);
        assert_eq!(matches[0]["stochK"], 70.0);
        assert!(body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn scan_defaults_to_bullish_and_uppercases() {
        let (status, body) = get_json(app(two_symbol_source()), "/api/scan?symbols=aaa").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scanParameters"]["setupType"], "bullish");
        assert_eq!(body["matches"][0]["symbol"], "AAA");
    }

    #[tokio::test]
    async fn scan_without_symbols_is_bad_request() {
        let (status, body) = get_json(app(two_symbol_source()), "/api/scan").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("symbols"));

        let (status, _) = get_json(app(two_symbol_source()), "/api/scan?symbols=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_setup_type_is_rejected_before_fan_out() {
        let source = Arc::new(two_symbol_source());
        let app = router(Arc::new(AppState::new(source.clone(), "public")));
        let (status, body) = get_json(app, "/api/scan?symbols=AAA&setupType=sideways").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("sideways"));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn scan_reports_per_symbol_errors_with_200() {
        let (status, body) = get_json(app(two_symbol_source()), "/api/scan?symbols=AAA,ZZZ").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["errors"][0]["symbol"], "ZZZ");
        assert_eq!(body["matches"][0]["symbol"], "AAA");
    }

    #[tokio::test]
    async fn ema_passthrough_returns_raw_payload() {
        let (status, body) = get_json(app(two_symbol_source()), "/api/stocks/aaa/ema?time_period=20").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Technical Analysis: EMA"]["2024-01-03"]["EMA"], "11.0000");
    }

    #[tokio::test]
    async fn ema_passthrough_defaults_to_period_ten() {
        let (_, body) = get_json(app(two_symbol_source()), "/api/stocks/AAA/ema").await;
        assert_eq!(body["Technical Analysis: EMA"]["2024-01-03"]["EMA"], "12.0000");
    }

    #[tokio::test]
    async fn rsi_stoch_and_daily_passthrough() {
        let (status, body) = get_json(app(two_symbol_source()), "/api/stocks/AAA/rsi").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("Technical Analysis: RSI").is_some());

        let (status, body) =
            get_json(app(two_symbol_source()), "/api/stocks/AAA/stoch?fastkperiod=9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Technical Analysis: STOCH"]["2024-01-03"]["SlowK"], "70.0000");

        let (status, body) = get_json(app(two_symbol_source()), "/api/stocks/AAA/daily").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("Time Series (Daily)").is_some());
    }

    #[tokio::test]
    async fn provider_failure_is_uniform_500() {
        let (status, body) = get_json(app(two_symbol_source()), "/api/stocks/NOPE/rsi").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch data from provider");
        assert!(body["details"].as_str().unwrap().contains("Invalid API call"));
    }

    #[tokio::test]
    async fn network_failure_never_exposes_credential() {
        let config = crate::config::ScannerConfig {
            api_key: Some("SECRETKEY".into()),
            base_url: "http://127.0.0.1:9/q".into(),
            request_timeout_secs: 5,
            ..crate::config::ScannerConfig::default()
        };
        let client = crate::provider::IndicatorClient::new(&config).unwrap();
        let state = Arc::new(AppState::new(Arc::new(client), "public"));

        let (status, body) = get_json(router(state.clone()), "/api/stocks/ibm/rsi").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let details = body["details"].as_str().unwrap();
        assert!(details.starts_with("Network error"), "{details}");
        assert!(!body.to_string().contains("SECRETKEY"), "{body}");

        let (status, body) = get_json(router(state), "/api/scan?symbols=IBM").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["errors"][0]["symbol"], "IBM");
        assert!(!body.to_string().contains("SECRETKEY"), "{body}");
    }

    #[test]
    fn period_query_fills_defaults() {
        let q = PeriodQuery {
            time_period: None,
            interval: Some("weekly".into()),
            series_type: None,
        };
        let p = q.into_params(DEFAULT_RSI_PERIOD);
        assert_eq!(p.time_period, 14);
        assert_eq!(p.interval, "weekly");
        assert_eq!(p.series_type, "close");
    }
}
