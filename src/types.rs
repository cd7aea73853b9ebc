// =============================================================================
// Shared types used across the scanner
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::ScannerError;

/// Trading pattern a scan looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupType {
    Bullish,
    Bearish,
    Neutral,
}

impl Default for SetupType {
    fn default() -> Self {
        Self::Bullish
    }
}

impl std::fmt::Display for SetupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

impl std::str::FromStr for SetupType {
    type Err = ScannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bullish" => Ok(Self::Bullish),
            "bearish" => Ok(Self::Bearish),
            "neutral" => Ok(Self::Neutral),
            other => Err(ScannerError::Validation(format!(
                "Invalid setupType: '{other}'. Use 'bullish', 'bearish' or 'neutral'."
            ))),
        }
    }
}

/// A validated scan request: uppercased, de-duplicated symbols plus the setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub symbols: Vec<String>,
    pub setup_type: SetupType,
}

impl ScanRequest {
    /// Build a request from the raw comma-separated `symbols` parameter.
    ///
    /// Entries are trimmed and uppercased; empty entries and repeats are
    /// dropped. Fails with a validation error if nothing is left.
    pub fn parse(raw_symbols: &str, setup_type: SetupType) -> Result<Self, ScannerError> {
        let mut symbols: Vec<String> = Vec::new();
        for s in raw_symbols.split(',') {
            let s = s.trim().to_uppercase();
            if !s.is_empty() && !symbols.contains(&s) {
                symbols.push(s);
            }
        }

        if symbols.is_empty() {
            return Err(ScannerError::Validation(
                "Query parameter 'symbols' is required (comma-separated list)".to_string(),
            ));
        }

        Ok(Self {
            symbols,
            setup_type,
        })
    }
}

/// Latest indicator readings for one symbol, emitted when its rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub ema10: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub rsi: f64,
    pub stoch_k: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub symbol: String,
    #[serde(flatten)]
    pub values: IndicatorSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanError {
    pub symbol: String,
    pub message: String,
}

/// Full response body of a scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub scan_parameters: ScanRequest,
    pub matches: Vec<ScanResult>,
    pub errors: Vec<ScanError>,
}
