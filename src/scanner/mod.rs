// =============================================================================
// Scan Orchestrator - per-symbol fan-out, latest-value reduction, rule check
// =============================================================================
//
// For every symbol, independently and concurrently:
//   1. fetch EMA(10), EMA(20), EMA(50), RSI(14) and STOCH together,
//   2. reduce each series to its most recent value,
//   3. evaluate the setup rule.
//
// A symbol ends up in exactly one bucket: matches, errors, or neither (rule
// did not hold). Failures are caught per symbol and never abort the batch.
// There is no shared state between symbol futures; results are merged only
// after all of them complete.
// =============================================================================

pub mod rules;

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::error::{Result, ScannerError};
use crate::provider::{IndicatorSource, PeriodParams, StochParams};
use crate::types::{IndicatorSnapshot, ScanError, ScanReport, ScanRequest, ScanResult, SetupType};

pub const EMA_PERIODS: [u32; 3] = [10, 20, 50];
pub const RSI_PERIOD: u32 = 14;

/// Result of scanning a single symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    Matched(ScanResult),
    NotMatched,
    Failed(ScanError),
}

#[derive(Clone)]
pub struct Scanner {
    source: Arc<dyn IndicatorSource>,
}

impl Scanner {
    pub fn new(source: Arc<dyn IndicatorSource>) -> Self {
        Self { source }
    }

    /// Run `request` across all of its symbols.
    pub async fn scan(&self, request: ScanRequest) -> ScanReport {
        let setup = request.setup_type;
        info!(symbols = request.symbols.len(), setup = %setup, "scan started");

        let outcomes = join_all(
            request
                .symbols
                .iter()
                .map(|symbol| self.scan_symbol(symbol, setup)),
        )
        .await;

        let mut matches = Vec::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                SymbolOutcome::Matched(result) => matches.push(result),
                SymbolOutcome::Failed(err) => errors.push(err),
                SymbolOutcome::NotMatched => {}
            }
        }

        info!(
            setup = %setup,
            matches = matches.len(),
            errors = errors.len(),
            "scan finished"
        );

        ScanReport {
            scan_parameters: request,
            matches,
            errors,
        }
    }

    pub async fn scan_symbol(&self, symbol: &str, setup: SetupType) -> SymbolOutcome {
        let values = match self.snapshot(symbol).await {
            Ok(v) => v,
            Err(e) => {
                warn!(symbol, error = %e, "symbol processing failed");
                return SymbolOutcome::Failed(ScanError {
                    symbol: symbol.to_string(),
                    message: e.to_string(),
                });
            }
        };

        let check = rules::evaluate(setup, &values);
        debug!(
            symbol,
            setup = %setup,
            trend = check.trend,
            momentum = check.momentum,
            ?values,
            "rule evaluated"
        );

        if check.matched() {
            SymbolOutcome::Matched(ScanResult {
                symbol: symbol.to_string(),
                values,
            })
        } else {
            SymbolOutcome::NotMatched
        }
    }

    /// Fetch the five series concurrently and reduce them to latest values.
    pub async fn snapshot(&self, symbol: &str) -> Result<IndicatorSnapshot> {
        let [p10, p20, p50] = EMA_PERIODS.map(PeriodParams::daily_close);
        let rsi_params = PeriodParams::daily_close(RSI_PERIOD);
        let stoch_params = StochParams::default();

        let (ema10, ema20, ema50, rsi, stoch) = tokio::join!(
            self.source.ema(symbol, &p10),
            self.source.ema(symbol, &p20),
            self.source.ema(symbol, &p50),
            self.source.rsi(symbol, &rsi_params),
            self.source.stoch(symbol, &stoch_params),
        );

        let named = [
            ("ema10", ema10?.latest_value()),
            ("ema20", ema20?.latest_value()),
            ("ema50", ema50?.latest_value()),
            ("rsi", rsi?.latest_value()),
            ("stochK", stoch?.latest_value()),
        ];

        match named {
            [(_, Some(ema10)), (_, Some(ema20)), (_, Some(ema50)), (_, Some(rsi)), (_, Some(stoch_k))] => {
                Ok(IndicatorSnapshot {
                    ema10,
                    ema20,
                    ema50,
                    rsi,
                    stoch_k,
                })
            }
            _ => {
                let missing: Vec<&str> = named
                    .iter()
                    .filter(|(_, v)| v.is_none())
                    .map(|(name, _)| *name)
                    .collect();
                Err(ScannerError::InsufficientData(missing.join(", ")))
            }
        }
    }
}
