// =============================================================================
// Setup Rules - static trend + momentum thresholds per setup type
// =============================================================================
//
//   setup    | trend                         | momentum
//   ---------+-------------------------------+-------------------------------
//   bullish  | ema10 > ema20 > ema50         | 55 <= rsi <= 80, stochK > 60
//   bearish  | ema10 < ema20 < ema50         | 20 <= rsi <= 45, stochK < 40
//   neutral  | EMAs within 1% of their mean  | 45 <= rsi <= 65, 25 <= stochK <= 75
//
// Options-market filters (IV rank, open interest) are not part of any rule.
// =============================================================================

use crate::types::{IndicatorSnapshot, SetupType};

/// Maximum relative distance of each EMA from the EMA mean for `neutral`.
pub const NEUTRAL_EMA_BAND: f64 = 0.01;

/// Relative slack on the band so an exact 1% distance stays inside whatever
/// the price scale.
const BAND_TOLERANCE: f64 = 1e-9;

/// Which halves of a rule held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleCheck {
    pub trend: bool,
    pub momentum: bool,
}

impl RuleCheck {
    pub fn matched(&self) -> bool {
        self.trend && self.momentum
    }
}

pub fn evaluate(setup: SetupType, v: &IndicatorSnapshot) -> RuleCheck {
    match setup {
        SetupType::Bullish => RuleCheck {
            trend: v.ema10 > v.ema20 && v.ema20 > v.ema50,
            momentum: (55.0..=80.0).contains(&v.rsi) && v.stoch_k > 60.0,
        },
        SetupType::Bearish => RuleCheck {
            trend: v.ema10 < v.ema20 && v.ema20 < v.ema50,
            momentum: (20.0..=45.0).contains(&v.rsi) && v.stoch_k < 40.0,
        },
        SetupType::Neutral => RuleCheck {
            trend: emas_converged(v),
            momentum: (45.0..=65.0).contains(&v.rsi) && (25.0..=75.0).contains(&v.stoch_k),
        },
    }
}

fn emas_converged(v: &IndicatorSnapshot) -> bool {
    let mean = (v.ema10 + v.ema20 + v.ema50) / 3.0;
    let band = NEUTRAL_EMA_BAND * mean.abs() * (1.0 + BAND_TOLERANCE);
    [v.ema10, v.ema20, v.ema50]
        .iter()
        .all(|ema| (ema - mean).abs() <= band)
}
