// =============================================================================
// Indicator Provider Module
// =============================================================================
//
// Typed access to the external technical-indicator provider:
// - Request construction and transport (`client`)
// - Per-function response schema and latest-value extraction (`series`)

pub mod client;
pub mod series;

#[cfg(test)]
pub mod stub;

pub use client::{IndicatorClient, IndicatorSource, PeriodParams, StochParams};
pub use series::IndicatorResponse;
