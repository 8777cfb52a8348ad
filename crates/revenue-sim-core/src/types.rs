use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RevenueSimError;
use crate::RevenueSimResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Percentages on a 0..100 scale. `None` when the denominator is zero.
pub type Percent = Option<Decimal>;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Percentage on a 0..100 scale, `None` when the denominator is zero or the
/// ratio is out of decimal range.
pub fn percent_of(numerator: Decimal, denominator: Decimal) -> Percent {
    numerator
        .checked_div(denominator)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
}

/// Sum `values`, failing with `InvalidInput` on `field` instead of
/// overflowing.
pub fn checked_total<I>(values: I, field: &str) -> RevenueSimResult<Money>
where
    I: IntoIterator<Item = Money>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
        .ok_or_else(|| RevenueSimError::InvalidInput {
            field: field.to_string(),
            reason: "Sum exceeds the representable decimal range".into(),
        })
}
