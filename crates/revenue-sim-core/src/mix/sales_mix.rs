use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::SalesMatrix;
use crate::error::RevenueSimError;
use crate::schedule::{RuleId, RuleSet, UPFRONT_ID};
use crate::types::Money;
use crate::RevenueSimResult;

/// Amortization length used when the mix input does not name one.
pub const DEFAULT_AMORTIZATION_MONTHS: u32 = 12;

fn default_amortization_months() -> u32 {
    DEFAULT_AMORTIZATION_MONTHS
}

/// One month of GMV with the share sold upfront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixMonth {
    /// Gross merchandise value originated this month
    pub gmv: Money,
    /// Share of `gmv` recognized upfront, 0..=100. The rest is amortized.
    pub upfront_pct: Decimal,
}

/// Monthly GMV split between one upfront and one amortized rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixInput {
    pub months: Vec<MixMonth>,
    /// Months over which the non-upfront share is spread
    #[serde(default = "default_amortization_months")]
    pub amortization_months: u32,
}

/// Build a two-rule [`SalesMatrix`] (`upfront`, `amortized_{N}m`) from GMV
/// and upfront percentages.
///
/// The amortized cell is `gmv - upfront`, so each month's cells add back to
/// its GMV exactly.
pub fn build_sales_matrix(input: &MixInput) -> RevenueSimResult<SalesMatrix> {
    let rules = RuleSet::upfront_and_amortized(&[input.amortization_months])?;
    let amortized_id = RuleId::amortized(input.amortization_months);

    let mut sales = SalesMatrix::zeros(rules, input.months.len());
    for (month, m) in input.months.iter().enumerate() {
        if m.gmv < Decimal::ZERO {
            return Err(RevenueSimError::InvalidInput {
                field: format!("months[{month}].gmv"),
                reason: "GMV cannot be negative".into(),
            });
        }
        if m.upfront_pct < Decimal::ZERO || m.upfront_pct > dec!(100) {
            return Err(RevenueSimError::InvalidInput {
                field: format!("months[{month}].upfront_pct"),
                reason: format!("Upfront share must be between 0 and 100, got {}", m.upfront_pct),
            });
        }
        let upfront = m.gmv * (m.upfront_pct / dec!(100));
        sales = sales
            .with_sale(month, UPFRONT_ID, upfront)?
            .with_sale(month, amortized_id.as_str(), m.gmv - upfront)?;
    }

    Ok(sales)
}
