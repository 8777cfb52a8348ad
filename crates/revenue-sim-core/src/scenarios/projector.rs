use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RevenueSimError;
use crate::types::{Money, Rate};
use crate::RevenueSimResult;

/// Monthly compounding rates for the optimistic and pessimistic variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRates {
    /// e.g. 0.02 = +2% per month
    pub optimistic_rate: Rate,
    /// e.g. -0.02 = -2% per month
    pub pessimistic_rate: Rate,
}

/// A series with its optimistic and pessimistic rescalings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProjection {
    pub base: Vec<Money>,
    pub optimistic: Vec<Money>,
    pub pessimistic: Vec<Money>,
    pub optimistic_rate: Rate,
    pub pessimistic_rate: Rate,
}

/// Rescale `series` by monthly compounding: `out[i] = series[i] * (1 + rate)^i`.
///
/// Index 0 is left unscaled. Any rate is accepted; the only failure is a
/// growth factor that overflows decimal range.
pub fn project(series: &[Money], monthly_rate: Rate) -> RevenueSimResult<Vec<Money>> {
    let growth = Decimal::ONE
        .checked_add(monthly_rate)
        .ok_or_else(|| overflow(0, monthly_rate))?;
    let mut factor = Decimal::ONE;
    let mut projected = Vec::with_capacity(series.len());

    for (i, value) in series.iter().enumerate() {
        if i > 0 {
            factor = factor.checked_mul(growth).ok_or_else(|| overflow(i, monthly_rate))?;
        }
        projected.push(value.checked_mul(factor).ok_or_else(|| overflow(i, monthly_rate))?);
    }

    Ok(projected)
}

/// Project `series` under both scenario rates.
pub fn project_band(series: &[Money], rates: &ScenarioRates) -> RevenueSimResult<ScenarioProjection> {
    Ok(ScenarioProjection {
        base: series.to_vec(),
        optimistic: project(series, rates.optimistic_rate)?,
        pessimistic: project(series, rates.pessimistic_rate)?,
        optimistic_rate: rates.optimistic_rate,
        pessimistic_rate: rates.pessimistic_rate,
    })
}

fn overflow(index: usize, rate: Rate) -> RevenueSimError {
    RevenueSimError::InvalidInput {
        field: "monthly_rate".into(),
        reason: format!("Compounding {rate} overflows at period {index}"),
    }
}
