use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RevenueSimError;
use crate::types::{Money, Rate};
use crate::RevenueSimResult;

/// Longest forecast accepted, in months.
pub const MAX_FORECAST_PERIODS: usize = 1200;

/// Extends a monthly series beyond the simulated horizon.
///
/// The statistical method is up to the implementor. Any
/// `Fn(&[Money], usize) -> RevenueSimResult<Vec<Money>>` closure is a forecaster.
pub trait Forecaster {
    /// Return exactly `periods` values following `history`.
    fn forecast(&self, history: &[Money], periods: usize) -> RevenueSimResult<Vec<Money>>;
}

impl<F> Forecaster for F
where
    F: Fn(&[Money], usize) -> RevenueSimResult<Vec<Money>>,
{
    fn forecast(&self, history: &[Money], periods: usize) -> RevenueSimResult<Vec<Money>> {
        self(history, periods)
    }
}

/// Compounds the last observed value by a fixed rate per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantGrowthForecaster {
    pub rate: Rate,
}

impl Forecaster for ConstantGrowthForecaster {
    fn forecast(&self, history: &[Money], periods: usize) -> RevenueSimResult<Vec<Money>> {
        check_periods(periods)?;
        let last = *history.last().ok_or_else(empty_history)?;
        let growth = Decimal::ONE
            .checked_add(self.rate)
            .ok_or_else(|| RevenueSimError::InvalidInput {
                field: "forecast.rate".into(),
                reason: format!("Growth factor 1 + {} is out of range", self.rate),
            })?;
        let mut prev = last;
        let mut out = Vec::with_capacity(periods);
        for i in 0..periods {
            prev = prev
                .checked_mul(growth)
                .ok_or_else(|| RevenueSimError::InvalidInput {
                    field: "forecast.rate".into(),
                    reason: format!("Growth of {} overflows at forecast period {}", self.rate, i + 1),
                })?;
            out.push(prev);
        }
        Ok(out)
    }
}

/// Least-squares line through the history, extended forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearTrendForecaster;

impl Forecaster for LinearTrendForecaster {
    fn forecast(&self, history: &[Money], periods: usize) -> RevenueSimResult<Vec<Money>> {
        check_periods(periods)?;
        if history.is_empty() {
            return Err(empty_history());
        }
        let n = Decimal::from(history.len());
        let mean_x = (n - Decimal::ONE) / dec!(2);
        let mean_y = history
            .iter()
            .try_fold(Decimal::ZERO, |acc, y| acc.checked_add(*y))
            .ok_or_else(trend_overflow)?
            / n;

        let mut sxy = Decimal::ZERO;
        let mut sxx = Decimal::ZERO;
        for (x, y) in history.iter().enumerate() {
            let dx = Decimal::from(x) - mean_x;
            sxy = y
                .checked_sub(mean_y)
                .and_then(|dy| dx.checked_mul(dy))
                .and_then(|p| sxy.checked_add(p))
                .ok_or_else(trend_overflow)?;
            sxx += dx * dx;
        }
        // A single observation has no slope; hold it flat.
        let slope = if sxx.is_zero() {
            Decimal::ZERO
        } else {
            sxy.checked_div(sxx).ok_or_else(trend_overflow)?
        };

        (0..periods)
            .map(|k| {
                let x = Decimal::from(history.len() + k);
                slope
                    .checked_mul(x - mean_x)
                    .and_then(|rise| mean_y.checked_add(rise))
                    .ok_or_else(trend_overflow)
            })
            .collect()
    }
}

/// Forecaster selection as supplied in a simulation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForecastMethod {
    ConstantGrowth { rate: Rate },
    LinearTrend,
}

/// How far to extend total revenue past the horizon, and with what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub method: ForecastMethod,
    /// Number of months to forecast
    pub periods: usize,
}

impl ForecastConfig {
    pub fn forecaster(&self) -> Box<dyn Forecaster> {
        match &self.method {
            ForecastMethod::ConstantGrowth { rate } => {
                Box::new(ConstantGrowthForecaster { rate: *rate })
            }
            ForecastMethod::LinearTrend => Box::new(LinearTrendForecaster),
        }
    }

    pub fn run(&self, history: &[Money]) -> RevenueSimResult<Vec<Money>> {
        self.forecaster().forecast(history, self.periods)
    }
}

fn check_periods(periods: usize) -> RevenueSimResult<()> {
    if periods > MAX_FORECAST_PERIODS {
        return Err(RevenueSimError::InvalidInput {
            field: "forecast.periods".into(),
            reason: format!("{periods} periods exceeds the {MAX_FORECAST_PERIODS} month limit"),
        });
    }
    Ok(())
}

fn trend_overflow() -> RevenueSimError {
    RevenueSimError::InvalidInput {
        field: "forecast".into(),
        reason: "Linear trend exceeds the representable decimal range".into(),
    }
}

fn empty_history() -> RevenueSimError {
    RevenueSimError::InsufficientData("Forecasting requires at least one observed month".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_growth_compounds_last_value() {
        let f = ConstantGrowthForecaster { rate: dec!(0.10) };
        let out = f.forecast(&[dec!(50), dec!(100)], 2).unwrap();
        assert_eq!(out, vec![dec!(110), dec!(121)]);
    }

    #[test]
    fn test_linear_trend_extends_line() {
        let out = LinearTrendForecaster
            .forecast(&[dec!(10), dec!(20), dec!(30)], 2)
            .unwrap();
        assert_eq!(out, vec![dec!(40), dec!(50)]);
    }

    #[test]
    fn test_linear_trend_single_point_is_flat() {
        let out = LinearTrendForecaster.forecast(&[dec!(7)], 3).unwrap();
        assert_eq!(out, vec![dec!(7), dec!(7), dec!(7)]);
    }

    #[test]
    fn test_empty_history_rejected() {
        assert!(matches!(
            LinearTrendForecaster.forecast(&[], 1),
            Err(RevenueSimError::InsufficientData(_))
        ));
        let f = ConstantGrowthForecaster { rate: dec!(0) };
        assert!(f.forecast(&[], 1).is_err());
    }

    #[test]
    fn test_period_count_is_bounded() {
        let f = ConstantGrowthForecaster { rate: dec!(0.01) };
        assert!(f.forecast(&[dec!(1)], MAX_FORECAST_PERIODS).is_ok());
        let config: ForecastConfig = serde_json::from_str(
            r#"{"method":{"kind":"constant_growth","rate":"0"},"periods":18446744073709551615}"#,
        )
        .unwrap();
        match config.run(&[dec!(1)]) {
            Err(RevenueSimError::InvalidInput { field, .. }) => {
                assert_eq!(field, "forecast.periods")
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
        assert!(LinearTrendForecaster.forecast(&[dec!(1)], usize::MAX).is_err());
    }

    #[test]
    fn test_linear_trend_out_of_range_is_an_error() {
        let history = [dec!(1), dec!(70000000000000000000000000000)];
        assert!(matches!(
            LinearTrendForecaster.forecast(&history, 3),
            Err(RevenueSimError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_closure_is_a_forecaster() {
        let repeat_last = |history: &[Money], periods: usize| -> RevenueSimResult<Vec<Money>> {
            Ok(vec![*history.last().unwrap(); periods])
        };
        assert_eq!(repeat_last.forecast(&[dec!(3)], 2).unwrap(), vec![dec!(3), dec!(3)]);
    }

    #[test]
    fn test_config_deserializes_tagged_method() {
        let config: ForecastConfig = serde_json::from_str(
            r#"{"method":{"kind":"constant_growth","rate":"0.05"},"periods":3}"#,
        )
        .unwrap();
        assert_eq!(config.periods, 3);
        assert_eq!(config.run(&[dec!(100)]).unwrap()[0], dec!(105));

        let config: ForecastConfig =
            serde_json::from_str(r#"{"method":{"kind":"linear_trend"},"periods":0}"#).unwrap();
        assert!(config.run(&[dec!(1)]).unwrap().is_empty());
    }
}
