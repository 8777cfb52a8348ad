use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amortization::sales::SalesMatrix;
use crate::error::RevenueSimError;
use crate::schedule::{RecognitionKind, RuleId, RuleSet};
use crate::types::{checked_total, Money};
use crate::RevenueSimResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Revenue recognized per month and rule.
///
/// `cell(m, r)` is the revenue recognized in month `m` from sales made in
/// `m` or earlier under rule `r`. Rule columns follow the registry order.
/// Cells are non-negative with a representable grand total, so the month and
/// rule sums below cannot overflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueMatrix {
    rules: RuleSet,
    cells: Vec<Vec<Money>>,
}

/// Recognized revenue of one rule across the horizon, for stacked charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSeries {
    pub rule_id: RuleId,
    pub kind: RecognitionKind,
    pub periods: u32,
    pub recognized: Vec<Money>,
    /// Sum of `recognized`
    pub total: Money,
}

/// Installments of one rule that fall past the horizon and are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruncatedRevenue {
    pub rule_id: RuleId,
    pub amount: Money,
}

impl RevenueMatrix {
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn horizon(&self) -> usize {
        self.cells.len()
    }

    pub fn row(&self, month: usize) -> Option<&[Money]> {
        self.cells.get(month).map(Vec::as_slice)
    }

    /// Revenue recognized in `month` under `rule_id`; `None` for an unknown
    /// rule or a month past the horizon.
    pub fn cell(&self, month: usize, rule_id: &str) -> Option<Money> {
        let index = self.rules.index_of(rule_id)?;
        self.cells.get(month).map(|row| row[index])
    }

    /// Sum over rules of the revenue recognized in `month`.
    pub fn month_total(&self, month: usize) -> Money {
        self.row(month)
            .map(|row| row.iter().copied().sum())
            .unwrap_or(Decimal::ZERO)
    }

    /// Monthly recognized revenue for a single rule.
    pub fn series(&self, rule_id: &str) -> Option<Vec<Money>> {
        let index = self.rules.index_of(rule_id)?;
        Some(self.cells.iter().map(|row| row[index]).collect())
    }

    /// One series per rule, in registry order.
    pub fn rule_series(&self) -> Vec<RuleSeries> {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                let recognized: Vec<Money> = self.cells.iter().map(|row| row[index]).collect();
                RuleSeries {
                    rule_id: rule.id.clone(),
                    kind: rule.kind,
                    periods: rule.periods,
                    total: recognized.iter().copied().sum(),
                    recognized,
                }
            })
            .collect()
    }

    pub fn total(&self) -> Money {
        self.cells.iter().flatten().copied().sum()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Longest horizon accepted, in months (100 years).
pub const MAX_HORIZON_MONTHS: usize = 1200;

/// Distribute every sales cell over its rule's recognition window.
///
/// Upfront sales land entirely in their origin month. An amortized sale of
/// `v` over `N` months adds `v / N` to each month of
/// `origin ..= min(origin + N - 1, horizon - 1)`; installments past the
/// horizon are dropped, not carried over. The result is a plain
/// superposition of independent contributions.
///
/// `horizon` may exceed the number of sales months (trailing months carry no
/// new sales) but may not be shorter, since that would drop input, nor longer
/// than [`MAX_HORIZON_MONTHS`].
pub fn amortize(sales: &SalesMatrix, horizon: usize) -> RevenueSimResult<RevenueMatrix> {
    if horizon == 0 {
        return Err(RevenueSimError::InvalidInput {
            field: "horizon".into(),
            reason: "Horizon must be at least one month".into(),
        });
    }
    if horizon > MAX_HORIZON_MONTHS {
        return Err(RevenueSimError::InvalidInput {
            field: "horizon".into(),
            reason: format!("Horizon of {horizon} months exceeds the {MAX_HORIZON_MONTHS} month limit"),
        });
    }
    if horizon < sales.months() {
        return Err(RevenueSimError::InvalidInput {
            field: "horizon".into(),
            reason: format!(
                "Horizon of {horizon} months is shorter than the {} months of sales input",
                sales.months()
            ),
        });
    }

    let rules = sales.rules();
    let mut cells = vec![vec![Decimal::ZERO; rules.len()]; horizon];

    for (index, rule) in rules.iter().enumerate() {
        for origin in 0..sales.months() {
            let value = sales.value(origin, index);
            if value.is_zero() {
                continue;
            }
            let share = rule.installment(value);
            let window = rule.recognition_window(origin, horizon);
            let first = window.start;
            for (offset, row) in cells[window].iter_mut().enumerate() {
                row[index] = row[index]
                    .checked_add(share)
                    .ok_or_else(|| revenue_overflow(first + offset))?;
            }
        }
    }
    // Installment rounding can push recognized revenue above the sales total.
    checked_total(cells.iter().flatten().copied(), "revenue")?;

    tracing::trace!(horizon, rules = rules.len(), "sales amortized");

    Ok(RevenueMatrix {
        rules: rules.clone(),
        cells,
    })
}

fn revenue_overflow(month: usize) -> RevenueSimError {
    RevenueSimError::InvalidInput {
        field: format!("revenue[{month}]"),
        reason: "Recognized revenue exceeds the representable decimal range".into(),
    }
}

/// Per-rule value of installments that fall past `horizon`.
///
/// Computed from the missing installment count, so rules without
/// truncation report exactly zero.
pub fn truncated_revenue(sales: &SalesMatrix, horizon: usize) -> Vec<TruncatedRevenue> {
    sales
        .rules()
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            let amount = (0..sales.months())
                .map(|origin| {
                    let value = sales.value(origin, index);
                    let recognized = rule.recognition_window(origin, horizon).len() as u32;
                    let missing = rule.periods.saturating_sub(recognized);
                    if value.is_zero() || missing == 0 {
                        Decimal::ZERO
                    } else {
                        rule.installment(value) * Decimal::from(missing)
                    }
                })
                .sum();
            TruncatedRevenue {
                rule_id: rule.id.clone(),
                amount,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn upfront_and_12() -> RuleSet {
        RuleSet::upfront_and_amortized(&[12]).unwrap()
    }

    #[test]
    fn test_upfront_and_full_year_amortization() {
        let sales = SalesMatrix::zeros(upfront_and_12(), 12)
            .with_sale(0, "upfront", dec!(1200))
            .unwrap()
            .with_sale(0, "amortized_12m", dec!(1200))
            .unwrap();
        let revenue = amortize(&sales, 12).unwrap();

        assert_eq!(revenue.month_total(0), dec!(1300));
        for m in 1..12 {
            assert_eq!(revenue.month_total(m), dec!(100), "month {m}");
            assert_eq!(revenue.cell(m, "upfront"), Some(Decimal::ZERO));
        }
        assert_eq!(revenue.total(), dec!(2400));
    }

    #[test]
    fn test_truncation_at_horizon() {
        let sales = SalesMatrix::zeros(upfront_and_12(), 12)
            .with_sale(6, "amortized_12m", dec!(1200))
            .unwrap();
        let revenue = amortize(&sales, 12).unwrap();
        let series = revenue.series("amortized_12m").unwrap();

        assert!(series[..6].iter().all(|v| v.is_zero()));
        assert!(series[6..].iter().all(|v| *v == dec!(100)));
        assert_eq!(revenue.total(), dec!(600));

        let truncated = truncated_revenue(&sales, 12);
        assert_eq!(truncated[0].amount, Decimal::ZERO);
        assert_eq!(truncated[1].amount, dec!(600));
    }

    #[test]
    fn test_late_sale_in_24_month_window() {
        // Month index 19 (the 20th month) over 12 months: 5 installments fit.
        let sales = SalesMatrix::zeros(upfront_and_12(), 24)
            .with_sale(19, "amortized_12m", dec!(1200))
            .unwrap();
        let revenue = amortize(&sales, 24).unwrap();
        assert_eq!(revenue.total(), dec!(500));
        assert_eq!(revenue.cell(19, "amortized_12m"), Some(dec!(100)));
        assert_eq!(revenue.cell(23, "amortized_12m"), Some(dec!(100)));
    }

    #[test]
    fn test_extended_horizon_shows_run_off() {
        let sales = SalesMatrix::zeros(upfront_and_12(), 12)
            .with_sale(6, "amortized_12m", dec!(1200))
            .unwrap();
        let revenue = amortize(&sales, 24).unwrap();
        assert_eq!(revenue.horizon(), 24);
        assert_eq!(revenue.total(), dec!(1200));
        assert_eq!(revenue.cell(17, "amortized_12m"), Some(dec!(100)));
        assert_eq!(revenue.cell(18, "amortized_12m"), Some(Decimal::ZERO));
        assert!(truncated_revenue(&sales, 24).iter().all(|t| t.amount.is_zero()));
    }

    #[test]
    fn test_rule_series_per_rule() {
        let sales = SalesMatrix::zeros(upfront_and_12(), 3)
            .with_sale(1, "upfront", dec!(50))
            .unwrap();
        let revenue = amortize(&sales, 3).unwrap();
        let series = revenue.rule_series();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].recognized, vec![dec!(0), dec!(50), dec!(0)]);
        assert_eq!(series[0].total, dec!(50));
        assert_eq!(series[1].total, Decimal::ZERO);
    }

    #[test]
    fn test_horizon_shorter_than_input_rejected() {
        let sales = SalesMatrix::zeros(upfront_and_12(), 12);
        assert!(amortize(&sales, 6).is_err());
        assert!(amortize(&sales, 0).is_err());
    }

    #[test]
    fn test_horizon_above_limit_rejected() {
        let sales = SalesMatrix::zeros(upfront_and_12(), 1);
        assert!(amortize(&sales, MAX_HORIZON_MONTHS).is_ok());
        match amortize(&sales, usize::MAX) {
            Err(RevenueSimError::InvalidInput { field, .. }) => assert_eq!(field, "horizon"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_rule_lookups() {
        let sales = SalesMatrix::zeros(upfront_and_12(), 2);
        let revenue = amortize(&sales, 2).unwrap();
        assert_eq!(revenue.cell(0, "missing"), None);
        assert_eq!(revenue.cell(5, "upfront"), None);
        assert!(revenue.series("missing").is_none());
    }
}
