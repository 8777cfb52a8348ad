use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::RevenueSimError;
use crate::schedule::RuleSet;
use crate::types::{checked_total, Money};
use crate::RevenueSimResult;

/// One month of keyed sales input: rule id -> amount originated that month.
/// Missing rule ids are zero.
pub type SalesRow = BTreeMap<String, Money>;

/// Per-month, per-rule sales input resolved against a [`RuleSet`].
///
/// Cells are indexed `[month][rule]` with the rule index following the
/// registry order. Every cell is non-negative and the grand total is
/// representable, so every month and rule subtotal is too. The matrix is never mutated
/// by the engine; builders consume and return it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesMatrix {
    rules: RuleSet,
    cells: Vec<Vec<Money>>,
}

impl SalesMatrix {
    /// An all-zero matrix of `months` months.
    pub fn zeros(rules: RuleSet, months: usize) -> Self {
        let width = rules.len();
        SalesMatrix {
            rules,
            cells: vec![vec![Decimal::ZERO; width]; months],
        }
    }

    /// Resolve keyed rows against `rules`. Unknown rule ids and negative
    /// amounts are rejected.
    pub fn from_rows(rules: RuleSet, rows: &[SalesRow]) -> RevenueSimResult<Self> {
        let mut matrix = SalesMatrix::zeros(rules, rows.len());
        for (month, row) in rows.iter().enumerate() {
            for (id, &value) in row {
                let index = matrix.rules.index_of(id).ok_or_else(|| {
                    RevenueSimError::InvalidInput {
                        field: format!("sales[{month}].{id}"),
                        reason: "Unknown recognition rule".into(),
                    }
                })?;
                validate_amount(month, id, value)?;
                matrix.cells[month][index] = value;
            }
        }
        matrix.ensure_summable()?;
        Ok(matrix)
    }

    /// Builder: set the amount originated in `month` under `rule_id`.
    pub fn with_sale(mut self, month: usize, rule_id: &str, value: Money) -> RevenueSimResult<Self> {
        let index = self
            .rules
            .index_of(rule_id)
            .ok_or_else(|| RevenueSimError::InvalidInput {
                field: format!("sales[{month}].{rule_id}"),
                reason: "Unknown recognition rule".into(),
            })?;
        if month >= self.cells.len() {
            return Err(RevenueSimError::InvalidInput {
                field: format!("sales[{month}]"),
                reason: format!("Month is outside the {} month matrix", self.cells.len()),
            });
        }
        validate_amount(month, rule_id, value)?;
        self.cells[month][index] = value;
        self.ensure_summable()?;
        Ok(self)
    }

    fn ensure_summable(&self) -> RevenueSimResult<()> {
        checked_total(self.cells.iter().flatten().copied(), "sales").map(|_| ())
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Number of months carrying input.
    pub fn months(&self) -> usize {
        self.cells.len()
    }

    /// Amount originated in `month` under the rule at `rule_index`; zero past the last month.
    pub fn value(&self, month: usize, rule_index: usize) -> Money {
        self.cells
            .get(month)
            .and_then(|row| row.get(rule_index))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn row(&self, month: usize) -> Option<&[Money]> {
        self.cells.get(month).map(Vec::as_slice)
    }

    /// Sum over rules of the amounts originated in `month`.
    pub fn month_total(&self, month: usize) -> Money {
        self.row(month)
            .map(|row| row.iter().copied().sum())
            .unwrap_or(Decimal::ZERO)
    }

    /// Sum over months of the amounts originated under the rule at `rule_index`.
    pub fn rule_total(&self, rule_index: usize) -> Money {
        (0..self.months()).map(|m| self.value(m, rule_index)).sum()
    }

    pub fn total(&self) -> Money {
        self.cells.iter().flatten().copied().sum()
    }
}

fn validate_amount(month: usize, rule_id: &str, value: Money) -> RevenueSimResult<()> {
    if value < Decimal::ZERO {
        return Err(RevenueSimError::InvalidInput {
            field: format!("sales[{month}].{rule_id}"),
            reason: "Sales amount cannot be negative".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(pairs: &[(&str, Decimal)]) -> SalesRow {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_from_rows_resolves_ids_and_fills_zeros() {
        let rules = RuleSet::upfront_and_amortized(&[12]).unwrap();
        let rows = vec![
            row(&[("upfront", dec!(1200)), ("amortized_12m", dec!(600))]),
            row(&[]),
            row(&[("amortized_12m", dec!(50))]),
        ];
        let sales = SalesMatrix::from_rows(rules, &rows).unwrap();
        assert_eq!(sales.months(), 3);
        assert_eq!(sales.value(0, 0), dec!(1200));
        assert_eq!(sales.value(0, 1), dec!(600));
        assert_eq!(sales.value(1, 0), Decimal::ZERO);
        assert_eq!(sales.value(2, 1), dec!(50));
        assert_eq!(sales.month_total(0), dec!(1800));
        assert_eq!(sales.rule_total(1), dec!(650));
        assert_eq!(sales.total(), dec!(1850));
    }

    #[test]
    fn test_value_past_last_month_is_zero() {
        let sales = SalesMatrix::zeros(RuleSet::standard(), 2);
        assert_eq!(sales.value(5, 0), Decimal::ZERO);
        assert_eq!(sales.month_total(5), Decimal::ZERO);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let rules = RuleSet::upfront_and_amortized(&[12]).unwrap();
        let rows = vec![row(&[("upfront", dec!(-1))])];
        let err = SalesMatrix::from_rows(rules, &rows).unwrap_err();
        match err {
            RevenueSimError::InvalidInput { field, .. } => assert_eq!(field, "sales[0].upfront"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_rule_rejected() {
        let rules = RuleSet::upfront_and_amortized(&[12]).unwrap();
        let rows = vec![row(&[("amortized_7m", dec!(10))])];
        assert!(SalesMatrix::from_rows(rules, &rows).is_err());
    }

    #[test]
    fn test_with_sale_bounds_checked() {
        let sales = SalesMatrix::zeros(RuleSet::standard(), 12);
        assert!(sales.clone().with_sale(12, "upfront", dec!(1)).is_err());
        let sales = sales.with_sale(11, "upfront", dec!(1)).unwrap();
        assert_eq!(sales.value(11, 0), dec!(1));
    }

    #[test]
    fn test_unsummable_totals_rejected() {
        let big = dec!(50000000000000000000000000000);
        let rules = RuleSet::new(vec![
            crate::schedule::RuleConfig::upfront("a"),
            crate::schedule::RuleConfig::upfront("b"),
        ])
        .unwrap();
        let rows = vec![row(&[("a", big), ("b", big)])];
        match SalesMatrix::from_rows(rules.clone(), &rows) {
            Err(RevenueSimError::InvalidInput { field, .. }) => assert_eq!(field, "sales"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }

        // Across months as well as within one.
        let sales = SalesMatrix::zeros(rules, 2).with_sale(0, "a", big).unwrap();
        assert!(sales.with_sale(1, "b", big).is_err());
    }
}
