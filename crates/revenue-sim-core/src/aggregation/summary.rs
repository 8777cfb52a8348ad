use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amortization::{RevenueMatrix, SalesMatrix};
use crate::error::RevenueSimError;
use crate::types::{checked_total, percent_of, Money, Percent};
use crate::RevenueSimResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Derived figures for one month of the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// Zero-based month index
    pub month: usize,
    pub label: String,
    /// Sum of all sales originated this month
    pub total_sales: Money,
    /// Sum of all revenue recognized this month
    pub total_revenue: Money,
    /// Sales under upfront rules, recognized in full this month
    pub upfront_revenue: Money,
    /// Upfront sales plus the first installment of every amortized sale made this month
    pub new_sales_revenue: Money,
    /// total_revenue - new_sales_revenue; installments of earlier sales
    pub legacy_revenue: Money,
    /// total_sales - new_sales_revenue; deferred to later months
    pub future_sales_revenue: Money,
    pub cumulative_revenue: Money,
    pub cumulative_sales: Money,
    /// Deferred revenue liability at month end
    pub accrual_balance: Money,
    pub pct_new: Percent,
    pub pct_legacy: Percent,
    pub pct_gmv_converted: Percent,
}

/// Inputs of the accrual balance recurrence for one month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthFlows {
    pub total_sales: Money,
    pub new_sales_revenue: Money,
    pub legacy_revenue: Money,
}

// ---------------------------------------------------------------------------
// Recurrences
// ---------------------------------------------------------------------------

/// Deferred revenue balance per month, starting from zero:
///
/// `balance[m] = (balance[m-1] - legacy[m]) + (sales[m] - new[m])`
///
/// The balance grows by the deferred part of this month's sales and shrinks
/// by installments recognized from earlier deferrals. Strictly sequential.
pub fn accrual_balance(flows: &[MonthFlows]) -> RevenueSimResult<Vec<Money>> {
    let mut balance = Decimal::ZERO;
    flows
        .iter()
        .enumerate()
        .map(|(m, f)| -> RevenueSimResult<Money> {
            balance = balance
                .checked_sub(f.legacy_revenue)
                .and_then(|b| b.checked_add(f.total_sales.checked_sub(f.new_sales_revenue)?))
                .ok_or_else(|| summary_overflow("accrual_balance", m))?;
            Ok(balance)
        })
        .collect()
}

/// Running sum of `values`, starting from zero.
pub fn running_total(values: &[Money]) -> RevenueSimResult<Vec<Money>> {
    let mut acc = Decimal::ZERO;
    values
        .iter()
        .enumerate()
        .map(|(m, v)| -> RevenueSimResult<Money> {
            acc = acc
                .checked_add(*v)
                .ok_or_else(|| summary_overflow("cumulative", m))?;
            Ok(acc)
        })
        .collect()
}

fn summary_overflow(field: &str, month: usize) -> RevenueSimError {
    RevenueSimError::InvalidInput {
        field: format!("summary[{month}].{field}"),
        reason: "Value exceeds the representable decimal range".into(),
    }
}

/// Display label per month: `YYYY-MM` counted from `start`, or `Month N`
/// (one-based) when no start month is given.
pub fn month_labels(horizon: usize, start: Option<NaiveDate>) -> RevenueSimResult<Vec<String>> {
    match start {
        None => Ok((1..=horizon).map(|n| format!("Month {n}")).collect()),
        Some(start) => (0..horizon)
            .map(|offset| {
                u32::try_from(offset)
                    .ok()
                    .and_then(|n| start.checked_add_months(Months::new(n)))
                    .map(|date| date.format("%Y-%m").to_string())
                    .ok_or_else(|| RevenueSimError::InvalidInput {
                        field: "start_month".into(),
                        reason: format!("Month offset {offset} overflows the calendar"),
                    })
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Roll the revenue matrix up into one [`MonthlySummary`] per month.
///
/// Months past the last sales month count as zero sales. Percentages are
/// `None` when their denominator is zero; negative legacy revenue is
/// reported as-is. Month and rule subtotals cannot overflow because both
/// matrices hold representable grand totals; derived series are checked.
pub fn summarize(
    sales: &SalesMatrix,
    revenue: &RevenueMatrix,
    start_month: Option<NaiveDate>,
) -> RevenueSimResult<Vec<MonthlySummary>> {
    if sales.rules() != revenue.rules() {
        return Err(RevenueSimError::InvalidInput {
            field: "revenue".into(),
            reason: "Revenue matrix was built against a different rule set".into(),
        });
    }

    let horizon = revenue.horizon();
    let labels = month_labels(horizon, start_month)?;
    let rules = sales.rules();

    let flows: Vec<(Money, MonthFlows)> = (0..horizon)
        .map(|m| -> RevenueSimResult<(Money, MonthFlows)> {
            let total_sales = sales.month_total(m);
            let total_revenue = revenue.month_total(m);
            let new_sales_revenue = checked_total(
                rules
                    .iter()
                    .enumerate()
                    .map(|(index, rule)| rule.installment(sales.value(m, index))),
                "new_sales_revenue",
            )?;
            let legacy_revenue = total_revenue
                .checked_sub(new_sales_revenue)
                .ok_or_else(|| summary_overflow("legacy_revenue", m))?;
            Ok((
                total_revenue,
                MonthFlows {
                    total_sales,
                    new_sales_revenue,
                    legacy_revenue,
                },
            ))
        })
        .collect::<RevenueSimResult<_>>()?;

    let month_flows: Vec<MonthFlows> = flows.iter().map(|(_, f)| *f).collect();
    let balances = accrual_balance(&month_flows)?;
    let cumulative_revenue =
        running_total(&flows.iter().map(|(r, _)| *r).collect::<Vec<_>>())?;
    let cumulative_sales =
        running_total(&month_flows.iter().map(|f| f.total_sales).collect::<Vec<_>>())?;

    let rows = flows
        .into_iter()
        .zip(labels)
        .enumerate()
        .map(|(m, ((total_revenue, f), label))| {
            let upfront_revenue: Money = rules
                .iter()
                .enumerate()
                .filter(|(_, rule)| rule.is_upfront())
                .map(|(index, _)| sales.value(m, index))
                .sum();
            MonthlySummary {
                month: m,
                label,
                total_sales: f.total_sales,
                total_revenue,
                upfront_revenue,
                new_sales_revenue: f.new_sales_revenue,
                legacy_revenue: f.legacy_revenue,
                future_sales_revenue: f.total_sales - f.new_sales_revenue,
                cumulative_revenue: cumulative_revenue[m],
                cumulative_sales: cumulative_sales[m],
                accrual_balance: balances[m],
                pct_new: percent_of(f.new_sales_revenue, total_revenue),
                pct_legacy: percent_of(f.legacy_revenue, total_revenue),
                pct_gmv_converted: percent_of(f.new_sales_revenue, f.total_sales),
            }
        })
        .collect();

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
