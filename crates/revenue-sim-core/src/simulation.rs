use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::aggregation::{summarize, MonthlySummary};
use crate::amortization::{
    amortize, truncated_revenue, RuleSeries, SalesMatrix, SalesRow, TruncatedRevenue,
};
use crate::scenarios::{project_band, ForecastConfig, ScenarioProjection, ScenarioRates};
use crate::schedule::RuleSet;
use crate::types::{checked_total, with_metadata, ComputationOutput, Money};
use crate::RevenueSimResult;

#[cfg(feature = "mix")]
use crate::mix::{build_sales_matrix, MixInput};

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Optional knobs shared by every simulation entry point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationOptions {
    /// Months to simulate; defaults to the number of sales months. May be
    /// longer to expose the run-off of deferred revenue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon: Option<usize>,
    /// First month of the horizon, used for `YYYY-MM` labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_month: Option<NaiveDate>,
    /// Optimistic/pessimistic compounding applied to total revenue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<ScenarioRates>,
    /// Forecast of total revenue past the horizon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<ForecastConfig>,
    /// Request keys no entry point recognizes; ignored apart from a warning
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub unrecognized: BTreeMap<String, serde_json::Value>,
}

/// Snapshot of a full simulation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInput {
    /// Recognition rules; the standard registry when omitted
    #[serde(default = "RuleSet::standard")]
    pub rules: RuleSet,
    /// One keyed row per month: rule id -> amount sold
    pub sales: Vec<SalesRow>,
    #[serde(flatten)]
    pub options: SimulationOptions,
}

/// Snapshot of a GMV + upfront-share simulation request.
#[cfg(feature = "mix")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixSimulationInput {
    #[serde(flatten)]
    pub mix: MixInput,
    #[serde(flatten)]
    pub options: SimulationOptions,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Horizon-wide totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationTotals {
    pub total_sales: Money,
    pub total_revenue: Money,
    pub new_sales_revenue: Money,
    pub legacy_revenue: Money,
    /// Installments falling past the horizon, all rules
    pub unrecognized_at_horizon: Money,
    pub truncated_by_rule: Vec<TruncatedRevenue>,
    /// Accrual balance after the last month
    pub closing_accrual_balance: Money,
}

/// Full simulation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub labels: Vec<String>,
    pub rules: RuleSet,
    /// Recognized revenue per rule, for stacked charts
    pub revenue_by_rule: Vec<RuleSeries>,
    pub summary: Vec<MonthlySummary>,
    pub totals: SimulationTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<ScenarioProjection>,
    /// Total revenue forecast for the months after the horizon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<Money>>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run registry resolution, amortization, aggregation and the optional
/// projections on one input snapshot.
pub fn run_simulation(
    input: &SimulationInput,
) -> RevenueSimResult<ComputationOutput<SimulationOutput>> {
    let start = Instant::now();
    let sales = SalesMatrix::from_rows(input.rules.clone(), &input.sales)?;
    let (output, warnings) = simulate(&sales, &input.options)?;

    Ok(with_metadata(
        "Deferred Revenue Recognition: upfront and straight-line amortization truncated at the horizon",
        &assumptions(&sales, &output, &input.options),
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

/// Simulate monthly GMV split between upfront and a single amortization length.
#[cfg(feature = "mix")]
pub fn run_mix_simulation(
    input: &MixSimulationInput,
) -> RevenueSimResult<ComputationOutput<SimulationOutput>> {
    let start = Instant::now();
    let sales = build_sales_matrix(&input.mix)?;
    let (output, warnings) = simulate(&sales, &input.options)?;

    Ok(with_metadata(
        "Deferred Revenue Recognition: GMV split by upfront share, remainder amortized straight-line",
        &assumptions(&sales, &output, &input.options),
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

/// Pipeline shared by every entry point. Returns the output and the
/// warnings to surface in the envelope.
pub fn simulate(
    sales: &SalesMatrix,
    options: &SimulationOptions,
) -> RevenueSimResult<(SimulationOutput, Vec<String>)> {
    let horizon = options.horizon.unwrap_or(sales.months());
    tracing::debug!(
        horizon,
        months = sales.months(),
        rules = sales.rules().len(),
        "running revenue simulation"
    );

    let revenue = amortize(sales, horizon)?;
    let summary = summarize(sales, &revenue, options.start_month)?;
    let truncated = truncated_revenue(sales, horizon);

    let total_revenue_series: Vec<Money> = summary.iter().map(|s| s.total_revenue).collect();

    let scenarios = options
        .scenarios
        .as_ref()
        .map(|rates| project_band(&total_revenue_series, rates))
        .transpose()?;
    let forecast = options
        .forecast
        .as_ref()
        .map(|config| config.run(&total_revenue_series))
        .transpose()?;

    let warnings = collect_warnings(&summary, &truncated, horizon, options);

    let totals = SimulationTotals {
        total_sales: checked_total(summary.iter().map(|s| s.total_sales), "total_sales")?,
        total_revenue: checked_total(summary.iter().map(|s| s.total_revenue), "total_revenue")?,
        new_sales_revenue: checked_total(
            summary.iter().map(|s| s.new_sales_revenue),
            "new_sales_revenue",
        )?,
        legacy_revenue: checked_total(summary.iter().map(|s| s.legacy_revenue), "legacy_revenue")?,
        unrecognized_at_horizon: checked_total(
            truncated.iter().map(|t| t.amount),
            "unrecognized_at_horizon",
        )?,
        truncated_by_rule: truncated,
        closing_accrual_balance: summary
            .last()
            .map(|s| s.accrual_balance)
            .unwrap_or(Decimal::ZERO),
    };

    let output = SimulationOutput {
        labels: summary.iter().map(|s| s.label.clone()).collect(),
        rules: sales.rules().clone(),
        revenue_by_rule: revenue.rule_series(),
        summary,
        totals,
        scenarios,
        forecast,
    };

    Ok((output, warnings))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn collect_warnings(
    summary: &[MonthlySummary],
    truncated: &[TruncatedRevenue],
    horizon: usize,
    options: &SimulationOptions,
) -> Vec<String> {
    let mut warnings: Vec<String> = options
        .unrecognized
        .keys()
        .map(|key| format!("Unrecognized request field '{key}' was ignored"))
        .collect();

    for t in truncated.iter().filter(|t| !t.amount.is_zero()) {
        tracing::debug!(rule = %t.rule_id, amount = %t.amount, "revenue truncated at horizon");
        warnings.push(format!(
            "Rule '{}': {} of revenue falls past the {}-month horizon and is not recognized",
            t.rule_id, t.amount, horizon
        ));
    }

    for s in summary.iter().filter(|s| s.legacy_revenue < Decimal::ZERO) {
        warnings.push(format!(
            "{}: legacy revenue is negative ({}); sales and revenue inputs are inconsistent",
            s.label, s.legacy_revenue
        ));
    }

    let zero_revenue = summary.iter().filter(|s| s.total_revenue.is_zero()).count();
    if zero_revenue > 0 {
        warnings.push(format!(
            "{zero_revenue} month(s) recognized no revenue; % new and % legacy are undefined (null) there"
        ));
    }

    warnings
}

fn assumptions(
    sales: &SalesMatrix,
    output: &SimulationOutput,
    options: &SimulationOptions,
) -> serde_json::Value {
    serde_json::json!({
        "horizon_months": output.summary.len(),
        "sales_months": sales.months(),
        "rules": sales.rules().ids(),
        "start_month": options.start_month,
        "scenarios": options.scenarios,
        "forecast_periods": options.forecast.as_ref().map(|f| f.periods),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::ForecastMethod;
    use crate::schedule::RuleConfig;
    use rust_decimal_macros::dec;

    fn reference_input() -> SimulationInput {
        let mut first = SalesRow::new();
        first.insert("upfront".into(), dec!(1200));
        first.insert("amortized_12m".into(), dec!(1200));
        let mut sales = vec![first];
        sales.resize(12, SalesRow::new());
        SimulationInput {
            rules: RuleSet::new(vec![
                RuleConfig::upfront("upfront"),
                RuleConfig::amortized("amortized_12m", 12),
            ])
            .unwrap(),
            sales,
            options: SimulationOptions::default(),
        }
    }

    #[test]
    fn test_reference_simulation_totals() {
        let result = run_simulation(&reference_input()).unwrap();
        let totals = &result.result.totals;
        assert_eq!(totals.total_sales, dec!(2400));
        assert_eq!(totals.total_revenue, dec!(2400));
        assert_eq!(totals.unrecognized_at_horizon, Decimal::ZERO);
        assert_eq!(totals.closing_accrual_balance, Decimal::ZERO);
        assert_eq!(result.result.labels[0], "Month 1");
        assert_eq!(result.result.revenue_by_rule.len(), 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_truncation_reported_as_warning() {
        let mut input = reference_input();
        input.sales[0].clear();
        input.sales[6].insert("amortized_12m".into(), dec!(1200));
        let result = run_simulation(&input).unwrap();
        assert_eq!(result.result.totals.total_revenue, dec!(600));
        assert_eq!(result.result.totals.unrecognized_at_horizon, dec!(600));
        assert_eq!(result.result.totals.closing_accrual_balance, dec!(600));
        assert!(result.warnings.iter().any(|w| w.contains("amortized_12m")));
        // months 0..6 recognize nothing
        assert!(result.warnings.iter().any(|w| w.starts_with("6 month(s)")));
    }

    #[test]
    fn test_scenarios_and_forecast_follow_total_revenue() {
        let mut input = reference_input();
        input.options.scenarios = Some(ScenarioRates {
            optimistic_rate: dec!(0.10),
            pessimistic_rate: dec!(-0.10),
        });
        input.options.forecast = Some(ForecastConfig {
            method: ForecastMethod::ConstantGrowth { rate: dec!(0) },
            periods: 3,
        });
        let result = run_simulation(&input).unwrap();
        let band = result.result.scenarios.as_ref().unwrap();
        assert_eq!(band.base[0], dec!(1300));
        assert_eq!(band.optimistic[0], dec!(1300));
        assert_eq!(band.optimistic[1], dec!(110));
        assert_eq!(band.pessimistic[1], dec!(90));
        assert_eq!(result.result.forecast, Some(vec![dec!(100); 3]));
    }

    #[test]
    fn test_start_month_labels() {
        let mut input = reference_input();
        input.options.start_month = NaiveDate::from_ymd_opt(2025, 1, 1);
        let result = run_simulation(&input).unwrap();
        assert_eq!(result.result.labels[11], "2025-12");
    }

    #[test]
    fn test_input_deserializes_with_default_rules() {
        let input: SimulationInput = serde_json::from_str(
            r#"{"sales":[{"upfront":"100","amortized_6m":"600"}],"horizon":6}"#,
        )
        .unwrap();
        assert_eq!(input.rules, RuleSet::standard());
        let result = run_simulation(&input).unwrap();
        assert_eq!(result.result.summary.len(), 6);
        assert_eq!(result.result.summary[0].total_revenue, dec!(200));
        assert_eq!(result.result.summary[5].total_revenue, dec!(100));
    }

    #[test]
    fn test_unrecognized_keys_warned() {
        let input: SimulationInput = serde_json::from_str(
            r#"{"sales":[{"upfront":"100"}],"horizn":12}"#,
        )
        .unwrap();
        assert!(input.options.unrecognized.contains_key("horizn"));
        let result = run_simulation(&input).unwrap();
        assert_eq!(result.result.summary.len(), 1);
        assert_eq!(
            result.warnings,
            vec!["Unrecognized request field 'horizn' was ignored".to_string()]
        );
    }

    #[test]
    fn test_empty_sales_without_horizon_rejected() {
        let input: SimulationInput = serde_json::from_str(r#"{"sales":[]}"#).unwrap();
        assert!(run_simulation(&input).is_err());
    }

    #[cfg(feature = "mix")]
    #[test]
    fn test_mix_simulation() {
        let input: MixSimulationInput = serde_json::from_str(
            r#"{"months":[{"gmv":"1200","upfront_pct":"50"}],"horizon":12}"#,
        )
        .unwrap();
        let result = run_mix_simulation(&input).unwrap();
        let summary = &result.result.summary;
        // 600 upfront + 600/12 amortized
        assert_eq!(summary[0].total_revenue, dec!(650));
        assert_eq!(summary[0].upfront_revenue, dec!(600));
        assert_eq!(summary[11].legacy_revenue, dec!(50));
        assert_eq!(result.result.totals.total_revenue, dec!(1200));
    }
}
