use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use revenue_sim_core::amortization::{self, RuleSeries, SalesMatrix, TruncatedRevenue};
use revenue_sim_core::simulation::{self, MixSimulationInput, SimulationInput};
use revenue_sim_core::types::{with_metadata, Money};

use crate::input;

/// Arguments for a full revenue simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON/YAML request (rules, sales, horizon, scenarios, forecast)
    #[arg(long)]
    pub input: Option<String>,

    /// Override the horizon in the request (months)
    #[arg(long)]
    pub horizon: Option<usize>,
}

/// Arguments for a GMV + upfront share simulation
#[derive(Args)]
pub struct MixArgs {
    /// Path to JSON/YAML request (months of gmv/upfront_pct)
    #[arg(long)]
    pub input: Option<String>,

    /// Override the amortization length of the non-upfront share (months)
    #[arg(long)]
    pub amortization_months: Option<u32>,

    /// Override the horizon in the request (months)
    #[arg(long)]
    pub horizon: Option<usize>,
}

/// Arguments for the amortization matrix alone
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON/YAML request (rules, sales, horizon)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Serialize)]
struct AmortizationOutput {
    horizon: usize,
    revenue_by_rule: Vec<RuleSeries>,
    month_totals: Vec<Money>,
    truncated_by_rule: Vec<TruncatedRevenue>,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: SimulationInput = input::read_request(args.input.as_deref(), "simulate")?;
    if args.horizon.is_some() {
        request.options.horizon = args.horizon;
    }
    let result = simulation::run_simulation(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_mix(args: MixArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: MixSimulationInput = input::read_request(args.input.as_deref(), "mix")?;
    if let Some(months) = args.amortization_months {
        request.mix.amortization_months = months;
    }
    if args.horizon.is_some() {
        request.options.horizon = args.horizon;
    }
    let result = simulation::run_mix_simulation(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let request: SimulationInput = input::read_request(args.input.as_deref(), "amortize")?;
    let sales = SalesMatrix::from_rows(request.rules.clone(), &request.sales)?;
    let horizon = request.options.horizon.unwrap_or(sales.months());

    let revenue = amortization::amortize(&sales, horizon)?;
    let output = AmortizationOutput {
        horizon,
        revenue_by_rule: revenue.rule_series(),
        month_totals: (0..horizon).map(|m| revenue.month_total(m)).collect(),
        truncated_by_rule: amortization::truncated_revenue(&sales, horizon),
    };

    let result = with_metadata(
        "Straight-line amortization of sales by recognition rule, truncated at the horizon",
        &serde_json::json!({
            "horizon_months": horizon,
            "rules": sales.rules().ids(),
        }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        output,
    );
    Ok(serde_json::to_value(result)?)
}
