use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use revenue_sim_core::amortization::{self, SalesMatrix};
use revenue_sim_core::scenarios::{self, ScenarioRates};
use revenue_sim_core::schedule::RuleSet;
use revenue_sim_core::simulation::{self, MixSimulationInput, SimulationInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn run_simulation(input_json: String) -> NapiResult<String> {
    let input: SimulationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = simulation::run_simulation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn run_mix_simulation(input_json: String) -> NapiResult<String> {
    let input: MixSimulationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = simulation::run_mix_simulation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amortization engine
// ---------------------------------------------------------------------------

/// Per-rule recognized revenue series for a sales grid snapshot.
#[napi]
pub fn amortize_sales(input_json: String) -> NapiResult<String> {
    let input: SimulationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let sales = SalesMatrix::from_rows(input.rules, &input.sales).map_err(to_napi_error)?;
    let horizon = input.options.horizon.unwrap_or(sales.months());
    let revenue = amortization::amortize(&sales, horizon).map_err(to_napi_error)?;
    serde_json::to_string(&revenue.rule_series()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ProjectRequest {
    series: Vec<Decimal>,
    #[serde(flatten)]
    rates: ScenarioRates,
}

/// Optimistic/pessimistic band for a revenue series.
#[napi]
pub fn project_series(input_json: String) -> NapiResult<String> {
    let request: ProjectRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let band = scenarios::project_band(&request.series, &request.rates).map_err(to_napi_error)?;
    serde_json::to_string(&band).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The standard upfront + 6..=24 month registry, for building the input grid.
#[napi]
pub fn standard_rules() -> NapiResult<String> {
    serde_json::to_string(&RuleSet::standard()).map_err(to_napi_error)
}
