use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use revenue_sim_core::scenarios::{project, project_band, ScenarioProjection, ScenarioRates};
use revenue_sim_core::types::{Money, Rate};

/// Arguments for the scenario projector
#[derive(Args)]
pub struct ProjectArgs {
    /// Comma-separated monthly series (e.g. "1300,100,100")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub series: Vec<Decimal>,

    /// Monthly compounding rate (e.g. 0.02 for +2%, -0.02 for -2%)
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Rate,

    /// Optional pessimistic rate; when given, `--rate` is the optimistic one
    #[arg(long, allow_hyphen_values = true)]
    pub pessimistic_rate: Option<Rate>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ProjectOutput {
    Single { rate: Rate, projected: Vec<Money> },
    Band(ScenarioProjection),
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let output = match args.pessimistic_rate {
        Some(pessimistic_rate) => ProjectOutput::Band(project_band(
            &args.series,
            &ScenarioRates {
                optimistic_rate: args.rate,
                pessimistic_rate,
            },
        )?),
        None => ProjectOutput::Single {
            rate: args.rate,
            projected: project(&args.series, args.rate)?,
        },
    };
    Ok(serde_json::to_value(output)?)
}
