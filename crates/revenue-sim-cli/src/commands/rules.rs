use clap::Args;
use serde_json::Value;

use revenue_sim_core::schedule::RuleSet;

/// Arguments for printing a recognition rule registry
#[derive(Args)]
pub struct RulesArgs {
    /// Comma-separated amortization lengths in months (default: 6,8,...,24)
    #[arg(long, value_delimiter = ',')]
    pub periods: Option<Vec<u32>>,
}

pub fn run_rules(args: RulesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rules = match args.periods {
        Some(periods) => RuleSet::upfront_and_amortized(&periods)?,
        None => RuleSet::standard(),
    };
    Ok(serde_json::to_value(rules)?)
}
