pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod money;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Column headers for a per-month table: the result's labels when present,
/// otherwise `Month 1..=n`.
pub fn month_headers(result: &Value, months: usize) -> Vec<String> {
    match result.get("labels").and_then(Value::as_array) {
        Some(labels) if labels.len() == months => labels
            .iter()
            .map(|l| l.as_str().unwrap_or_default().to_string())
            .collect(),
        _ => (1..=months).map(|n| format!("Month {}", n)).collect(),
    }
}
