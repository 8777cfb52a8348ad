use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::money::{money_cell, percent_cell};
use super::month_headers;

#[derive(Clone, Copy)]
enum Cell {
    Money,
    Percent,
}

/// Summary rows in display order: (row label, summary field, cell kind).
const SUMMARY_ROWS: [(&str, &str, Cell); 9] = [
    ("Total Sales", "total_sales", Cell::Money),
    ("Total Revenue", "total_revenue", Cell::Money),
    ("% New", "pct_new", Cell::Percent),
    ("Revenue New Sales", "new_sales_revenue", Cell::Money),
    ("% Legacy", "pct_legacy", Cell::Percent),
    ("Revenue Legacy", "legacy_revenue", Cell::Money),
    ("Revenue Future Sales", "future_sales_revenue", Cell::Money),
    ("Accrual Balance", "accrual_balance", Cell::Money),
    ("% GMV Converted", "pct_gmv_converted", Cell::Percent),
];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) if result.get("summary").is_some() => {
                print_summary_table(result);
                print_rule_revenue_table(result);
                print_envelope_notes(map);
            }
            Some(result) if result.get("revenue_by_rule").is_some() => {
                print_rule_revenue_table(result);
                print_envelope_notes(map);
            }
            Some(result) => {
                print_flat_object(result);
                print_envelope_notes(map);
            }
            None => print_flat_object(value),
        },
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

/// Metrics as rows, months as columns.
fn print_summary_table(result: &Value) {
    let rows = match result.get("summary").and_then(Value::as_array) {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            println!("(empty)");
            return;
        }
    };

    let mut builder = Builder::default();
    let mut header = vec![String::new()];
    header.extend(month_headers(result, rows.len()));
    builder.push_record(header);

    for (title, field, kind) in SUMMARY_ROWS {
        let mut record = vec![title.to_string()];
        record.extend(rows.iter().map(|row| {
            let cell = row.get(field).unwrap_or(&Value::Null);
            match kind {
                Cell::Money => money_cell(cell),
                Cell::Percent => percent_cell(cell),
            }
        }));
        builder.push_record(record);
    }

    println!("Totals, Revenue and Percentages per Month");
    println!("{}", Table::from(builder));
}

/// Recognition rules as rows, months as columns.
fn print_rule_revenue_table(result: &Value) {
    let Some(series) = result.get("revenue_by_rule").and_then(Value::as_array) else {
        return;
    };
    let months = series
        .first()
        .and_then(|s| s.get("recognized"))
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    let mut builder = Builder::default();
    let mut header = vec!["Rule".to_string()];
    header.extend(month_headers(result, months));
    header.push("Total".to_string());
    builder.push_record(header);

    for s in series {
        let mut record = vec![s
            .get("rule_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()];
        if let Some(recognized) = s.get("recognized").and_then(Value::as_array) {
            record.extend(recognized.iter().map(money_cell));
        }
        record.push(money_cell(s.get("total").unwrap_or(&Value::Null)));
        builder.push_record(record);
    }

    println!("\nRevenue by Recognition Rule");
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    } else {
        println!("{}", format_value(value));
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
