use serde_json::Value;
use std::io;

use super::month_headers;

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Simulations emit one row per month; amortization results emit the
/// month x rule revenue matrix; anything else falls back to field/value.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => {
                if let Some(Value::Array(summary)) = result.get("summary") {
                    write_array_csv(&mut wtr, summary);
                } else if let Some(Value::Array(series)) = result.get("revenue_by_rule") {
                    write_rule_matrix_csv(&mut wtr, result, series);
                } else {
                    write_field_value_csv(&mut wtr, result);
                }
            }
            None => write_field_value_csv(&mut wtr, value),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_field_value_csv(wtr: &mut StdoutWriter<'_>, value: &Value) {
    let _ = wtr.write_record(["field", "value"]);
    if let Value::Object(map) = value {
        for (key, val) in map {
            let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
        }
    }
}

/// One row per month, one column per rule, then the month total.
fn write_rule_matrix_csv(wtr: &mut StdoutWriter<'_>, result: &Value, series: &[Value]) {
    let columns: Vec<&[Value]> = series
        .iter()
        .map(|s| {
            s.get("recognized")
                .and_then(Value::as_array)
                .map_or(&[][..], Vec::as_slice)
        })
        .collect();
    let months = columns.first().map_or(0, |c| c.len());

    let mut header = vec!["month".to_string()];
    header.extend(series.iter().map(|s| {
        s.get("rule_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }));
    if result.get("month_totals").is_some() {
        header.push("total".to_string());
    }
    let _ = wtr.write_record(&header);

    let totals = result.get("month_totals").and_then(Value::as_array);
    for (m, label) in month_headers(result, months).into_iter().enumerate() {
        let mut row = vec![label];
        row.extend(
            columns
                .iter()
                .map(|c| c.get(m).map(format_csv_value).unwrap_or_default()),
        );
        if let Some(totals) = totals {
            row.push(totals.get(m).map(format_csv_value).unwrap_or_default());
        }
        let _ = wtr.write_record(&row);
    }
}

fn write_array_csv(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
