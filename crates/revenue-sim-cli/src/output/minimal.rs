use serde_json::Value;

/// Fields printed by `--output minimal`, in priority order. Looked up in
/// `result.totals` first, then in `result`.
const PRIORITY_KEYS: [&str; 5] = [
    "total_revenue",
    "closing_accrual_balance",
    "month_totals",
    "projected",
    "optimistic",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);
    let totals = result.get("totals");

    for key in PRIORITY_KEYS {
        let found = totals
            .and_then(|t| t.get(key))
            .or_else(|| result.get(key))
            .filter(|v| !v.is_null());
        if let Some(val) = found {
            println!("{}", format_minimal(val));
            return;
        }
    }

    if let Some((key, val)) = result.as_object().and_then(|m| m.iter().next()) {
        println!("{}: {}", key, format_minimal(val));
        return;
    }

    println!("{}", format_minimal(result));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => arr.iter().map(format_minimal).collect::<Vec<_>>().join(","),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
