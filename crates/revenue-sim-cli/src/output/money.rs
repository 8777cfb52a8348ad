use num_format::{Locale, ToFormattedString};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde_json::Value;

/// Display-only currency convention: `R$ 1.234,56`.
const CURRENCY_SYMBOL: &str = "R$";

/// Format an amount with two decimals, `.` thousands and `,` decimal separators.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let abs = rounded.abs();
    let whole = abs.trunc();
    let cents = ((abs - whole) * dec!(100)).to_u32().unwrap_or(0);
    let whole = whole
        .to_u128()
        .map(|w| w.to_formatted_string(&Locale::pt))
        .unwrap_or_else(|| whole.to_string());
    format!("{}{} {},{:02}", sign, CURRENCY_SYMBOL, whole, cents)
}

/// Format a 0..100 percentage with two decimals, or `n/a` when undefined.
pub fn format_percent(pct: Option<Decimal>) -> String {
    match pct {
        Some(p) => format!(
            "{:.2}%",
            p.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        ),
        None => "n/a".to_string(),
    }
}

/// Decimal carried in a JSON value (string or number), if any.
pub fn decimal_of(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

pub fn money_cell(value: &Value) -> String {
    match decimal_of(value) {
        Some(d) => format_money(d),
        None if value.is_null() => "n/a".to_string(),
        None => value.to_string(),
    }
}

pub fn percent_cell(value: &Value) -> String {
    format_percent(decimal_of(value))
}
