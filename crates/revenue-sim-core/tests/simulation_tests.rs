use pretty_assertions::assert_eq;
use revenue_sim_core::simulation::{run_simulation, SimulationInput};
use revenue_sim_core::RevenueSimError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// End-to-end JSON requests
// ===========================================================================

const MULTI_RULE_REQUEST: &str = r#"{
    "rules": [
        {"id": "upfront", "kind": "upfront"},
        {"id": "6m", "kind": "amortized", "periods": 6},
        {"id": "12m", "kind": "amortized", "periods": 12}
    ],
    "sales": [
        {"upfront": "1000", "6m": "600", "12m": "1200"},
        {},
        {"6m": "300"}
    ],
    "horizon": 12,
    "start_month": "2024-01-01",
    "scenarios": {"optimistic_rate": "0.02", "pessimistic_rate": "-0.02"},
    "forecast": {"method": {"kind": "linear_trend"}, "periods": 6}
}"#;

#[test]
fn test_multi_rule_request() {
    let input: SimulationInput = serde_json::from_str(MULTI_RULE_REQUEST).unwrap();
    let result = run_simulation(&input).unwrap();
    let out = &result.result;

    assert_eq!(out.labels.first().map(String::as_str), Some("2024-01"));
    assert_eq!(out.summary.len(), 12);

    // month 0: 1000 + 100 + 100
    assert_eq!(out.summary[0].total_revenue, dec!(1200));
    assert_eq!(out.summary[0].new_sales_revenue, dec!(1200));
    // month 2: 100 (6m) + 100 (12m) from month 0, plus 50 new from the 300 sale
    assert_eq!(out.summary[2].total_revenue, dec!(250));
    assert_eq!(out.summary[2].new_sales_revenue, dec!(50));
    assert_eq!(out.summary[2].legacy_revenue, dec!(200));
    assert_eq!(out.summary[2].future_sales_revenue, dec!(250));

    // Everything fits inside 12 months.
    assert_eq!(out.totals.total_sales, dec!(3100));
    assert_eq!(out.totals.total_revenue, dec!(3100));
    assert_eq!(out.totals.closing_accrual_balance, Decimal::ZERO);

    assert_eq!(out.forecast.as_ref().map(Vec::len), Some(6));
    let band = out.scenarios.as_ref().unwrap();
    assert!(band.optimistic[11] > band.base[11]);
    assert!(band.pessimistic[11] < band.base[11]);
}

#[test]
fn test_output_serializes_undefined_percentages_as_null() {
    let input: SimulationInput =
        serde_json::from_str(r#"{"sales": [{}, {"upfront": "10"}]}"#).unwrap();
    let result = run_simulation(&input).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    let first = &json["result"]["summary"][0];
    assert!(first["pct_new"].is_null());
    assert!(first["pct_gmv_converted"].is_null());
    assert_eq!(json["result"]["summary"][1]["pct_new"], "100");
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_duplicate_rule_ids_rejected_before_sales() {
    let err = serde_json::from_str::<SimulationInput>(
        r#"{"rules": [{"id": "a", "kind": "upfront"}, {"id": "a", "kind": "upfront"}], "sales": []}"#,
    );
    assert!(err.is_err());
}

#[test]
fn test_negative_sale_is_an_input_error() {
    let input: SimulationInput =
        serde_json::from_str(r#"{"sales": [{"amortized_12m": "-5"}]}"#).unwrap();
    match run_simulation(&input) {
        Err(RevenueSimError::InvalidInput { field, .. }) => {
            assert_eq!(field, "sales[0].amortized_12m")
        }
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_non_numeric_cell_fails_to_parse() {
    let parsed = serde_json::from_str::<SimulationInput>(r#"{"sales": [{"upfront": "abc"}]}"#);
    assert!(parsed.is_err());
}

// ===========================================================================
// Out-of-range requests fail with errors, never panics
// ===========================================================================

#[test]
fn test_unsummable_upfront_sales_are_an_input_error() {
    let input: SimulationInput = serde_json::from_str(
        r#"{
            "rules": [{"id": "a", "kind": "upfront"}, {"id": "b", "kind": "upfront"}],
            "sales": [{"a": "50000000000000000000000000000", "b": "50000000000000000000000000000"}]
        }"#,
    )
    .unwrap();
    match run_simulation(&input) {
        Err(RevenueSimError::InvalidInput { field, .. }) => assert_eq!(field, "sales"),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_oversized_horizon_and_forecast_rejected() {
    let input: SimulationInput =
        serde_json::from_str(r#"{"sales": [{"upfront": "1"}], "horizon": 18446744073709551615}"#)
            .unwrap();
    assert!(matches!(
        run_simulation(&input),
        Err(RevenueSimError::InvalidInput { .. })
    ));

    let input: SimulationInput = serde_json::from_str(
        r#"{
            "sales": [{"upfront": "1"}],
            "forecast": {"method": {"kind": "constant_growth", "rate": "0"}, "periods": 18446744073709551615}
        }"#,
    )
    .unwrap();
    match run_simulation(&input) {
        Err(RevenueSimError::InvalidInput { field, .. }) => assert_eq!(field, "forecast.periods"),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_linear_trend_beyond_decimal_range_is_an_error() {
    let input: SimulationInput = serde_json::from_str(
        r#"{
            "sales": [{"upfront": "1"}, {"upfront": "70000000000000000000000000000"}],
            "forecast": {"method": {"kind": "linear_trend"}, "periods": 2}
        }"#,
    )
    .unwrap();
    assert!(matches!(
        run_simulation(&input),
        Err(RevenueSimError::InvalidInput { .. })
    ));
}

#[test]
fn test_misspelt_option_is_warned_not_applied() {
    let input: SimulationInput =
        serde_json::from_str(r#"{"sales": [{"upfront": "10"}], "horizn": 6}"#).unwrap();
    let result = run_simulation(&input).unwrap();
    assert_eq!(result.result.summary.len(), 1);
    assert!(result.warnings.iter().any(|w| w.contains("'horizn'")));
}
