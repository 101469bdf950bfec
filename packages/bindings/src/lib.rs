use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Serialize;
use serde_json::Value;

use tailorcast_core::types::{AnalyticsInput, ComputationOutput};
use tailorcast_core::AnalyticsResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Accept either a bare order array or the full `{orders, students, settings}`
/// document.
fn parse_input(input_json: &str) -> NapiResult<AnalyticsInput> {
    let raw: Value = serde_json::from_str(input_json).map_err(to_napi_error)?;
    if raw.is_array() {
        let orders = serde_json::from_value(raw).map_err(to_napi_error)?;
        Ok(AnalyticsInput::from_orders(orders))
    } else {
        serde_json::from_value(raw).map_err(to_napi_error)
    }
}

fn run<T: Serialize>(
    input_json: &str,
    entry: impl Fn(&AnalyticsInput) -> AnalyticsResult<ComputationOutput<T>>,
) -> NapiResult<String> {
    let input = parse_input(input_json)?;
    let output = entry(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_report(input_json: String) -> NapiResult<String> {
    run(&input_json, tailorcast_core::report::generate_report)
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_seasonality(input_json: String) -> NapiResult<String> {
    run(&input_json, tailorcast_core::insights::seasonality)
}

#[napi]
pub fn analyze_demand(input_json: String) -> NapiResult<String> {
    run(&input_json, tailorcast_core::insights::demand)
}

#[napi]
pub fn rank_configurations(input_json: String) -> NapiResult<String> {
    run(&input_json, tailorcast_core::insights::popular_configurations)
}

#[napi]
pub fn forecast_trends(input_json: String) -> NapiResult<String> {
    run(&input_json, tailorcast_core::insights::future_trends)
}

#[napi]
pub fn forecast_inventory(input_json: String) -> NapiResult<String> {
    run(&input_json, tailorcast_core::insights::inventory_needs)
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

#[napi]
pub fn forecast_revenue(input_json: String) -> NapiResult<String> {
    run(&input_json, tailorcast_core::forecast::revenue_forecast)
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[napi]
pub fn build_dashboard(input_json: String) -> NapiResult<String> {
    run(&input_json, tailorcast_core::dashboard::build_dashboard)
}
