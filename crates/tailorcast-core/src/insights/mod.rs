pub mod configurations;
pub mod daily;
pub mod demand;
pub mod growth;
pub mod inventory;
pub mod seasonal;

use std::time::Instant;

use crate::types::{with_metadata, AnalyticsInput, ComputationOutput};
use crate::AnalyticsResult;

use configurations::{rank_configurations, ConfigurationRanking};
use demand::{analyze_customer_demand, DemandAnalysis};
use growth::{predict_future_trends, FutureTrends, PROJECTION_OVERFLOW_WARNING};
use inventory::{predict_inventory_needs, InventoryNeeds};
use seasonal::{analyze_seasonal_patterns, SeasonalAnalysis};

/// Day-of-week, month and quarter revenue tables with best performers.
pub fn seasonality(input: &AnalyticsInput) -> AnalyticsResult<ComputationOutput<SeasonalAnalysis>> {
    let start = Instant::now();
    input.settings.validate()?;
    let warnings = input.input_warnings();

    let output = analyze_seasonal_patterns(&input.orders);

    Ok(with_metadata(
        "Seasonal revenue decomposition by weekday, month and quarter (UTC calendar)",
        &serde_json::json!({
            "orders": input.orders.len(),
            "tie_break": "first maximum in calendar order",
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

/// Product-type, course and gender distributions over every order.
pub fn demand(input: &AnalyticsInput) -> AnalyticsResult<ComputationOutput<DemandAnalysis>> {
    let start = Instant::now();
    input.settings.validate()?;

    let output = analyze_customer_demand(&input.orders);

    Ok(with_metadata(
        "Category demand distribution over the full order history",
        &serde_json::json!({
            "orders": input.orders.len(),
            "missing_product_type": crate::types::UNKNOWN_PRODUCT_TYPE,
        }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        output,
    ))
}

/// Most ordered and fastest-rising (product type, gender, course) combinations.
pub fn popular_configurations(
    input: &AnalyticsInput,
) -> AnalyticsResult<ComputationOutput<ConfigurationRanking>> {
    let start = Instant::now();
    input.settings.validate()?;
    let settings = input.settings.pinned();
    let as_of = settings.reference_time();

    let output = rank_configurations(&input.orders, as_of, settings.top_configurations);

    Ok(with_metadata(
        "Configuration ranking by volume and month-over-month order delta",
        &serde_json::json!({
            "as_of": as_of.to_rfc3339(),
            "top": settings.top_configurations,
        }),
        input.input_warnings(),
        start.elapsed().as_micros() as u64,
        output,
    ))
}

/// Next-quarter revenue outlook, next peak month and growth opportunities.
pub fn future_trends(input: &AnalyticsInput) -> AnalyticsResult<ComputationOutput<FutureTrends>> {
    let start = Instant::now();
    input.settings.validate()?;
    let settings = input.settings.pinned();
    let mut warnings = input.input_warnings();

    let seasonal = analyze_seasonal_patterns(&input.orders);
    let output = predict_future_trends(&input.orders, &seasonal, &settings);
    if output == FutureTrends::neutral() {
        warnings.push("Fewer than 3 orders in the last 6 months; trend reported as stable".into());
    }
    if output.projection_overflowed {
        warnings.push(PROJECTION_OVERFLOW_WARNING.into());
    }

    Ok(with_metadata(
        "Average month-over-month revenue growth compounded over three months",
        &serde_json::json!({
            "as_of": settings.reference_time().to_rfc3339(),
            "trend_window_months": 6,
            "category_window_months": 3,
            "top_opportunities": settings.top_opportunities,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

/// Stock recommendations with shortage and surplus flags.
pub fn inventory_needs(input: &AnalyticsInput) -> AnalyticsResult<ComputationOutput<InventoryNeeds>> {
    let start = Instant::now();
    input.settings.validate()?;
    let settings = input.settings.pinned();
    let mut warnings = input.input_warnings();

    let output = predict_inventory_needs(&input.orders, &settings);
    if output.recommended_stock.is_empty() {
        warnings.push(format!(
            "No orders in the last {} months; no stock recommended",
            settings.inventory.window_months
        ));
    }

    Ok(with_metadata(
        "Trailing run-rate with safety buffer and growth uplift",
        &settings.inventory,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}
