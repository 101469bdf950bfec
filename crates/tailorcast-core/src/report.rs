use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineSettings;
use crate::forecast::regressor::{build_sales_model, forecast_horizon, DailyPrediction, ModelSummary};
use crate::forecast::{total_predicted, DataQuality};
use crate::insights::configurations::{rank_configurations, ConfigurationRanking};
use crate::insights::daily::aggregate_daily;
use crate::insights::demand::{analyze_customer_demand, DemandAnalysis};
use crate::insights::growth::{predict_future_trends, FutureTrends, PROJECTION_OVERFLOW_WARNING};
use crate::insights::inventory::{predict_inventory_needs, InventoryNeeds};
use crate::insights::seasonal::{analyze_seasonal_patterns, SeasonalAnalysis};
use crate::types::{with_metadata, AnalyticsInput, ComputationOutput, Money, OrderRecord};
use crate::AnalyticsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerforming {
    pub day: String,
    pub month: String,
    pub quarter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandSignals {
    pub popular_uniform: String,
    pub popular_course: String,
    pub dominant_gender: String,
}

/// Headline figures pulled from the individual analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportInsights {
    pub top_performing: TopPerforming,
    pub demand: DemandSignals,
    /// Sum of the daily predictions, 2 dp
    pub predicted_revenue: Money,
    pub growth_opportunities: Vec<String>,
    pub inventory_recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub predictions: Vec<DailyPrediction>,
    pub seasonal_analysis: SeasonalAnalysis,
    pub demand_analysis: DemandAnalysis,
    pub popular_configurations: ConfigurationRanking,
    pub future_trends: FutureTrends,
    pub inventory_needs: InventoryNeeds,
    pub data_quality: DataQuality,
    pub model: ModelSummary,
    pub insights: ReportInsights,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Run every analysis over one snapshot. `settings` must already be pinned
/// so all windows share the same reference instant.
pub fn build_report(orders: &[OrderRecord], settings: &EngineSettings) -> AnalyticsReport {
    let as_of = settings.reference_time();

    let daily = aggregate_daily(orders);
    let model = build_sales_model(&daily, settings);
    let predictions = forecast_horizon(&model, &daily, as_of, settings.horizon_days);

    let seasonal_analysis = analyze_seasonal_patterns(orders);
    let demand_analysis = analyze_customer_demand(orders);
    let popular_configurations = rank_configurations(orders, as_of, settings.top_configurations);
    let future_trends = predict_future_trends(orders, &seasonal_analysis, settings);
    let inventory_needs = predict_inventory_needs(orders, settings);

    let insights = ReportInsights {
        top_performing: TopPerforming {
            day: seasonal_analysis.insights.best_day.name.clone(),
            month: seasonal_analysis.insights.best_month.name.clone(),
            quarter: seasonal_analysis.insights.best_quarter.name.clone(),
        },
        demand: DemandSignals {
            popular_uniform: demand_analysis.insights.most_popular_uniform.clone(),
            popular_course: demand_analysis.insights.most_popular_course.clone(),
            dominant_gender: demand_analysis.insights.dominant_gender.clone(),
        },
        predicted_revenue: total_predicted(&predictions),
        growth_opportunities: future_trends.growth_opportunities.clone(),
        inventory_recommendations: inventory_needs.recommendation_lines(),
    };

    AnalyticsReport {
        predictions,
        seasonal_analysis,
        demand_analysis,
        popular_configurations,
        future_trends,
        inventory_needs,
        data_quality: DataQuality::from_points(daily.len()),
        model: model.summary(daily.len()),
        insights,
    }
}

/// The merged report: forecast, seasonal, demand, configuration, trend and
/// inventory analyses plus data-quality and headline insights.
pub fn generate_report(input: &AnalyticsInput) -> AnalyticsResult<ComputationOutput<AnalyticsReport>> {
    let start = Instant::now();
    input.settings.validate()?;
    let settings = input.settings.pinned();
    let mut warnings = input.input_warnings();

    let report = build_report(&input.orders, &settings);

    if let Some(reason) = &report.model.fallback_reason {
        warnings.push(format!("Fallback model used: {reason}"));
    }
    if report.future_trends.projection_overflowed {
        warnings.push(PROJECTION_OVERFLOW_WARNING.into());
    }
    if report.data_quality.data_points < settings.training.min_points {
        warnings.push(report.data_quality.recommendation.clone());
    }

    Ok(with_metadata(
        "Calendar aggregation, category growth and feed-forward revenue regression",
        &serde_json::json!({
            "as_of": settings.reference_time().to_rfc3339(),
            "horizon_days": settings.horizon_days,
            "seed": settings.seed,
            "orders": input.orders.len(),
            "timezone": "UTC",
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    ))
}
