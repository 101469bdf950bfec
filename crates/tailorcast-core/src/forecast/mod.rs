pub mod network;
pub mod regressor;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::insights::daily::aggregate_daily;
use crate::types::{AnalyticsInput, ComputationMetadata, ComputationOutput, Money};
use crate::AnalyticsResult;

use regressor::{build_sales_model, forecast_horizon, DailyPrediction, ModelSummary};

/// Daily aggregates at which the confidence score saturates.
const FULL_CONFIDENCE_POINTS: f64 = 30.0;
const MIN_CONFIDENCE: f64 = 20.0;

fn with_metadata_f64<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}

/// How much history backs the forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    /// 20..=100
    pub confidence_score: u32,
    pub data_points: usize,
    pub coverage: String,
    pub recommendation: String,
}

impl DataQuality {
    pub fn from_points(points: usize) -> Self {
        let score = (points as f64 / FULL_CONFIDENCE_POINTS * 100.0).clamp(MIN_CONFIDENCE, 100.0);
        DataQuality {
            confidence_score: score.round() as u32,
            data_points: points,
            coverage: if points > 0 {
                format!("{points} days of historical data available")
            } else {
                "Limited historical data available".to_string()
            },
            recommendation: if (points as f64) < FULL_CONFIDENCE_POINTS {
                "Continue collecting data for more accurate predictions".to_string()
            } else {
                "Data quality is good for predictions".to_string()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueForecast {
    pub predictions: Vec<DailyPrediction>,
    /// Sum of the rounded daily predictions
    pub total_predicted: Money,
    pub model: ModelSummary,
    pub data_quality: DataQuality,
}

pub fn total_predicted(predictions: &[DailyPrediction]) -> Money {
    predictions
        .iter()
        .map(|p| p.predicted)
        .sum::<Decimal>()
        .round_dp(2)
}

/// Daily revenue for the configured horizon from a model trained on the
/// daily aggregates (or the seeded fallback for thin histories).
pub fn revenue_forecast(input: &AnalyticsInput) -> AnalyticsResult<ComputationOutput<RevenueForecast>> {
    let start = Instant::now();
    input.settings.validate()?;
    let settings = input.settings.pinned();
    let mut warnings = input.input_warnings();

    let daily = aggregate_daily(&input.orders);
    let model = build_sales_model(&daily, &settings);
    let summary = model.summary(daily.len());
    if let Some(reason) = &summary.fallback_reason {
        warnings.push(format!("Fallback model used: {reason}"));
    }

    let predictions = forecast_horizon(&model, &daily, settings.reference_time(), settings.horizon_days);
    let output = RevenueForecast {
        total_predicted: total_predicted(&predictions),
        predictions,
        model: summary,
        data_quality: DataQuality::from_points(daily.len()),
    };

    Ok(with_metadata_f64(
        "Feed-forward regression on calendar features, Adam-optimised MSE",
        &serde_json::json!({
            "as_of": settings.reference_time().to_rfc3339(),
            "horizon_days": settings.horizon_days,
            "seed": settings.seed,
            "features": ["weekday", "day_of_month", "month", "had_revenue"],
            "training": settings.training,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bounds() {
        assert_eq!(DataQuality::from_points(0).confidence_score, 20);
        assert_eq!(DataQuality::from_points(3).confidence_score, 20);
        assert_eq!(DataQuality::from_points(15).confidence_score, 50);
        assert_eq!(DataQuality::from_points(30).confidence_score, 100);
        assert_eq!(DataQuality::from_points(400).confidence_score, 100);
    }

    #[test]
    fn test_quality_strings() {
        let thin = DataQuality::from_points(0);
        assert_eq!(thin.coverage, "Limited historical data available");
        assert_eq!(thin.recommendation, "Continue collecting data for more accurate predictions");
        let good = DataQuality::from_points(45);
        assert_eq!(good.coverage, "45 days of historical data available");
        assert_eq!(good.recommendation, "Data quality is good for predictions");
    }

    #[test]
    fn test_empty_input_forecast_uses_fallback() {
        let mut input = AnalyticsInput::default();
        input.settings.as_of = chrono::DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z")
            .ok()
            .map(|d| d.with_timezone(&chrono::Utc));
        let out = revenue_forecast(&input).unwrap();
        assert_eq!(out.result.predictions.len(), 30);
        assert_eq!(out.result.model.kind, "fallback");
        assert_eq!(out.metadata.precision, "ieee754_f64");
        assert!(out.warnings.iter().any(|w| w.starts_with("Fallback model used")));
    }
}
