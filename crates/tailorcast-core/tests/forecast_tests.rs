#![cfg(feature = "forecast")]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use tailorcast_core::config::EngineSettings;
use tailorcast_core::forecast::{self, regressor};
use tailorcast_core::insights::daily::aggregate_daily;
use tailorcast_core::types::{AnalyticsInput, OrderRecord};

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 31, 18, 0, 0).unwrap()
}

/// One order per day for `days` days ending on `as_of`, weekly revenue cycle.
fn history(days: i64) -> Vec<OrderRecord> {
    (0..days)
        .map(|i| OrderRecord {
            created_at: Some(as_of() - Duration::days(days - 1 - i)),
            amount_paid: Some(Decimal::from(200 + (i % 7) * 50)),
            uniform_type: Some("Polo".into()),
            ..Default::default()
        })
        .collect()
}

fn input(orders: Vec<OrderRecord>) -> AnalyticsInput {
    AnalyticsInput {
        orders,
        students: Vec::new(),
        settings: EngineSettings {
            as_of: Some(as_of()),
            ..Default::default()
        },
    }
}

#[test]
fn test_empty_history_uses_fallback_with_full_horizon() {
    let out = forecast::revenue_forecast(&input(Vec::new())).unwrap();
    let fc = out.result;
    assert_eq!(fc.predictions.len(), 30);
    assert_eq!(fc.model.kind, "fallback");
    assert!(fc.predictions.iter().all(|p| p.predicted >= Decimal::ZERO));
    assert_eq!(fc.data_quality.confidence_score, 20);
    assert_eq!(fc.data_quality.coverage, "Limited historical data available");
    assert!(out.warnings.iter().any(|w| w.starts_with("Fallback model used")));
    assert_eq!(out.metadata.precision, "ieee754_f64");
}

#[test]
fn test_horizon_starts_the_day_after_as_of() {
    let fc = forecast::revenue_forecast(&input(history(5))).unwrap().result;
    assert_eq!(fc.predictions[0].date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    assert_eq!(fc.predictions[0].day, "Mon");
    assert_eq!(fc.predictions[29].date, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
}

#[test]
fn test_trained_model_predictions_are_non_negative() {
    let fc = forecast::revenue_forecast(&input(history(60))).unwrap().result;
    assert_eq!(fc.model.kind, "trained");
    assert_eq!(fc.model.training_points, 60);
    assert_eq!(fc.model.layer_sizes, vec![10, 5, 1]);
    assert!(fc.model.final_validation_loss.is_some());
    assert!(fc.predictions.iter().all(|p| p.predicted >= Decimal::ZERO));
    assert_eq!(fc.data_quality.confidence_score, 100);
    assert_eq!(
        fc.total_predicted,
        fc.predictions.iter().map(|p| p.predicted).sum::<Decimal>()
    );
}

#[test]
fn test_small_history_trains_single_hidden_layer() {
    let daily = aggregate_daily(&history(4));
    let settings = EngineSettings {
        as_of: Some(as_of()),
        ..Default::default()
    };
    let model = regressor::build_sales_model(&daily, &settings);
    let summary = model.summary(daily.len());
    if !model.is_fallback() {
        assert_eq!(summary.layer_sizes, vec![5, 1]);
        assert_eq!(summary.epochs, 20);
        assert_eq!(summary.final_validation_loss, None);
    }
}

#[test]
fn test_custom_horizon_and_reproducible_seed() {
    let mut a = input(history(12));
    a.settings.horizon_days = 7;
    let first = forecast::revenue_forecast(&a).unwrap().result;
    let second = forecast::revenue_forecast(&a).unwrap().result;
    assert_eq!(first.predictions.len(), 7);
    assert_eq!(first.predictions, second.predictions);
}

#[test]
fn test_fallback_values_stay_in_range() {
    let model = regressor::SalesModel::fallback(7, "test");
    let rows: Vec<regressor::FeatureRow> = (0..50).map(|_| [0.0; regressor::FEATURE_COUNT]).collect();
    let values = model.predict(&rows);
    assert_eq!(values.len(), 50);
    assert!(values.iter().all(|v| (0.0..100.0).contains(v)));
}

#[test]
fn test_diverging_training_falls_back() {
    let mut diverging = input(history(60));
    diverging.settings.training.learning_rate = 1e300;
    let out = forecast::revenue_forecast(&diverging).unwrap();
    let fc = out.result;
    assert_eq!(fc.model.kind, "fallback");
    assert!(fc.model.fallback_reason.is_some());
    assert_eq!(fc.predictions.len(), 30);
    assert!(fc
        .predictions
        .iter()
        .all(|p| p.predicted >= Decimal::ZERO && p.predicted <= Decimal::ONE_HUNDRED));
    assert!(out.warnings.iter().any(|w| w.starts_with("Fallback model used")));
}
