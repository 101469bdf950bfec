#![cfg(feature = "forecast")]

use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::Value;

use tailorcast_core::report;
use tailorcast_core::types::AnalyticsInput;

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 20, 0, 0).unwrap()
}

/// Collaborator-shaped rows: nested `students`/`courses`, string timestamps
/// in mixed formats, numeric amounts.
fn collaborator_json(days: i64) -> String {
    let kinds = ["Polo", "Blazer", "Skirt"];
    let courses = ["BSIT", "BSN"];
    let genders = ["Male", "Female"];
    let rows: Vec<Value> = (0..days)
        .map(|i| {
            let created = as_of() - Duration::days(i * 2);
            serde_json::json!({
                "id": i,
                "created_at": created.format("%Y-%m-%d %H:%M:%S+00").to_string(),
                "amount_paid": 150 + (i % 5) * 40,
                "uniform_type": kinds[(i % 3) as usize],
                "students": {
                    "gender": genders[(i % 2) as usize],
                    "courses": { "course_code": courses[(i % 2) as usize] }
                }
            })
        })
        .collect();
    serde_json::json!({
        "orders": rows,
        "settings": { "as_of": as_of().to_rfc3339() }
    })
    .to_string()
}

fn parse(json: &str) -> AnalyticsInput {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_empty_input_report() {
    let out = report::generate_report(&AnalyticsInput::default()).unwrap();
    let r = out.result;
    assert_eq!(r.predictions.len(), 30);
    assert!(r.predictions.iter().all(|p| p.predicted >= Decimal::ZERO));
    assert_eq!(r.demand_analysis.total_orders, 0);
    assert!(r.popular_configurations.popular_configs.is_empty());
    assert!(r.inventory_needs.recommended_stock.is_empty());
    assert_eq!(r.data_quality.recommendation, "Continue collecting data for more accurate predictions");
}

#[test]
fn test_full_report_over_collaborator_rows() {
    let input = parse(&collaborator_json(90));
    assert_eq!(input.orders.len(), 90);
    assert_eq!(input.undated_orders(), 0);

    let out = report::generate_report(&input).unwrap();
    let r = &out.result;

    assert_eq!(r.model.kind, "trained");
    assert_eq!(r.data_quality.data_points, 90);
    assert_eq!(r.data_quality.confidence_score, 100);
    assert_eq!(r.demand_analysis.total_orders, 90);
    assert_eq!(r.demand_analysis.uniform_type_count["polo"], 30);
    assert_eq!(r.demand_analysis.insights.dominant_gender, "equal");
    assert_eq!(
        r.insights.predicted_revenue,
        r.predictions.iter().map(|p| p.predicted).sum::<Decimal>().round_dp(2)
    );
    assert_eq!(r.insights.top_performing.day, r.seasonal_analysis.insights.best_day.name);
    assert_eq!(r.insights.inventory_recommendations, r.inventory_needs.recommendation_lines());
    assert!(r.popular_configurations.popular_configs.len() <= 5);
    assert!(r.insights.growth_opportunities.len() <= 3);
}

#[test]
fn test_unparseable_timestamps_are_reported_not_fatal() {
    let json = r#"{
        "orders": [
            { "created_at": "not a date", "amount_paid": 100, "uniform_type": "Polo" },
            { "created_at": "2024-06-01", "amount_paid": 100, "uniform_type": "Polo" }
        ],
        "settings": { "as_of": "2024-06-30T00:00:00Z" }
    }"#;
    let out = report::generate_report(&parse(json)).unwrap();
    assert!(out.warnings.iter().any(|w| w.contains("1 of 2 orders skipped")));
    assert_eq!(out.result.demand_analysis.total_orders, 2);
    assert_eq!(out.result.seasonal_analysis.monthly_trends[5].count, 1);
}

#[test]
fn test_report_is_bit_identical_across_runs() {
    let input = parse(&collaborator_json(40));
    let first = serde_json::to_string(&report::generate_report(&input).unwrap().result).unwrap();
    let second = serde_json::to_string(&report::generate_report(&input).unwrap().result).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_invalid_settings_error() {
    let json = r#"{ "orders": [], "settings": { "training": { "learning_rate": -1 } } }"#;
    assert!(report::generate_report(&parse(json)).is_err());
}

#[test]
fn test_steep_growth_does_not_abort_report() {
    let json = r#"{
        "orders": [
            { "created_at": "2024-03-05", "amount_paid": 0.01, "uniform_type": "Polo" },
            { "created_at": "2024-04-05", "amount_paid": 1000000, "uniform_type": "Polo" },
            { "created_at": "2024-04-06", "amount_paid": 0, "uniform_type": "Polo" }
        ],
        "settings": { "as_of": "2024-05-20T00:00:00Z" }
    }"#;
    let out = report::generate_report(&parse(json)).unwrap();
    let trends = &out.result.future_trends;
    assert!(trends.projection_overflowed);
    assert_eq!(trends.next_quarter.estimated, Decimal::ZERO);
    assert_eq!(out.result.demand_analysis.total_orders, 3);
    assert_eq!(out.result.predictions.len(), 30);
    assert!(out.warnings.iter().any(|w| w.contains("too steep to project")));
}
