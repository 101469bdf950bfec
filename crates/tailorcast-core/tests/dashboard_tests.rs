#![cfg(feature = "dashboard")]

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tailorcast_core::config::EngineSettings;
use tailorcast_core::dashboard;
use tailorcast_core::types::{AnalyticsInput, CourseRecord, EmployeeRef, Gender, OrderRecord, StudentRecord};

fn ts(m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, m, d, h, 0, 0).unwrap()
}

fn student(gender: &str, course: &str) -> StudentRecord {
    StudentRecord {
        gender: Some(Gender::from(gender.to_string())),
        course: Some(CourseRecord {
            course_code: Some(course.to_string()),
            ..Default::default()
        }),
        created_at: Some(ts(1, 15, 9)),
        ..Default::default()
    }
}

fn tailor(name: &str) -> Option<EmployeeRef> {
    Some(EmployeeRef {
        first_name: Some(name.to_string()),
        last_name: None,
    })
}

fn snapshot() -> AnalyticsInput {
    let orders = vec![
        OrderRecord {
            created_at: Some(ts(6, 1, 9)),
            completed_at: Some(ts(6, 4, 9)),
            due_date: Some(ts(6, 5, 0)),
            payment_date: Some(ts(6, 4, 10)),
            status: Some("completed".into()),
            payment_status: Some("fully paid".into()),
            amount_paid: Some(dec!(600)),
            total_amount: Some(dec!(600)),
            balance: Some(dec!(0)),
            uniform_type: Some("Blazer".into()),
            student: Some(student("female", "BSN")),
            employee: tailor("Rosa"),
            ..Default::default()
        },
        OrderRecord {
            created_at: Some(ts(6, 10, 14)),
            due_date: Some(ts(6, 12, 0)),
            status: Some("in progress".into()),
            payment_status: Some("partial".into()),
            amount_paid: Some(dec!(200)),
            total_amount: Some(dec!(400)),
            balance: Some(dec!(200)),
            uniform_type: Some("Polo".into()),
            student: Some(student("male", "BSIT")),
            employee: tailor("Rosa"),
            ..Default::default()
        },
        OrderRecord {
            created_at: Some(ts(6, 13, 22)),
            due_date: Some(ts(6, 20, 0)),
            status: Some("pending".into()),
            payment_status: Some("not paid".into()),
            amount_paid: None,
            total_amount: Some(dec!(400)),
            balance: Some(dec!(400)),
            uniform_type: Some("Polo".into()),
            student: Some(student("male", "BSIT")),
            ..Default::default()
        },
    ];
    AnalyticsInput {
        orders,
        students: vec![student("female", "BSN"), student("male", "BSIT"), student("male", "BSIT")],
        settings: EngineSettings {
            as_of: Some(ts(6, 15, 12)),
            ..Default::default()
        },
    }
}

#[test]
fn test_basic_stats_and_financials() {
    let dash = dashboard::build_dashboard(&snapshot()).unwrap().result;
    assert_eq!(dash.basic_stats.total_orders, 3);
    assert_eq!(dash.basic_stats.total_students, 3);
    assert_eq!(dash.basic_stats.completion_rate, dec!(33.33));
    assert_eq!(dash.basic_stats.total_revenue, dec!(800));

    let fin = &dash.financial_metrics;
    assert_eq!(fin.total_pending, dec!(600));
    assert_eq!(fin.collected_percentage, dec!(57.1));
    assert_eq!(fin.pending_percentage, dec!(42.9));
    assert_eq!(fin.payment_completion, dec!(33.33));
    assert_eq!(fin.revenue_by_quarter[1].1, dec!(800));
}

#[test]
fn test_status_shares_sum_to_one_hundred() {
    let dash = dashboard::build_dashboard(&snapshot()).unwrap().result;
    let total: Decimal = dash
        .order_metrics
        .completion_details
        .iter()
        .map(|s| s.percentage)
        .sum();
    assert!((total - dec!(100)).abs() <= dec!(0.1), "sum was {total}");
    assert_eq!(dash.order_metrics.by_type["polo"], 2);
    assert_eq!(dash.order_metrics.by_payment_status["partial"], 1);
}

#[test]
fn test_students_and_staff() {
    let dash = dashboard::build_dashboard(&snapshot()).unwrap().result;
    let students = &dash.student_analytics;
    assert_eq!(students.course_enrollment["BSIT"], 2);
    assert_eq!(students.gender_by_course["BSIT"].male, 2);
    assert_eq!(students.enrollment_trend[0].count, 3);
    assert_eq!(students.course_performance["BSIT"].total_revenue, dec!(200));

    let staff = &dash.performance_metrics;
    assert_eq!(staff.employee_stats["Rosa"].total, 2);
    assert_eq!(staff.employee_stats["Rosa"].pending, 1);
    assert_eq!(staff.employee_efficiency["Rosa"].completed_on_time, 1);
    assert_eq!(staff.employee_efficiency["Rosa"].average_completion_days, dec!(3));
    assert_eq!(staff.top_performers[0].name, "Rosa");
    assert_eq!(staff.delivery_performance.percent_on_time, dec!(100));
}

#[test]
fn test_time_metrics_against_pinned_as_of() {
    let dash = dashboard::build_dashboard(&snapshot()).unwrap().result;
    let time = &dash.time_metrics;
    // due 12 June, still in progress on the 15th
    assert_eq!(time.overdue_orders, 1);
    assert_eq!(time.upcoming_due, 1);
    assert_eq!(time.rush_orders, 1);
    assert_eq!(time.peak_order_times["Morning"], 1);
    assert_eq!(time.peak_order_times["Afternoon"], 1);
    assert_eq!(time.peak_order_times["Night"], 1);
    assert_eq!(time.seasonal_trends["Summer"], 3);
    assert_eq!(time.processing_times.average, dec!(3));

    let june = time.revenue_over_time.month.last().unwrap();
    assert_eq!(june.period, "2024-06");
    assert_eq!(june.order_revenue, dec!(800));
    assert_eq!(june.payment_revenue, dec!(600));
}

#[test]
fn test_empty_dashboard_is_zeroed() {
    let input = AnalyticsInput {
        settings: EngineSettings {
            as_of: Some(ts(6, 15, 12)),
            ..Default::default()
        },
        ..Default::default()
    };
    let dash = dashboard::build_dashboard(&input).unwrap().result;
    assert_eq!(dash.basic_stats.completion_rate, Decimal::ZERO);
    assert_eq!(dash.financial_metrics.average_order_value, Decimal::ZERO);
    assert_eq!(dash.order_metrics.by_status.len(), 3);
    assert_eq!(dash.time_metrics.busy_days.len(), 7);
    assert!(dash.performance_metrics.top_performers.is_empty());
}
