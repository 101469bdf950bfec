pub mod orders;
pub mod staff;
pub mod students;
pub mod timeline;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, AnalyticsInput, ComputationOutput, Money, OrderRecord, Rate, StudentRecord};
use crate::AnalyticsResult;

use orders::{completion_rate, financial_metrics, order_metrics, FinancialMetrics, OrderMetrics};
use staff::{performance_metrics, PerformanceMetrics};
use students::{student_analytics, StudentAnalytics};
use timeline::{time_metrics, TimeMetrics};

/// Bucket label for a missing status, payment status or gender.
pub const UNKNOWN_LABEL: &str = "unknown";

pub fn label_or_unknown(label: Option<String>) -> String {
    label.unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

/// `part / whole × 100` rounded to `dp`; 0 when `whole` is not positive.
pub fn percentage(part: Decimal, whole: Decimal, dp: u32) -> Rate {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (part / whole * Decimal::ONE_HUNDRED).round_dp(dp)
}

/// When the order was finished. Older rows only carry `updated_at`.
pub fn completion_time(order: &OrderRecord) -> Option<DateTime<Utc>> {
    order.completed_at.or(order.updated_at)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicStats {
    pub total_students: usize,
    pub total_orders: usize,
    pub completion_rate: Rate,
    /// Collected amount over every order
    pub total_revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub basic_stats: BasicStats,
    pub order_metrics: OrderMetrics,
    pub financial_metrics: FinancialMetrics,
    pub student_analytics: StudentAnalytics,
    pub performance_metrics: PerformanceMetrics,
    pub time_metrics: TimeMetrics,
}

pub fn assemble_dashboard(
    orders: &[OrderRecord],
    students: &[StudentRecord],
    as_of: DateTime<Utc>,
) -> Dashboard {
    tracing::debug!(orders = orders.len(), students = students.len(), "assembling dashboard");
    let financial_metrics = financial_metrics(orders);
    Dashboard {
        basic_stats: BasicStats {
            total_students: students.len(),
            total_orders: orders.len(),
            completion_rate: completion_rate(orders),
            total_revenue: financial_metrics.total_collected,
        },
        order_metrics: order_metrics(orders),
        financial_metrics,
        student_analytics: student_analytics(students, orders),
        performance_metrics: performance_metrics(orders),
        time_metrics: time_metrics(orders, as_of),
    }
}

/// Operational KPIs over orders and students: status, payment, staff and
/// deadline views plus rolling revenue series.
pub fn build_dashboard(input: &AnalyticsInput) -> AnalyticsResult<ComputationOutput<Dashboard>> {
    let start = Instant::now();
    input.settings.validate()?;
    let settings = input.settings.pinned();
    let as_of = settings.reference_time();

    let output = assemble_dashboard(&input.orders, &input.students, as_of);

    Ok(with_metadata(
        "Independent KPI reducers over the order and student snapshot",
        &serde_json::json!({
            "as_of": as_of.to_rfc3339(),
            "orders": input.orders.len(),
            "students": input.students.len(),
            "completion_time": "completed_at, else updated_at",
        }),
        input.input_warnings(),
        start.elapsed().as_micros() as u64,
        output,
    ))
}
