use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::days_between;
use crate::dashboard::{completion_time, percentage};
use crate::types::{Money, OrderRecord, Rate};

const TOP_PERFORMERS: usize = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeEfficiency {
    pub total_orders: u32,
    pub completed_orders: u32,
    pub completed_on_time: u32,
    /// Mean days from creation to completion over completed orders, 1 dp
    pub average_completion_days: Decimal,
    /// On-time completions as a share of all assigned orders, 0–100
    pub efficiency_rate: Rate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeWorkload {
    pub completed: u32,
    pub pending: u32,
    pub total: u32,
    /// Sum of quoted order values
    pub revenue: Money,
    pub average_order_value: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPerformance {
    pub on_time: u32,
    pub late: u32,
    pub percent_on_time: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformer {
    pub name: String,
    pub completed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub employee_stats: BTreeMap<String, EmployeeWorkload>,
    pub top_performers: Vec<TopPerformer>,
    pub employee_efficiency: BTreeMap<String, EmployeeEfficiency>,
    pub delivery_performance: DeliveryPerformance,
}

// ---------------------------------------------------------------------------
// Reducers
// ---------------------------------------------------------------------------

fn assignee(order: &OrderRecord) -> Option<String> {
    order
        .employee
        .as_ref()
        .map(|e| e.display_name())
        .filter(|name| !name.is_empty())
}

/// Completed on or before the due date. Orders without a due date or a
/// completion time are never on time.
fn on_time(order: &OrderRecord) -> bool {
    match (completion_time(order), order.due_date) {
        (Some(done), Some(due)) => done <= due,
        _ => false,
    }
}

fn elapsed_days(order: &OrderRecord) -> Option<Decimal> {
    let created: DateTime<Utc> = order.created_at?;
    Some(days_between(created, completion_time(order)?))
}

pub fn employee_efficiency(orders: &[OrderRecord]) -> BTreeMap<String, EmployeeEfficiency> {
    let mut by_name: BTreeMap<String, (EmployeeEfficiency, Decimal, u32)> = BTreeMap::new();
    for order in orders {
        let Some(name) = assignee(order) else {
            continue;
        };
        let (stats, days_total, timed) = by_name.entry(name).or_default();
        stats.total_orders += 1;
        if order.is_completed() {
            stats.completed_orders += 1;
            if on_time(order) {
                stats.completed_on_time += 1;
            }
            if let Some(days) = elapsed_days(order) {
                *days_total += days;
                *timed += 1;
            }
        }
    }

    by_name
        .into_iter()
        .map(|(name, (mut stats, days_total, timed))| {
            stats.average_completion_days = if timed > 0 {
                (days_total / Decimal::from(timed)).round_dp(1)
            } else {
                Decimal::ZERO
            };
            stats.efficiency_rate = percentage(
                Decimal::from(stats.completed_on_time),
                Decimal::from(stats.total_orders),
                2,
            );
            (name, stats)
        })
        .collect()
}

pub fn employee_workload(orders: &[OrderRecord]) -> BTreeMap<String, EmployeeWorkload> {
    let mut by_name: BTreeMap<String, EmployeeWorkload> = BTreeMap::new();
    for order in orders {
        let Some(name) = assignee(order) else {
            continue;
        };
        let stats = by_name.entry(name).or_default();
        stats.total += 1;
        stats.revenue += order.total();
        if order.is_completed() {
            stats.completed += 1;
        } else {
            stats.pending += 1;
        }
    }
    for stats in by_name.values_mut() {
        stats.average_order_value = (stats.revenue / Decimal::from(stats.total.max(1))).round_dp(2);
    }
    by_name
}

/// Employees ranked by completed orders, ties in name order.
pub fn top_performers(workload: &BTreeMap<String, EmployeeWorkload>, limit: usize) -> Vec<TopPerformer> {
    let mut ranked: Vec<TopPerformer> = workload
        .iter()
        .map(|(name, w)| TopPerformer {
            name: name.clone(),
            completed: w.completed,
        })
        .collect();
    ranked.sort_by(|a, b| b.completed.cmp(&a.completed));
    ranked.truncate(limit);
    ranked
}

/// On-time share of completed orders that have a completion time.
pub fn delivery_performance(orders: &[OrderRecord]) -> DeliveryPerformance {
    let completed: Vec<&OrderRecord> = orders
        .iter()
        .filter(|o| o.is_completed() && completion_time(o).is_some())
        .collect();
    let on_time_count = completed.iter().filter(|o| on_time(o)).count() as u32;
    let total = completed.len() as u32;
    DeliveryPerformance {
        on_time: on_time_count,
        late: total - on_time_count,
        percent_on_time: percentage(Decimal::from(on_time_count), Decimal::from(total), 2),
    }
}

pub fn performance_metrics(orders: &[OrderRecord]) -> PerformanceMetrics {
    let employee_stats = employee_workload(orders);
    PerformanceMetrics {
        top_performers: top_performers(&employee_stats, TOP_PERFORMERS),
        employee_stats,
        employee_efficiency: employee_efficiency(orders),
        delivery_performance: delivery_performance(orders),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EmployeeRef;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts(d: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 4, d, 12, 0, 0).unwrap())
    }

    fn order(employee: &str, status: &str, created: u32, completed: Option<u32>, due: u32) -> OrderRecord {
        OrderRecord {
            created_at: ts(created),
            completed_at: completed.and_then(ts),
            due_date: ts(due),
            status: Some(status.to_string()),
            total_amount: Some(dec!(400)),
            employee: Some(EmployeeRef {
                first_name: Some(employee.to_string()),
                last_name: Some("Cruz".to_string()),
            }),
            ..Default::default()
        }
    }

    fn sample() -> Vec<OrderRecord> {
        vec![
            order("Ana", "completed", 1, Some(4), 5),
            order("Ana", "completed", 1, Some(8), 5),
            order("Ana", "pending", 2, None, 9),
            order("Ben", "completed", 3, Some(4), 10),
        ]
    }

    #[test]
    fn test_efficiency() {
        let eff = employee_efficiency(&sample());
        let ana = &eff["Ana Cruz"];
        assert_eq!(ana.total_orders, 3);
        assert_eq!(ana.completed_orders, 2);
        assert_eq!(ana.completed_on_time, 1);
        assert_eq!(ana.average_completion_days, dec!(5));
        assert_eq!(ana.efficiency_rate, dec!(33.33));
        assert_eq!(eff["Ben Cruz"].efficiency_rate, dec!(100));
    }

    #[test]
    fn test_workload_and_ranking() {
        let work = employee_workload(&sample());
        assert_eq!(work["Ana Cruz"].pending, 1);
        assert_eq!(work["Ana Cruz"].revenue, dec!(1200));
        assert_eq!(work["Ana Cruz"].average_order_value, dec!(400));
        let top = top_performers(&work, 5);
        assert_eq!(top[0].name, "Ana Cruz");
        assert_eq!(top[0].completed, 2);
    }

    #[test]
    fn test_updated_at_stands_in_for_completion() {
        let mut o = order("Cy", "completed", 1, None, 5);
        o.updated_at = ts(3);
        let delivery = delivery_performance(&[o]);
        assert_eq!(delivery.on_time, 1);
        assert_eq!(delivery.percent_on_time, dec!(100));
    }

    #[test]
    fn test_delivery_performance() {
        let delivery = delivery_performance(&sample());
        assert_eq!(delivery.on_time, 2);
        assert_eq!(delivery.late, 1);
        assert_eq!(delivery.percent_on_time, dec!(66.67));
    }

    #[test]
    fn test_unassigned_and_empty() {
        let mut o = order("x", "completed", 1, Some(2), 3);
        o.employee = None;
        assert!(employee_efficiency(&[o]).is_empty());
        let delivery = delivery_performance(&[]);
        assert_eq!(delivery.percent_on_time, Decimal::ZERO);
        assert!(performance_metrics(&[]).top_performers.is_empty());
    }
}
