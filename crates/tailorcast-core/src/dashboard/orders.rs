use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::{month_index, QUARTER_NAMES, SHORT_MONTH_NAMES};
use crate::dashboard::{label_or_unknown, percentage};
use crate::types::{Money, OrderRecord, Rate};

/// Statuses always present in the status breakdown.
const DEFAULT_STATUSES: [&str; 3] = ["completed", "in progress", "pending"];
const CANCELLED: &str = "cancelled";
const FULLY_PAID: &str = "fully paid";
const PARTIAL: &str = "partial";
const NOT_PAID: &str = "not paid";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Completed orders spread over a 30-day month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turnover {
    pub daily: Decimal,
    pub weekly: Decimal,
    pub monthly: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusShare {
    pub status: String,
    pub count: u32,
    /// 0–100, 1 dp
    pub percentage: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetrics {
    pub by_status: BTreeMap<String, u32>,
    pub by_type: BTreeMap<String, u32>,
    pub by_payment_status: BTreeMap<String, u32>,
    pub order_turnover: Turnover,
    pub completion_details: Vec<StatusShare>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub fully_paid: u32,
    pub partial: u32,
    pub not_paid: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialMetrics {
    pub total_collected: Money,
    pub total_pending: Money,
    pub average_balance: Money,
    /// Share of orders fully paid, 0–100
    pub payment_completion: Rate,
    pub payment_stats: PaymentStats,
    pub average_order_value: Money,
    pub revenue_by_status: BTreeMap<String, Money>,
    /// Collected revenue per calendar month, January first
    pub revenue_by_month: Vec<(String, Money)>,
    pub revenue_by_quarter: Vec<(String, Money)>,
    /// Collected vs pending share of paid + balance, 0–100
    pub collected_percentage: Rate,
    pub pending_percentage: Rate,
}

// ---------------------------------------------------------------------------
// Reducers
// ---------------------------------------------------------------------------

/// Share of orders whose status is `completed`, 2 dp.
pub fn completion_rate(orders: &[OrderRecord]) -> Rate {
    let completed = orders.iter().filter(|o| o.is_completed()).count();
    percentage(Decimal::from(completed), Decimal::from(orders.len()), 2)
}

pub fn order_turnover(orders: &[OrderRecord]) -> Turnover {
    let completed = Decimal::from(orders.iter().filter(|o| o.is_completed()).count());
    Turnover {
        daily: (completed / dec!(30)).round_dp(2),
        weekly: (completed / dec!(4)).round_dp(2),
        monthly: completed,
    }
}

/// Mean quoted order value, 2 dp; 0 for no orders.
pub fn average_order_value(orders: &[OrderRecord]) -> Money {
    if orders.is_empty() {
        return Decimal::ZERO;
    }
    let total: Money = orders.iter().map(OrderRecord::total).sum();
    (total / Decimal::from(orders.len())).round_dp(2)
}

pub fn revenue_by_status(orders: &[OrderRecord]) -> BTreeMap<String, Money> {
    let mut by_status = BTreeMap::new();
    for order in orders {
        *by_status
            .entry(label_or_unknown(order.status_label()))
            .or_insert(Decimal::ZERO) += order.paid();
    }
    by_status
}

/// Status counts with cancelled orders left out; the usual workflow
/// statuses are always present.
pub fn status_breakdown(orders: &[OrderRecord]) -> BTreeMap<String, u32> {
    let mut counts: BTreeMap<String, u32> = DEFAULT_STATUSES
        .iter()
        .map(|s| (s.to_string(), 0))
        .collect();
    for order in orders {
        let status = label_or_unknown(order.status_label());
        if status != CANCELLED {
            *counts.entry(status).or_insert(0) += 1;
        }
    }
    counts
}

fn count_by(orders: &[OrderRecord], key: impl Fn(&OrderRecord) -> String) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for order in orders {
        *counts.entry(key(order)).or_insert(0) += 1;
    }
    counts
}

fn payment_label(order: &OrderRecord) -> String {
    label_or_unknown(
        order
            .payment_status
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty()),
    )
}

pub fn completion_details(orders: &[OrderRecord]) -> Vec<StatusShare> {
    let counts = count_by(orders, |o| label_or_unknown(o.status_label()));
    let total = Decimal::from(orders.len());
    counts
        .into_iter()
        .map(|(status, count)| StatusShare {
            percentage: percentage(Decimal::from(count), total, 1),
            status,
            count,
        })
        .collect()
}

pub fn order_metrics(orders: &[OrderRecord]) -> OrderMetrics {
    OrderMetrics {
        by_status: status_breakdown(orders),
        by_type: count_by(orders, OrderRecord::product_bucket),
        by_payment_status: count_by(orders, payment_label),
        order_turnover: order_turnover(orders),
        completion_details: completion_details(orders),
    }
}

pub fn payment_stats(orders: &[OrderRecord]) -> PaymentStats {
    let mut stats = PaymentStats::default();
    for order in orders {
        match payment_label(order).as_str() {
            FULLY_PAID => stats.fully_paid += 1,
            PARTIAL => stats.partial += 1,
            NOT_PAID => stats.not_paid += 1,
            _ => {}
        }
    }
    stats
}

pub fn financial_metrics(orders: &[OrderRecord]) -> FinancialMetrics {
    let total_collected: Money = orders.iter().map(OrderRecord::paid).sum();
    let total_pending: Money = orders.iter().map(OrderRecord::outstanding).sum();
    let count = Decimal::from(orders.len());
    let stats = payment_stats(orders);

    let mut months = [Decimal::ZERO; 12];
    for order in orders {
        if let Some(created) = order.created_at {
            months[month_index(created.date_naive())] += order.paid();
        }
    }
    let mut quarters = [Decimal::ZERO; 4];
    for (m, revenue) in months.iter().enumerate() {
        quarters[m / 3] += *revenue;
    }

    FinancialMetrics {
        total_collected,
        total_pending,
        average_balance: if orders.is_empty() {
            Decimal::ZERO
        } else {
            (total_pending / count).round_dp(2)
        },
        payment_completion: percentage(Decimal::from(stats.fully_paid), count, 2),
        payment_stats: stats,
        average_order_value: average_order_value(orders),
        revenue_by_status: revenue_by_status(orders),
        revenue_by_month: SHORT_MONTH_NAMES
            .iter()
            .zip(months)
            .map(|(name, revenue)| (name.to_string(), revenue))
            .collect(),
        revenue_by_quarter: QUARTER_NAMES
            .iter()
            .zip(quarters)
            .map(|(name, revenue)| (name.to_string(), revenue))
            .collect(),
        collected_percentage: percentage(total_collected, total_collected + total_pending, 1),
        pending_percentage: percentage(total_pending, total_collected + total_pending, 1),
    }
}
