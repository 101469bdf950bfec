use chrono::{DateTime, Datelike, Days, NaiveDate, Timelike, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::{days_between, iso_week_key, weekday_index, YearMonth, SHORT_DAY_NAMES};
use crate::dashboard::completion_time;
use crate::types::{Money, OrderRecord};

const DAY_SERIES: u64 = 30;
const WEEK_SERIES: u64 = 12;
const MONTH_SERIES: u32 = 12;
const YEAR_SERIES: i32 = 5;
/// Orders due within this many days of creation count as rush orders.
const RUSH_WINDOW_DAYS: Decimal = dec!(3);
const UPCOMING_WINDOW_DAYS: u64 = 7;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingTimes {
    /// Days, 1 dp
    pub average: Decimal,
    pub fastest: Decimal,
    pub slowest: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCount {
    pub day: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    pub period: String,
    /// Collected amount keyed by order date
    pub order_revenue: Money,
    /// Collected amount keyed by payment date
    pub payment_revenue: Money,
}

/// Rolling revenue series ending at the reference date, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueOverTime {
    pub day: Vec<RevenuePoint>,
    pub week: Vec<RevenuePoint>,
    pub month: Vec<RevenuePoint>,
    pub year: Vec<RevenuePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeMetrics {
    pub overdue_orders: u32,
    pub upcoming_due: u32,
    pub rush_orders: u32,
    pub busy_days: Vec<DayCount>,
    pub processing_times: ProcessingTimes,
    pub seasonal_trends: BTreeMap<String, u32>,
    pub peak_order_times: BTreeMap<String, u32>,
    pub revenue_over_time: RevenueOverTime,
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// Meteorological season for a zero-based month index.
pub fn season(month: usize) -> &'static str {
    match month {
        2..=4 => "Spring",
        5..=7 => "Summer",
        8..=10 => "Fall",
        _ => "Winter",
    }
}

pub fn time_slot(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Morning",
        12..=16 => "Afternoon",
        17..=20 => "Evening",
        _ => "Night",
    }
}

fn zeroed(keys: &[&str]) -> BTreeMap<String, u32> {
    keys.iter().map(|k| (k.to_string(), 0)).collect()
}

pub fn seasonal_trends(orders: &[OrderRecord]) -> BTreeMap<String, u32> {
    let mut counts = zeroed(&["Spring", "Summer", "Fall", "Winter"]);
    for created in orders.iter().filter_map(|o| o.created_at) {
        *counts
            .entry(season(created.month0() as usize).to_string())
            .or_insert(0) += 1;
    }
    counts
}

/// Order counts by time of day (UTC hour).
pub fn peak_order_times(orders: &[OrderRecord]) -> BTreeMap<String, u32> {
    let mut counts = zeroed(&["Morning", "Afternoon", "Evening", "Night"]);
    for created in orders.iter().filter_map(|o| o.created_at) {
        *counts.entry(time_slot(created.hour()).to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn busy_days(orders: &[OrderRecord]) -> Vec<DayCount> {
    let mut counts = [0u32; 7];
    for created in orders.iter().filter_map(|o| o.created_at) {
        counts[weekday_index(created.date_naive())] += 1;
    }
    SHORT_DAY_NAMES
        .iter()
        .zip(counts)
        .map(|(day, count)| DayCount {
            day: day.to_string(),
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Durations and deadlines
// ---------------------------------------------------------------------------

/// Days from creation to completion for completed orders.
pub fn processing_times(orders: &[OrderRecord]) -> ProcessingTimes {
    let durations: Vec<Decimal> = orders
        .iter()
        .filter(|o| o.is_completed())
        .filter_map(|o| Some(days_between(o.created_at?, completion_time(o)?)))
        .collect();
    if durations.is_empty() {
        return ProcessingTimes::default();
    }
    let total: Decimal = durations.iter().copied().sum();
    ProcessingTimes {
        average: (total / Decimal::from(durations.len())).round_dp(1),
        fastest: durations.iter().copied().min().unwrap_or_default().round_dp(1),
        slowest: durations.iter().copied().max().unwrap_or_default().round_dp(1),
    }
}

/// Open orders whose due date is before the start of `as_of`'s day.
pub fn overdue_orders(orders: &[OrderRecord], as_of: DateTime<Utc>) -> u32 {
    let today = as_of.date_naive();
    orders
        .iter()
        .filter(|o| !o.is_completed())
        .filter(|o| o.due_date.map_or(false, |due| due.date_naive() < today))
        .count() as u32
}

/// Open orders due between today and seven days from now, inclusive.
pub fn upcoming_due(orders: &[OrderRecord], as_of: DateTime<Utc>) -> u32 {
    let today = as_of.date_naive();
    let horizon = today
        .checked_add_days(Days::new(UPCOMING_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MAX);
    orders
        .iter()
        .filter(|o| !o.is_completed())
        .filter(|o| {
            o.due_date
                .map_or(false, |due| (today..=horizon).contains(&due.date_naive()))
        })
        .count() as u32
}

/// Orders due no more than three days after they were placed.
pub fn rush_orders(orders: &[OrderRecord]) -> u32 {
    orders
        .iter()
        .filter(|o| match (o.created_at, o.due_date) {
            (Some(created), Some(due)) => days_between(created, due) <= RUSH_WINDOW_DAYS,
            _ => false,
        })
        .count() as u32
}

// ---------------------------------------------------------------------------
// Revenue series
// ---------------------------------------------------------------------------

struct Series {
    points: Vec<RevenuePoint>,
    index: BTreeMap<String, usize>,
}

impl Series {
    fn new(periods: Vec<String>) -> Self {
        let index = periods
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();
        let points = periods
            .into_iter()
            .map(|period| RevenuePoint {
                period,
                order_revenue: Decimal::ZERO,
                payment_revenue: Decimal::ZERO,
            })
            .collect();
        Series { points, index }
    }

    fn add_order(&mut self, period: &str, amount: Money) {
        if let Some(&i) = self.index.get(period) {
            self.points[i].order_revenue += amount;
        }
    }

    fn add_payment(&mut self, period: &str, amount: Money) {
        if let Some(&i) = self.index.get(period) {
            self.points[i].payment_revenue += amount;
        }
    }
}

fn period_keys(date: NaiveDate) -> [String; 4] {
    [
        date.to_string(),
        iso_week_key(date),
        YearMonth::of(date).to_string(),
        date.year().to_string(),
    ]
}

/// Last 30 days, 12 ISO weeks, 12 months and 5 years up to `as_of`.
/// Amounts outside every window are dropped.
pub fn revenue_over_time(orders: &[OrderRecord], as_of: DateTime<Utc>) -> RevenueOverTime {
    let today = as_of.date_naive();
    let days_back = |n: u64| today.checked_sub_days(Days::new(n)).unwrap_or(NaiveDate::MIN);

    let mut series = [
        Series::new((0..DAY_SERIES).rev().map(|i| days_back(i).to_string()).collect()),
        Series::new((0..WEEK_SERIES).rev().map(|i| iso_week_key(days_back(i * 7))).collect()),
        Series::new(
            (0..MONTH_SERIES)
                .rev()
                .map(|i| YearMonth::of(today).minus(i).to_string())
                .collect(),
        ),
        Series::new(
            (0..YEAR_SERIES)
                .rev()
                .map(|i| (today.year() - i).to_string())
                .collect(),
        ),
    ];

    for order in orders {
        let amount = order.paid();
        if let Some(created) = order.created_at {
            for (s, key) in series.iter_mut().zip(period_keys(created.date_naive())) {
                s.add_order(&key, amount);
            }
        }
        if amount > Decimal::ZERO {
            if let Some(paid_on) = order.payment_date {
                for (s, key) in series.iter_mut().zip(period_keys(paid_on.date_naive())) {
                    s.add_payment(&key, amount);
                }
            }
        }
    }

    let [day, week, month, year] = series.map(|s| s.points);
    RevenueOverTime {
        day,
        week,
        month,
        year,
    }
}

pub fn time_metrics(orders: &[OrderRecord], as_of: DateTime<Utc>) -> TimeMetrics {
    TimeMetrics {
        overdue_orders: overdue_orders(orders, as_of),
        upcoming_due: upcoming_due(orders, as_of),
        rush_orders: rush_orders(orders),
        busy_days: busy_days(orders),
        processing_times: processing_times(orders),
        seasonal_trends: seasonal_trends(orders),
        peak_order_times: peak_order_times(orders),
        revenue_over_time: revenue_over_time(orders, as_of),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(m: u32, d: u32, h: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, m, d, h, 0, 0).unwrap())
    }

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_season_and_slot_boundaries() {
        assert_eq!(season(1), "Winter");
        assert_eq!(season(2), "Spring");
        assert_eq!(season(7), "Summer");
        assert_eq!(season(10), "Fall");
        assert_eq!(season(11), "Winter");
        assert_eq!(time_slot(4), "Night");
        assert_eq!(time_slot(5), "Morning");
        assert_eq!(time_slot(12), "Afternoon");
        assert_eq!(time_slot(20), "Evening");
        assert_eq!(time_slot(21), "Night");
    }

    #[test]
    fn test_deadline_counts() {
        let orders = vec![
            OrderRecord {
                status: Some("pending".into()),
                created_at: at(6, 1, 9),
                due_date: at(6, 10, 0),
                ..Default::default()
            },
            OrderRecord {
                status: Some("in progress".into()),
                created_at: at(6, 14, 9),
                due_date: at(6, 16, 0),
                ..Default::default()
            },
            OrderRecord {
                status: Some("completed".into()),
                created_at: at(6, 1, 9),
                due_date: at(6, 2, 0),
                ..Default::default()
            },
        ];
        assert_eq!(overdue_orders(&orders, as_of()), 1);
        assert_eq!(upcoming_due(&orders, as_of()), 1);
        assert_eq!(rush_orders(&orders), 2);
    }

    #[test]
    fn test_processing_times() {
        let orders = vec![
            OrderRecord {
                status: Some("completed".into()),
                created_at: at(6, 1, 0),
                completed_at: at(6, 3, 0),
                ..Default::default()
            },
            OrderRecord {
                status: Some("completed".into()),
                created_at: at(6, 1, 0),
                completed_at: at(6, 7, 0),
                ..Default::default()
            },
        ];
        let times = processing_times(&orders);
        assert_eq!(times.average, dec!(4));
        assert_eq!(times.fastest, dec!(2));
        assert_eq!(times.slowest, dec!(6));
        assert_eq!(processing_times(&[]), ProcessingTimes::default());
    }

    #[test]
    fn test_revenue_over_time_windows() {
        let orders = vec![
            OrderRecord {
                created_at: at(6, 10, 9),
                payment_date: at(6, 12, 9),
                amount_paid: Some(dec!(250)),
                ..Default::default()
            },
            OrderRecord {
                created_at: Some(Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()),
                amount_paid: Some(dec!(999)),
                ..Default::default()
            },
        ];
        let series = revenue_over_time(&orders, as_of());
        assert_eq!(series.day.len(), 30);
        assert_eq!(series.week.len(), 12);
        assert_eq!(series.month.len(), 12);
        assert_eq!(series.year.len(), 5);
        assert_eq!(series.day.last().unwrap().period, "2024-06-15");
        assert_eq!(series.month.last().unwrap().period, "2024-06");
        assert_eq!(series.year[0].period, "2020");

        let created_day = series.day.iter().find(|p| p.period == "2024-06-10").unwrap();
        assert_eq!(created_day.order_revenue, dec!(250));
        assert_eq!(created_day.payment_revenue, Decimal::ZERO);
        let paid_day = series.day.iter().find(|p| p.period == "2024-06-12").unwrap();
        assert_eq!(paid_day.payment_revenue, dec!(250));

        let june = series.month.last().unwrap();
        assert_eq!(june.order_revenue, dec!(250));
        let total: Decimal = series.year.iter().map(|p| p.order_revenue).sum();
        assert_eq!(total, dec!(250));
    }

    #[test]
    fn test_buckets_zeroed_for_empty_input() {
        let metrics = time_metrics(&[], as_of());
        assert_eq!(metrics.seasonal_trends.len(), 4);
        assert_eq!(metrics.peak_order_times["Night"], 0);
        assert_eq!(metrics.busy_days.len(), 7);
        assert_eq!(metrics.overdue_orders, 0);
        assert!(metrics.revenue_over_time.day.iter().all(|p| p.order_revenue.is_zero()));
    }
}
