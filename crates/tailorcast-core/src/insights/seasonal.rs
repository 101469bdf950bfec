use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::{month_index, quarter_index, weekday_index, DAY_NAMES, MONTH_NAMES, QUARTER_NAMES};
use crate::types::{Money, OrderRecord};

/// Label used when no period has positive revenue.
pub const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Count / revenue / average for one calendar bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRow {
    pub name: String,
    pub count: u32,
    pub revenue: Money,
    /// revenue / count, 0 when the bucket is empty
    pub average: Money,
}

/// Winning bucket of a max-revenue reduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPerformer {
    pub name: String,
    pub value: Money,
}

impl BestPerformer {
    pub fn not_available() -> Self {
        BestPerformer {
            name: NOT_AVAILABLE.to_string(),
            value: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalInsights {
    pub best_day: BestPerformer,
    pub best_month: BestPerformer,
    pub best_quarter: BestPerformer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalAnalysis {
    /// Sunday..Saturday
    pub daily_trends: Vec<TrendRow>,
    /// January..December
    pub monthly_trends: Vec<TrendRow>,
    /// Q1..Q4
    pub quarterly_trends: Vec<TrendRow>,
    pub insights: SeasonalInsights,
}

impl SeasonalAnalysis {
    /// Revenue recorded for a zero-based month index across all years.
    pub fn month_revenue(&self, month: usize) -> Money {
        self.monthly_trends
            .get(month)
            .map(|row| row.revenue)
            .unwrap_or(Decimal::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
struct Bucket {
    count: u32,
    revenue: Money,
}

const EMPTY_BUCKET: Bucket = Bucket {
    count: 0,
    revenue: Decimal::ZERO,
};

fn to_rows(names: &[&str], buckets: &[Bucket]) -> Vec<TrendRow> {
    names
        .iter()
        .zip(buckets)
        .map(|(name, b)| TrendRow {
            name: (*name).to_string(),
            count: b.count,
            revenue: b.revenue,
            average: if b.count > 0 {
                (b.revenue / Decimal::from(b.count)).round_dp(2)
            } else {
                Decimal::ZERO
            },
        })
        .collect()
}

/// Left-to-right reduction keeping the first strictly-greater revenue.
pub fn best_by_revenue(rows: &[TrendRow]) -> BestPerformer {
    rows.iter()
        .fold(BestPerformer::not_available(), |best, row| {
            if row.revenue > best.value {
                BestPerformer {
                    name: row.name.clone(),
                    value: row.revenue,
                }
            } else {
                best
            }
        })
}

/// Day-of-week, month and quarter statistics over raw orders.
///
/// Calendar fields are derived per order (UTC) rather than from daily
/// aggregates. Orders without a creation timestamp are ignored. Empty input
/// yields all-zero tables and `N/A` best performers.
pub fn analyze_seasonal_patterns(orders: &[OrderRecord]) -> SeasonalAnalysis {
    let mut days = [EMPTY_BUCKET; 7];
    let mut months = [EMPTY_BUCKET; 12];
    let mut quarters = [EMPTY_BUCKET; 4];

    for order in orders {
        let Some(created) = order.created_at else {
            continue;
        };
        let date = created.date_naive();
        let revenue = order.paid();

        for bucket in [
            &mut days[weekday_index(date)],
            &mut months[month_index(date)],
            &mut quarters[quarter_index(date)],
        ] {
            bucket.count += 1;
            bucket.revenue += revenue;
        }
    }

    let daily_trends = to_rows(&DAY_NAMES, &days);
    let monthly_trends = to_rows(&MONTH_NAMES, &months);
    let quarterly_trends = to_rows(&QUARTER_NAMES, &quarters);

    let insights = SeasonalInsights {
        best_day: best_by_revenue(&daily_trends),
        best_month: best_by_revenue(&monthly_trends),
        best_quarter: best_by_revenue(&quarterly_trends),
    };

    SeasonalAnalysis {
        daily_trends,
        monthly_trends,
        quarterly_trends,
        insights,
    }
}
