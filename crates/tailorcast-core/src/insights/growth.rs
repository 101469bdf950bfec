use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::{month_index, months_before, YearMonth, MONTH_NAMES};
use crate::config::EngineSettings;
use crate::insights::seasonal::SeasonalAnalysis;
use crate::types::{Money, OrderRecord, Rate};

/// Months in the half-window used for category growth.
const HALF_WINDOW_MONTHS: u32 = 3;
/// Months of history behind the revenue trend.
const TREND_WINDOW_MONTHS: u32 = 6;
/// Fewer recent orders than this and the trend is reported as neutral.
const MIN_TREND_ORDERS: usize = 3;
/// Average monthly growth beyond which the trend is no longer stable.
const TREND_BAND: Rate = dec!(0.05);
/// Growth assigned to a category that only appears in the recent half.
const NEW_CATEGORY_GROWTH: Rate = Decimal::ONE;
/// Label for the next peak when there is not enough recent data.
const UNKNOWN_PEAK: &str = "unknown";

/// Envelope warning when the quarter projection leaves the `Decimal` range.
pub const PROJECTION_OVERFLOW_WARNING: &str =
    "Revenue growth too steep to project; next quarter reported as stable";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Growing,
    Stable,
    Declining,
}

impl TrendDirection {
    pub fn from_rate(avg_growth: Rate) -> Self {
        if avg_growth > TREND_BAND {
            TrendDirection::Growing
        } else if avg_growth < -TREND_BAND {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        }
    }
}

/// Recent-versus-older growth of one course or product type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGrowth {
    pub category: String,
    /// `(recent - older) / older`, or 1.0 for a category new in the recent half
    pub growth: Rate,
    pub recent_count: u32,
    pub older_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterOutlook {
    /// Projected revenue minus the last observed month
    pub change: Money,
    pub trend: TrendDirection,
    /// Last month's revenue compounded three months ahead
    pub estimated: Money,
    pub average_growth_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonOutlook {
    pub peak: String,
    /// Historical revenue of the peak month
    pub estimate: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureTrends {
    pub next_quarter: QuarterOutlook,
    pub next_season: SeasonOutlook,
    pub growth_opportunities: Vec<String>,
    /// Revenue per `YYYY-MM` inside the trend window
    pub monthly_revenue: BTreeMap<String, Money>,
    pub course_growth: Vec<CategoryGrowth>,
    pub uniform_growth: Vec<CategoryGrowth>,
    /// The quarter projection left the `Decimal` range and `next_quarter`
    /// holds the neutral outlook instead
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub projection_overflowed: bool,
}

impl QuarterOutlook {
    pub fn neutral() -> Self {
        QuarterOutlook {
            change: Decimal::ZERO,
            trend: TrendDirection::Stable,
            estimated: Decimal::ZERO,
            average_growth_rate: Decimal::ZERO,
        }
    }
}

impl FutureTrends {
    /// Result for histories too thin to show a trend.
    pub fn neutral() -> Self {
        FutureTrends {
            next_quarter: QuarterOutlook::neutral(),
            next_season: SeasonOutlook {
                peak: UNKNOWN_PEAK.to_string(),
                estimate: Decimal::ZERO,
            },
            growth_opportunities: Vec::new(),
            monthly_revenue: BTreeMap::new(),
            course_growth: Vec::new(),
            uniform_growth: Vec::new(),
            projection_overflowed: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Category growth
// ---------------------------------------------------------------------------

fn created_within(order: &OrderRecord, from: DateTime<Utc>, until: DateTime<Utc>) -> bool {
    order
        .created_at
        .map(|ts| ts >= from && ts <= until)
        .unwrap_or(false)
}

/// Compare the last three months against the three before, per category.
///
/// Only categories seen in the recent half are reported; older-only
/// categories never surface. Sorted by growth descending, ties in key order.
pub fn category_growth<F>(orders: &[OrderRecord], as_of: DateTime<Utc>, category_of: F) -> Vec<CategoryGrowth>
where
    F: Fn(&OrderRecord) -> Option<String>,
{
    let recent_start = months_before(as_of, HALF_WINDOW_MONTHS);
    let older_start = months_before(as_of, HALF_WINDOW_MONTHS * 2);

    let mut recent: BTreeMap<String, u32> = BTreeMap::new();
    let mut older: BTreeMap<String, u32> = BTreeMap::new();

    for order in orders {
        let Some(created) = order.created_at else {
            continue;
        };
        if created > as_of || created < older_start {
            continue;
        }
        let Some(category) = category_of(order) else {
            continue;
        };
        let bucket = if created >= recent_start { &mut recent } else { &mut older };
        *bucket.entry(category).or_insert(0) += 1;
    }

    let mut growth: Vec<CategoryGrowth> = recent
        .into_iter()
        .map(|(category, recent_count)| {
            let older_count = older.get(&category).copied().unwrap_or(0);
            let growth = if older_count > 0 {
                (Decimal::from(recent_count) - Decimal::from(older_count)) / Decimal::from(older_count)
            } else {
                NEW_CATEGORY_GROWTH
            };
            CategoryGrowth {
                category,
                growth,
                recent_count,
                older_count,
            }
        })
        .collect();

    growth.sort_by(|a, b| b.growth.cmp(&a.growth));
    growth
}

pub fn course_growth(orders: &[OrderRecord], as_of: DateTime<Utc>) -> Vec<CategoryGrowth> {
    category_growth(orders, as_of, |o| o.course_code().map(str::to_string))
}

pub fn uniform_growth(orders: &[OrderRecord], as_of: DateTime<Utc>) -> Vec<CategoryGrowth> {
    category_growth(orders, as_of, |o| Some(o.product_bucket()))
}

// ---------------------------------------------------------------------------
// Trend projection
// ---------------------------------------------------------------------------

/// Mean of month-over-month growth rates, skipping months after a zero.
/// `None` when a rate or the running sum leaves the `Decimal` range.
fn average_growth(monthly: &BTreeMap<YearMonth, Money>) -> Option<Rate> {
    let revenues: Vec<Money> = monthly.values().copied().collect();
    let mut total = Decimal::ZERO;
    let mut count: u32 = 0;
    for pair in revenues.windows(2).filter(|pair| pair[0] > Decimal::ZERO) {
        let rate = pair[1].checked_sub(pair[0])?.checked_div(pair[0])?;
        total = total.checked_add(rate)?;
        count += 1;
    }
    if count == 0 {
        return Some(Decimal::ZERO);
    }
    total.checked_div(Decimal::from(count))
}

/// `last × (1 + avg)³`, or `None` on overflow.
fn compound_quarter(last: Money, avg: Rate) -> Option<Money> {
    let factor = Decimal::ONE.checked_add(avg)?;
    last.checked_mul(factor)?.checked_mul(factor)?.checked_mul(factor)
}

/// Highest-revenue month among the three after `as_of`'s month. When all
/// three are equal the first one wins.
fn next_peak(seasonal: &SeasonalAnalysis, as_of: DateTime<Utc>) -> SeasonOutlook {
    let current = month_index(as_of.date_naive());
    let mut best: Option<(usize, Money)> = None;
    for offset in 1..=3 {
        let month = (current + offset) % 12;
        let revenue = seasonal.month_revenue(month);
        if best.map_or(true, |(_, value)| revenue > value) {
            best = Some((month, revenue));
        }
    }
    let (month, estimate) = best.unwrap_or((0, Decimal::ZERO));
    SeasonOutlook {
        peak: MONTH_NAMES[month].to_string(),
        estimate,
    }
}

fn growth_opportunities(
    courses: &[CategoryGrowth],
    uniforms: &[CategoryGrowth],
    limit: usize,
) -> Vec<String> {
    let mut ranked: Vec<(Rate, String)> = courses
        .iter()
        .map(|c| {
            (
                c.growth,
                format!("{} course enrollment ({:.1}% growth)", c.category, c.growth * dec!(100)),
            )
        })
        .chain(uniforms.iter().map(|u| {
            (
                u.growth,
                format!("{} uniform orders ({:.1}% growth)", u.category, u.growth * dec!(100)),
            )
        }))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().take(limit).map(|(_, text)| text).collect()
}

/// Revenue trend over the trailing six months, compounded one quarter
/// ahead, plus the next likely peak month and the fastest-growing
/// categories.
///
/// `seasonal` must cover the full history; only its top-level
/// `monthly_trends` is read.
pub fn predict_future_trends(
    orders: &[OrderRecord],
    seasonal: &SeasonalAnalysis,
    settings: &EngineSettings,
) -> FutureTrends {
    let as_of = settings.reference_time();
    let window_start = months_before(as_of, TREND_WINDOW_MONTHS);

    let recent: Vec<OrderRecord> = orders
        .iter()
        .filter(|o| created_within(o, window_start, as_of))
        .cloned()
        .collect();
    if recent.len() < MIN_TREND_ORDERS {
        tracing::debug!(recent = recent.len(), "too few recent orders for a trend");
        return FutureTrends::neutral();
    }

    let mut monthly: BTreeMap<YearMonth, Money> = BTreeMap::new();
    for order in &recent {
        if let Some(created) = order.created_at {
            *monthly
                .entry(YearMonth::of(created.date_naive()))
                .or_insert(Decimal::ZERO) += order.paid();
        }
    }

    let last = monthly.values().last().copied().unwrap_or(Decimal::ZERO);
    let projection =
        average_growth(&monthly).and_then(|avg| compound_quarter(last, avg).map(|estimated| (avg, estimated)));
    let (next_quarter, projection_overflowed) = match projection {
        Some((avg, estimated)) => (
            QuarterOutlook {
                change: (estimated - last).round_dp(2),
                trend: TrendDirection::from_rate(avg),
                estimated: estimated.round_dp(2),
                average_growth_rate: avg.round_dp(6),
            },
            false,
        ),
        None => {
            tracing::warn!(last_month = %last, "quarter projection overflowed, using neutral outlook");
            (QuarterOutlook::neutral(), true)
        }
    };

    let course_growth = course_growth(&recent, as_of);
    let uniform_growth = uniform_growth(&recent, as_of);
    let growth_opportunities =
        growth_opportunities(&course_growth, &uniform_growth, settings.top_opportunities);

    FutureTrends {
        next_quarter,
        next_season: next_peak(seasonal, as_of),
        growth_opportunities,
        monthly_revenue: monthly
            .into_iter()
            .map(|(ym, revenue)| (ym.to_string(), revenue))
            .collect(),
        course_growth,
        uniform_growth,
        projection_overflowed,
    }
}
