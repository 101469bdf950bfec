use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::insights::daily::GenderCounts;
use crate::insights::seasonal::NOT_AVAILABLE;
use crate::types::{Money, OrderRecord, Rate};

/// Decimal places kept on demand percentages.
const PERCENTAGE_DP: u32 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderBreakdown {
    pub male: u32,
    pub female: u32,
    pub male_percentage: Rate,
    pub female_percentage: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandInsights {
    pub most_popular_uniform: String,
    pub most_popular_course: String,
    /// "male", "female", "equal", or "N/A" for empty input
    pub dominant_gender: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandAnalysis {
    pub total_orders: u32,
    pub uniform_type_count: BTreeMap<String, u32>,
    pub uniform_type_revenue: BTreeMap<String, Money>,
    /// Share of `total_orders`, 0–100
    pub uniform_type_percentage: BTreeMap<String, Rate>,
    pub course_distribution: BTreeMap<String, u32>,
    pub gender_distribution: GenderBreakdown,
    pub insights: DemandInsights,
}

fn percentage_of(count: u32, total: u32) -> Rate {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(count) / Decimal::from(total) * dec!(100)).round_dp(PERCENTAGE_DP)
}

/// Key with the strictly highest count, scanning in key order; `N/A` when
/// nothing has a positive count.
fn most_popular(counts: &BTreeMap<String, u32>) -> String {
    counts
        .iter()
        .fold((NOT_AVAILABLE, 0u32), |best, (key, &count)| {
            if count > best.1 {
                (key.as_str(), count)
            } else {
                best
            }
        })
        .0
        .to_string()
}

fn dominant_gender(genders: &GenderCounts) -> &'static str {
    if genders.male > genders.female {
        "male"
    } else if genders.female > genders.male {
        "female"
    } else {
        "equal"
    }
}

/// Product-type, course and gender distributions over every order.
///
/// All orders count towards the total, dated or not. Percentages divide by
/// that same total.
pub fn analyze_customer_demand(orders: &[OrderRecord]) -> DemandAnalysis {
    let mut uniform_type_count: BTreeMap<String, u32> = BTreeMap::new();
    let mut uniform_type_revenue: BTreeMap<String, Money> = BTreeMap::new();
    let mut course_distribution: BTreeMap<String, u32> = BTreeMap::new();
    let mut genders = GenderCounts::default();
    let mut total_orders: u32 = 0;

    for order in orders {
        total_orders += 1;
        let kind = order.product_bucket();
        *uniform_type_revenue.entry(kind.clone()).or_insert(Decimal::ZERO) += order.paid();
        *uniform_type_count.entry(kind).or_insert(0) += 1;

        if let Some(course) = order.course_code() {
            *course_distribution.entry(course.to_string()).or_insert(0) += 1;
        }
        genders.record(order.gender());
    }

    let uniform_type_percentage = uniform_type_count
        .iter()
        .map(|(kind, &count)| (kind.clone(), percentage_of(count, total_orders)))
        .collect();

    let insights = if total_orders == 0 {
        DemandInsights {
            most_popular_uniform: NOT_AVAILABLE.to_string(),
            most_popular_course: NOT_AVAILABLE.to_string(),
            dominant_gender: NOT_AVAILABLE.to_string(),
        }
    } else {
        DemandInsights {
            most_popular_uniform: most_popular(&uniform_type_count),
            most_popular_course: most_popular(&course_distribution),
            dominant_gender: dominant_gender(&genders).to_string(),
        }
    };

    DemandAnalysis {
        total_orders,
        uniform_type_count,
        uniform_type_revenue,
        uniform_type_percentage,
        course_distribution,
        gender_distribution: GenderBreakdown {
            male: genders.male,
            female: genders.female,
            male_percentage: percentage_of(genders.male, total_orders),
            female_percentage: percentage_of(genders.female, total_orders),
        },
        insights,
    }
}
