use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::{month_index, previous_month};
use crate::types::{Gender, Money, OrderRecord};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A (product type, gender, course) combination.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationKey {
    pub uniform_type: String,
    pub gender: Gender,
    pub course: String,
}

impl ConfigurationKey {
    /// Key for an order, if it carries all three parts.
    pub fn of(order: &OrderRecord) -> Option<Self> {
        Some(ConfigurationKey {
            uniform_type: order.product_type()?,
            gender: order.gender()?,
            course: order.course_code()?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationStats {
    #[serde(flatten)]
    pub key: ConfigurationKey,
    pub count: u32,
    pub revenue: Money,
    /// Orders per calendar month, January first, all years folded together.
    pub monthly_trend: [u32; 12],
}

impl ConfigurationStats {
    fn new(key: ConfigurationKey) -> Self {
        ConfigurationStats {
            key,
            count: 0,
            revenue: Decimal::ZERO,
            monthly_trend: [0; 12],
        }
    }

    /// Orders this month minus orders last month, as an absolute count.
    pub fn month_over_month(&self, current_month: usize) -> i64 {
        let current = self.monthly_trend[current_month % 12] as i64;
        let previous = self.monthly_trend[previous_month(current_month % 12)] as i64;
        current - previous
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingConfiguration {
    #[serde(flatten)]
    pub stats: ConfigurationStats,
    pub growth: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationRanking {
    pub popular_configs: Vec<ConfigurationStats>,
    pub trending_configs: Vec<TrendingConfiguration>,
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Rank configurations by total volume and by month-over-month delta.
///
/// `as_of` supplies the current calendar month; the previous month wraps
/// from January to December. Orders missing any key part are ignored.
/// Orders without a creation date still count towards volume and revenue
/// but not towards the monthly histogram. Ties keep key order.
pub fn rank_configurations(
    orders: &[OrderRecord],
    as_of: DateTime<Utc>,
    top: usize,
) -> ConfigurationRanking {
    let mut by_key: BTreeMap<ConfigurationKey, ConfigurationStats> = BTreeMap::new();

    for order in orders {
        let Some(key) = ConfigurationKey::of(order) else {
            continue;
        };
        let stats = by_key
            .entry(key.clone())
            .or_insert_with(|| ConfigurationStats::new(key));
        stats.count += 1;
        stats.revenue += order.paid();
        if let Some(created) = order.created_at {
            stats.monthly_trend[month_index(created.date_naive())] += 1;
        }
    }

    if by_key.is_empty() {
        return ConfigurationRanking::default();
    }

    let all: Vec<ConfigurationStats> = by_key.into_values().collect();
    let current_month = month_index(as_of.date_naive());

    let mut popular_configs = all.clone();
    popular_configs.sort_by(|a, b| b.count.cmp(&a.count));
    popular_configs.truncate(top);

    let mut trending_configs: Vec<TrendingConfiguration> = all
        .into_iter()
        .map(|stats| TrendingConfiguration {
            growth: stats.month_over_month(current_month),
            stats,
        })
        .collect();
    trending_configs.sort_by(|a, b| b.growth.cmp(&a.growth));
    trending_configs.truncate(top);

    ConfigurationRanking {
        popular_configs,
        trending_configs,
    }
}
