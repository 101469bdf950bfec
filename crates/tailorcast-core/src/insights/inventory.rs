use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::months_before;
use crate::config::{EngineSettings, InventoryPolicy};
use crate::insights::growth::{uniform_growth, CategoryGrowth};
use crate::types::{OrderRecord, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortageRisk {
    #[serde(rename = "type")]
    pub uniform_type: String,
    pub growth: Rate,
    /// Units already recommended for this type (0 if none)
    pub recommended: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurplusRisk {
    #[serde(rename = "type")]
    pub uniform_type: String,
    /// Magnitude of the decline, positive
    pub decline: Rate,
    pub caution: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryNeeds {
    /// Units to hold per product type
    pub recommended_stock: BTreeMap<String, u32>,
    pub potential_shortages: Vec<ShortageRisk>,
    pub surplus_risk: Vec<SurplusRisk>,
    /// Recent orders per `{course}-{type}`
    pub course_type_demand: BTreeMap<String, u32>,
}

impl InventoryNeeds {
    /// `"{type}: {qty} units"` lines, one per recommended type.
    pub fn recommendation_lines(&self) -> Vec<String> {
        self.recommended_stock
            .iter()
            .map(|(kind, qty)| format!("{kind}: {qty} units"))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

fn ceil_units(value: Decimal) -> u32 {
    value.ceil().to_u32().unwrap_or_default()
}

/// Buffered stock for `count` orders seen over the trailing window.
pub fn base_recommendation(count: u32, policy: &InventoryPolicy) -> u32 {
    // Multiply before dividing so whole-unit results stay exact.
    ceil_units(
        Decimal::from(count) * policy.coverage_months * policy.safety_buffer
            / Decimal::from(policy.window_months),
    )
}

/// Restocking recommendation per product type from the recent run-rate,
/// raised for growing types, with shortage and surplus flags.
///
/// Empty or stale history (no orders in the trailing window) yields an
/// empty result.
pub fn predict_inventory_needs(orders: &[OrderRecord], settings: &EngineSettings) -> InventoryNeeds {
    let policy = &settings.inventory;
    let as_of = settings.reference_time();
    let window_start = months_before(as_of, policy.window_months);

    let mut type_counts: BTreeMap<String, u32> = BTreeMap::new();
    let mut course_type_demand: BTreeMap<String, u32> = BTreeMap::new();

    for order in orders {
        let Some(created) = order.created_at else {
            continue;
        };
        if created < window_start || created > as_of {
            continue;
        }
        let kind = order.product_bucket();
        if let Some(course) = order.course_code() {
            *course_type_demand.entry(format!("{course}-{kind}")).or_insert(0) += 1;
        }
        *type_counts.entry(kind).or_insert(0) += 1;
    }

    if type_counts.is_empty() {
        return InventoryNeeds::default();
    }

    let mut recommended_stock: BTreeMap<String, u32> = type_counts
        .iter()
        .map(|(kind, &count)| (kind.clone(), base_recommendation(count, policy)))
        .collect();

    let growth: Vec<CategoryGrowth> = uniform_growth(orders, as_of);
    for g in growth.iter().filter(|g| g.growth > policy.uplift_threshold) {
        if let Some(qty) = recommended_stock.get_mut(&g.category) {
            if *qty > 0 {
                *qty = ceil_units(Decimal::from(*qty) * policy.growth_uplift);
            }
        }
    }

    let potential_shortages: Vec<ShortageRisk> = growth
        .iter()
        .filter(|g| g.growth > policy.shortage_threshold)
        .take(settings.top_risks)
        .map(|g| ShortageRisk {
            uniform_type: g.category.clone(),
            growth: g.growth,
            recommended: recommended_stock.get(&g.category).copied().unwrap_or(0),
        })
        .collect();

    let mut surplus_risk: Vec<SurplusRisk> = growth
        .iter()
        .filter(|g| g.growth < policy.surplus_threshold)
        .map(|g| SurplusRisk {
            uniform_type: g.category.clone(),
            decline: -g.growth,
            caution: recommended_stock.get(&g.category).copied().unwrap_or(0),
        })
        .collect();
    surplus_risk.sort_by(|a, b| b.decline.cmp(&a.decline));
    surplus_risk.truncate(settings.top_risks);

    tracing::debug!(
        types = recommended_stock.len(),
        shortages = potential_shortages.len(),
        surplus = surplus_risk.len(),
        "inventory forecast complete"
    );

    InventoryNeeds {
        recommended_stock,
        potential_shortages,
        surplus_risk,
        course_type_demand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CourseRecord, StudentRecord};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn order(m: u32, d: u32, kind: &str) -> OrderRecord {
        OrderRecord {
            created_at: Some(Utc.with_ymd_and_hms(2024, m, d, 10, 0, 0).unwrap()),
            uniform_type: Some(kind.to_string()),
            amount_paid: Some(dec!(50)),
            student: Some(StudentRecord {
                course: Some(CourseRecord {
                    course_code: Some("BSIT".into()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn settings() -> EngineSettings {
        EngineSettings {
            as_of: Some(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_base_recommendation_exact_ceiling() {
        let policy = InventoryPolicy::default();
        // 5 / 3 * 2 * 1.2 = 4 exactly
        assert_eq!(base_recommendation(5, &policy), 4);
        // 1 / 3 * 2 * 1.2 = 0.8
        assert_eq!(base_recommendation(1, &policy), 1);
        assert_eq!(base_recommendation(0, &policy), 0);
    }

    #[test]
    fn test_steady_type_gets_base_recommendation() {
        // Same count in both halves: growth 0, no uplift
        let mut orders = Vec::new();
        for d in 1..=5 {
            orders.push(order(2, d, "polo"));
            orders.push(order(5, d, "polo"));
        }
        let needs = predict_inventory_needs(&orders, &settings());
        assert_eq!(needs.recommended_stock["polo"], 4);
        assert!(needs.potential_shortages.is_empty());
        assert!(needs.surplus_risk.is_empty());
        assert_eq!(needs.course_type_demand["BSIT-polo"], 5);
        assert_eq!(needs.recommendation_lines(), vec!["polo: 4 units".to_string()]);
    }

    #[test]
    fn test_new_type_is_uplifted_and_flagged() {
        let orders: Vec<OrderRecord> = (1..=5).map(|d| order(5, d, "blazer")).collect();
        let needs = predict_inventory_needs(&orders, &settings());
        // ceil(4 * 1.3) = 6
        assert_eq!(needs.recommended_stock["blazer"], 6);
        assert_eq!(needs.potential_shortages.len(), 1);
        assert_eq!(needs.potential_shortages[0].growth, Decimal::ONE);
        assert_eq!(needs.potential_shortages[0].recommended, 6);
    }

    #[test]
    fn test_declining_type_is_surplus_risk() {
        let mut orders = Vec::new();
        for d in 1..=4 {
            orders.push(order(2, d, "pants"));
        }
        orders.push(order(5, 1, "pants"));
        let needs = predict_inventory_needs(&orders, &settings());
        assert_eq!(needs.surplus_risk.len(), 1);
        assert_eq!(needs.surplus_risk[0].decline, dec!(0.75));
        assert_eq!(needs.surplus_risk[0].caution, 1);
    }

    #[test]
    fn test_risk_lists_capped() {
        let mut orders = Vec::new();
        for kind in ["a", "b", "c", "d", "e"] {
            orders.push(order(5, 1, kind));
        }
        let needs = predict_inventory_needs(&orders, &settings());
        assert_eq!(needs.recommended_stock.len(), 5);
        assert_eq!(needs.potential_shortages.len(), 3);
    }

    #[test]
    fn test_no_recent_orders_is_empty() {
        let needs = predict_inventory_needs(&[order(1, 5, "polo")], &settings());
        assert_eq!(needs, InventoryNeeds::default());
        assert!(predict_inventory_needs(&[], &settings()).recommended_stock.is_empty());
    }
}
