use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::{month_index, weekday_index};
use crate::types::{Gender, Money, OrderRecord};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Male / female split. Other genders are not counted here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderCounts {
    pub male: u32,
    pub female: u32,
}

impl GenderCounts {
    pub fn record(&mut self, gender: Option<Gender>) {
        match gender {
            Some(Gender::Male) => self.male += 1,
            Some(Gender::Female) => self.female += 1,
            _ => {}
        }
    }
}

/// One calendar day of rolled-up order activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAggregate {
    /// Serialises as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub count: u32,
    pub revenue: Money,
    pub uniform_types: BTreeMap<String, u32>,
    pub course_distribution: BTreeMap<String, u32>,
    pub gender_distribution: GenderCounts,
    /// Sunday = 0
    pub day: u32,
    pub day_of_month: u32,
    /// January = 0
    pub month: u32,
}

impl DailyAggregate {
    fn empty(date: NaiveDate) -> Self {
        DailyAggregate {
            date,
            count: 0,
            revenue: Decimal::ZERO,
            uniform_types: BTreeMap::new(),
            course_distribution: BTreeMap::new(),
            gender_distribution: GenderCounts::default(),
            day: weekday_index(date) as u32,
            day_of_month: date.day(),
            month: month_index(date) as u32,
        }
    }

    pub fn had_revenue(&self) -> bool {
        self.revenue > Decimal::ZERO
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Fold orders into one aggregate per calendar day (UTC), ascending by date.
///
/// Orders without a creation timestamp are skipped. The result does not
/// depend on the order of `orders`.
pub fn aggregate_daily(orders: &[OrderRecord]) -> Vec<DailyAggregate> {
    let mut by_date: BTreeMap<NaiveDate, DailyAggregate> = BTreeMap::new();

    for order in orders {
        let Some(created) = order.created_at else {
            continue;
        };
        let date = created.date_naive();
        let day = by_date
            .entry(date)
            .or_insert_with(|| DailyAggregate::empty(date));

        day.count += 1;
        day.revenue += order.paid();
        *day.uniform_types.entry(order.product_bucket()).or_insert(0) += 1;
        if let Some(course) = order.course_code() {
            *day.course_distribution.entry(course.to_string()).or_insert(0) += 1;
        }
        day.gender_distribution.record(order.gender());
    }

    tracing::debug!(days = by_date.len(), orders = orders.len(), "daily aggregation complete");
    by_date.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CourseRecord, StudentRecord};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn order(day: u32, hour: u32, paid: Option<Decimal>, kind: Option<&str>, gender: &str) -> OrderRecord {
        OrderRecord {
            created_at: Some(Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()),
            amount_paid: paid,
            uniform_type: kind.map(String::from),
            student: Some(StudentRecord {
                gender: Some(Gender::from(gender.to_string())),
                course: Some(CourseRecord {
                    course_code: Some("BSN".into()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_groups_by_calendar_day_sorted() {
        let orders = vec![
            order(5, 10, Some(dec!(100)), Some("Polo"), "male"),
            order(4, 9, Some(dec!(50)), Some("polo"), "female"),
            order(5, 15, Some(dec!(25)), None, "other"),
        ];
        let days = aggregate_daily(&orders);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(days[1].count, 2);
        assert_eq!(days[1].revenue, dec!(125));
        assert_eq!(days[1].uniform_types.get("polo"), Some(&1));
        assert_eq!(days[1].uniform_types.get("unknown"), Some(&1));
        assert_eq!(days[1].gender_distribution, GenderCounts { male: 1, female: 0 });
        assert_eq!(days[1].course_distribution.get("BSN"), Some(&2));
    }

    #[test]
    fn test_calendar_fields() {
        // 2024-03-04 was a Monday
        let days = aggregate_daily(&[order(4, 8, None, None, "male")]);
        assert_eq!(days[0].day, 1);
        assert_eq!(days[0].day_of_month, 4);
        assert_eq!(days[0].month, 2);
        assert_eq!(days[0].revenue, Decimal::ZERO);
        assert!(!days[0].had_revenue());
    }

    #[test]
    fn test_skips_undated_orders() {
        let mut undated = order(4, 8, Some(dec!(10)), None, "male");
        undated.created_at = None;
        let days = aggregate_daily(&[undated, order(6, 8, Some(dec!(10)), None, "male")]);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].count, 1);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = order(1, 8, Some(dec!(10)), Some("blouse"), "female");
        let b = order(2, 8, Some(dec!(20)), Some("pants"), "male");
        let c = order(1, 18, Some(dec!(30)), Some("pants"), "male");
        let forward = aggregate_daily(&[a.clone(), b.clone(), c.clone()]);
        let reversed = aggregate_daily(&[c, b, a]);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_daily(&[]).is_empty());
    }
}
