use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::{month_index, SHORT_MONTH_NAMES};
use crate::dashboard::{percentage, UNKNOWN_LABEL};
use crate::insights::daily::GenderCounts;
use crate::types::{Money, OrderRecord, Rate, StudentRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePerformance {
    pub total_orders: u32,
    pub completed_orders: u32,
    pub total_revenue: Money,
    pub completion_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthCount {
    pub month: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAnalytics {
    pub total_students: usize,
    pub gender_distribution: BTreeMap<String, u32>,
    pub course_enrollment: BTreeMap<String, u32>,
    /// Enrollments per calendar month, January first
    pub enrollment_trend: Vec<MonthCount>,
    pub gender_by_course: BTreeMap<String, GenderCounts>,
    pub course_performance: BTreeMap<String, CoursePerformance>,
}

/// Orders, completions and collected revenue per course.
pub fn course_performance(orders: &[OrderRecord]) -> BTreeMap<String, CoursePerformance> {
    let mut by_course: BTreeMap<String, CoursePerformance> = BTreeMap::new();
    for order in orders {
        let Some(course) = order.course_code() else {
            continue;
        };
        let perf = by_course.entry(course.to_string()).or_default();
        perf.total_orders += 1;
        if order.is_completed() {
            perf.completed_orders += 1;
        }
        perf.total_revenue += order.paid();
    }
    for perf in by_course.values_mut() {
        perf.completion_rate = percentage(
            Decimal::from(perf.completed_orders),
            Decimal::from(perf.total_orders),
            2,
        );
    }
    by_course
}

pub fn enrollment_trend(students: &[StudentRecord]) -> Vec<MonthCount> {
    let mut months = [0u32; 12];
    for student in students {
        if let Some(created) = student.created_at {
            months[month_index(created.date_naive())] += 1;
        }
    }
    SHORT_MONTH_NAMES
        .iter()
        .zip(months)
        .map(|(name, count)| MonthCount {
            month: name.to_string(),
            count,
        })
        .collect()
}

/// Male / female split per course; students without a course are skipped.
pub fn gender_by_course(students: &[StudentRecord]) -> BTreeMap<String, GenderCounts> {
    let mut by_course: BTreeMap<String, GenderCounts> = BTreeMap::new();
    for student in students {
        if let Some(course) = student.course_code() {
            by_course
                .entry(course.to_string())
                .or_default()
                .record(student.gender);
        }
    }
    by_course
}

pub fn student_analytics(students: &[StudentRecord], orders: &[OrderRecord]) -> StudentAnalytics {
    let mut gender_distribution = BTreeMap::new();
    let mut course_enrollment = BTreeMap::new();
    for student in students {
        let gender = student
            .gender
            .map(|g| g.as_str())
            .unwrap_or(UNKNOWN_LABEL);
        *gender_distribution.entry(gender.to_string()).or_insert(0) += 1;
        if let Some(course) = student.course_code() {
            *course_enrollment.entry(course.to_string()).or_insert(0) += 1;
        }
    }

    StudentAnalytics {
        total_students: students.len(),
        gender_distribution,
        course_enrollment,
        enrollment_trend: enrollment_trend(students),
        gender_by_course: gender_by_course(students),
        course_performance: course_performance(orders),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CourseRecord, Gender};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn student(gender: &str, course: Option<&str>, month: u32) -> StudentRecord {
        StudentRecord {
            gender: Some(Gender::from(gender.to_string())),
            course: course.map(|c| CourseRecord {
                course_code: Some(c.to_string()),
                ..Default::default()
            }),
            created_at: Some(Utc.with_ymd_and_hms(2024, month, 3, 8, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_course_performance() {
        let orders = vec![
            OrderRecord {
                status: Some("completed".into()),
                amount_paid: Some(dec!(300)),
                student: Some(student("male", Some("BSIT"), 1)),
                ..Default::default()
            },
            OrderRecord {
                status: Some("pending".into()),
                amount_paid: None,
                student: Some(student("female", Some("BSIT"), 1)),
                ..Default::default()
            },
            OrderRecord::default(),
        ];
        let perf = course_performance(&orders);
        assert_eq!(perf.len(), 1);
        assert_eq!(perf["BSIT"].total_orders, 2);
        assert_eq!(perf["BSIT"].completed_orders, 1);
        assert_eq!(perf["BSIT"].total_revenue, dec!(300));
        assert_eq!(perf["BSIT"].completion_rate, dec!(50));
    }

    #[test]
    fn test_student_breakdowns() {
        let students = vec![
            student("male", Some("BSN"), 6),
            student("female", Some("BSN"), 6),
            student("female", None, 8),
            student("nonbinary", Some("BSHM"), 8),
        ];
        let analytics = student_analytics(&students, &[]);
        assert_eq!(analytics.total_students, 4);
        assert_eq!(analytics.gender_distribution["female"], 2);
        assert_eq!(analytics.gender_distribution["other"], 1);
        assert_eq!(analytics.course_enrollment["BSN"], 2);
        assert_eq!(analytics.gender_by_course["BSN"], GenderCounts { male: 1, female: 1 });
        assert_eq!(analytics.gender_by_course["BSHM"], GenderCounts::default());
        assert_eq!(analytics.enrollment_trend[5].count, 2);
        assert_eq!(analytics.enrollment_trend[7].month, "Aug");
    }

    #[test]
    fn test_empty_students() {
        let analytics = student_analytics(&[], &[]);
        assert_eq!(analytics.enrollment_trend.len(), 12);
        assert!(analytics.enrollment_trend.iter().all(|m| m.count == 0));
        assert!(analytics.gender_by_course.is_empty());
    }
}
