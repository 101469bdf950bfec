use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::lenient_timestamp;
use crate::config::EngineSettings;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Percentages are named `*_percentage`.
pub type Rate = Decimal;

/// Bucket label used when an order carries no product type.
pub const UNKNOWN_PRODUCT_TYPE: &str = "unknown";

/// Row identity as handed over by the collaborator (serial or UUID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Serial(i64),
    Text(String),
}

/// Student gender as recorded at enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl From<String> for Gender {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Other,
        }
    }
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default, alias = "courses")]
    pub course: Option<CourseRecord>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl StudentRecord {
    /// Course code, if the student is linked to a course with a non-blank code.
    pub fn course_code(&self) -> Option<&str> {
        self.course
            .as_ref()
            .and_then(|c| c.course_code.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Staff member an order is assigned to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeRef {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl EmployeeRef {
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        format!("{first} {last}").trim().to_string()
    }
}

/// A single uniform order. Never mutated by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub uniform_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub amount_paid: Option<Money>,
    #[serde(default)]
    pub total_amount: Option<Money>,
    #[serde(default)]
    pub balance: Option<Money>,
    #[serde(default, alias = "students")]
    pub student: Option<StudentRecord>,
    #[serde(default, alias = "profiles")]
    pub employee: Option<EmployeeRef>,
}

impl OrderRecord {
    /// Amount actually collected; missing or negative amounts count as zero.
    pub fn paid(&self) -> Money {
        self.amount_paid
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO)
    }

    /// Quoted order value; missing counts as zero.
    pub fn total(&self) -> Money {
        self.total_amount.unwrap_or(Decimal::ZERO)
    }

    /// Outstanding balance; missing counts as zero.
    pub fn outstanding(&self) -> Money {
        self.balance.unwrap_or(Decimal::ZERO)
    }

    /// Product type, lowercased and trimmed, if present.
    pub fn product_type(&self) -> Option<String> {
        self.uniform_type
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
    }

    /// Product type bucket; absent types fall under [`UNKNOWN_PRODUCT_TYPE`].
    pub fn product_bucket(&self) -> String {
        self.product_type()
            .unwrap_or_else(|| UNKNOWN_PRODUCT_TYPE.to_string())
    }

    pub fn gender(&self) -> Option<Gender> {
        self.student.as_ref().and_then(|s| s.gender)
    }

    pub fn course_code(&self) -> Option<&str> {
        self.student.as_ref().and_then(|s| s.course_code())
    }

    /// Lowercased order status, if present.
    pub fn status_label(&self) -> Option<String> {
        self.status
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    pub fn is_completed(&self) -> bool {
        self.status_label().as_deref() == Some("completed")
    }
}

/// The document every entry point consumes: raw collaborator rows plus
/// optional engine settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsInput {
    #[serde(default)]
    pub orders: Vec<OrderRecord>,
    #[serde(default)]
    pub students: Vec<StudentRecord>,
    #[serde(default)]
    pub settings: EngineSettings,
}

impl AnalyticsInput {
    pub fn from_orders(orders: Vec<OrderRecord>) -> Self {
        AnalyticsInput {
            orders,
            ..Default::default()
        }
    }

    /// Number of orders whose creation timestamp could not be read.
    pub fn undated_orders(&self) -> usize {
        self.orders.iter().filter(|o| o.created_at.is_none()).count()
    }

    /// Warnings about input quality shared by every entry point.
    pub fn input_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let undated = self.undated_orders();
        if undated > 0 {
            tracing::warn!(undated, "orders without a parseable created_at were skipped");
            warnings.push(format!(
                "{undated} of {} orders skipped: missing or unparseable created_at",
                self.orders.len()
            ));
        }
        warnings
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
