use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;
use crate::types::Rate;
use crate::AnalyticsResult;

/// Engine-wide knobs. Every field has a default so the collaborator can
/// omit the whole `settings` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Reference instant for trailing windows and the forecast horizon.
    /// Defaults to the current time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
    /// Number of days to forecast.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    /// Seed for weight initialisation, shuffling and the fallback model.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_top_configurations")]
    pub top_configurations: usize,
    #[serde(default = "default_top_opportunities")]
    pub top_opportunities: usize,
    /// Cap for each of the shortage / surplus lists.
    #[serde(default = "default_top_risks")]
    pub top_risks: usize,
    #[serde(default)]
    pub training: TrainingSettings,
    #[serde(default)]
    pub inventory: InventoryPolicy,
}

fn default_horizon_days() -> u32 {
    30
}

fn default_seed() -> u64 {
    42
}

fn default_top_configurations() -> usize {
    5
}

fn default_top_opportunities() -> usize {
    3
}

fn default_top_risks() -> usize {
    3
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            as_of: None,
            horizon_days: default_horizon_days(),
            seed: default_seed(),
            top_configurations: default_top_configurations(),
            top_opportunities: default_top_opportunities(),
            top_risks: default_top_risks(),
            training: TrainingSettings::default(),
            inventory: InventoryPolicy::default(),
        }
    }
}

impl EngineSettings {
    /// Resolve the reference instant, falling back to now.
    pub fn reference_time(&self) -> DateTime<Utc> {
        self.as_of.unwrap_or_else(Utc::now)
    }

    /// Pin the reference instant so every component sees the same "now".
    pub fn pinned(&self) -> EngineSettings {
        EngineSettings {
            as_of: Some(self.reference_time()),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.horizon_days == 0 || self.horizon_days > 366 {
            return Err(AnalyticsError::InvalidInput {
                field: "settings.horizon_days".into(),
                reason: "Must be between 1 and 366".into(),
            });
        }
        if self.top_configurations == 0 {
            return Err(AnalyticsError::InvalidInput {
                field: "settings.top_configurations".into(),
                reason: "Must be at least 1".into(),
            });
        }
        self.training.validate()?;
        self.inventory.validate()?;
        Ok(())
    }
}

/// Regressor training schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSettings {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_min_epochs")]
    pub min_epochs: usize,
    #[serde(default = "default_max_epochs")]
    pub max_epochs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Fraction of points held out for validation (only when enough data).
    #[serde(default = "default_validation_split")]
    pub validation_split: f64,
    /// Fewer daily aggregates than this and the fallback model is used.
    #[serde(default = "default_min_points")]
    pub min_points: usize,
}

fn default_learning_rate() -> f64 {
    0.01
}

fn default_min_epochs() -> usize {
    20
}

fn default_max_epochs() -> usize {
    100
}

fn default_batch_size() -> usize {
    32
}

fn default_validation_split() -> f64 {
    0.2
}

fn default_min_points() -> usize {
    3
}

impl Default for TrainingSettings {
    fn default() -> Self {
        TrainingSettings {
            learning_rate: default_learning_rate(),
            min_epochs: default_min_epochs(),
            max_epochs: default_max_epochs(),
            batch_size: default_batch_size(),
            validation_split: default_validation_split(),
            min_points: default_min_points(),
        }
    }
}

impl TrainingSettings {
    pub fn validate(&self) -> AnalyticsResult<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(AnalyticsError::InvalidInput {
                field: "settings.training.learning_rate".into(),
                reason: "Must be a positive finite number".into(),
            });
        }
        if self.min_epochs == 0 || self.min_epochs > self.max_epochs {
            return Err(AnalyticsError::InvalidInput {
                field: "settings.training.min_epochs".into(),
                reason: "Must be at least 1 and not exceed max_epochs".into(),
            });
        }
        if self.batch_size == 0 {
            return Err(AnalyticsError::InvalidInput {
                field: "settings.training.batch_size".into(),
                reason: "Must be at least 1".into(),
            });
        }
        if !(0.0..0.5).contains(&self.validation_split) {
            return Err(AnalyticsError::InvalidInput {
                field: "settings.training.validation_split".into(),
                reason: "Must be in [0, 0.5)".into(),
            });
        }
        if self.min_points < 2 {
            return Err(AnalyticsError::InvalidInput {
                field: "settings.training.min_points".into(),
                reason: "Must be at least 2".into(),
            });
        }
        Ok(())
    }

    /// Epoch budget for `points` training rows: five passes per point,
    /// clamped to `[min_epochs, max_epochs]`.
    pub fn epochs_for(&self, points: usize) -> usize {
        (points * 5).clamp(self.min_epochs, self.max_epochs)
    }
}

/// Restocking policy applied by the inventory forecaster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryPolicy {
    /// Trailing window used to measure the run-rate.
    #[serde(default = "default_window_months")]
    pub window_months: u32,
    /// Months of demand each recommendation should cover.
    #[serde(default = "default_coverage_months")]
    pub coverage_months: Decimal,
    #[serde(default = "default_safety_buffer")]
    pub safety_buffer: Decimal,
    /// Extra multiplier for product types that are growing.
    #[serde(default = "default_growth_uplift")]
    pub growth_uplift: Decimal,
    #[serde(default = "default_uplift_threshold")]
    pub uplift_threshold: Rate,
    #[serde(default = "default_shortage_threshold")]
    pub shortage_threshold: Rate,
    #[serde(default = "default_surplus_threshold")]
    pub surplus_threshold: Rate,
}

fn default_window_months() -> u32 {
    3
}

fn default_coverage_months() -> Decimal {
    dec!(2)
}

fn default_safety_buffer() -> Decimal {
    dec!(1.2)
}

fn default_growth_uplift() -> Decimal {
    dec!(1.3)
}

fn default_uplift_threshold() -> Rate {
    dec!(0.1)
}

fn default_shortage_threshold() -> Rate {
    dec!(0.2)
}

fn default_surplus_threshold() -> Rate {
    dec!(-0.1)
}

impl Default for InventoryPolicy {
    fn default() -> Self {
        InventoryPolicy {
            window_months: default_window_months(),
            coverage_months: default_coverage_months(),
            safety_buffer: default_safety_buffer(),
            growth_uplift: default_growth_uplift(),
            uplift_threshold: default_uplift_threshold(),
            shortage_threshold: default_shortage_threshold(),
            surplus_threshold: default_surplus_threshold(),
        }
    }
}

impl InventoryPolicy {
    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.window_months == 0 {
            return Err(AnalyticsError::InvalidInput {
                field: "settings.inventory.window_months".into(),
                reason: "Must be at least 1".into(),
            });
        }
        if self.coverage_months <= Decimal::ZERO {
            return Err(AnalyticsError::InvalidInput {
                field: "settings.inventory.coverage_months".into(),
                reason: "Must be positive".into(),
            });
        }
        if self.safety_buffer < Decimal::ONE || self.growth_uplift < Decimal::ONE {
            return Err(AnalyticsError::InvalidInput {
                field: "settings.inventory".into(),
                reason: "safety_buffer and growth_uplift must be >= 1".into(),
            });
        }
        if self.surplus_threshold >= Decimal::ZERO {
            return Err(AnalyticsError::InvalidInput {
                field: "settings.inventory.surplus_threshold".into(),
                reason: "Must be negative".into(),
            });
        }
        Ok(())
    }
}
