use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use rand::distributions::Uniform as UniformRange;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::{month_index, weekday_index, SHORT_DAY_NAMES};
use crate::config::EngineSettings;
use crate::forecast::network::{fit, FitHistory, Network};
use crate::insights::daily::DailyAggregate;
use crate::types::Money;
use crate::AnalyticsResult;

pub const FEATURE_COUNT: usize = 4;
/// Added to every standard deviation before dividing.
const STD_EPSILON: f64 = 1e-8;
/// Daily aggregates needed before a second hidden layer and a validation
/// hold-out are used.
const DEEP_MODEL_POINTS: usize = 10;
const SECOND_LAYER_UNITS: usize = 5;
const MIN_FIRST_LAYER_UNITS: usize = 5;
const MAX_FIRST_LAYER_UNITS: usize = 10;
/// Fallback predictions are drawn from `[0, FALLBACK_CEILING)`.
const FALLBACK_CEILING: f64 = 100.0;

pub type FeatureRow = [f64; FEATURE_COUNT];

/// `[weekday (Sunday = 0), day of month, month (January = 0), had revenue]`.
pub fn day_features(date: NaiveDate, had_revenue: bool) -> FeatureRow {
    [
        weekday_index(date) as f64,
        date.day() as f64,
        month_index(date) as f64,
        if had_revenue { 1.0 } else { 0.0 },
    ]
}

// ---------------------------------------------------------------------------
// Normalisation
// ---------------------------------------------------------------------------

/// Per-feature z-score parameters plus the label's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Normalization {
    pub feature_mean: FeatureRow,
    pub feature_std: FeatureRow,
    pub label_mean: f64,
    pub label_std: f64,
}

fn mean_std(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = values.clone().count().max(1) as f64;
    let mean = values.clone().sum::<f64>() / n;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt() + STD_EPSILON)
}

impl Normalization {
    /// Mean 0, std 1: inputs and outputs pass through unchanged.
    pub fn identity() -> Self {
        Normalization {
            feature_mean: [0.0; FEATURE_COUNT],
            feature_std: [1.0; FEATURE_COUNT],
            label_mean: 0.0,
            label_std: 1.0,
        }
    }

    /// Population mean and standard deviation over every row.
    pub fn fit(features: &[FeatureRow], labels: &[f64]) -> Self {
        let mut feature_mean = [0.0; FEATURE_COUNT];
        let mut feature_std = [1.0; FEATURE_COUNT];
        for k in 0..FEATURE_COUNT {
            let (mean, std) = mean_std(features.iter().map(|row| row[k]));
            feature_mean[k] = mean;
            feature_std[k] = std;
        }
        let (label_mean, label_std) = mean_std(labels.iter().copied());
        Normalization {
            feature_mean,
            feature_std,
            label_mean,
            label_std,
        }
    }

    pub fn normalize(&self, row: &FeatureRow) -> Vec<f64> {
        row.iter()
            .zip(self.feature_mean.iter().zip(&self.feature_std))
            .map(|(x, (mean, std))| (x - mean) / std)
            .collect()
    }

    pub fn normalize_label(&self, y: f64) -> f64 {
        (y - self.label_mean) / self.label_std
    }

    pub fn denormalize_label(&self, y: f64) -> f64 {
        y * self.label_std + self.label_mean
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum SalesModel {
    Trained {
        network: Network,
        normalization: Normalization,
        history: FitHistory,
    },
    /// Seeded placeholder used when there is too little data or training
    /// failed. Its output does not depend on the input rows.
    Fallback {
        seed: u64,
        normalization: Normalization,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    /// "trained" or "fallback"
    pub kind: String,
    pub training_points: usize,
    pub layer_sizes: Vec<usize>,
    pub epochs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_validation_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl SalesModel {
    pub fn fallback(seed: u64, reason: impl Into<String>) -> Self {
        SalesModel::Fallback {
            seed,
            normalization: Normalization::identity(),
            reason: reason.into(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SalesModel::Fallback { .. })
    }

    pub fn normalization(&self) -> &Normalization {
        match self {
            SalesModel::Trained { normalization, .. } | SalesModel::Fallback { normalization, .. } => {
                normalization
            }
        }
    }

    /// Revenue estimate per row, never negative.
    pub fn predict(&self, rows: &[FeatureRow]) -> Vec<f64> {
        let raw: Vec<f64> = match self {
            SalesModel::Trained {
                network,
                normalization,
                ..
            } => rows
                .iter()
                .map(|row| network.predict(&normalization.normalize(row)))
                .collect(),
            SalesModel::Fallback { seed, .. } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                let range = UniformRange::new(0.0, FALLBACK_CEILING);
                rows.iter().map(|_| rng.sample(range)).collect()
            }
        };
        let normalization = self.normalization();
        raw.into_iter()
            .map(|y| {
                let value = normalization.denormalize_label(y);
                if value.is_finite() {
                    value.max(0.0)
                } else {
                    0.0
                }
            })
            .collect()
    }

    pub fn summary(&self, training_points: usize) -> ModelSummary {
        match self {
            SalesModel::Trained { network, history, .. } => ModelSummary {
                kind: "trained".into(),
                training_points,
                layer_sizes: network.layer_sizes(),
                epochs: history.epochs,
                final_loss: Some(history.final_loss),
                final_validation_loss: history.final_validation_loss,
                fallback_reason: None,
            },
            SalesModel::Fallback { reason, .. } => ModelSummary {
                kind: "fallback".into(),
                training_points,
                layer_sizes: Vec::new(),
                epochs: 0,
                final_loss: None,
                final_validation_loss: None,
                fallback_reason: Some(reason.clone()),
            },
        }
    }
}

fn hidden_layers(points: usize) -> Vec<usize> {
    let mut layers = vec![points.clamp(MIN_FIRST_LAYER_UNITS, MAX_FIRST_LAYER_UNITS)];
    if points >= DEEP_MODEL_POINTS {
        layers.push(SECOND_LAYER_UNITS);
    }
    layers
}

/// Fit the network on daily aggregates. Errors only on training failure.
pub fn train_sales_model(daily: &[DailyAggregate], settings: &EngineSettings) -> AnalyticsResult<SalesModel> {
    let training = &settings.training;
    let points = daily.len();

    let features: Vec<FeatureRow> = daily
        .iter()
        .map(|d| day_features(d.date, d.had_revenue()))
        .collect();
    let labels: Vec<f64> = daily
        .iter()
        .map(|d| d.revenue.to_f64().unwrap_or(0.0))
        .collect();

    let normalization = Normalization::fit(&features, &labels);
    let inputs: Vec<Vec<f64>> = features.iter().map(|row| normalization.normalize(row)).collect();
    let targets: Vec<f64> = labels.iter().map(|&y| normalization.normalize_label(y)).collect();

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut network = Network::new(FEATURE_COUNT, &hidden_layers(points), &mut rng)?;

    let validation_rows = if points >= DEEP_MODEL_POINTS {
        (points as f64 * training.validation_split).floor() as usize
    } else {
        0
    };
    let epochs = training.epochs_for(points);
    let history = fit(
        &mut network,
        &inputs,
        &targets,
        validation_rows,
        epochs,
        training,
        &mut rng,
    )?;

    tracing::debug!(
        points,
        epochs,
        loss = history.final_loss,
        layers = ?network.layer_sizes(),
        "sales model trained"
    );

    Ok(SalesModel::Trained {
        network,
        normalization,
        history,
    })
}

/// Trained model when there is enough history, otherwise the fallback.
/// Training failures are logged and downgraded to the fallback.
pub fn build_sales_model(daily: &[DailyAggregate], settings: &EngineSettings) -> SalesModel {
    let min_points = settings.training.min_points;
    if daily.len() < min_points {
        tracing::warn!(points = daily.len(), min_points, "too little history, using fallback model");
        return SalesModel::fallback(
            settings.seed,
            format!("{} daily aggregates available, {min_points} required", daily.len()),
        );
    }
    match train_sales_model(daily, settings) {
        Ok(model) => model,
        Err(e) => {
            tracing::warn!(error = %e, "training failed, using fallback model");
            SalesModel::fallback(settings.seed, e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Horizon
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPrediction {
    /// `YYYY-MM-DD`
    pub date: NaiveDate,
    pub predicted: Money,
    /// Short weekday name, e.g. `Mon`
    pub day: String,
}

/// One prediction per day starting the day after `as_of`.
///
/// Only the first day carries the had-revenue indicator, taken from the
/// most recent daily aggregate.
pub fn forecast_horizon(
    model: &SalesModel,
    daily: &[DailyAggregate],
    as_of: DateTime<Utc>,
    horizon_days: u32,
) -> Vec<DailyPrediction> {
    let last_had_revenue = daily.last().map(DailyAggregate::had_revenue).unwrap_or(false);
    let start = as_of.date_naive();

    let dates: Vec<NaiveDate> = (1..=u64::from(horizon_days))
        .filter_map(|offset| start.checked_add_days(Days::new(offset)))
        .collect();
    let rows: Vec<FeatureRow> = dates
        .iter()
        .enumerate()
        .map(|(i, &date)| day_features(date, i == 0 && last_had_revenue))
        .collect();

    model
        .predict(&rows)
        .into_iter()
        .zip(dates)
        .map(|(value, date)| DailyPrediction {
            date,
            predicted: Decimal::from_f64(value)
                .unwrap_or(Decimal::ZERO)
                .round_dp(2)
                .max(Decimal::ZERO),
            day: SHORT_DAY_NAMES[weekday_index(date)].to_string(),
        })
        .collect()
}
