//! A small fully-connected regression network trained with Adam.
//!
//! Layers are stored row-major (`weights[out][in]`). Hidden layers use ReLU,
//! the output layer is a single linear unit. Everything is `f64` and runs on
//! one thread; the sizes involved are tiny.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Normal, Uniform};

use crate::config::TrainingSettings;
use crate::error::AnalyticsError;
use crate::AnalyticsResult;

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-7;

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Linear,
}

impl Activation {
    fn apply(self, z: f64) -> f64 {
        match self {
            Activation::Relu => z.max(0.0),
            Activation::Linear => z,
        }
    }

    fn derivative(self, z: f64) -> f64 {
        match self {
            Activation::Relu => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Linear => 1.0,
        }
    }
}

/// Weight initialisation scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Init {
    /// N(0, sqrt(2 / fan_in))
    HeNormal,
    /// U(-l, l) with l = sqrt(6 / (fan_in + fan_out))
    GlorotUniform,
}

#[derive(Debug, Clone, Default)]
struct Moments {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

impl Moments {
    fn zeros(inputs: usize, units: usize) -> Self {
        Moments {
            weights: vec![vec![0.0; inputs]; units],
            bias: vec![0.0; units],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dense {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    activation: Activation,
    first_moment: Moments,
    second_moment: Moments,
}

impl Dense {
    pub fn new(
        inputs: usize,
        units: usize,
        activation: Activation,
        init: Init,
        rng: &mut StdRng,
    ) -> AnalyticsResult<Self> {
        let weights = match init {
            Init::HeNormal => {
                let dist = Normal::new(0.0, (2.0 / inputs as f64).sqrt()).map_err(|e| {
                    AnalyticsError::TrainingFailure(format!("Invalid He-normal parameters: {e}"))
                })?;
                (0..units)
                    .map(|_| (0..inputs).map(|_| rng.sample(dist)).collect())
                    .collect()
            }
            Init::GlorotUniform => {
                let limit = (6.0 / (inputs + units) as f64).sqrt();
                let dist = Uniform::new(-limit, limit).map_err(|e| {
                    AnalyticsError::TrainingFailure(format!("Invalid Glorot parameters: {e}"))
                })?;
                (0..units)
                    .map(|_| (0..inputs).map(|_| rng.sample(dist)).collect())
                    .collect()
            }
        };
        Ok(Dense {
            weights,
            bias: vec![0.0; units],
            activation,
            first_moment: Moments::zeros(inputs, units),
            second_moment: Moments::zeros(inputs, units),
        })
    }

    pub fn units(&self) -> usize {
        self.bias.len()
    }

    /// Pre-activations `W·x + b`.
    fn linear(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// Adam hyper-parameters; betas and epsilon are fixed.
#[derive(Debug, Clone, Copy)]
pub struct Adam {
    pub learning_rate: f64,
}

#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Dense>,
    step: i32,
}

/// Forward values kept for backprop: inputs to each layer and its
/// pre-activations.
struct Trace {
    inputs: Vec<Vec<f64>>,
    pre_activations: Vec<Vec<f64>>,
    output: f64,
}

impl Network {
    /// Build `inputs -> hidden[0] -> ... -> 1`. The first hidden layer is
    /// He-normal initialised, later layers Glorot-uniform; biases start at 0.
    pub fn new(inputs: usize, hidden: &[usize], rng: &mut StdRng) -> AnalyticsResult<Self> {
        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut fan_in = inputs;
        for (i, &units) in hidden.iter().enumerate() {
            let init = if i == 0 { Init::HeNormal } else { Init::GlorotUniform };
            layers.push(Dense::new(fan_in, units, Activation::Relu, init, rng)?);
            fan_in = units;
        }
        layers.push(Dense::new(fan_in, 1, Activation::Linear, Init::GlorotUniform, rng)?);
        Ok(Network { layers, step: 0 })
    }

    /// Units per layer, input excluded.
    pub fn layer_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(Dense::units).collect()
    }

    pub fn predict(&self, input: &[f64]) -> f64 {
        self.trace(input).output
    }

    fn trace(&self, input: &[f64]) -> Trace {
        let mut inputs = Vec::with_capacity(self.layers.len());
        let mut pre_activations = Vec::with_capacity(self.layers.len());
        let mut current = input.to_vec();
        for layer in &self.layers {
            let z = layer.linear(&current);
            let next: Vec<f64> = z.iter().map(|&v| layer.activation.apply(v)).collect();
            inputs.push(current);
            pre_activations.push(z);
            current = next;
        }
        Trace {
            inputs,
            pre_activations,
            output: current.first().copied().unwrap_or(0.0),
        }
    }

    /// Mean squared error over `rows`.
    pub fn mse(&self, features: &[Vec<f64>], labels: &[f64], rows: &[usize]) -> f64 {
        if rows.is_empty() {
            return 0.0;
        }
        let total: f64 = rows
            .iter()
            .map(|&r| {
                let err = self.predict(&features[r]) - labels[r];
                err * err
            })
            .sum();
        total / rows.len() as f64
    }

    /// One Adam step on the MSE of `batch`. Returns the batch loss measured
    /// before the update.
    fn train_batch(&mut self, features: &[Vec<f64>], labels: &[f64], batch: &[usize], adam: Adam) -> f64 {
        let mut grads: Vec<Moments> = self
            .layers
            .iter()
            .map(|l| Moments::zeros(l.weights.first().map_or(0, Vec::len), l.units()))
            .collect();
        let scale = 2.0 / batch.len() as f64;
        let mut loss = 0.0;

        for &row in batch {
            let trace = self.trace(&features[row]);
            let err = trace.output - labels[row];
            loss += err * err;

            let mut delta = vec![err * scale];
            for (l, layer) in self.layers.iter().enumerate().rev() {
                let z = &trace.pre_activations[l];
                for (i, d) in delta.iter_mut().enumerate() {
                    *d *= layer.activation.derivative(z[i]);
                }
                let input = &trace.inputs[l];
                for (i, &d) in delta.iter().enumerate() {
                    grads[l].bias[i] += d;
                    for (j, &x) in input.iter().enumerate() {
                        grads[l].weights[i][j] += d * x;
                    }
                }
                if l > 0 {
                    delta = (0..input.len())
                        .map(|j| {
                            layer
                                .weights
                                .iter()
                                .zip(&delta)
                                .map(|(row, d)| row[j] * d)
                                .sum()
                        })
                        .collect();
                }
            }
        }

        self.step += 1;
        let correction1 = 1.0 - ADAM_BETA1.powi(self.step);
        let correction2 = 1.0 - ADAM_BETA2.powi(self.step);
        let update = |param: &mut f64, m: &mut f64, v: &mut f64, g: f64| {
            *m = ADAM_BETA1 * *m + (1.0 - ADAM_BETA1) * g;
            *v = ADAM_BETA2 * *v + (1.0 - ADAM_BETA2) * g * g;
            let m_hat = *m / correction1;
            let v_hat = *v / correction2;
            *param -= adam.learning_rate * m_hat / (v_hat.sqrt() + ADAM_EPSILON);
        };

        for (layer, grad) in self.layers.iter_mut().zip(&grads) {
            for i in 0..layer.units() {
                for j in 0..layer.weights[i].len() {
                    update(
                        &mut layer.weights[i][j],
                        &mut layer.first_moment.weights[i][j],
                        &mut layer.second_moment.weights[i][j],
                        grad.weights[i][j],
                    );
                }
                update(
                    &mut layer.bias[i],
                    &mut layer.first_moment.bias[i],
                    &mut layer.second_moment.bias[i],
                    grad.bias[i],
                );
            }
        }

        loss / batch.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Training loop
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitHistory {
    pub epochs: usize,
    pub training_rows: usize,
    pub validation_rows: usize,
    pub final_loss: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_validation_loss: Option<f64>,
}

/// Train on the leading rows and hold out the trailing `validation_rows`.
/// Rows are reshuffled every epoch. A non-finite loss aborts training.
pub fn fit(
    network: &mut Network,
    features: &[Vec<f64>],
    labels: &[f64],
    validation_rows: usize,
    epochs: usize,
    settings: &TrainingSettings,
    rng: &mut StdRng,
) -> AnalyticsResult<FitHistory> {
    if features.len() != labels.len() || features.is_empty() {
        return Err(AnalyticsError::TrainingFailure(format!(
            "{} feature rows for {} labels",
            features.len(),
            labels.len()
        )));
    }
    let training_rows = features.len().saturating_sub(validation_rows).max(1);
    let validation: Vec<usize> = (training_rows..features.len()).collect();
    let mut order: Vec<usize> = (0..training_rows).collect();
    let adam = Adam {
        learning_rate: settings.learning_rate,
    };

    let mut final_loss = 0.0;
    for epoch in 0..epochs {
        order.shuffle(rng);
        let mut weighted = 0.0;
        for batch in order.chunks(settings.batch_size.max(1)) {
            weighted += network.train_batch(features, labels, batch, adam) * batch.len() as f64;
        }
        final_loss = weighted / training_rows as f64;
        if !final_loss.is_finite() {
            return Err(AnalyticsError::TrainingFailure(format!(
                "loss diverged at epoch {epoch}"
            )));
        }
        if epoch % 10 == 0 {
            tracing::debug!(epoch, loss = final_loss, "training");
        }
    }

    let final_validation_loss = if validation.is_empty() {
        None
    } else {
        Some(network.mse(features, labels, &validation))
    };

    Ok(FitHistory {
        epochs,
        training_rows,
        validation_rows: validation.len(),
        final_loss,
        final_validation_loss,
    })
}
