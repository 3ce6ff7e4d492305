//! Binary logistic regression over sparse TF-IDF rows.
//!
//! Fitting is deterministic: zero-initialized weights trained by full-batch
//! gradient descent with an L2 penalty, so identical inputs always produce
//! the identical classifier.

use serde::{Deserialize, Serialize};

use crate::vectorizer::SparseRow;

/// Gradient-descent hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSettings {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2_penalty: f64,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            epochs: 200,
            learning_rate: 1.0,
            l2_penalty: 1e-4,
        }
    }
}

/// Errors raised while fitting a classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingError {
    message: String,
}

impl TrainingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for TrainingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TrainingError {}

/// Fitted binary linear classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogisticClassifier {
    weights: Vec<f64>,
    bias: f64,
}

impl LogisticClassifier {
    /// Fit a classifier on sparse rows and binary targets.
    pub fn fit(
        rows: &[SparseRow],
        targets: &[u8],
        n_features: usize,
        settings: &TrainingSettings,
    ) -> Result<Self, TrainingError> {
        if rows.is_empty() {
            return Err(TrainingError::new("training set cannot be empty"));
        }
        if rows.len() != targets.len() {
            return Err(TrainingError::new(format!(
                "rows ({}) and targets ({}) must have equal length",
                rows.len(),
                targets.len()
            )));
        }
        if targets.iter().any(|&target| target > 1) {
            return Err(TrainingError::new("targets must be 0 or 1"));
        }
        for row in rows {
            if row.iter().any(|&(index, _)| index >= n_features) {
                return Err(TrainingError::new(format!(
                    "feature index out of bounds for width {n_features}"
                )));
            }
        }

        let mut weights = vec![0.0; n_features];
        let mut bias = 0.0;
        let count = rows.len() as f64;

        for _ in 0..settings.epochs {
            let mut weight_gradient = vec![0.0; n_features];
            let mut bias_gradient = 0.0;

            for (row, &target) in rows.iter().zip(targets) {
                let error = sigmoid(dot(row, &weights) + bias) - f64::from(target);
                for &(index, value) in row {
                    weight_gradient[index] += error * value;
                }
                bias_gradient += error;
            }

            for index in 0..n_features {
                weights[index] -= settings.learning_rate
                    * (weight_gradient[index] / count + settings.l2_penalty * weights[index]);
            }
            bias -= settings.learning_rate * bias_gradient / count;
        }

        Ok(Self { weights, bias })
    }

    /// Feature width this classifier was trained against.
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, row: &SparseRow) -> f64 {
        sigmoid(dot(row, &self.weights) + self.bias)
    }

    /// Predicted class: `1` when the positive probability reaches 0.5.
    pub fn predict(&self, row: &SparseRow) -> u8 {
        u8::from(self.predict_proba(row) >= 0.5)
    }
}

fn dot(row: &SparseRow, weights: &[f64]) -> f64 {
    row.iter().map(|&(index, value)| value * weights[index]).sum()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
