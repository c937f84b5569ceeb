//! Multinomial logistic-regression classifier.
//!
//! [`SoftmaxClassifier`] maps TF-IDF feature vectors to intent labels. It is
//! trained with batch gradient descent on the mean cross-entropy loss plus a
//! small L2 penalty, capped at a fixed iteration budget with early stopping
//! once the loss stops moving. Epoch gradients are accumulated in parallel
//! with rayon.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PalaverError, Result};

/// Hyperparameters for classifier training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Maximum number of gradient-descent iterations.
    pub max_iterations: usize,
    /// Step size for weight updates.
    pub learning_rate: f64,
    /// L2 regularization strength.
    pub l2_penalty: f64,
    /// Stop early once the absolute loss change drops below this.
    pub tolerance: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            max_iterations: 200,
            learning_rate: 1.0,
            l2_penalty: 1e-4,
            tolerance: 1e-6,
        }
    }
}

/// Statistics from a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Iterations actually performed.
    pub iterations: usize,
    /// Mean regularized cross-entropy after the final iteration.
    pub final_loss: f64,
    /// Whether training stopped on the tolerance rather than the cap.
    pub converged: bool,
    /// Wall-clock training time in milliseconds.
    pub training_time_ms: u64,
}

/// Multinomial logistic-regression (softmax) classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxClassifier {
    labels: Vec<String>,
    /// Weight matrix, one row per label.
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    config: TrainingConfig,
}

/// Per-epoch gradient sums, mergeable across rayon workers.
struct GradientAccumulator {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    loss: f64,
}

impl GradientAccumulator {
    fn zero(n_labels: usize, n_features: usize) -> Self {
        GradientAccumulator {
            weights: vec![vec![0.0; n_features]; n_labels],
            bias: vec![0.0; n_labels],
            loss: 0.0,
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (row, other_row) in self.weights.iter_mut().zip(other.weights) {
            for (value, other_value) in row.iter_mut().zip(other_row) {
                *value += other_value;
            }
        }
        for (value, other_value) in self.bias.iter_mut().zip(other.bias) {
            *value += other_value;
        }
        self.loss += other.loss;
        self
    }
}

fn raw_scores(weights: &[Vec<f64>], bias: &[f64], features: &[f64]) -> Vec<f64> {
    weights
        .iter()
        .zip(bias)
        .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + b)
        .collect()
}

fn softmax_in_place(scores: &mut [f64]) {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for score in scores.iter_mut() {
        *score = (*score - max).exp();
        total += *score;
    }
    for score in scores.iter_mut() {
        *score /= total;
    }
}

impl SoftmaxClassifier {
    /// Create an untrained classifier over the given label space.
    pub fn new(labels: Vec<String>) -> Self {
        Self::with_config(labels, TrainingConfig::default())
    }

    /// Create an untrained classifier with custom hyperparameters.
    pub fn with_config(labels: Vec<String>, config: TrainingConfig) -> Self {
        SoftmaxClassifier {
            labels,
            weights: Vec::new(),
            bias: Vec::new(),
            config,
        }
    }

    /// Train on feature vectors paired with label indices.
    ///
    /// `targets[i]` is the index into the label space for `features[i]`.
    /// Retraining replaces any previous weights.
    pub fn fit(&mut self, features: &[Vec<f64>], targets: &[usize]) -> Result<TrainingStats> {
        if features.is_empty() {
            return Err(PalaverError::model("cannot train on an empty dataset"));
        }
        if features.len() != targets.len() {
            return Err(PalaverError::model(format!(
                "feature/target length mismatch: {} vs {}",
                features.len(),
                targets.len()
            )));
        }
        if self.labels.is_empty() {
            return Err(PalaverError::model("label space is empty"));
        }
        if let Some(&bad) = targets.iter().find(|&&t| t >= self.labels.len()) {
            return Err(PalaverError::model(format!(
                "target index {bad} outside label space of {}",
                self.labels.len()
            )));
        }

        let n_features = features[0].len();
        if features.iter().any(|row| row.len() != n_features) {
            return Err(PalaverError::model("inconsistent feature dimensions"));
        }

        let n_labels = self.labels.len();
        let n_samples = features.len() as f64;
        let mut weights = vec![vec![0.0; n_features]; n_labels];
        let mut bias = vec![0.0; n_labels];

        let started = Instant::now();
        let mut previous_loss = f64::INFINITY;
        let mut iterations = 0;
        let mut final_loss = 0.0;
        let mut converged = false;

        for _ in 0..self.config.max_iterations {
            iterations += 1;

            let grads = features
                .par_iter()
                .zip(targets.par_iter())
                .fold(
                    || GradientAccumulator::zero(n_labels, n_features),
                    |mut acc, (x, &y)| {
                        let mut probs = raw_scores(&weights, &bias, x);
                        softmax_in_place(&mut probs);
                        acc.loss -= probs[y].max(1e-12).ln();
                        for (label, &p) in probs.iter().enumerate() {
                            let g = p - if label == y { 1.0 } else { 0.0 };
                            for (acc_w, &xv) in acc.weights[label].iter_mut().zip(x.iter()) {
                                *acc_w += g * xv;
                            }
                            acc.bias[label] += g;
                        }
                        acc
                    },
                )
                .reduce(
                    || GradientAccumulator::zero(n_labels, n_features),
                    GradientAccumulator::merge,
                );

            let mut loss = grads.loss / n_samples;
            for label in 0..n_labels {
                for j in 0..n_features {
                    let w = weights[label][j];
                    loss += 0.5 * self.config.l2_penalty * w * w;
                    weights[label][j] -= self.config.learning_rate
                        * (grads.weights[label][j] / n_samples + self.config.l2_penalty * w);
                }
                bias[label] -= self.config.learning_rate * grads.bias[label] / n_samples;
            }

            final_loss = loss;
            if (previous_loss - loss).abs() < self.config.tolerance {
                converged = true;
                break;
            }
            previous_loss = loss;
        }

        self.weights = weights;
        self.bias = bias;

        Ok(TrainingStats {
            iterations,
            final_loss,
            converged,
            training_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Predict the label index for a feature vector.
    pub fn predict(&self, features: &[f64]) -> Result<usize> {
        let probs = self.predict_proba(features)?;
        let best = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(index, _)| index)
            .ok_or_else(|| PalaverError::model("classifier has no labels"))?;
        Ok(best)
    }

    /// Class probabilities for a feature vector, aligned with `labels()`.
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        if !self.is_trained() {
            return Err(PalaverError::model("classifier has not been trained"));
        }
        if features.len() != self.weights[0].len() {
            return Err(PalaverError::model(format!(
                "expected {} features, got {}",
                self.weights[0].len(),
                features.len()
            )));
        }
        let mut probs = raw_scores(&self.weights, &self.bias, features);
        softmax_in_place(&mut probs);
        Ok(probs)
    }

    /// The label space, aligned with prediction indices.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Whether the classifier has been trained.
    pub fn is_trained(&self) -> bool {
        !self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well-separated clusters in a 2D feature space.
    fn toy_dataset() -> (Vec<Vec<f64>>, Vec<usize>) {
        let features = vec![
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.8, 0.0],
            vec![0.0, 1.0],
            vec![0.1, 0.9],
            vec![0.0, 0.8],
        ];
        let targets = vec![0, 0, 0, 1, 1, 1];
        (features, targets)
    }

    #[test]
    fn test_fit_and_predict_separable() {
        let (features, targets) = toy_dataset();
        let mut classifier =
            SoftmaxClassifier::new(vec!["order_status".to_string(), "refund_request".to_string()]);
        let stats = classifier.fit(&features, &targets).unwrap();

        assert!(stats.iterations <= 200);
        assert!(classifier.is_trained());
        assert_eq!(classifier.predict(&[1.0, 0.0]).unwrap(), 0);
        assert_eq!(classifier.predict(&[0.0, 1.0]).unwrap(), 1);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (features, targets) = toy_dataset();
        let mut classifier = SoftmaxClassifier::new(vec!["a".to_string(), "b".to_string()]);
        classifier.fit(&features, &targets).unwrap();

        let probs = classifier.predict_proba(&[0.5, 0.5]).unwrap();
        assert_eq!(probs.len(), 2);
        let total: f64 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_confident_on_training_points() {
        let (features, targets) = toy_dataset();
        let mut classifier = SoftmaxClassifier::new(vec!["a".to_string(), "b".to_string()]);
        classifier.fit(&features, &targets).unwrap();

        let probs = classifier.predict_proba(&[1.0, 0.0]).unwrap();
        assert!(probs[0] > 0.5, "expected confident prediction, got {probs:?}");
    }

    #[test]
    fn test_untrained_predict_fails() {
        let classifier = SoftmaxClassifier::new(vec!["a".to_string()]);
        assert!(classifier.predict(&[0.0]).is_err());
    }

    #[test]
    fn test_dimension_mismatch_fails() {
        let (features, targets) = toy_dataset();
        let mut classifier = SoftmaxClassifier::new(vec!["a".to_string(), "b".to_string()]);
        classifier.fit(&features, &targets).unwrap();
        assert!(classifier.predict_proba(&[1.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_target_outside_label_space_fails() {
        let mut classifier = SoftmaxClassifier::new(vec!["only".to_string()]);
        let result = classifier.fit(&[vec![1.0]], &[3]);
        assert!(result.is_err());
    }

    #[test]
    fn test_single_label_dataset() {
        let mut classifier = SoftmaxClassifier::new(vec!["general_chat".to_string()]);
        classifier
            .fit(&[vec![1.0, 0.0], vec![0.0, 1.0]], &[0, 0])
            .unwrap();

        assert_eq!(classifier.predict(&[0.3, 0.7]).unwrap(), 0);
        let probs = classifier.predict_proba(&[0.3, 0.7]).unwrap();
        assert!((probs[0] - 1.0).abs() < 1e-9);
    }
}
