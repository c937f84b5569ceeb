//! The trained vectorizer + classifier pair.
//!
//! [`IntentPipeline`] is what actually ships in the model artifact: fitting
//! it fits the TF-IDF vectorizer and the softmax classifier together, and
//! prediction runs text through both to produce an intent label with a
//! confidence score.

use serde::{Deserialize, Serialize};

use crate::error::{PalaverError, Result};
use crate::ml::classifier::{SoftmaxClassifier, TrainingConfig, TrainingStats};
use crate::ml::vectorizer::TfIdfVectorizer;

/// A labeled training query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledQuery {
    /// The user query text.
    pub query: String,
    /// The intent label for this query.
    pub intent: String,
}

impl LabeledQuery {
    pub fn new<Q: Into<String>, I: Into<String>>(query: Q, intent: I) -> Self {
        LabeledQuery {
            query: query.into(),
            intent: intent.into(),
        }
    }
}

/// A prediction with its confidence score.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// The predicted intent label.
    pub intent: String,
    /// Probability of the predicted label, in [0, 1].
    pub confidence: f64,
}

/// Text-to-intent pipeline: TF-IDF vectorization followed by softmax
/// classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentPipeline {
    vectorizer: TfIdfVectorizer,
    classifier: SoftmaxClassifier,
    config: TrainingConfig,
}

impl IntentPipeline {
    /// Create an untrained pipeline with default hyperparameters.
    pub fn new() -> Self {
        Self::with_config(TrainingConfig::default())
    }

    /// Create an untrained pipeline with custom training hyperparameters.
    pub fn with_config(config: TrainingConfig) -> Self {
        IntentPipeline {
            vectorizer: TfIdfVectorizer::new(),
            classifier: SoftmaxClassifier::new(Vec::new()),
            config,
        }
    }

    /// Fit the pipeline on labeled queries.
    ///
    /// The label space is built in first-seen order over the samples, so a
    /// given input ordering always produces the same trained label indices.
    pub fn fit(&mut self, samples: &[LabeledQuery]) -> Result<TrainingStats> {
        if samples.is_empty() {
            return Err(PalaverError::model(
                "cannot fit pipeline on an empty sample set",
            ));
        }

        let mut labels: Vec<String> = Vec::new();
        let mut targets = Vec::with_capacity(samples.len());
        for sample in samples {
            let index = match labels.iter().position(|l| l == &sample.intent) {
                Some(index) => index,
                None => {
                    labels.push(sample.intent.clone());
                    labels.len() - 1
                }
            };
            targets.push(index);
        }

        let queries: Vec<String> = samples.iter().map(|s| s.query.clone()).collect();
        let features = self.vectorizer.fit_transform(&queries)?;

        self.classifier = SoftmaxClassifier::with_config(labels, self.config.clone());
        self.classifier.fit(&features, &targets)
    }

    /// Predict the intent of a message.
    ///
    /// Confidence is the probability of the winning label; if the classifier
    /// yields no probability for it, confidence defaults to 1.0.
    pub fn predict(&self, text: &str) -> Result<Prediction> {
        let features = self.vectorizer.transform(text)?;
        let index = self.classifier.predict(&features)?;
        let probs = self.classifier.predict_proba(&features)?;

        let intent = self
            .classifier
            .labels()
            .get(index)
            .cloned()
            .ok_or_else(|| PalaverError::model(format!("prediction index {index} unmapped")))?;
        let confidence = probs.get(index).copied().unwrap_or(1.0);

        Ok(Prediction { intent, confidence })
    }

    /// Accuracy over a labeled sample set.
    pub fn evaluate(&self, samples: &[LabeledQuery]) -> Result<f64> {
        if samples.is_empty() {
            return Err(PalaverError::dataset("cannot evaluate on an empty set"));
        }
        let mut correct = 0usize;
        for sample in samples {
            if self.predict(&sample.query)?.intent == sample.intent {
                correct += 1;
            }
        }
        Ok(correct as f64 / samples.len() as f64)
    }

    /// The labels this pipeline can emit.
    pub fn labels(&self) -> &[String] {
        self.classifier.labels()
    }

    /// Whether the pipeline has been fitted.
    pub fn is_trained(&self) -> bool {
        self.vectorizer.is_fitted() && self.classifier.is_trained()
    }
}

impl Default for IntentPipeline {
    fn default() -> Self {
        Self::new()
    }
}
