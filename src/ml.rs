//! Machine learning for intent classification.
//!
//! This module contains the trainable half of the chatbot: a TF-IDF
//! vectorizer over analyzed query text, a multinomial logistic-regression
//! classifier on top of it, and the [`pipeline::IntentPipeline`] that binds
//! the two into the predict-with-confidence surface the serving process uses.

pub mod classifier;
pub mod pipeline;
pub mod vectorizer;

pub use classifier::{SoftmaxClassifier, TrainingConfig, TrainingStats};
pub use pipeline::{IntentPipeline, LabeledQuery, Prediction};
pub use vectorizer::TfIdfVectorizer;
