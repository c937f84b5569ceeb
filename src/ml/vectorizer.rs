//! TF-IDF vectorization of query text.
//!
//! [`TfIdfVectorizer`] learns a vocabulary and inverse-document-frequency
//! weights from a training corpus, then converts arbitrary text into a dense
//! feature vector for the classifier. Rows are L2-normalized so message
//! length does not dominate the classifier's dot products.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::{Analyzer, default_analyzer};
use crate::error::{PalaverError, Result};

/// TF-IDF vectorizer for converting text to numerical features.
///
/// Fitting assigns each distinct term a column in first-seen order and
/// computes smoothed IDF weights `ln((N + 1) / (df + 1)) + 1`. The analyzer
/// is not serialized with the learned state; deserialized vectorizers rebuild
/// the default analyzer.
#[derive(Clone, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    /// Vocabulary mapping term to feature index.
    vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per feature index.
    idf: Vec<f64>,
    /// Number of documents the vectorizer was fitted on.
    n_documents: usize,
    #[serde(skip, default = "default_analyzer")]
    analyzer: Arc<dyn Analyzer>,
}

impl TfIdfVectorizer {
    /// Create an unfitted vectorizer with the default analyzer.
    pub fn new() -> Self {
        Self::with_analyzer(default_analyzer())
    }

    /// Create an unfitted vectorizer with a custom analyzer.
    pub fn with_analyzer(analyzer: Arc<dyn Analyzer>) -> Self {
        TfIdfVectorizer {
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            n_documents: 0,
            analyzer,
        }
    }

    /// Fit the vectorizer on a document corpus.
    ///
    /// Builds the vocabulary and IDF table. Refitting replaces any previous
    /// state.
    pub fn fit(&mut self, documents: &[String]) -> Result<()> {
        if documents.is_empty() {
            return Err(PalaverError::model(
                "cannot fit vectorizer on an empty corpus",
            ));
        }

        self.vocabulary.clear();
        self.n_documents = documents.len();

        // Document frequency per feature index, vocabulary in first-seen
        // order so fitting is deterministic for a given input order.
        let mut document_frequency: Vec<usize> = Vec::new();
        for document in documents {
            let terms = self.analyzer.analyze(document)?;
            let mut seen: Vec<usize> = Vec::new();
            for term in terms {
                let next_index = self.vocabulary.len();
                let index = *self.vocabulary.entry(term).or_insert(next_index);
                if index == document_frequency.len() {
                    document_frequency.push(0);
                }
                if !seen.contains(&index) {
                    document_frequency[index] += 1;
                    seen.push(index);
                }
            }
        }

        let n = self.n_documents as f64;
        self.idf = document_frequency
            .iter()
            .map(|&df| ((n + 1.0) / (df as f64 + 1.0)).ln() + 1.0)
            .collect();

        Ok(())
    }

    /// Transform text into an L2-normalized TF-IDF vector.
    ///
    /// Terms outside the fitted vocabulary are ignored. A text with no known
    /// terms yields the zero vector.
    pub fn transform(&self, text: &str) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(PalaverError::model("vectorizer has not been fitted"));
        }

        let mut features = vec![0.0; self.vocabulary.len()];
        for term in self.analyzer.analyze(text)? {
            if let Some(&index) = self.vocabulary.get(&term) {
                features[index] += 1.0;
            }
        }

        for (index, value) in features.iter_mut().enumerate() {
            *value *= self.idf[index];
        }

        let norm = features.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in features.iter_mut() {
                *value /= norm;
            }
        }

        Ok(features)
    }

    /// Fit on a corpus and transform every document in it.
    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Vec<Vec<f64>>> {
        self.fit(documents)?;
        documents.iter().map(|doc| self.transform(doc)).collect()
    }

    /// Number of features (vocabulary size).
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Whether the vectorizer has been fitted.
    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TfIdfVectorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TfIdfVectorizer")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("n_documents", &self.n_documents)
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "where is my order".to_string(),
            "cancel my order".to_string(),
        ]
    }

    #[test]
    fn test_fit_builds_vocabulary() {
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&corpus()).unwrap();

        // where, is, my, order, cancel
        assert_eq!(vectorizer.vocabulary_size(), 5);
        assert!(vectorizer.is_fitted());
    }

    #[test]
    fn test_fit_empty_corpus_fails() {
        let mut vectorizer = TfIdfVectorizer::new();
        assert!(vectorizer.fit(&[]).is_err());
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let vectorizer = TfIdfVectorizer::new();
        assert!(vectorizer.transform("anything").is_err());
    }

    #[test]
    fn test_idf_weights_rare_terms_higher() {
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&corpus()).unwrap();

        // "order" appears in both documents, "where" in one; with equal raw
        // counts the rarer term must carry more weight.
        let features = vectorizer.transform("where order").unwrap();
        let nonzero: Vec<f64> = features.iter().copied().filter(|v| *v > 0.0).collect();
        assert_eq!(nonzero.len(), 2);

        let where_weight = features[0]; // first-seen order: "where" is column 0
        let order_weight = features[3];
        assert!(where_weight > order_weight);
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&corpus()).unwrap();

        let features = vectorizer.transform("order order where").unwrap();
        let norm = features.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_terms_yield_zero_vector() {
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&corpus()).unwrap();

        let features = vectorizer.transform("completely unrelated words").unwrap();
        assert!(features.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&corpus()).unwrap();
        let before = vectorizer.transform("where is my order").unwrap();

        let bytes = bincode::serialize(&vectorizer).unwrap();
        let restored: TfIdfVectorizer = bincode::deserialize(&bytes).unwrap();
        let after = restored.transform("where is my order").unwrap();

        assert_eq!(before, after);
    }
}
