//! Text analysis for the intent pipeline.
//!
//! Analysis turns raw message text into the token stream the vectorizer
//! counts. The only analyzer the chatbot ships is [`StandardAnalyzer`], which
//! splits on Unicode word boundaries and lowercases, but the [`Analyzer`]
//! trait keeps the seam open so the vectorizer never depends on a concrete
//! tokenization.
//!
//! # Examples
//!
//! ```
//! use palaver::analysis::{Analyzer, StandardAnalyzer};
//!
//! let analyzer = StandardAnalyzer::new();
//! let terms = analyzer.analyze("Where is my ORDER?").unwrap();
//! assert_eq!(terms, vec!["where", "is", "my", "order"]);
//! ```

use std::fmt;
use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;

/// Trait for text analyzers.
///
/// An analyzer converts input text into a sequence of terms. Implementations
/// must be thread-safe because a trained pipeline is shared across request
/// handlers.
pub trait Analyzer: Send + Sync {
    /// Analyze text into terms.
    fn analyze(&self, text: &str) -> Result<Vec<String>>;

    /// Get the name of this analyzer.
    fn name(&self) -> &'static str;
}

impl fmt::Debug for dyn Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Analyzer({})", self.name())
    }
}

/// The default analyzer: Unicode word segmentation plus lowercasing.
///
/// Splits text with the Unicode word-boundary rules (UAX #29), keeps only
/// segments containing at least one alphanumeric character, and lowercases
/// each surviving term. Punctuation and whitespace never become terms.
#[derive(Clone, Debug, Default)]
pub struct StandardAnalyzer;

impl StandardAnalyzer {
    /// Create a new standard analyzer.
    pub fn new() -> Self {
        StandardAnalyzer
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<String>> {
        let terms = text
            .split_word_bounds()
            .filter(|word| word.chars().any(|c| c.is_alphanumeric()))
            .map(|word| word.to_lowercase())
            .collect();
        Ok(terms)
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

/// The analyzer used when none is supplied, shared behind an `Arc` so cloned
/// pipelines reuse it.
pub fn default_analyzer() -> Arc<dyn Analyzer> {
    Arc::new(StandardAnalyzer::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_analyzer_basic() {
        let analyzer = StandardAnalyzer::new();
        let terms = analyzer.analyze("hello, world!").unwrap();
        assert_eq!(terms, vec!["hello", "world"]);
    }

    #[test]
    fn test_standard_analyzer_lowercases() {
        let analyzer = StandardAnalyzer::new();
        let terms = analyzer.analyze("WHERE Is My Order").unwrap();
        assert_eq!(terms, vec!["where", "is", "my", "order"]);
    }

    #[test]
    fn test_standard_analyzer_keeps_numbers() {
        let analyzer = StandardAnalyzer::new();
        let terms = analyzer.analyze("order #12345 missing").unwrap();
        assert_eq!(terms, vec!["order", "12345", "missing"]);
    }

    #[test]
    fn test_standard_analyzer_unicode() {
        let analyzer = StandardAnalyzer::new();
        let terms = analyzer.analyze("café résumé").unwrap();
        assert_eq!(terms, vec!["café", "résumé"]);
    }

    #[test]
    fn test_standard_analyzer_empty_input() {
        let analyzer = StandardAnalyzer::new();
        assert!(analyzer.analyze("").unwrap().is_empty());
        assert!(analyzer.analyze("  ... !!!").unwrap().is_empty());
    }

    #[test]
    fn test_analyzer_name() {
        assert_eq!(StandardAnalyzer::new().name(), "standard");
    }
}
