//! The serialized model artifact.
//!
//! Training produces a single binary file holding the fitted
//! [`IntentPipeline`] plus the intent-to-canned-response lookup; the serving
//! process loads it once at startup and never mutates it. Serialization is
//! bincode over serde.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PalaverError, Result};
use crate::ml::IntentPipeline;

/// Metadata recorded alongside the trained pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// When the artifact was produced.
    pub created_at: DateTime<Utc>,
    /// Number of examples the pipeline was trained on.
    pub training_examples: usize,
    /// The label space of the trained classifier.
    pub labels: Vec<String>,
    /// Accuracy on the held-out split, if one existed.
    pub holdout_accuracy: Option<f64>,
    /// Crate version that produced the artifact.
    pub version: String,
}

/// The trained chatbot model as written to and read from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// The fitted vectorizer + classifier pair.
    pub pipeline: IntentPipeline,
    /// Canned response per intent label.
    pub responses: HashMap<String, String>,
    /// Training provenance.
    pub metadata: ArtifactMetadata,
}

impl ModelArtifact {
    pub fn new(
        pipeline: IntentPipeline,
        responses: HashMap<String, String>,
        metadata: ArtifactMetadata,
    ) -> Self {
        ModelArtifact {
            pipeline,
            responses,
            metadata,
        }
    }

    /// Write the artifact to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self)
            .map_err(|e| PalaverError::serialization(format!("failed to write artifact: {e}")))?;
        Ok(())
    }

    /// Read an artifact from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let artifact: ModelArtifact = bincode::deserialize_from(reader)
            .map_err(|e| PalaverError::serialization(format!("failed to read artifact: {e}")))?;
        Ok(artifact)
    }

    /// The canned response for an intent, if one is mapped.
    pub fn response_for(&self, intent: &str) -> Option<&str> {
        self.responses.get(intent).map(String::as_str)
    }
}
