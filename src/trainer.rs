//! Offline training: directory of CSVs in, model artifact out.
//!
//! Loads every usable row, holds out a fifth of them (fixed seed) for an
//! accuracy estimate, fits the intent pipeline on the rest, pairs each intent
//! with the response of the last row carrying it, and writes the whole bundle
//! to one artifact file. Accuracy is reported, never gated on: training that
//! completes always saves.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::dataset::loader::load_dir;
use crate::error::Result;
use crate::ml::{IntentPipeline, LabeledQuery};
use crate::model::{ArtifactMetadata, ModelArtifact};

/// Seed for the train/holdout split shuffle.
pub const TRAIN_SPLIT_SEED: u64 = 42;

/// Summary of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainReport {
    pub examples: usize,
    pub train_examples: usize,
    pub holdout_examples: usize,
    pub labels: Vec<String>,
    pub holdout_accuracy: Option<f64>,
    pub iterations: usize,
    pub converged: bool,
    pub elapsed_ms: u64,
    pub artifact_path: String,
}

/// Train on every CSV under `data_dir` and write the artifact to `output`.
pub fn train_dir(data_dir: &Path, output: &Path) -> Result<TrainReport> {
    let started = Instant::now();
    let rows = load_dir(data_dir)?;

    // Canned response per intent, last row wins.
    let mut responses: HashMap<String, String> = HashMap::new();
    for row in &rows {
        responses.insert(row.intent.clone(), row.response.clone());
    }

    let samples: Vec<LabeledQuery> = rows
        .iter()
        .map(|row| LabeledQuery::new(row.query.clone(), row.intent.clone()))
        .collect();

    // 80/20 split on shuffled indices, seeded for reproducible runs.
    let mut indices: Vec<usize> = (0..samples.len()).collect();
    let mut rng = StdRng::seed_from_u64(TRAIN_SPLIT_SEED);
    indices.shuffle(&mut rng);
    let holdout_len = samples.len() / 5;
    let (holdout_idx, train_idx) = indices.split_at(holdout_len);

    let train_set: Vec<LabeledQuery> = train_idx.iter().map(|&i| samples[i].clone()).collect();
    let holdout_set: Vec<LabeledQuery> = holdout_idx.iter().map(|&i| samples[i].clone()).collect();

    let mut pipeline = IntentPipeline::new();
    let stats = pipeline.fit(&train_set)?;

    let holdout_accuracy = if holdout_set.is_empty() {
        warn!("dataset too small for a holdout split; accuracy not estimated");
        None
    } else {
        let accuracy = pipeline.evaluate(&holdout_set)?;
        info!(
            "holdout accuracy {:.3} over {} examples",
            accuracy,
            holdout_set.len()
        );
        Some(accuracy)
    };

    let metadata = ArtifactMetadata {
        created_at: Utc::now(),
        training_examples: train_set.len(),
        labels: pipeline.labels().to_vec(),
        holdout_accuracy,
        version: crate::VERSION.to_string(),
    };

    let labels = metadata.labels.clone();
    let artifact = ModelArtifact::new(pipeline, responses, metadata);
    artifact.save(output)?;
    info!(
        "trained on {} examples ({} intents), artifact written to {}",
        train_set.len(),
        labels.len(),
        output.display()
    );

    Ok(TrainReport {
        examples: samples.len(),
        train_examples: train_set.len(),
        holdout_examples: holdout_set.len(),
        labels,
        holdout_accuracy,
        iterations: stats.iterations,
        converged: stats.converged,
        elapsed_ms: started.elapsed().as_millis() as u64,
        artifact_path: output.display().to_string(),
    })
}
