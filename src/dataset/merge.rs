//! Merging per-topic CSVs into one labeled training dataset.
//!
//! Every file exposing `query` and `response` columns (exact, case-sensitive
//! header match) contributes its rows, labeled with the intent mapped from
//! the file stem. Rows whose query is empty after trimming are dropped, as
//! are rows with a query already seen; the survivors are shuffled with a
//! fixed seed and one combined CSV is written. The whole operation is
//! deterministic: identical inputs produce byte-identical output.

use std::collections::HashSet;
use std::path::Path;

use csv::{ReaderBuilder, Writer};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::dataset::{csv_files, intent_for_source, TrainingRow};
use crate::error::{PalaverError, Result};

/// Seed for the reproducible output shuffle.
pub const MERGE_SHUFFLE_SEED: u64 = 42;

/// Summary of a merge run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeReport {
    pub files_merged: usize,
    pub files_skipped: usize,
    pub rows_written: usize,
    pub duplicates_dropped: usize,
}

/// Merge all qualifying CSVs under `dir` into `output`.
pub fn merge_dir(dir: &Path, output: &Path) -> Result<MergeReport> {
    let output_abs = std::path::absolute(output)?;

    let mut rows: Vec<TrainingRow> = Vec::new();
    let mut seen_queries: HashSet<String> = HashSet::new();
    let mut files_merged = 0usize;
    let mut files_skipped = 0usize;
    let mut duplicates_dropped = 0usize;

    for path in csv_files(dir)? {
        // Never fold a previous merge output back into itself.
        if std::path::absolute(&path)? == output_abs {
            continue;
        }

        let mut reader = ReaderBuilder::new().has_headers(true).from_path(&path)?;
        let headers = reader.headers()?.clone();
        let query_col = headers.iter().position(|h| h == "query");
        let response_col = headers.iter().position(|h| h == "response");
        let (Some(query_col), Some(response_col)) = (query_col, response_col) else {
            debug!(
                "skipping {}: missing query/response columns",
                path.display()
            );
            files_skipped += 1;
            continue;
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let intent = intent_for_source(&stem);

        let mut file_rows = 0usize;
        for record in reader.records() {
            let record = record?;
            let query = record.get(query_col).unwrap_or("").trim().to_string();
            let response = record.get(response_col).unwrap_or("").trim().to_string();
            if query.is_empty() {
                continue;
            }
            if !seen_queries.insert(query.clone()) {
                duplicates_dropped += 1;
                continue;
            }
            rows.push(TrainingRow {
                query,
                response,
                intent: intent.to_string(),
            });
            file_rows += 1;
        }

        info!("merged {} rows from {} as {intent}", file_rows, path.display());
        files_merged += 1;
    }

    if files_merged == 0 {
        return Err(PalaverError::dataset(format!(
            "no CSV files with query/response columns found in {}",
            dir.display()
        )));
    }

    let mut rng = StdRng::seed_from_u64(MERGE_SHUFFLE_SEED);
    rows.shuffle(&mut rng);

    let mut writer = Writer::from_path(output)?;
    writer.write_record(["query", "response", "intent"])?;
    for row in &rows {
        writer.write_record([&row.query, &row.response, &row.intent])?;
    }
    writer.flush()?;

    Ok(MergeReport {
        files_merged,
        files_skipped,
        rows_written: rows.len(),
        duplicates_dropped,
    })
}
