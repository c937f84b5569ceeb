//! Loading labeled training rows from a directory of CSVs.
//!
//! The loader is more forgiving than the merge step: headers are matched
//! case-insensitively (first occurrence wins when a name repeats), files
//! missing either required column are skipped, and rows missing a query or
//! response are dropped. Labels follow the canonical scheme: the `intent`
//! column when present, the filename mapping otherwise.

use std::collections::HashMap;
use std::path::Path;

use csv::ReaderBuilder;
use log::{debug, warn};

use crate::dataset::{csv_files, intent_for_source, TrainingRow};
use crate::error::{PalaverError, Result};

/// Load every usable CSV under `dir` into training rows.
///
/// Fails if no file qualifies or every qualifying row was dropped.
pub fn load_dir(dir: &Path) -> Result<Vec<TrainingRow>> {
    let mut rows: Vec<TrainingRow> = Vec::new();
    let mut files_used = 0usize;

    for path in csv_files(dir)? {
        match load_file(&path)? {
            Some(mut file_rows) => {
                debug!("loaded {} rows from {}", file_rows.len(), path.display());
                rows.append(&mut file_rows);
                files_used += 1;
            }
            None => {
                warn!(
                    "skipping {}: no query/response columns",
                    path.display()
                );
            }
        }
    }

    if files_used == 0 {
        return Err(PalaverError::dataset(format!(
            "no CSV files with query/response columns found in {}",
            dir.display()
        )));
    }
    if rows.is_empty() {
        return Err(PalaverError::dataset(
            "no usable rows after dropping incomplete entries",
        ));
    }

    Ok(rows)
}

/// Load one CSV file, or `None` if it lacks the required columns.
pub fn load_file(path: &Path) -> Result<Option<Vec<TrainingRow>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    // Lowercased header -> column index, first occurrence winning.
    let mut columns: HashMap<String, usize> = HashMap::new();
    for (index, header) in reader.headers()?.iter().enumerate() {
        columns.entry(header.trim().to_lowercase()).or_insert(index);
    }

    let (Some(&query_col), Some(&response_col)) =
        (columns.get("query"), columns.get("response"))
    else {
        return Ok(None);
    };
    let intent_col = columns.get("intent").copied();

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let source_intent = intent_for_source(&stem);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let query = record.get(query_col).unwrap_or("").trim();
        let response = record.get(response_col).unwrap_or("").trim();
        if query.is_empty() || response.is_empty() {
            continue;
        }

        let intent = intent_col
            .and_then(|col| record.get(col))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(source_intent);

        rows.push(TrainingRow {
            query: query.to_string(),
            response: response.to_string(),
            intent: intent.to_string(),
        });
    }

    Ok(Some(rows))
}
