//! Dataset preparation: repair, merge, and loading of training CSVs.
//!
//! The offline tooling operates on a directory of CSV files with `query` and
//! `response` columns. [`repair`] normalizes rows whose response text grew
//! extra comma-separated fields, [`merge`] combines the per-topic files into
//! one labeled, deduplicated, deterministically shuffled CSV, and [`loader`]
//! reads whatever is on disk into labeled training rows for the trainer.
//!
//! Intent labels come from one canonical source: a row's `intent` column when
//! the file has one, otherwise the static filename mapping below.

pub mod loader;
pub mod merge;
pub mod repair;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The label assigned when a file stem has no mapping of its own.
pub const DEFAULT_INTENT: &str = "general_chat";

lazy_static! {
    /// File stem to intent label, for datasets without an `intent` column.
    static ref INTENT_BY_SOURCE: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("orders", "order_status");
        m.insert("order", "order_status");
        m.insert("refunds", "refund_request");
        m.insert("refund", "refund_request");
        m.insert("products", "product_info");
        m.insert("product", "product_info");
        m.insert("accounts", "account_help");
        m.insert("account", "account_help");
        m.insert("general", "general_chat");
        m.insert("ecommerce_chatbot_dataset", "general_chat");
        m.insert("ecommerce_faq", "general_chat");
        m
    };
}

/// Map a file stem to its intent label.
pub fn intent_for_source(stem: &str) -> &'static str {
    INTENT_BY_SOURCE
        .get(stem.to_lowercase().as_str())
        .copied()
        .unwrap_or(DEFAULT_INTENT)
}

/// One labeled training row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRow {
    pub query: String,
    pub response: String,
    pub intent: String,
}

/// All CSV files directly under `dir`, in sorted path order.
///
/// Sorted traversal keeps merge output and training label order independent
/// of directory-entry ordering.
pub fn csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_intent_mapping() {
        assert_eq!(intent_for_source("orders"), "order_status");
        assert_eq!(intent_for_source("order"), "order_status");
        assert_eq!(intent_for_source("refund"), "refund_request");
        assert_eq!(intent_for_source("products"), "product_info");
        assert_eq!(intent_for_source("account"), "account_help");
        assert_eq!(intent_for_source("general"), "general_chat");
        assert_eq!(intent_for_source("ecommerce_faq"), "general_chat");
    }

    #[test]
    fn test_intent_mapping_is_case_insensitive() {
        assert_eq!(intent_for_source("Orders"), "order_status");
        assert_eq!(intent_for_source("REFUNDS"), "refund_request");
    }

    #[test]
    fn test_unknown_stem_defaults_to_general_chat() {
        assert_eq!(intent_for_source("weird_export_v2"), DEFAULT_INTENT);
        assert_eq!(intent_for_source(""), DEFAULT_INTENT);
    }

    #[test]
    fn test_csv_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.csv"), "query,response\n").unwrap();
        fs::write(dir.path().join("a.CSV"), "query,response\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a dataset").unwrap();

        let files = csv_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["a.CSV", "b.csv"]);
    }
}
