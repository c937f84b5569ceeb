//! CSV repair for rows broken by unquoted commas.
//!
//! Response text that contains commas splits into extra fields when a file
//! was written without quoting. Repair collapses everything from the third
//! field onward back into a single field and rewrites the file with all
//! fields quoted, so downstream readers see a stable shape. Running repair
//! over an already-repaired file changes nothing.

use std::fs;
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::dataset::csv_files;
use crate::error::{PalaverError, Result};

/// Summary of a repair run over a directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairReport {
    pub files_scanned: usize,
    pub files_rewritten: usize,
    pub rows_collapsed: usize,
}

/// Outcome of repairing a single file.
#[derive(Debug, Clone)]
pub struct FileRepair {
    /// Rows whose extra fields were collapsed.
    pub rows_collapsed: usize,
    /// Whether the file content actually changed.
    pub changed: bool,
}

/// Repair every CSV file directly under `dir`.
///
/// A malformed file is a fatal error; files already in good shape are left
/// byte-identical.
pub fn repair_dir(dir: &Path) -> Result<RepairReport> {
    let mut report = RepairReport {
        files_scanned: 0,
        files_rewritten: 0,
        rows_collapsed: 0,
    };

    for path in csv_files(dir)? {
        report.files_scanned += 1;
        let outcome = repair_file(&path)?;
        report.rows_collapsed += outcome.rows_collapsed;
        if outcome.changed {
            report.files_rewritten += 1;
            info!(
                "repaired {} ({} rows collapsed)",
                path.display(),
                outcome.rows_collapsed
            );
        } else {
            debug!("{} already clean", path.display());
        }
    }

    Ok(report)
}

/// Repair a single CSV file in place.
pub fn repair_file(path: &Path) -> Result<FileRepair> {
    let original = fs::read(path)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(original.as_slice());

    let mut rows_collapsed = 0usize;
    let mut rows: Vec<StringRecord> = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() > 3 {
            let collapsed = record.iter().skip(2).collect::<Vec<_>>().join(",");
            let mut fixed = StringRecord::new();
            fixed.push_field(&record[0]);
            fixed.push_field(&record[1]);
            fixed.push_field(&collapsed);
            rows.push(fixed);
            rows_collapsed += 1;
        } else {
            rows.push(record);
        }
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());
    for row in &rows {
        writer.write_record(row)?;
    }
    let repaired = writer
        .into_inner()
        .map_err(|e| PalaverError::dataset(format!("csv flush failed: {e}")))?;

    let changed = repaired != original;
    if changed {
        fs::write(path, &repaired)?;
    }

    Ok(FileRepair {
        rows_collapsed,
        changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collapses_extra_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orders.csv");
        fs::write(
            &path,
            "query,response\nwhere is my order,It shipped, on Monday, we promise\n",
        )
        .unwrap();

        let outcome = repair_file(&path).unwrap();
        assert_eq!(outcome.rows_collapsed, 1);
        assert!(outcome.changed);

        let repaired = fs::read_to_string(&path).unwrap();
        assert_eq!(
            repaired,
            "\"query\",\"response\"\n\"where is my order\",\"It shipped\",\" on Monday, we promise\"\n"
        );
    }

    #[test]
    fn test_three_field_rows_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "\"a\",\"b\",\"c\"\n").unwrap();

        let outcome = repair_file(&path).unwrap();
        assert_eq!(outcome.rows_collapsed, 0);
        assert!(!outcome.changed);
    }

    #[test]
    fn test_skips_empty_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "query,response\n\nhello,hi\n").unwrap();

        repair_file(&path).unwrap();
        let repaired = fs::read_to_string(&path).unwrap();
        assert_eq!(repaired, "\"query\",\"response\"\n\"hello\",\"hi\"\n");
    }

    #[test]
    fn test_repair_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(
            &path,
            "query,response\nrefund please,Sure, no problem, right away\n",
        )
        .unwrap();

        repair_file(&path).unwrap();
        let first = fs::read(&path).unwrap();

        let second_run = repair_file(&path).unwrap();
        assert!(!second_run.changed);
        assert_eq!(second_run.rows_collapsed, 0);
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_repair_dir_reports_totals() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.csv"),
            "q,r\none,two, three, four\nfive,six\n",
        )
        .unwrap();
        fs::write(dir.path().join("b.csv"), "\"q\",\"r\"\n\"x\",\"y\"\n").unwrap();

        let report = repair_dir(dir.path()).unwrap();
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.files_rewritten, 1);
        assert_eq!(report.rows_collapsed, 1);
    }
}
