//! Aggregate summaries from the flat JaCoCo CSV export.
//!
//! The CSV has one row per class and no per-method detail, so it can only
//! answer "how much is covered", never "which methods are missing".

use super::{CounterKind, CoverageCounter, CounterSummary};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

const FORMAT: &str = "JaCoCo CSV";

/// The columns this summary needs; other columns are ignored.
#[derive(Debug, Deserialize)]
struct ClassRow {
    #[serde(rename = "PACKAGE")]
    package: String,
    #[serde(rename = "CLASS")]
    class: String,
    #[serde(rename = "LINE_MISSED")]
    line_missed: u64,
    #[serde(rename = "LINE_COVERED")]
    line_covered: u64,
    #[serde(rename = "BRANCH_MISSED")]
    branch_missed: u64,
    #[serde(rename = "BRANCH_COVERED")]
    branch_covered: u64,
    #[serde(rename = "METHOD_MISSED")]
    method_missed: u64,
    #[serde(rename = "METHOD_COVERED")]
    method_covered: u64,
}

/// A class with something missing, by one counter kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassShortfall {
    /// `package.Class`
    pub class: String,
    pub missed: u64,
    pub covered: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularSummary {
    pub line_coverage: CounterSummary,
    pub branch_coverage: CounterSummary,
    pub method_coverage: CounterSummary,
    /// Total number of classes with missed lines, before truncation
    pub classes_with_missing_lines_count: usize,
    /// Sorted by missed lines, most first
    pub classes_with_missing_lines: Vec<ClassShortfall>,
    pub classes_with_missing_methods_count: usize,
    pub classes_with_missing_methods: Vec<ClassShortfall>,
    /// Rows that could not be read as integers
    pub rows_skipped: usize,
}

/// Summarize a CSV report from disk.
pub fn summarize_csv_file(path: &Path, limit: usize) -> Result<TabularSummary> {
    if !path.is_file() {
        return Err(Error::not_found("JaCoCo CSV", path));
    }
    let file = std::fs::File::open(path)
        .map_err(|e| Error::io(format!("Failed to open {}", path.display()), e))?;
    summarize_csv(file, limit)
}

/// Summarize CSV content, listing at most `limit` classes per shortfall list.
///
/// Rows whose counts cannot be read are skipped rather than failing the summary.
pub fn summarize_csv<R: Read>(input: R, limit: usize) -> Result<TabularSummary> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| Error::parse(FORMAT, e.to_string()))?;
    if !headers.iter().any(|h| h == "LINE_MISSED") {
        return Err(Error::parse(FORMAT, "missing LINE_MISSED column"));
    }

    let mut lines = (0u64, 0u64);
    let mut branches = (0u64, 0u64);
    let mut methods = (0u64, 0u64);
    let mut missing_lines = Vec::new();
    let mut missing_methods = Vec::new();
    let mut rows_skipped = 0;

    for record in reader.deserialize::<ClassRow>() {
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                tracing::debug!("Skipping CSV row: {}", e);
                rows_skipped += 1;
                continue;
            }
        };

        lines.0 += row.line_missed;
        lines.1 += row.line_covered;
        branches.0 += row.branch_missed;
        branches.1 += row.branch_covered;
        methods.0 += row.method_missed;
        methods.1 += row.method_covered;

        let class = format!("{}.{}", row.package, row.class);
        if row.line_missed > 0 {
            missing_lines.push(ClassShortfall {
                class: class.clone(),
                missed: row.line_missed,
                covered: row.line_covered,
            });
        }
        if row.method_missed > 0 {
            missing_methods.push(ClassShortfall {
                class,
                missed: row.method_missed,
                covered: row.method_covered,
            });
        }
    }

    let classes_with_missing_lines_count = missing_lines.len();
    let classes_with_missing_methods_count = missing_methods.len();

    Ok(TabularSummary {
        line_coverage: CoverageCounter::new(CounterKind::Line, lines.0, lines.1).summary(),
        branch_coverage: CoverageCounter::new(CounterKind::Branch, branches.0, branches.1)
            .summary(),
        method_coverage: CoverageCounter::new(CounterKind::Method, methods.0, methods.1)
            .summary(),
        classes_with_missing_lines_count,
        classes_with_missing_lines: most_missed(missing_lines, limit),
        classes_with_missing_methods_count,
        classes_with_missing_methods: most_missed(missing_methods, limit),
        rows_skipped,
    })
}

fn most_missed(mut classes: Vec<ClassShortfall>, limit: usize) -> Vec<ClassShortfall> {
    // Stable sort keeps file order among equal counts
    classes.sort_by(|a, b| b.missed.cmp(&a.missed));
    classes.truncate(limit);
    classes
}
