//! Batch generation for every source file without a test.

use super::generate_test_file;
use crate::config::ProjectConfig;
use crate::error::Result;
use crate::language::{find_source_files, SourceExtractor};
use serde::{Deserialize, Serialize};

/// A source file whose generation failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileError {
    pub file: String,
    pub error: String,
}

/// Summary of one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_files: usize,
    pub generated: usize,
    pub skipped: usize,
    pub generated_files: Vec<String>,
    pub errors: Vec<FileError>,
    pub message: String,
}

/// Generate tests for every source file whose mirrored test path does not exist.
///
/// An existing file at the test path is the only thing that marks a class as
/// tested; its contents are never compared with the source. Per-file failures
/// are collected and the scan carries on. Files are processed one at a time.
pub fn generate_missing_tests(
    extractor: &impl SourceExtractor,
    project: &ProjectConfig,
) -> Result<BatchSummary> {
    let listing = find_source_files(project)?;
    let mut summary = BatchSummary {
        total_files: listing.total_files,
        ..Default::default()
    };

    for file in &listing.files {
        let test_path = project.test_path_for(&file.path);
        if project.root.join(&test_path).exists() {
            tracing::debug!("Test already exists for {}: {}", file.path, test_path);
            summary.skipped += 1;
            continue;
        }

        match generate_test_file(extractor, project, &file.path) {
            Ok(generated) => {
                summary.generated += 1;
                summary.generated_files.push(generated.test_file);
            }
            Err(e) => {
                tracing::warn!("Failed to generate test for {}: {}", file.path, e);
                summary.errors.push(FileError {
                    file: file.path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    summary.message = format!(
        "Generated {} new test files, skipped {} existing tests",
        summary.generated, summary.skipped
    );
    tracing::info!("{}", summary.message);

    Ok(summary)
}
