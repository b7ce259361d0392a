//! Coverage gap classification and recommendations.

use super::{ClassCoverage, CoverageReport, CoverageStatus, MethodCoverage};
use serde::{Deserialize, Serialize};

/// A method that still needs tests, with the class it lives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodGap {
    pub package: String,
    pub class: String,
    #[serde(flatten)]
    pub method: MethodCoverage,
    pub status: CoverageStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    pub uncovered_classes: Vec<ClassCoverage>,
    pub uncovered_methods: Vec<MethodGap>,
    pub partially_covered_classes: Vec<ClassCoverage>,
    /// Missed lines across uncovered and partially covered classes
    pub total_uncovered_lines: u64,
    pub recommendations: Vec<String>,
}

/// Split the report's classes into gap categories and derive recommendations.
///
/// Fully covered classes and classes without lines appear in neither list.
pub fn classify_gaps(report: &CoverageReport) -> GapReport {
    let mut gaps = GapReport::default();

    for class in &report.classes {
        let bucket = match class.status() {
            Some(CoverageStatus::Uncovered) => &mut gaps.uncovered_classes,
            Some(CoverageStatus::PartiallyCovered) => &mut gaps.partially_covered_classes,
            Some(CoverageStatus::Covered) | None => continue,
        };

        gaps.total_uncovered_lines += class.missed_lines;
        bucket.push(class.clone());

        gaps.uncovered_methods
            .extend(class.methods.iter().filter_map(|method| {
                Some(MethodGap {
                    package: class.package.clone(),
                    class: class.class.clone(),
                    status: method.status()?,
                    method: method.clone(),
                })
            }));
    }

    gaps.recommendations = recommendations(&gaps);
    gaps
}

fn recommendations(gaps: &GapReport) -> Vec<String> {
    let mut notes = Vec::new();

    if !gaps.uncovered_classes.is_empty() {
        notes.push(format!(
            "PRIORITY: {} classes have 0% coverage. Generate tests for these first.",
            gaps.uncovered_classes.len()
        ));
    }

    if !gaps.partially_covered_classes.is_empty() {
        notes.push(format!(
            "Found {} partially covered classes. Add tests for uncovered methods.",
            gaps.partially_covered_classes.len()
        ));
    }

    if gaps.total_uncovered_lines > 0 {
        notes.push(format!(
            "Total uncovered lines: {}. Focus on critical business logic first.",
            gaps.total_uncovered_lines
        ));
    }

    notes
}
