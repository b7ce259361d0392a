//! Coverage report model.
//!
//! Coverage arrives in two shapes:
//! - the hierarchical JaCoCo XML report (report → package → class → method → counter),
//!   parsed by [`jacoco`] into a [`CoverageReport`] that feeds gap classification
//! - the flat JaCoCo CSV export (one row per class), summarized by [`tabular`] for
//!   aggregate numbers only

pub mod gaps;
pub mod jacoco;
pub mod tabular;

use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use gaps::{classify_gaps, GapReport};
pub use jacoco::parse_report_file;
pub use tabular::{summarize_csv_file, TabularSummary};

/// Kind of a coverage counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterKind {
    Instruction,
    Branch,
    Line,
    Method,
    Class,
    Complexity,
}

impl CounterKind {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "INSTRUCTION" => Some(Self::Instruction),
            "BRANCH" => Some(Self::Branch),
            "LINE" => Some(Self::Line),
            "METHOD" => Some(Self::Method),
            "CLASS" => Some(Self::Class),
            "COMPLEXITY" => Some(Self::Complexity),
            _ => None,
        }
    }
}

impl std::fmt::Display for CounterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instruction => write!(f, "INSTRUCTION"),
            Self::Branch => write!(f, "BRANCH"),
            Self::Line => write!(f, "LINE"),
            Self::Method => write!(f, "METHOD"),
            Self::Class => write!(f, "CLASS"),
            Self::Complexity => write!(f, "COMPLEXITY"),
        }
    }
}

/// Percentage of `covered` over `missed + covered`, rounded to two decimals.
///
/// Zero when there is nothing to cover. Halfway values round to the even
/// neighbour, so 1 of 32 covered gives 3.12.
pub fn percentage(missed: u64, covered: u64) -> f64 {
    let total = missed + covered;
    if total == 0 {
        return 0.0;
    }
    let raw = covered as f64 / total as f64 * 100.0;
    (raw * 100.0).round_ties_even() / 100.0
}

/// A `(missed, covered)` pair for one kind at some scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCounter {
    pub kind: CounterKind,
    pub missed: u64,
    pub covered: u64,
}

impl CoverageCounter {
    pub fn new(kind: CounterKind, missed: u64, covered: u64) -> Self {
        Self {
            kind,
            missed,
            covered,
        }
    }

    pub fn total(&self) -> u64 {
        self.missed + self.covered
    }

    pub fn percentage(&self) -> f64 {
        percentage(self.missed, self.covered)
    }

    pub fn summary(&self) -> CounterSummary {
        CounterSummary {
            missed: self.missed,
            covered: self.covered,
            total: self.total(),
            percentage: self.percentage(),
        }
    }
}

/// Serialized view of a counter with its derived totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterSummary {
    pub missed: u64,
    pub covered: u64,
    pub total: u64,
    pub percentage: f64,
}

/// Gap classification of a method or class by its LINE counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    Covered,
    PartiallyCovered,
    Uncovered,
}

impl CoverageStatus {
    /// Status from line counts; `None` when there are no lines at all.
    pub fn from_lines(missed: u64, covered: u64) -> Option<Self> {
        match (missed, covered) {
            (0, 0) => None,
            (0, _) => Some(Self::Covered),
            (_, 0) => Some(Self::Uncovered),
            _ => Some(Self::PartiallyCovered),
        }
    }
}

impl std::fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Covered => write!(f, "covered"),
            Self::PartiallyCovered => write!(f, "partially_covered"),
            Self::Uncovered => write!(f, "uncovered"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCoverage {
    pub name: String,
    pub descriptor: String,
    pub lines: CoverageCounter,
    pub instructions: CoverageCounter,
}

impl MethodCoverage {
    pub fn new(name: String, descriptor: String) -> Self {
        Self {
            name,
            descriptor,
            lines: CoverageCounter::new(CounterKind::Line, 0, 0),
            instructions: CoverageCounter::new(CounterKind::Instruction, 0, 0),
        }
    }

    pub fn percentage(&self) -> f64 {
        self.lines.percentage()
    }

    pub fn status(&self) -> Option<CoverageStatus> {
        CoverageStatus::from_lines(self.lines.missed, self.lines.covered)
    }

    /// Whether this method belongs in a gap list.
    pub fn is_gap(&self) -> bool {
        matches!(
            self.status(),
            Some(CoverageStatus::Uncovered | CoverageStatus::PartiallyCovered)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCoverage {
    pub package: String,
    pub class: String,
    pub source_file: String,
    /// Only methods that are not fully covered
    pub methods: Vec<MethodCoverage>,
    pub total_lines: u64,
    pub covered_lines: u64,
    pub missed_lines: u64,
}

impl ClassCoverage {
    pub fn new(package: String, class: String, source_file: String) -> Self {
        Self {
            package,
            class,
            source_file,
            methods: Vec::new(),
            total_lines: 0,
            covered_lines: 0,
            missed_lines: 0,
        }
    }

    /// Fold a method into the class totals, keeping it only if it is a gap.
    pub fn add_method(&mut self, method: MethodCoverage) {
        self.total_lines += method.lines.total();
        self.covered_lines += method.lines.covered;
        self.missed_lines += method.lines.missed;
        if method.is_gap() {
            self.methods.push(method);
        }
    }

    pub fn percentage(&self) -> f64 {
        percentage(self.missed_lines, self.covered_lines)
    }

    /// `None` for classes without lines. A partially covered class must also
    /// retain at least one gap method.
    pub fn status(&self) -> Option<CoverageStatus> {
        match CoverageStatus::from_lines(self.missed_lines, self.covered_lines)? {
            CoverageStatus::PartiallyCovered if self.methods.is_empty() => {
                Some(CoverageStatus::Covered)
            }
            status => Some(status),
        }
    }
}

/// Root of a parsed hierarchical report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Report-level counters, at most one per kind
    pub counters: Vec<CoverageCounter>,
    pub classes: Vec<ClassCoverage>,
}

impl CoverageReport {
    pub fn counter(&self, kind: CounterKind) -> Option<&CoverageCounter> {
        self.counters.iter().find(|c| c.kind == kind)
    }

    /// Line totals re-derived by summing the parsed classes.
    ///
    /// Constructors and static initializers are excluded from class sums but
    /// counted by the report-level LINE counter, so the two agree only when the
    /// report has no such methods with lines.
    pub fn class_line_totals(&self) -> CoverageCounter {
        let (missed, covered) = self
            .classes
            .iter()
            .fold((0, 0), |(m, c), class| (m + class.missed_lines, c + class.covered_lines));
        CoverageCounter::new(CounterKind::Line, missed, covered)
    }

    /// Report-level statistics, taken straight from the root counters.
    pub fn total_coverage(&self) -> TotalCoverage {
        let summary = |kind: CounterKind| {
            self.counter(kind)
                .filter(|c| c.total() > 0)
                .map(CoverageCounter::summary)
        };
        let line_coverage = summary(CounterKind::Line);
        TotalCoverage {
            instruction_coverage: summary(CounterKind::Instruction),
            branch_coverage: summary(CounterKind::Branch),
            method_coverage: summary(CounterKind::Method),
            class_coverage: summary(CounterKind::Class),
            assessment: line_coverage.map(|line| assess(line.percentage)),
            line_coverage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalCoverage {
    pub instruction_coverage: Option<CounterSummary>,
    pub branch_coverage: Option<CounterSummary>,
    pub line_coverage: Option<CounterSummary>,
    pub method_coverage: Option<CounterSummary>,
    pub class_coverage: Option<CounterSummary>,
    pub assessment: Option<String>,
}

/// One-line verdict for a line coverage percentage.
pub fn assess(line_percentage: f64) -> String {
    if line_percentage >= 80.0 {
        format!("EXCELLENT: {}% line coverage", line_percentage)
    } else if line_percentage >= 60.0 {
        format!("GOOD: {}% line coverage - aim for 80%", line_percentage)
    } else if line_percentage >= 40.0 {
        format!("FAIR: {}% line coverage - needs improvement", line_percentage)
    } else {
        format!("POOR: {}% line coverage - critical gap", line_percentage)
    }
}

/// Where the hierarchical report was found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportLocation {
    pub found: bool,
    pub path: Option<PathBuf>,
    pub relative_path: Option<PathBuf>,
    pub size_bytes: Option<u64>,
    pub expected_path: PathBuf,
}

/// Find the JaCoCo XML report: the configured path first, then the first
/// `jacoco.xml` anywhere under `target/`. Unreadable directories are skipped,
/// so a missing report is reported as `found: false` rather than an error.
pub fn locate_report(config: &Config) -> ReportLocation {
    let root = &config.project.root;
    let expected = config.report_path(&config.reports.jacoco_xml);

    let found = if expected.is_file() {
        Some(expected.clone())
    } else {
        let target = root.join("target");
        walkdir::WalkDir::new(&target)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .find(|entry| entry.file_type().is_file() && entry.file_name() == "jacoco.xml")
            .map(|entry| entry.into_path())
    };

    let Some(path) = found else {
        tracing::debug!("No JaCoCo report under {}", root.display());
        return ReportLocation {
            found: false,
            path: None,
            relative_path: None,
            size_bytes: None,
            expected_path: expected,
        };
    };

    let size_bytes = std::fs::metadata(&path).ok().map(|m| m.len());
    ReportLocation {
        found: true,
        relative_path: path.strip_prefix(root).ok().map(PathBuf::from),
        path: Some(path),
        size_bytes,
        expected_path: expected,
    }
}
