//! Surefire `TEST-*.xml` failure and error extraction.

use super::truncate_chars;
use crate::xml::attribute_value;
use crate::config::Config;
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const FORMAT: &str = "Surefire XML";
const REPORT_PATTERN: &str = "TEST-*.xml";

const RECOMMENDATIONS: &[&str] = &[
    "Fix compilation errors first (check errors list)",
    "Then fix assertion failures (check failures list)",
    "Common issues: NullPointerException, AssertionError, IllegalArgumentException",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProblemKind {
    Failure,
    Error,
}

/// One failed or errored test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestProblem {
    pub class: String,
    pub test: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub message: Option<String>,
    /// Stack trace text, truncated
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSummary {
    pub total_failures: usize,
    pub total_errors: usize,
    pub failures: Vec<TestProblem>,
    pub errors: Vec<TestProblem>,
    pub files_skipped: usize,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Default)]
struct ParsedSuite {
    failures: Vec<TestProblem>,
    errors: Vec<TestProblem>,
}

/// Summarize every Surefire report of the configured project.
pub fn summarize_failures(config: &Config) -> Result<FailureSummary> {
    let dir = config.report_path(&config.reports.surefire_dir);
    summarize_dir(&dir, config.tools.max_detail_chars, config.tools.max_listed)
}

/// Summarize the `TEST-*.xml` files of one directory.
///
/// Unreadable or malformed files are skipped with a warning.
pub fn summarize_dir(
    dir: &Path,
    max_detail_chars: usize,
    max_listed: usize,
) -> Result<FailureSummary> {
    if !dir.is_dir() {
        return Err(Error::not_found("Surefire reports", dir));
    }

    let mut failures = Vec::new();
    let mut errors = Vec::new();
    let mut files_skipped = 0;

    for path in report_files(dir)? {
        let parsed = std::fs::read(&path)
            .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))
            .and_then(|bytes| parse_suite(&bytes, max_detail_chars));
        match parsed {
            Ok(suite) => {
                failures.extend(suite.failures);
                errors.extend(suite.errors);
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                files_skipped += 1;
            }
        }
    }

    tracing::info!(
        "Found {} failures and {} errors in {}",
        failures.len(),
        errors.len(),
        dir.display()
    );

    let total_failures = failures.len();
    let total_errors = errors.len();
    failures.truncate(max_listed);
    errors.truncate(max_listed);

    Ok(FailureSummary {
        total_failures,
        total_errors,
        failures,
        errors,
        files_skipped,
        recommendations: RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
    })
}

fn report_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::io(format!("Failed to list {}", dir.display()), e))?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| glob_match::glob_match(REPORT_PATTERN, name))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// The `<testcase>` currently open.
struct OpenCase {
    class: String,
    test: String,
    saw_failure: bool,
    saw_error: bool,
    /// Elements open beneath the test case
    depth: usize,
}

/// A `<failure>` or `<error>` whose detail text is being collected.
struct OpenProblem {
    kind: ProblemKind,
    problem: TestProblem,
}

fn parse_suite(bytes: &[u8], max_detail_chars: usize) -> Result<ParsedSuite> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut suite = ParsedSuite::default();
    let mut case: Option<OpenCase> = None;
    let mut open: Option<OpenProblem> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(tag)) => {
                if tag.name().as_ref() == b"testcase" {
                    case = Some(OpenCase::new(&tag));
                } else if let Some(c) = case.as_mut() {
                    c.depth += 1;
                    if c.depth == 1 {
                        open = c.start_problem(&tag);
                    }
                }
            }
            Ok(Event::Empty(tag)) => {
                if let Some(c) = case.as_mut().filter(|c| c.depth == 0) {
                    if let Some(p) = c.start_problem(&tag) {
                        push_problem(&mut suite, p, max_detail_chars);
                    }
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(p) = open.as_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| Error::parse(FORMAT, e.to_string()))?;
                    p.problem.detail.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(p) = open.as_mut() {
                    p.problem
                        .detail
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::End(tag)) => {
                if tag.name().as_ref() == b"testcase" {
                    case = None;
                } else if let Some(c) = case.as_mut() {
                    if c.depth == 1 {
                        if let Some(p) = open.take() {
                            push_problem(&mut suite, p, max_detail_chars);
                        }
                    }
                    c.depth = c.depth.saturating_sub(1);
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(Error::parse(
                    FORMAT,
                    format!("error at position {}: {}", reader.buffer_position(), err),
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(suite)
}

impl OpenCase {
    fn new(tag: &BytesStart<'_>) -> Self {
        Self {
            class: attribute_value(tag, b"classname").unwrap_or_default(),
            test: attribute_value(tag, b"name").unwrap_or_default(),
            saw_failure: false,
            saw_error: false,
            depth: 0,
        }
    }

    /// Only the first `<failure>` and first `<error>` of a test case count.
    fn start_problem(&mut self, tag: &BytesStart<'_>) -> Option<OpenProblem> {
        let kind = match tag.name().as_ref() {
            b"failure" if !self.saw_failure => {
                self.saw_failure = true;
                ProblemKind::Failure
            }
            b"error" if !self.saw_error => {
                self.saw_error = true;
                ProblemKind::Error
            }
            _ => return None,
        };
        Some(OpenProblem {
            kind,
            problem: TestProblem {
                class: self.class.clone(),
                test: self.test.clone(),
                kind: attribute_value(tag, b"type"),
                message: attribute_value(tag, b"message"),
                detail: String::new(),
            },
        })
    }
}

fn push_problem(suite: &mut ParsedSuite, open: OpenProblem, max_detail_chars: usize) {
    let mut problem = open.problem;
    problem.detail = truncate_chars(&problem.detail, max_detail_chars);
    match open.kind {
        ProblemKind::Failure => suite.failures.push(problem),
        ProblemKind::Error => suite.errors.push(problem),
    }
}
