//! SpotBugs XML (`spotbugsXml.xml`) finding extraction.

use crate::error::{Error, Result};
use crate::xml::attribute_value;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::path::Path;

const FORMAT: &str = "SpotBugs XML";
const NO_MESSAGE: &str = "No message";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugFinding {
    #[serde(rename = "type")]
    pub bug_type: Option<String>,
    /// "1" high, "2" medium, "3" low
    pub priority: Option<String>,
    pub category: Option<String>,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugSummary {
    pub total_issues: usize,
    pub high_priority: usize,
    pub medium_priority: usize,
    pub low_priority: usize,
    pub findings: Vec<BugFinding>,
    pub high_priority_details: Vec<BugFinding>,
    pub summary: String,
}

impl BugFinding {
    fn has_priority(&self, level: &str) -> bool {
        self.priority.as_deref() == Some(level)
    }
}

impl BugSummary {
    pub fn new(findings: Vec<BugFinding>, max_listed: usize) -> Self {
        let count = |level: &str| findings.iter().filter(|f| f.has_priority(level)).count();
        let high_priority = count("1");
        let medium_priority = count("2");
        let low_priority = count("3");

        let high_priority_details = findings
            .iter()
            .filter(|f| f.has_priority("1"))
            .take(max_listed)
            .cloned()
            .collect();

        Self {
            total_issues: findings.len(),
            summary: format!(
                "Found {} issues: {} high, {} medium, {} low priority",
                findings.len(),
                high_priority,
                medium_priority,
                low_priority
            ),
            high_priority,
            medium_priority,
            low_priority,
            findings,
            high_priority_details,
        }
    }
}

/// Parse and summarize a SpotBugs report from disk.
pub fn parse_bug_report_file(path: &Path, max_listed: usize) -> Result<BugSummary> {
    if !path.is_file() {
        return Err(Error::not_found("SpotBugs report", path));
    }
    let bytes = std::fs::read(path)
        .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;
    let findings = parse_bug_report(&bytes)?;
    tracing::info!("Parsed {} SpotBugs findings", findings.len());
    Ok(BugSummary::new(findings, max_listed))
}

/// Extract every `BugInstance`, in document order.
pub fn parse_bug_report(bytes: &[u8]) -> Result<Vec<BugFinding>> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut findings = Vec::new();
    let mut current: Option<BugFinding> = None;
    let mut in_long_message = false;
    // Set by the first SourceLine of the open instance
    let mut located = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(tag)) => match tag.name().as_ref() {
                b"BugInstance" => {
                    current = Some(start_finding(&tag));
                    located = false;
                }
                b"LongMessage" => in_long_message = current.is_some(),
                b"SourceLine" => locate(current.as_mut(), &mut located, &tag),
                _ => {}
            },
            Ok(Event::Empty(tag)) => match tag.name().as_ref() {
                b"BugInstance" => findings.push(start_finding(&tag)),
                b"SourceLine" => locate(current.as_mut(), &mut located, &tag),
                _ => {}
            },
            Ok(Event::Text(text)) if in_long_message => {
                if let Some(finding) = current.as_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| Error::parse(FORMAT, e.to_string()))?;
                    if finding.message == NO_MESSAGE {
                        finding.message.clear();
                    }
                    finding.message.push_str(&text);
                }
            }
            Ok(Event::End(tag)) => match tag.name().as_ref() {
                b"BugInstance" => findings.extend(current.take()),
                b"LongMessage" => in_long_message = false,
                _ => {}
            },
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

    Ok(findings)
}

fn start_finding(tag: &BytesStart<'_>) -> BugFinding {
    BugFinding {
        bug_type: attribute_value(tag, b"type"),
        priority: attribute_value(tag, b"priority"),
        category: attribute_value(tag, b"category"),
        message: NO_MESSAGE.to_string(),
        file: None,
        line: None,
    }
}

/// The first `SourceLine` anywhere inside the instance gives its location,
/// even when it lacks some of the attributes.
fn locate(finding: Option<&mut BugFinding>, located: &mut bool, tag: &BytesStart<'_>) {
    let Some(finding) = finding else {
        return;
    };
    if *located {
        return;
    }
    *located = true;
    finding.file = attribute_value(tag, b"sourcepath");
    finding.line = attribute_value(tag, b"start").and_then(|s| s.parse().ok());
}
