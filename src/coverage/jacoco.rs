//! Streaming parser for the JaCoCo XML report.

use super::{ClassCoverage, CounterKind, CoverageCounter, CoverageReport, MethodCoverage};
use crate::error::{Error, Result};
use crate::xml::attribute_value;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

const FORMAT: &str = "JaCoCo XML";

/// Method names that never take part in gap analysis.
const SKIPPED_METHODS: &[&str] = &["<init>", "<clinit>"];

/// Elements whose counters matter, tracked as an open-element stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Report,
    Package,
    Class,
    Method,
    Other,
}

/// Parse a JaCoCo XML report from disk.
pub fn parse_report_file(path: &Path) -> Result<CoverageReport> {
    if !path.is_file() {
        return Err(Error::not_found("JaCoCo file", path));
    }
    let bytes = std::fs::read(path)
        .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;
    let report = parse_report(&bytes)?;
    tracing::info!(
        "Parsed {} classes from {}",
        report.classes.len(),
        path.display()
    );
    Ok(report)
}

/// Parse JaCoCo XML content.
///
/// Method-level INSTRUCTION and LINE counters feed each class; constructors and
/// static initializers are skipped. Report-level counters are read only from
/// direct children of `<report>`.
pub fn parse_report(bytes: &[u8]) -> Result<CoverageReport> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut report = CoverageReport::default();
    let mut saw_report = false;
    let mut scopes: Vec<Scope> = Vec::new();
    let mut package = String::new();
    let mut class: Option<ClassCoverage> = None;
    let mut method: Option<MethodCoverage> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(tag)) => {
                let scope = open_element(&tag, &mut package, &mut class, &mut method)?;
                saw_report |= scope == Scope::Report;
                scopes.push(scope);
            }
            Ok(Event::Empty(tag)) => match tag.name().as_ref() {
                b"counter" => {
                    if let Some(counter) = parse_counter(&tag)? {
                        match scopes.last() {
                            Some(Scope::Report) => set_counter(&mut report.counters, counter),
                            Some(Scope::Method) => {
                                if let Some(m) = method.as_mut() {
                                    apply_method_counter(m, counter);
                                }
                            }
                            _ => {}
                        }
                    }
                }
                b"class" => {
                    // A class without methods contributes no lines
                    let scope = open_element(&tag, &mut package, &mut class, &mut method)?;
                    if scope == Scope::Class {
                        if let Some(c) = class.take() {
                            report.classes.push(c);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::End(_)) => match scopes.pop() {
                Some(Scope::Method) => {
                    if let (Some(c), Some(m)) = (class.as_mut(), method.take()) {
                        c.add_method(m);
                    }
                }
                Some(Scope::Class) => {
                    if let Some(c) = class.take() {
                        report.classes.push(c);
                    }
                }
                Some(Scope::Package) => package.clear(),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(Error::parse(
                    FORMAT,
                    format!(
                        "error at position {}: {}",
                        reader.buffer_position(),
                        err
                    ),
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_report {
        return Err(Error::parse(FORMAT, "missing <report> root element"));
    }

    Ok(report)
}

fn open_element(
    tag: &BytesStart<'_>,
    package: &mut String,
    class: &mut Option<ClassCoverage>,
    method: &mut Option<MethodCoverage>,
) -> Result<Scope> {
    let scope = match tag.name().as_ref() {
        b"report" => Scope::Report,
        b"package" => {
            *package = attribute_value(tag, b"name")
                .unwrap_or_default()
                .replace('/', ".");
            Scope::Package
        }
        b"class" => {
            let raw = attribute_value(tag, b"name").unwrap_or_default();
            *class = Some(ClassCoverage::new(
                package.clone(),
                outer_class_name(&raw),
                attribute_value(tag, b"sourcefilename").unwrap_or_default(),
            ));
            Scope::Class
        }
        b"method" => {
            let name = attribute_value(tag, b"name").unwrap_or_default();
            *method = if SKIPPED_METHODS.contains(&name.as_str()) {
                None
            } else {
                Some(MethodCoverage::new(
                    name,
                    attribute_value(tag, b"desc").unwrap_or_default(),
                ))
            };
            Scope::Method
        }
        _ => Scope::Other,
    };
    Ok(scope)
}

/// `com/example/Outer$Inner` → `com.example.Outer`.
fn outer_class_name(raw: &str) -> String {
    let dotted = raw.replace('/', ".");
    match dotted.split_once('$') {
        Some((outer, _)) => outer.to_string(),
        None => dotted,
    }
}

fn parse_counter(tag: &BytesStart<'_>) -> Result<Option<CoverageCounter>> {
    let Some(kind) = attribute_value(tag, b"type").and_then(|t| CounterKind::parse(&t)) else {
        return Ok(None);
    };
    let missed = count_attribute(tag, b"missed")?;
    let covered = count_attribute(tag, b"covered")?;
    Ok(Some(CoverageCounter::new(kind, missed, covered)))
}

fn count_attribute(tag: &BytesStart<'_>, name: &[u8]) -> Result<u64> {
    match attribute_value(tag, name) {
        None => Ok(0),
        Some(value) => value.trim().parse::<u64>().map_err(|e| {
            Error::parse(
                FORMAT,
                format!(
                    "invalid {} count '{}': {}",
                    String::from_utf8_lossy(name),
                    value,
                    e
                ),
            )
        }),
    }
}

fn set_counter(counters: &mut Vec<CoverageCounter>, counter: CoverageCounter) {
    match counters.iter_mut().find(|c| c.kind == counter.kind) {
        Some(existing) => *existing = counter,
        None => counters.push(counter),
    }
}

fn apply_method_counter(method: &mut MethodCoverage, counter: CoverageCounter) {
    match counter.kind {
        CounterKind::Line => method.lines = counter,
        CounterKind::Instruction => method.instructions = counter,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::CoverageStatus;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<!DOCTYPE report PUBLIC "-//JACOCO//DTD Report 1.1//EN" "report.dtd">
<report name="codebase">
  <sessioninfo id="host-1" start="1" dump="2"/>
  <package name="com/example">
    <class name="com/example/Calculator" sourcefilename="Calculator.java">
      <method name="&lt;init&gt;" desc="()V" line="3">
        <counter type="INSTRUCTION" missed="3" covered="0"/>
        <counter type="LINE" missed="1" covered="0"/>
      </method>
      <method name="add" desc="(II)I" line="5">
        <counter type="INSTRUCTION" missed="0" covered="4"/>
        <counter type="LINE" missed="0" covered="1"/>
        <counter type="METHOD" missed="0" covered="1"/>
      </method>
      <method name="divide" desc="(II)I" line="9">
        <counter type="INSTRUCTION" missed="6" covered="4"/>
        <counter type="BRANCH" missed="1" covered="1"/>
        <counter type="LINE" missed="2" covered="2"/>
      </method>
      <counter type="LINE" missed="3" covered="3"/>
    </class>
    <class name="com/example/Untested" sourcefilename="Untested.java">
      <method name="run" desc="()V" line="4">
        <counter type="INSTRUCTION" missed="12" covered="0"/>
        <counter type="LINE" missed="10" covered="0"/>
      </method>
    </class>
    <class name="com/example/Done" sourcefilename="Done.java">
      <method name="ok" desc="()Z" line="4">
        <counter type="LINE" missed="0" covered="20"/>
      </method>
    </class>
    <sourcefile name="Calculator.java">
      <line nr="5" mi="0" ci="4" mb="0" cb="0"/>
      <counter type="LINE" missed="99" covered="99"/>
    </sourcefile>
    <counter type="LINE" missed="13" covered="23"/>
  </package>
  <counter type="INSTRUCTION" missed="21" covered="8"/>
  <counter type="BRANCH" missed="1" covered="1"/>
  <counter type="LINE" missed="13" covered="23"/>
  <counter type="METHOD" missed="2" covered="2"/>
  <counter type="CLASS" missed="1" covered="2"/>
</report>
"#;

    fn parse(xml: &str) -> CoverageReport {
        parse_report(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_classes_and_methods() {
        let report = parse(REPORT);
        assert_eq!(report.classes.len(), 3);

        let calc = &report.classes[0];
        assert_eq!(calc.package, "com.example");
        assert_eq!(calc.class, "com.example.Calculator");
        assert_eq!(calc.source_file, "Calculator.java");
        // <init> skipped, add fully covered, divide partial
        assert_eq!(calc.total_lines, 5);
        assert_eq!(calc.covered_lines, 3);
        assert_eq!(calc.missed_lines, 2);
        assert_eq!(calc.methods.len(), 1);
        assert_eq!(calc.methods[0].name, "divide");
        assert_eq!(calc.methods[0].descriptor, "(II)I");
        assert_eq!(calc.methods[0].instructions.missed, 6);
        assert_eq!(calc.methods[0].percentage(), 50.0);
        assert_eq!(calc.status(), Some(CoverageStatus::PartiallyCovered));
    }

    #[test]
    fn test_parse_uncovered_and_covered_classes() {
        let report = parse(REPORT);

        let untested = &report.classes[1];
        assert_eq!(untested.percentage(), 0.0);
        assert_eq!(untested.status(), Some(CoverageStatus::Uncovered));
        assert_eq!(untested.missed_lines, 10);

        let done = &report.classes[2];
        assert_eq!(done.percentage(), 100.0);
        assert_eq!(done.status(), Some(CoverageStatus::Covered));
        assert!(done.methods.is_empty());
    }

    #[test]
    fn test_parse_root_counters_only_from_report() {
        let report = parse(REPORT);
        assert_eq!(report.counters.len(), 5);
        let line = report.counter(CounterKind::Line).unwrap();
        assert_eq!((line.missed, line.covered), (13, 23));
        let class = report.counter(CounterKind::Class).unwrap();
        assert_eq!((class.missed, class.covered), (1, 2));
    }

    #[test]
    fn test_root_totals_include_constructor_lines() {
        let report = parse(REPORT);
        let from_classes = report.class_line_totals();
        let from_root = report.counter(CounterKind::Line).unwrap();
        // The skipped <init> line shows up only in the root counter
        assert_eq!(from_classes.missed + 1, from_root.missed);
        assert_eq!(from_classes.covered, from_root.covered);
    }

    #[test]
    fn test_root_totals_agree_without_constructors() {
        let xml = r#"<report name="r">
  <package name="p">
    <class name="p/A" sourcefilename="A.java">
      <method name="a" desc="()V"><counter type="LINE" missed="2" covered="3"/></method>
    </class>
    <class name="p/B" sourcefilename="B.java">
      <method name="b" desc="()V"><counter type="LINE" missed="1" covered="0"/></method>
    </class>
  </package>
  <counter type="LINE" missed="3" covered="3"/>
</report>"#;
        let report = parse(xml);
        let from_root = *report.counter(CounterKind::Line).unwrap();
        assert_eq!(report.class_line_totals(), from_root);
    }

    #[test]
    fn test_inner_class_name_is_collapsed() {
        assert_eq!(outer_class_name("com/example/Outer$Inner"), "com.example.Outer");
        assert_eq!(outer_class_name("com/example/Plain"), "com.example.Plain");
    }

    #[test]
    fn test_empty_class_element() {
        let xml = r#"<report name="r"><package name="p"><class name="p/Empty" sourcefilename="Empty.java"/></package></report>"#;
        let report = parse(xml);
        assert_eq!(report.classes.len(), 1);
        assert_eq!(report.classes[0].status(), None);
    }

    #[test]
    fn test_missing_attributes_default_to_zero() {
        let xml = r#"<report name="r"><package name="p"><class name="p/A"><method name="m"><counter type="LINE" covered="4"/></method></class></package></report>"#;
        let report = parse(xml);
        assert_eq!(report.classes[0].source_file, "");
        assert_eq!(report.classes[0].covered_lines, 4);
        assert_eq!(report.classes[0].missed_lines, 0);
    }

    #[test]
    fn test_invalid_count_is_parse_failure() {
        let xml = r#"<report name="r"><counter type="LINE" missed="many" covered="1"/></report>"#;
        let result = parse_report(xml.as_bytes());
        assert!(matches!(result, Err(Error::ParseFailure { .. })));
    }

    #[test]
    fn test_missing_report_root_is_parse_failure() {
        let result = parse_report(b"<coverage line-rate=\"0.5\"></coverage>");
        assert!(matches!(result, Err(Error::ParseFailure { .. })));
    }

    #[test]
    fn test_malformed_xml_is_parse_failure() {
        let result = parse_report(b"<report><package name=\"p\"></report>");
        assert!(matches!(result, Err(Error::ParseFailure { .. })));
    }

    #[test]
    fn test_parse_report_file_not_found() {
        let result = parse_report_file(Path::new("/definitely/missing/jacoco.xml"));
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_parse_report_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", REPORT).unwrap();
        let report = parse_report_file(file.path()).unwrap();
        assert_eq!(report.classes.len(), 3);
    }
}
