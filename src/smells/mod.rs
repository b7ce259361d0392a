//! Heuristic code smell detection.
//!
//! A single forward pass over the physical lines of one file. Method spans are
//! tracked by a two-state machine driven by brace counts; every other check looks
//! at one line (or one line and its successor) in isolation.

use crate::config::SmellConfig;
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Literals of two or more digits; `0`, `1` and `-1` can never match.
static MAGIC_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{2,}\b").expect("valid magic number pattern"));

const STRUCTURAL_KEYWORDS: &[&str] = &[
    "public",
    "private",
    "protected",
    "class",
    "if",
    "for",
    "while",
];

const CONTROL_KEYWORDS: &[&str] = &["if", "for", "while"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmellKind {
    #[serde(rename = "Long Method")]
    LongMethod,
    #[serde(rename = "Magic Number")]
    MagicNumber,
    #[serde(rename = "Long Parameter List")]
    LongParameterList,
    #[serde(rename = "Deep Nesting")]
    DeepNesting,
    #[serde(rename = "Commented Code")]
    CommentedCode,
    #[serde(rename = "Empty Catch Block")]
    EmptyCatchBlock,
}

impl std::fmt::Display for SmellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LongMethod => write!(f, "Long Method"),
            Self::MagicNumber => write!(f, "Magic Number"),
            Self::LongParameterList => write!(f, "Long Parameter List"),
            Self::DeepNesting => write!(f, "Deep Nesting"),
            Self::CommentedCode => write!(f, "Commented Code"),
            Self::EmptyCatchBlock => write!(f, "Empty Catch Block"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSmell {
    #[serde(rename = "type")]
    pub kind: SmellKind,
    pub severity: Severity,
    /// 1-based
    pub line: usize,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmellReport {
    pub file: String,
    pub total_smells: usize,
    pub by_severity: SeverityCounts,
    pub smells: Vec<CodeSmell>,
}

/// Method span tracking state.
#[derive(Debug)]
enum MethodState {
    Outside,
    Inside {
        start_line: usize,
        name: String,
        balance: i64,
    },
}

/// Scan a file on disk.
pub fn detect_file(path: &Path, config: &SmellConfig) -> Result<SmellReport> {
    if !path.is_file() {
        return Err(Error::not_found("Source file", path));
    }
    let code = std::fs::read_to_string(path)
        .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;

    let smells = detect(&code, config);
    tracing::debug!("{} smells in {}", smells.len(), path.display());
    Ok(SmellReport::new(path.display().to_string(), smells))
}

impl SmellReport {
    pub fn new(file: String, smells: Vec<CodeSmell>) -> Self {
        let mut by_severity = SeverityCounts::default();
        for smell in &smells {
            match smell.severity {
                Severity::High => by_severity.high += 1,
                Severity::Medium => by_severity.medium += 1,
                Severity::Low => by_severity.low += 1,
            }
        }
        Self {
            file,
            total_smells: smells.len(),
            by_severity,
            smells,
        }
    }
}

fn count_char(s: &str, c: char) -> i64 {
    s.matches(c).count() as i64
}

/// Scan source text, returning findings in discovery order.
pub fn detect(code: &str, config: &SmellConfig) -> Vec<CodeSmell> {
    let lines: Vec<&str> = code.split('\n').collect();
    let mut smells = Vec::new();
    let mut state = MethodState::Outside;

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let stripped = line.trim();

        state = match state {
            _ if is_method_header(stripped) => MethodState::Inside {
                start_line: line_no,
                name: method_name_guess(stripped),
                balance: 1,
            },
            MethodState::Inside {
                start_line,
                name,
                balance,
            } => {
                let balance = balance + count_char(stripped, '{') - count_char(stripped, '}');
                if balance == 0 {
                    let length = line_no - start_line;
                    if length > config.long_method_lines {
                        smells.push(CodeSmell {
                            kind: SmellKind::LongMethod,
                            severity: Severity::Medium,
                            line: start_line,
                            message: format!(
                                "Method '{}' is {} lines long (>{} lines)",
                                name, length, config.long_method_lines
                            ),
                            suggestion: "Consider breaking this method into smaller, focused methods"
                                .to_string(),
                        });
                    }
                    MethodState::Outside
                } else {
                    MethodState::Inside {
                        start_line,
                        name,
                        balance,
                    }
                }
            }
            MethodState::Outside => MethodState::Outside,
        };

        if !stripped.is_empty() && !stripped.starts_with("//") {
            let numbers = magic_numbers(stripped);
            if !numbers.is_empty() {
                smells.push(CodeSmell {
                    kind: SmellKind::MagicNumber,
                    severity: Severity::Low,
                    line: line_no,
                    message: format!("Magic number(s) found: {}", numbers.join(", ")),
                    suggestion: "Replace magic numbers with named constants".to_string(),
                });
            }
        }

        if let Some(commas) = parenthesized_commas(stripped) {
            if commas > config.max_commas {
                smells.push(CodeSmell {
                    kind: SmellKind::LongParameterList,
                    severity: Severity::Medium,
                    line: line_no,
                    message: format!(
                        "Method has {} parameters (>{})",
                        commas + 1,
                        config.max_commas + 1
                    ),
                    suggestion: "Consider using a parameter object or builder pattern".to_string(),
                });
            }
        }

        let indent_level = (line.len() - line.trim_start().len()) / 4;
        if indent_level > config.max_nesting && contains_any(stripped, CONTROL_KEYWORDS) {
            smells.push(CodeSmell {
                kind: SmellKind::DeepNesting,
                severity: Severity::High,
                line: line_no,
                message: format!("Deep nesting detected (level {})", indent_level),
                suggestion: "Extract nested logic into separate methods or use early returns"
                    .to_string(),
            });
        }

        if stripped.starts_with("//") && contains_any(stripped, STRUCTURAL_KEYWORDS) {
            smells.push(CodeSmell {
                kind: SmellKind::CommentedCode,
                severity: Severity::Low,
                line: line_no,
                message: "Commented-out code detected".to_string(),
                suggestion: "Remove commented code (use version control instead)".to_string(),
            });
        }

        let next_closes = lines.get(idx + 1).is_some_and(|next| next.trim() == "}");
        if stripped.contains("catch") && next_closes {
            smells.push(CodeSmell {
                kind: SmellKind::EmptyCatchBlock,
                severity: Severity::High,
                line: line_no,
                message: "Empty catch block - silently swallowing exceptions".to_string(),
                suggestion: "At minimum, log the exception or rethrow as RuntimeException"
                    .to_string(),
            });
        }
    }

    smells
}

fn is_method_header(stripped: &str) -> bool {
    stripped.contains('(') && stripped.contains(')') && stripped.contains('{')
}

/// Last whitespace-separated token before the first `(`.
fn method_name_guess(stripped: &str) -> String {
    stripped
        .split('(')
        .next()
        .and_then(|head| head.split_whitespace().last())
        .unwrap_or_default()
        .to_string()
}

fn magic_numbers(stripped: &str) -> Vec<&str> {
    MAGIC_NUMBER_RE
        .find_iter(stripped)
        .map(|m| m.as_str())
        .collect()
}

/// Commas between the first `(` and the first `)` after it.
fn parenthesized_commas(stripped: &str) -> Option<usize> {
    let open = stripped.find('(')?;
    let close = open + stripped[open..].find(')')?;
    Some(stripped[open..close].matches(',').count())
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(code: &str) -> Vec<CodeSmell> {
        detect(code, &SmellConfig::default())
    }

    fn kinds(smells: &[CodeSmell]) -> Vec<SmellKind> {
        smells.iter().map(|s| s.kind).collect()
    }

    fn method_with_body(body_lines: usize) -> String {
        let mut code = String::from("public class Big {\n    public void work() {\n");
        for _ in 0..body_lines {
            code.push_str("        step();\n");
        }
        code.push_str("    }\n}\n");
        code
    }

    // =========================================================================
    // Long method tests
    // =========================================================================

    #[test]
    fn test_long_method_reported_once_at_opening_line() {
        // Opening brace on line 2, closing brace 60 lines later
        let code = method_with_body(59);
        let smells = scan(&code);
        let long: Vec<&CodeSmell> = smells
            .iter()
            .filter(|s| s.kind == SmellKind::LongMethod)
            .collect();

        assert_eq!(long.len(), 1);
        assert_eq!(long[0].line, 2);
        assert_eq!(long[0].severity, Severity::Medium);
        assert_eq!(long[0].message, "Method 'work' is 60 lines long (>50 lines)");
    }

    #[test]
    fn test_short_method_not_reported() {
        // Header on line 2, closing brace on line 52: exactly 50 lines
        let smells = scan(&method_with_body(49));
        assert!(!kinds(&smells).contains(&SmellKind::LongMethod));
    }

    #[test]
    fn test_method_one_line_over_limit_reported() {
        let smells = scan(&method_with_body(50));
        let long: Vec<&CodeSmell> = smells
            .iter()
            .filter(|s| s.kind == SmellKind::LongMethod)
            .collect();
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].message, "Method 'work' is 51 lines long (>50 lines)");
    }

    #[test]
    fn test_nested_braces_keep_method_open() {
        let mut code = String::from("void run() {\n    while (true) {\n");
        for _ in 0..55 {
            code.push_str("        tick();\n");
        }
        code.push_str("    }\n}\n");
        let smells = scan(&code);
        // The while header restarts the span at line 2, closing at line 58
        let long: Vec<&CodeSmell> = smells
            .iter()
            .filter(|s| s.kind == SmellKind::LongMethod)
            .collect();
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].line, 2);
        assert!(long[0].message.starts_with("Method 'while'"));
    }

    #[test]
    fn test_method_name_guess() {
        assert_eq!(method_name_guess("public int add(int a, int b) {"), "add");
        assert_eq!(method_name_guess("(x) -> {"), "");
    }

    // =========================================================================
    // Magic number tests
    // =========================================================================

    #[test]
    fn test_magic_number() {
        let smells = scan("int x = 42;");
        assert_eq!(kinds(&smells), vec![SmellKind::MagicNumber]);
        assert_eq!(smells[0].message, "Magic number(s) found: 42");
        assert_eq!(smells[0].line, 1);
        assert_eq!(smells[0].severity, Severity::Low);
    }

    #[test]
    fn test_small_literals_are_not_magic() {
        assert!(scan("int x = 1;").is_empty());
        assert!(scan("int y = -1;").is_empty());
        assert!(scan("int z = 0;").is_empty());
        assert!(scan("int w = 7;").is_empty());
    }

    #[test]
    fn test_magic_numbers_listed_together() {
        let smells = scan("timeout = 300 * 1000;");
        assert_eq!(smells.len(), 1);
        assert_eq!(smells[0].message, "Magic number(s) found: 300, 1000");
    }

    #[test]
    fn test_magic_numbers_ignored_in_comments() {
        let smells = scan("// retry 42 times");
        assert!(!kinds(&smells).contains(&SmellKind::MagicNumber));
    }

    // =========================================================================
    // Per-line structural checks
    // =========================================================================

    #[test]
    fn test_long_parameter_list() {
        let smells = scan("call(a, b, c, d, e, f);");
        assert_eq!(kinds(&smells), vec![SmellKind::LongParameterList]);
        assert_eq!(smells[0].message, "Method has 6 parameters (>5)");

        assert!(scan("call(a, b, c, d, e);").is_empty());
    }

    #[test]
    fn test_deep_nesting() {
        let smells = scan("                if (ready) run();");
        assert_eq!(kinds(&smells), vec![SmellKind::DeepNesting]);
        assert_eq!(smells[0].message, "Deep nesting detected (level 4)");
        assert_eq!(smells[0].severity, Severity::High);

        assert!(scan("            if (ready) run();").is_empty());
    }

    #[test]
    fn test_commented_code() {
        let smells = scan("// if (debug) log();");
        assert_eq!(kinds(&smells), vec![SmellKind::CommentedCode]);

        assert!(scan("// just a note").is_empty());
    }

    #[test]
    fn test_empty_catch_block() {
        let code = "try {\n    risky();\n} catch (Exception e) {\n}\n";
        let smells = scan(code);
        let catches: Vec<&CodeSmell> = smells
            .iter()
            .filter(|s| s.kind == SmellKind::EmptyCatchBlock)
            .collect();
        assert_eq!(catches.len(), 1);
        assert_eq!(catches[0].line, 3);
    }

    #[test]
    fn test_catch_with_body_is_fine() {
        let code = "} catch (Exception e) {\n    log(e);\n}\n";
        let smells = scan(code);
        assert!(!kinds(&smells).contains(&SmellKind::EmptyCatchBlock));
    }

    // =========================================================================
    // Report tests
    // =========================================================================

    #[test]
    fn test_findings_in_line_order_with_counts() {
        let code = "int a = 42;\n// for (;;) {}\n                while (x) go();\n";
        let smells = scan(code);
        assert_eq!(
            kinds(&smells),
            vec![
                SmellKind::MagicNumber,
                SmellKind::CommentedCode,
                SmellKind::DeepNesting
            ]
        );

        let report = SmellReport::new("A.java".to_string(), smells);
        assert_eq!(report.total_smells, 3);
        assert_eq!(
            report.by_severity,
            SeverityCounts {
                high: 1,
                medium: 0,
                low: 2
            }
        );
    }

    #[test]
    fn test_smell_serializes_with_display_names() {
        let smell = CodeSmell {
            kind: SmellKind::EmptyCatchBlock,
            severity: Severity::High,
            line: 3,
            message: String::new(),
            suggestion: String::new(),
        };
        let json = serde_json::to_value(&smell).unwrap();
        assert_eq!(json["type"], "Empty Catch Block");
        assert_eq!(json["severity"], "high");
    }

    #[test]
    fn test_detect_file_not_found() {
        let result = detect_file(Path::new("/missing/Foo.java"), &SmellConfig::default());
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }
}
