//! Smoke-test skeleton generation.
//!
//! This module provides functionality for:
//! - Rendering a JUnit 5 test class from an extracted [`SourceUnit`]
//! - Writing the rendered class next to the sources, mirrored into the test tree
//! - Generating tests for every source file that has none yet ([`batch`])
//!
//! Generated tests only call each method with placeholder arguments and assert
//! that a value came back; they check that nothing throws, not behavior.

pub mod batch;

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::language::{analyze_file, MethodSignature, SourceExtractor, SourceUnit};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

pub use batch::{generate_missing_tests, BatchSummary};

/// A rendered test class and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUnit {
    pub target_class: String,
    pub test_class: String,
    pub source: String,
    /// Root-relative destination, mirrored from the source path
    pub destination: String,
}

/// Outcome of generating one test file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedTest {
    pub success: bool,
    pub test_file: String,
    pub test_class: String,
    pub methods_tested: usize,
    pub message: String,
}

/// How a placeholder argument is chosen for a declared parameter type.
struct ArgumentRule {
    needles: &'static [&'static str],
    case_sensitive: bool,
    literal: &'static str,
}

impl ArgumentRule {
    fn matches(&self, ty: &str) -> bool {
        if self.case_sensitive {
            self.needles.iter().any(|needle| ty.contains(needle))
        } else {
            let lowered = ty.to_lowercase();
            self.needles.iter().any(|needle| lowered.contains(needle))
        }
    }
}

// Order matters: a type name can contain several needles ("Point" contains "int").
const ARGUMENT_RULES: &[ArgumentRule] = &[
    ArgumentRule {
        needles: &["int"],
        case_sensitive: false,
        literal: "1",
    },
    ArgumentRule {
        needles: &["double", "float"],
        case_sensitive: false,
        literal: "1.0",
    },
    ArgumentRule {
        needles: &["boolean"],
        case_sensitive: false,
        literal: "true",
    },
    ArgumentRule {
        needles: &["String"],
        case_sensitive: true,
        literal: "\"test\"",
    },
    ArgumentRule {
        needles: &["char"],
        case_sensitive: false,
        literal: "'a'",
    },
];

const NULL_LITERAL: &str = "null";

/// Placeholder literal for a parameter of the given declared type.
pub fn argument_literal(ty: &str) -> &'static str {
    ARGUMENT_RULES
        .iter()
        .find(|rule| rule.matches(ty))
        .map_or(NULL_LITERAL, |rule| rule.literal)
}

/// `test` followed by the method name with its first character upper-cased.
pub fn test_method_name(method: &str) -> String {
    let mut chars = method.chars();
    match chars.next() {
        Some(first) => format!("test{}{}", first.to_uppercase(), chars.as_str()),
        None => "test".to_string(),
    }
}

fn render_method(out: &mut String, method: &MethodSignature) {
    let args = method
        .parameters
        .iter()
        .map(|p| argument_literal(&p.ty))
        .collect::<Vec<_>>()
        .join(", ");

    let _ = write!(
        out,
        "\n    @Test\n    public void {}() {{\n        // Basic test for {}\n",
        test_method_name(&method.name),
        method.name
    );

    if method.returns_void() {
        let _ = write!(
            out,
            "        instance.{}({});\n        // If no exception thrown, test passes\n        assertTrue(true);\n    }}\n",
            method.name, args
        );
    } else {
        let _ = write!(
            out,
            "        {} result = instance.{}({});\n        assertNotNull(result);\n    }}\n",
            method.return_type, method.name, args
        );
    }
}

/// Render the test class for `unit`, destined for the mirror of `source_path`.
pub fn synthesize(unit: &SourceUnit, source_path: &str, project: &ProjectConfig) -> Result<TestUnit> {
    let class_name = unit.require_class_name()?;
    let test_class = format!("{}{}", class_name, project.test_suffix);

    let mut source = String::new();
    if !unit.package.is_empty() {
        let _ = writeln!(source, "package {};\n", unit.package);
    }
    let _ = write!(
        source,
        "import org.junit.jupiter.api.Test;\n\
         import org.junit.jupiter.api.BeforeEach;\n\
         import static org.junit.jupiter.api.Assertions.*;\n\
         \n\
         public class {test_class} {{\n\
         \n    private {class_name} instance;\n\
         \n    @BeforeEach\n    public void setUp() {{\n        instance = new {class_name}();\n    }}\n"
    );

    for method in &unit.methods {
        render_method(&mut source, method);
    }
    source.push_str("}\n");

    Ok(TestUnit {
        target_class: class_name.to_string(),
        test_class,
        source,
        destination: project.test_path_for(source_path),
    })
}

/// Write a test unit under `root`, creating directories and overwriting any
/// existing file at the destination.
pub fn write_test(root: &Path, test: &TestUnit) -> Result<()> {
    let full_path = root.join(&test.destination);

    if let Some(parent) = full_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::io(format!("Failed to create {}", parent.display()), e))?;
    }

    std::fs::write(&full_path, &test.source)
        .map_err(|e| Error::io(format!("Failed to write test file {}", full_path.display()), e))?;

    tracing::debug!("Wrote {}", full_path.display());
    Ok(())
}

/// A test file read back from the test tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFile {
    pub path: String,
    pub content: String,
    /// Newline-separated segments, so a trailing newline counts as one more line
    pub line_count: usize,
}

/// Read a root-relative test file.
pub fn read_test_file(root: &Path, relative: &str) -> Result<TestFile> {
    let full_path = root.join(relative);
    if !full_path.is_file() {
        return Err(Error::not_found("Test file", relative));
    }
    let content = std::fs::read_to_string(&full_path)
        .map_err(|e| Error::io(format!("Failed to read {}", full_path.display()), e))?;

    Ok(TestFile {
        path: relative.to_string(),
        line_count: content.split('\n').count(),
        content,
    })
}

/// Extract, render and write the test for one root-relative source file.
pub fn generate_test_file(
    extractor: &impl SourceExtractor,
    project: &ProjectConfig,
    source_path: &str,
) -> Result<GeneratedTest> {
    let unit = analyze_file(extractor, &project.root, source_path)?;
    let test = synthesize(&unit, source_path, project)?;
    write_test(&project.root, &test)?;

    let methods_tested = unit.method_count();
    tracing::info!(
        "Generated {} ({} tests) for {}",
        test.destination,
        methods_tested,
        source_path
    );

    Ok(GeneratedTest {
        success: true,
        message: format!("Generated {} tests for {}", methods_tested, test.target_class),
        test_file: test.destination,
        test_class: test.test_class,
        methods_tested,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{Parameter, PatternExtractor, Visibility};
    use tempfile::TempDir;

    fn method(return_type: &str, name: &str, params: &[(&str, &str)]) -> MethodSignature {
        MethodSignature {
            visibility: Visibility::Public,
            is_static: false,
            return_type: return_type.to_string(),
            name: name.to_string(),
            parameters: params
                .iter()
                .map(|(ty, name)| Parameter {
                    ty: ty.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            param_string: String::new(),
        }
    }

    fn calculator() -> SourceUnit {
        SourceUnit {
            package: "com.example".to_string(),
            class_name: "Calculator".to_string(),
            imports: vec![],
            methods: vec![
                method("int", "add", &[("int", "a"), ("int", "b")]),
                method("void", "reset", &[]),
            ],
        }
    }

    const SOURCE_PATH: &str = "src/main/java/com/example/Calculator.java";

    // =========================================================================
    // Argument selection tests
    // =========================================================================

    #[test]
    fn test_argument_literal_rules() {
        assert_eq!(argument_literal("int"), "1");
        assert_eq!(argument_literal("Integer"), "1");
        assert_eq!(argument_literal("double"), "1.0");
        assert_eq!(argument_literal("Float"), "1.0");
        assert_eq!(argument_literal("boolean"), "true");
        assert_eq!(argument_literal("String"), "\"test\"");
        assert_eq!(argument_literal("char"), "'a'");
        assert_eq!(argument_literal("List<Foo>"), "null");
        assert_eq!(argument_literal("long"), "null");
    }

    #[test]
    fn test_argument_literal_first_rule_wins() {
        // "Point" contains "int" and is checked before anything else
        assert_eq!(argument_literal("Point"), "1");
        // "String[]" only matches the String rule
        assert_eq!(argument_literal("String[]"), "\"test\"");
    }

    #[test]
    fn test_test_method_name() {
        assert_eq!(test_method_name("add"), "testAdd");
        assert_eq!(test_method_name("getValue"), "testGetValue");
        assert_eq!(test_method_name("x"), "testX");
    }

    // =========================================================================
    // Rendering tests
    // =========================================================================

    #[test]
    fn test_synthesize_non_void_method() {
        let test = synthesize(&calculator(), SOURCE_PATH, &ProjectConfig::default()).unwrap();
        assert!(test.source.contains("public void testAdd() {"));
        assert!(test.source.contains("int result = instance.add(1, 1);"));
        assert!(test.source.contains("assertNotNull(result);"));
    }

    #[test]
    fn test_synthesize_void_method() {
        let test = synthesize(&calculator(), SOURCE_PATH, &ProjectConfig::default()).unwrap();
        assert!(test.source.contains("public void testReset() {"));
        assert!(test.source.contains("instance.reset();"));
        assert!(test.source.contains("assertTrue(true);"));
    }

    #[test]
    fn test_synthesize_class_scaffold() {
        let test = synthesize(&calculator(), SOURCE_PATH, &ProjectConfig::default()).unwrap();
        assert_eq!(test.target_class, "Calculator");
        assert_eq!(test.test_class, "CalculatorTest");
        assert!(test.source.starts_with("package com.example;\n"));
        assert!(test.source.contains("public class CalculatorTest {"));
        assert!(test.source.contains("@BeforeEach"));
        assert!(test.source.contains("instance = new Calculator();"));
        assert_eq!(test.source.matches("@Test").count(), 2);
        assert!(test.source.ends_with("}\n"));
        assert_eq!(
            test.destination,
            "src/test/java/com/example/CalculatorTest.java"
        );
    }

    #[test]
    fn test_synthesize_omits_empty_package() {
        let mut unit = calculator();
        unit.package.clear();
        let test = synthesize(&unit, "src/main/java/Calculator.java", &ProjectConfig::default())
            .unwrap();
        assert!(test.source.starts_with("import org.junit.jupiter.api.Test;"));
    }

    #[test]
    fn test_synthesize_requires_class_name() {
        let unit = SourceUnit::default();
        let result = synthesize(&unit, SOURCE_PATH, &ProjectConfig::default());
        assert!(matches!(result, Err(Error::ParseFailure { .. })));
    }

    // =========================================================================
    // File generation tests
    // =========================================================================

    #[test]
    fn test_write_test_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let test = synthesize(&calculator(), SOURCE_PATH, &ProjectConfig::default()).unwrap();
        let destination = temp_dir.path().join(&test.destination);

        std::fs::create_dir_all(destination.parent().unwrap()).unwrap();
        std::fs::write(&destination, "hand written").unwrap();

        write_test(temp_dir.path(), &test).unwrap();
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), test.source);
    }

    #[test]
    fn test_generate_test_file_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join(SOURCE_PATH);
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(
            &source,
            "package com.example;\n\npublic class Calculator {\n    public int add(int a, int b) {\n        return a + b;\n    }\n}\n",
        )
        .unwrap();

        let project = ProjectConfig {
            root: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let generated = generate_test_file(&PatternExtractor, &project, SOURCE_PATH).unwrap();

        assert!(generated.success);
        assert_eq!(generated.test_class, "CalculatorTest");
        assert_eq!(generated.methods_tested, 1);
        assert_eq!(generated.message, "Generated 1 tests for Calculator");
        assert!(temp_dir.path().join(&generated.test_file).exists());
    }

    #[test]
    fn test_generate_test_file_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let project = ProjectConfig {
            root: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let result = generate_test_file(&PatternExtractor, &project, SOURCE_PATH);
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_read_test_file() {
        let temp_dir = TempDir::new().unwrap();
        let relative = "src/test/java/com/example/CalculatorTest.java";
        let path = temp_dir.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "class CalculatorTest {\n}\n").unwrap();

        let file = read_test_file(temp_dir.path(), relative).unwrap();
        assert_eq!(file.path, relative);
        assert_eq!(file.line_count, 3);
        assert!(file.content.starts_with("class CalculatorTest"));

        let missing = read_test_file(temp_dir.path(), "src/test/java/Nope.java");
        assert!(matches!(missing, Err(Error::NotFound { .. })));
    }
}
