//! Source language layer.
//!
//! Defines the structural model extracted from a source file, the extraction
//! capability the rest of the pipeline depends on, and source file discovery.

mod java;

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use java::PatternExtractor;

/// Turns raw source text into a [`SourceUnit`].
///
/// The pattern-based [`PatternExtractor`] is the only implementation; a real
/// parser can be dropped in behind this trait without touching generation.
pub trait SourceExtractor {
    fn extract(&self, text: &str) -> Result<SourceUnit>;
}

/// Structural model of one source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Empty when the file has no package declaration
    pub package: String,
    /// Empty when no public class was detected
    pub class_name: String,
    pub imports: Vec<String>,
    /// Never contains a method named like the class (constructors are dropped)
    pub methods: Vec<MethodSignature>,
}

impl SourceUnit {
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// The class name, or a parse failure when none was detected.
    pub fn require_class_name(&self) -> Result<&str> {
        if self.class_name.is_empty() {
            return Err(Error::parse("source", "No class name found in file"));
        }
        Ok(&self.class_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Default,
}

impl Visibility {
    fn from_keyword(keyword: Option<&str>) -> Self {
        match keyword {
            Some("public") => Self::Public,
            Some("private") => Self::Private,
            Some("protected") => Self::Protected,
            _ => Self::Default,
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
            Self::Protected => write!(f, "protected"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Sentinel return type for methods that produce no value.
pub const VOID: &str = "void";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub visibility: Visibility,
    pub is_static: bool,
    pub return_type: String,
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// Raw text between the parentheses, trimmed
    pub param_string: String,
}

impl MethodSignature {
    pub fn returns_void(&self) -> bool {
        self.return_type == VOID
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
}

/// Read a root-relative source file and extract its structure.
pub fn analyze_file(
    extractor: &impl SourceExtractor,
    root: &Path,
    relative: &str,
) -> Result<SourceUnit> {
    let full_path = root.join(relative);
    if !full_path.is_file() {
        return Err(Error::not_found("Source file", relative));
    }

    let content = std::fs::read_to_string(&full_path)
        .map_err(|e| Error::io(format!("Failed to read {}", full_path.display()), e))?;

    let unit = extractor.extract(&content)?;
    tracing::debug!(
        "Extracted {} ({} methods) from {}",
        unit.class_name,
        unit.method_count(),
        relative
    );
    Ok(unit)
}

/// A discovered source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the project root, `/`-separated
    pub path: String,
    pub absolute_path: PathBuf,
    /// File name only
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceListing {
    pub total_files: usize,
    pub files: Vec<SourceFile>,
    pub source_directory: PathBuf,
}

/// Find every source file under the configured source directory.
///
/// Files matching an exclude glob are left out. The listing is sorted by path so
/// repeated runs visit files in the same order.
pub fn find_source_files(project: &ProjectConfig) -> Result<SourceListing> {
    let source_dir = project.source_path();
    if !source_dir.is_dir() {
        return Err(Error::not_found("Source path", source_dir));
    }

    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(&source_dir).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_default();
            Error::io(
                format!("Failed to walk {}", path.display()),
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
            )
        })?;
        let path = entry.path();

        if !path.is_file()
            || !path
                .extension()
                .is_some_and(|ext| ext == project.extension.as_str())
        {
            continue;
        }

        let relative = relative_path(&project.root, path);
        if project.is_excluded(&relative) {
            tracing::debug!("Skipping excluded source file {}", relative);
            continue;
        }

        files.push(SourceFile {
            path: relative,
            absolute_path: path.to_path_buf(),
            name: entry.file_name().to_string_lossy().to_string(),
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(SourceListing {
        total_files: files.len(),
        files,
        source_directory: source_dir,
    })
}

/// Path of `path` relative to `root`, always `/`-separated.
fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
