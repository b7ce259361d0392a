use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Project layout
    #[serde(default)]
    pub project: ProjectConfig,

    /// Locations of reports produced by external tools
    #[serde(default)]
    pub reports: ReportsConfig,

    /// External tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Code smell thresholds
    #[serde(default)]
    pub smells: SmellConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Layout of the project under test.
///
/// Sources live under `source_dir`; a source path is mirrored to its test path by
/// replacing the first `main_source_root` segment with `test_source_root` and
/// appending `test_suffix` to the file stem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project root, all other paths are relative to it
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_main_source_root")]
    pub main_source_root: String,

    #[serde(default = "default_test_source_root")]
    pub test_source_root: String,

    /// Directory scanned for source files
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Source file extension, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default = "default_test_suffix")]
    pub test_suffix: String,

    /// Glob patterns (relative to `root`) of source files never given a test
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_jacoco_xml")]
    pub jacoco_xml: PathBuf,

    #[serde(default = "default_jacoco_csv")]
    pub jacoco_csv: PathBuf,

    #[serde(default = "default_surefire_dir")]
    pub surefire_dir: PathBuf,

    #[serde(default = "default_spotbugs_xml")]
    pub spotbugs_xml: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Build tool executable
    #[serde(default = "default_build_command")]
    pub build_command: String,

    #[serde(default = "default_tool_timeout")]
    pub test_timeout_seconds: u64,

    #[serde(default = "default_tool_timeout")]
    pub analysis_timeout_seconds: u64,

    /// Maximum characters kept from a failure detail
    #[serde(default = "default_max_detail_chars")]
    pub max_detail_chars: usize,

    /// Maximum entries listed in summaries
    #[serde(default = "default_max_listed")]
    pub max_listed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmellConfig {
    #[serde(default = "default_long_method_lines")]
    pub long_method_lines: usize,

    /// Commas allowed inside a parenthesized segment
    #[serde(default = "default_max_commas")]
    pub max_commas: usize,

    /// Indentation depth (in 4-space levels) allowed for control flow
    #[serde(default = "default_max_nesting")]
    pub max_nesting: usize,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_main_source_root() -> String {
    "src/main/".to_string()
}

fn default_test_source_root() -> String {
    "src/test/".to_string()
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("src/main/java")
}

fn default_extension() -> String {
    "java".to_string()
}

fn default_test_suffix() -> String {
    "Test".to_string()
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/package-info.java".to_string(),
        "**/module-info.java".to_string(),
    ]
}

fn default_jacoco_xml() -> PathBuf {
    PathBuf::from("target/site/jacoco/jacoco.xml")
}

fn default_jacoco_csv() -> PathBuf {
    PathBuf::from("target/site/jacoco/jacoco.csv")
}

fn default_surefire_dir() -> PathBuf {
    PathBuf::from("target/surefire-reports")
}

fn default_spotbugs_xml() -> PathBuf {
    PathBuf::from("target/spotbugsXml.xml")
}

fn default_build_command() -> String {
    "mvn".to_string()
}

fn default_tool_timeout() -> u64 {
    600 // 10 minutes
}

fn default_max_detail_chars() -> usize {
    500
}

fn default_max_listed() -> usize {
    10
}

fn default_long_method_lines() -> usize {
    50
}

fn default_max_commas() -> usize {
    4
}

fn default_max_nesting() -> usize {
    3
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            main_source_root: default_main_source_root(),
            test_source_root: default_test_source_root(),
            source_dir: default_source_dir(),
            extension: default_extension(),
            test_suffix: default_test_suffix(),
            exclude: default_exclude(),
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            jacoco_xml: default_jacoco_xml(),
            jacoco_csv: default_jacoco_csv(),
            surefire_dir: default_surefire_dir(),
            spotbugs_xml: default_spotbugs_xml(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            build_command: default_build_command(),
            test_timeout_seconds: default_tool_timeout(),
            analysis_timeout_seconds: default_tool_timeout(),
            max_detail_chars: default_max_detail_chars(),
            max_listed: default_max_listed(),
        }
    }
}

impl Default for SmellConfig {
    fn default() -> Self {
        Self {
            long_method_lines: default_long_method_lines(),
            max_commas: default_max_commas(),
            max_nesting: default_max_nesting(),
        }
    }
}

impl ProjectConfig {
    /// Absolute (root-joined) directory scanned for sources.
    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.source_dir)
    }

    /// Mirror a root-relative source path onto its test path.
    ///
    /// `src/main/java/com/example/Foo.java` becomes
    /// `src/test/java/com/example/FooTest.java`. Only the first occurrence of the
    /// main root segment is replaced.
    pub fn test_path_for(&self, source: &str) -> String {
        let mirrored = source.replacen(&self.main_source_root, &self.test_source_root, 1);
        let ext = format!(".{}", self.extension);
        match mirrored.strip_suffix(&ext) {
            Some(stem) => format!("{}{}{}", stem, self.test_suffix, ext),
            None => format!("{}{}", mirrored, self.test_suffix),
        }
    }

    /// Whether a root-relative source path matches one of the exclude globs.
    pub fn is_excluded(&self, relative: &str) -> bool {
        self.exclude
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, relative))
    }
}

impl Config {
    /// Load configuration from file, or create default if not found
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(Self::default_config_path);

        let config = if let Some(ref path) = config_path {
            if path.exists() {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config from {:?}", path))?;
                toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse config from {:?}", path))?
            } else {
                Config::default()
            }
        } else {
            Config::default()
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = path
            .map(PathBuf::from)
            .or_else(Self::default_config_path)
            .context("No config path available")?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "coverforge", "coverforge")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Resolve a report path against the project root.
    pub fn report_path(&self, relative: &Path) -> PathBuf {
        self.project.root.join(relative)
    }
}
