//! Driving the project's build tool.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::reports::{spotbugs, BugSummary};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Bytes of combined output kept in a run report
const MAX_OUTPUT_BYTES: usize = 10_000;

/// A command line to execute in a working directory with a time bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, args: &[&str], cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: cwd.into(),
            timeout: Duration::from_secs(600),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The command line as typed in a shell.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Runs external commands.
pub trait ToolRunner {
    fn run(&self, command: &ToolCommand) -> impl Future<Output = Result<ToolOutput>> + Send;
}

/// Spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        tracing::debug!("Running `{}` in {}", command.display(), command.cwd.display());

        let result = tokio::time::timeout(
            command.timeout,
            Command::new(&command.program)
                .args(&command.args)
                .current_dir(&command.cwd)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) => Ok(ToolOutput {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(Error::ExternalProcessFailure {
                command: command.display(),
                exit_code: None,
                stderr: e.to_string(),
            }),
            Err(_) => {
                tracing::warn!("`{}` timed out after {:?}", command.display(), command.timeout);
                Err(Error::Timeout {
                    command: command.display(),
                    seconds: command.timeout.as_secs(),
                })
            }
        }
    }
}

/// Result of a test run; failing tests do not make the run itself fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunReport {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    /// Combined stdout and stderr, truncated
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRunReport {
    pub duration_ms: u64,
    #[serde(flatten)]
    pub bugs: BugSummary,
}

fn build_command(config: &Config, args: &[&str], timeout_seconds: u64) -> ToolCommand {
    ToolCommand::new(&config.tools.build_command, args, &config.project.root)
        .with_timeout(Duration::from_secs(timeout_seconds))
}

/// Clean, compile and run the project's tests, ignoring test failures.
pub async fn run_tests(runner: &impl ToolRunner, config: &Config) -> Result<TestRunReport> {
    let command = build_command(
        config,
        &["clean", "test", "-Dmaven.test.failure.ignore=true"],
        config.tools.test_timeout_seconds,
    );

    let start = Instant::now();
    let output = runner.run(&command).await?;
    let duration_ms = start.elapsed().as_millis() as u64;

    if !output.success() {
        tracing::warn!("`{}` exited with {:?}", command.display(), output.exit_code);
    }

    Ok(TestRunReport {
        success: output.success(),
        exit_code: output.exit_code,
        duration_ms,
        output: truncate_output(&output.combined(), MAX_OUTPUT_BYTES),
    })
}

/// Compile the project, run SpotBugs and summarize its report.
pub async fn run_spotbugs(runner: &impl ToolRunner, config: &Config) -> Result<AnalysisRunReport> {
    let command = build_command(
        config,
        &["clean", "compile", "spotbugs:spotbugs"],
        config.tools.analysis_timeout_seconds,
    );

    let start = Instant::now();
    let output = runner.run(&command).await?;
    let duration_ms = start.elapsed().as_millis() as u64;

    if !output.success() {
        return Err(Error::ExternalProcessFailure {
            command: command.display(),
            exit_code: output.exit_code,
            stderr: truncate_output(&output.combined(), MAX_OUTPUT_BYTES),
        });
    }

    let report = config.report_path(&config.reports.spotbugs_xml);
    let bugs = spotbugs::parse_bug_report_file(&report, config.tools.max_listed)?;
    Ok(AnalysisRunReport { duration_ms, bugs })
}

/// Keep the tail of the output, where build tools print their verdict.
fn truncate_output(output: &str, max_bytes: usize) -> String {
    if output.len() <= max_bytes {
        return output.to_string();
    }
    let mut start = output.len() - max_bytes;
    while !output.is_char_boundary(start) {
        start += 1;
    }
    format!("(truncated)...{}", &output[start..])
}
