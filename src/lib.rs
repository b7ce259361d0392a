//! Test-coverage tooling for Maven/JUnit projects.
//!
//! - `language`: source discovery and structure extraction
//! - `testgen`: smoke-test skeleton generation
//! - `coverage`: JaCoCo report parsing, totals and gap analysis
//! - `reports`: Surefire and SpotBugs report readers
//! - `smells`: line-based code smell heuristics
//! - `runner`: driving the build tool with time bounds

pub mod config;
pub mod coverage;
pub mod error;
pub mod language;
pub mod reports;
pub mod runner;
pub mod smells;
pub mod testgen;

mod xml;

pub use error::{Error, Result};
