//! # CLI Support
//!
//! Runs the contract suites from CI pipelines.
//!
//! - `petcheck --base-url http://localhost:8080/v2 --suite pet`
//! - Exit code 1 when any suite did not pass
//! - Text or JSON report on stdout, optional JSON report file
//!
//! Every flag can also come from a `PETCHECK_*` environment variable.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::environment::{DEFAULT_BASE_URL, RunEnvironment, TestData};
use crate::error::{ContractError, Result};
use crate::storage;
use crate::testing::RunMode;

/// CLI configuration parsed from command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "petcheck")]
#[command(about = "Stateful contract tests for a pet-store REST API")]
pub struct CliConfig {
    /// Base URL of the service under test.
    #[arg(long, env = "PETCHECK_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, env = "PETCHECK_TIMEOUT_MS", default_value = "30000")]
    pub timeout_ms: u64,

    /// JSON file with the user password and pet image URLs.
    #[arg(long, env = "PETCHECK_TEST_DATA")]
    pub test_data: Option<PathBuf>,

    /// Suite to run (`user`, `pet`); repeat for several. Runs all by default.
    #[arg(long = "suite", value_name = "NAME")]
    pub suites: Vec<String>,

    /// Run independent suites concurrently.
    #[arg(long, env = "PETCHECK_PARALLEL")]
    pub parallel: bool,

    /// Seed for the data factory, to replay a run.
    #[arg(long, env = "PETCHECK_SEED")]
    pub seed: Option<u64>,

    /// Report format written to stdout.
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Also write the JSON report to this file.
    #[arg(long = "report", env = "PETCHECK_REPORT")]
    pub report_path: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "PETCHECK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Extra header sent with every request, as `Name: value`.
    #[arg(long = "header", value_name = "NAME: VALUE")]
    pub headers: Vec<String>,
}

/// Output format for CLI reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl CliConfig {
    pub fn run_mode(&self) -> RunMode {
        if self.parallel { RunMode::Parallel } else { RunMode::Serial }
    }

    /// Resolves flags and the test data file into a validated environment.
    pub fn environment(&self) -> Result<RunEnvironment> {
        let test_data = match &self.test_data {
            Some(path) => storage::load_test_data(path)?,
            None => TestData::default(),
        };
        let headers = self
            .headers
            .iter()
            .map(|header| parse_header(header))
            .collect::<Result<Vec<_>>>()?;

        let env = RunEnvironment {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(self.timeout_ms),
            headers,
            test_data,
        };
        env.validate()?;
        Ok(env)
    }
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    let Some((name, value)) = raw.split_once(':') else {
        return Err(ContractError::configuration(format!(
            "Header `{raw}` must have the form `Name: value`"
        )));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(ContractError::configuration(format!("Header `{raw}` has no name")));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        CliConfig::try_parse_from(std::iter::once("petcheck").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&[]);
        assert_eq!(config.output_format, OutputFormat::Text);
        assert_eq!(config.run_mode(), RunMode::Serial);
        assert!(config.suites.is_empty());

        let env = config.environment().unwrap();
        assert_eq!(env.base_url, DEFAULT_BASE_URL);
        assert_eq!(env.timeout, Duration::from_secs(30));
        assert_eq!(env.test_data, TestData::default());
    }

    #[test]
    fn flags_reach_the_environment() {
        let config = parse(&[
            "--base-url",
            "http://localhost:8080/v2/",
            "--timeout-ms",
            "250",
            "--suite",
            "pet",
            "--suite",
            "user",
            "--parallel",
            "--format",
            "json",
            "--header",
            "api_key: special-key",
        ]);
        assert_eq!(config.suites, ["pet", "user"]);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.run_mode(), RunMode::Parallel);

        let env = config.environment().unwrap();
        assert_eq!(env.base_url, "http://localhost:8080/v2");
        assert_eq!(env.timeout, Duration::from_millis(250));
        assert_eq!(env.headers, [("api_key".to_string(), "special-key".to_string())]);
    }

    #[test]
    fn invalid_settings_are_configuration_errors() {
        let zero = parse(&["--timeout-ms", "0"]).environment().unwrap_err();
        assert!(matches!(zero, ContractError::Configuration(_)));

        let scheme = parse(&["--base-url", "ftp://store.test"]).environment().unwrap_err();
        assert!(scheme.to_string().contains("http or https"));

        let header = parse(&["--header", "no-colon"]).environment().unwrap_err();
        assert!(header.to_string().contains("Name: value"));
    }
}
