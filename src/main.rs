use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use petcheck::cli::{CliConfig, OutputFormat};
use petcheck::factory::DataFactory;
use petcheck::testing::SuiteOrchestrator;
use petcheck::testing::report::render_text;
use petcheck::{scenarios, storage};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = CliConfig::parse();
    petcheck::init_logging(&config.log_level);

    let env = config.environment().context("invalid configuration")?;
    let suites = scenarios::select(&config.suites)?;
    let factory = match config.seed {
        Some(seed) => DataFactory::seeded(seed),
        None => DataFactory::new(),
    };

    info!(base_url = %env.base_url, "running contract suites");
    let orchestrator = SuiteOrchestrator::new(env, factory)?;
    let report = orchestrator.run_all(&suites, config.run_mode()).await;

    match config.output_format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    if let Some(path) = &config.report_path {
        storage::save_report(path, &report)?;
        info!(path = %path.display(), "report written");
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
