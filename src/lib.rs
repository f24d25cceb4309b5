//! Stateful contract testing for a pet-store REST API.
//!
//! Suites create users and pets through the live API, remember what the
//! service accepted as fixtures, and check every later read, update and
//! delete against that state.

pub mod cli;
pub mod environment;
pub mod error;
pub mod factory;
pub mod fixture;
pub mod http;
pub mod scenarios;
pub mod storage;
pub mod testing;

pub use error::{ContractError, Result};

/// Initializes the tracing subscriber. `RUST_LOG` takes precedence over
/// `level` (error, warn, info, debug, trace).
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("petcheck={level}")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
