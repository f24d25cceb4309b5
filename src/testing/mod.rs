//! # Testing & Assertions
//!
//! Contract checks for HTTP responses and the orchestrator that runs
//! stateful suites against the service under test.
//!
//! - [`assertions`]: status / field / absence checks
//! - [`suite`]: suites, cases and their `depends_on` graph
//! - [`runner`]: setup-once, ordered execution, skip and block semantics
//! - [`report`]: run, suite and case verdicts

pub mod assertions;
pub mod report;
pub mod runner;
pub mod suite;

pub use report::{CaseReport, CaseVerdict, Failure, RunReport, SkipReason, SuiteReport, SuiteStatus};
pub use runner::SuiteOrchestrator;
pub use suite::{CaseContext, StepFuture, Suite, TestCase};

/// Execution mode for independent suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Serial,
    Parallel,
}
