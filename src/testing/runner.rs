//! Suite orchestration.
//!
//! Each call to [`SuiteOrchestrator::run`] builds a fresh
//! [`FixtureContext`], runs the suite's setup once and then its cases in
//! declaration order. Independent suites may be run concurrently with
//! [`SuiteOrchestrator::run_all`]; they never share fixture state.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::FutureExt;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::environment::RunEnvironment;
use crate::error::Result;
use crate::factory::DataFactory;
use crate::fixture::FixtureContext;
use crate::http::ApiClient;

use super::report::{
    CaseReport, CaseVerdict, Failure, RunReport, SkipReason, SuiteReport, SuiteStatus,
};
use super::suite::{CaseContext, StepFuture, Suite};
use super::RunMode;

pub struct SuiteOrchestrator {
    client: ApiClient,
    factory: DataFactory,
    env: RunEnvironment,
}

enum StepOutcome {
    Passed,
    Failed { failure: Failure, fatal: bool },
}

impl SuiteOrchestrator {
    pub fn new(env: RunEnvironment, factory: DataFactory) -> Result<Self> {
        env.validate()?;
        let client = ApiClient::new(&env)?;
        Ok(Self { client, factory, env })
    }

    pub fn factory(&self) -> &DataFactory {
        &self.factory
    }

    pub async fn run_all(&self, suites: &[Suite], mode: RunMode) -> RunReport {
        let started = Instant::now();
        info!(suites = suites.len(), ?mode, "starting run");

        let reports = match mode {
            RunMode::Serial => {
                let mut reports = Vec::with_capacity(suites.len());
                for suite in suites {
                    reports.push(self.run(suite).await);
                }
                reports
            }
            RunMode::Parallel => join_all(suites.iter().map(|suite| self.run(suite))).await,
        };

        let report = RunReport::from_suites(reports, elapsed_ms(started));
        info!(
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            skipped = report.skipped,
            "run finished"
        );
        report
    }

    pub async fn run(&self, suite: &Suite) -> SuiteReport {
        let started = Instant::now();
        let mut run = SuiteRun::new(suite.name());
        info!(suite = suite.name(), cases = suite.cases().len(), "suite started");

        if let Err(err) = suite.validate() {
            warn!(suite = suite.name(), error = %err, "suite definition rejected");
            return run.block(suite, Failure::from(&err), started);
        }

        let mut fixtures = FixtureContext::new();

        if suite.has_setup() {
            run.advance(SuiteStatus::SettingUp);
            // The setup future's borrow of `fixtures` must end here.
            let outcome = match suite.run_setup(self.context(&mut fixtures)) {
                Some(setup) => guarded(setup).await,
                None => StepOutcome::Passed,
            };
            if let StepOutcome::Failed { failure, .. } = outcome {
                warn!(suite = suite.name(), error = %failure.message, "setup failed");
                return run.block(suite, failure, started);
            }
            debug!(suite = suite.name(), fixtures = fixtures.len(), "setup complete");
        }

        run.advance(SuiteStatus::Running);
        let mut passed: HashMap<&str, bool> = HashMap::new();
        let mut aborted_by: Option<String> = None;
        let mut cases = Vec::with_capacity(suite.cases().len());

        for case in suite.cases() {
            if let Some(culprit) = &aborted_by {
                passed.insert(case.name(), false);
                let skip = SkipReason::SuiteAborted(culprit.clone());
                cases.push(CaseReport::skipped(case.name(), skip));
                continue;
            }

            let unmet = case
                .dependencies()
                .iter()
                .find(|dependency| !passed.get(dependency.as_str()).copied().unwrap_or(false));
            if let Some(dependency) = unmet {
                warn!(suite = suite.name(), case = case.name(), %dependency, "case skipped");
                passed.insert(case.name(), false);
                cases.push(CaseReport::skipped(
                    case.name(),
                    SkipReason::DependencyFailed(dependency.clone()),
                ));
                continue;
            }

            debug!(suite = suite.name(), case = case.name(), "case running");
            let case_started = Instant::now();
            let verdict = match guarded(case.run(self.context(&mut fixtures))).await {
                StepOutcome::Passed => {
                    info!(suite = suite.name(), case = case.name(), "case passed");
                    CaseVerdict::Passed
                }
                StepOutcome::Failed { failure, fatal } => {
                    warn!(
                        suite = suite.name(),
                        case = case.name(),
                        error = %failure.message,
                        "case failed"
                    );
                    if fatal {
                        warn!(suite = suite.name(), case = case.name(), "aborting suite");
                        aborted_by = Some(case.name().to_string());
                    }
                    CaseVerdict::Failed(failure)
                }
            };

            passed.insert(case.name(), verdict.is_passed());
            cases.push(CaseReport {
                name: case.name().to_string(),
                verdict,
                duration_ms: elapsed_ms(case_started),
            });
        }

        run.finish(cases, aborted_by, started)
    }

    fn context<'a>(&'a self, fixtures: &'a mut FixtureContext) -> CaseContext<'a> {
        CaseContext {
            client: &self.client,
            fixtures,
            factory: &self.factory,
            env: &self.env,
        }
    }
}

/// Tracks the suite state machine for one run.
struct SuiteRun {
    name: String,
    status: SuiteStatus,
}

impl SuiteRun {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: SuiteStatus::Pending,
        }
    }

    fn advance(&mut self, next: SuiteStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal suite transition {} -> {}",
            self.status,
            next
        );
        debug!(suite = %self.name, from = %self.status, to = %next, "suite transition");
        self.status = next;
    }

    fn block(mut self, suite: &Suite, failure: Failure, started: Instant) -> SuiteReport {
        self.advance(SuiteStatus::Blocked);
        let cases = suite
            .cases()
            .iter()
            .map(|case| CaseReport::skipped(case.name(), SkipReason::SetupFailed))
            .collect();
        SuiteReport {
            name: self.name,
            status: self.status,
            blocked_by: Some(failure),
            aborted_by: None,
            cases,
            duration_ms: elapsed_ms(started),
        }
    }

    /// An aborted suite is `Failed` regardless of how many cases passed
    /// before the abort.
    fn finish(
        mut self,
        cases: Vec<CaseReport>,
        aborted_by: Option<String>,
        started: Instant,
    ) -> SuiteReport {
        let passed = cases.iter().filter(|case| case.verdict.is_passed()).count();
        let next = if aborted_by.is_some() {
            SuiteStatus::Failed
        } else if passed == cases.len() {
            SuiteStatus::Passed
        } else if passed == 0 {
            SuiteStatus::Failed
        } else {
            SuiteStatus::PartiallyFailed
        };
        self.advance(next);
        info!(suite = %self.name, status = %self.status, "suite finished");

        SuiteReport {
            name: self.name,
            status: self.status,
            blocked_by: None,
            aborted_by,
            cases,
            duration_ms: elapsed_ms(started),
        }
    }
}

/// Runs one step, turning errors and panics into a failure verdict.
async fn guarded(step: StepFuture<'_>) -> StepOutcome {
    match AssertUnwindSafe(step).catch_unwind().await {
        Ok(Ok(())) => StepOutcome::Passed,
        Ok(Err(err)) => StepOutcome::Failed {
            fatal: err.is_fatal(),
            failure: Failure::from(&err),
        },
        Err(payload) => StepOutcome::Failed {
            failure: Failure::panic(panic_message(payload.as_ref())),
            fatal: false,
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("case panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("case panicked: {message}")
    } else {
        "case panicked".to_string()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
