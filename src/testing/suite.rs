//! Suite and case definitions.
//!
//! Cases run in declaration order. `depends_on` edges may only name cases
//! declared earlier, which keeps the graph acyclic and makes declaration
//! order a valid topological order.

use std::collections::HashSet;

use futures::future::BoxFuture;

use crate::environment::RunEnvironment;
use crate::error::{ContractError, Result};
use crate::factory::DataFactory;
use crate::fixture::FixtureContext;
use crate::http::ApiClient;

/// What a setup step or case gets to work with. The fixture store is
/// borrowed mutably for the duration of one step only.
pub struct CaseContext<'a> {
    pub client: &'a ApiClient,
    pub fixtures: &'a mut FixtureContext,
    pub factory: &'a DataFactory,
    pub env: &'a RunEnvironment,
}

pub type StepFuture<'a> = BoxFuture<'a, Result<()>>;

type Step = Box<dyn for<'a> Fn(CaseContext<'a>) -> StepFuture<'a> + Send + Sync>;

pub struct TestCase {
    name: String,
    depends_on: Vec<String>,
    body: Step,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: for<'a> Fn(CaseContext<'a>) -> StepFuture<'a> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            body: Box::new(body),
        }
    }

    /// This case is skipped unless `case` passed.
    pub fn depends_on(mut self, case: impl Into<String>) -> Self {
        self.depends_on.push(case.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    pub(crate) fn run<'a>(&self, cx: CaseContext<'a>) -> StepFuture<'a> {
        (self.body)(cx)
    }
}

pub struct Suite {
    name: String,
    setup: Option<Step>,
    cases: Vec<TestCase>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setup: None,
            cases: Vec::new(),
        }
    }

    /// One-time setup run before the first case. Its failure blocks the suite.
    pub fn setup<F>(mut self, setup: F) -> Self
    where
        F: for<'a> Fn(CaseContext<'a>) -> StepFuture<'a> + Send + Sync + 'static,
    {
        self.setup = Some(Box::new(setup));
        self
    }

    pub fn case<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: for<'a> Fn(CaseContext<'a>) -> StepFuture<'a> + Send + Sync + 'static,
    {
        self.with_case(TestCase::new(name, body))
    }

    pub fn with_case(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn has_setup(&self) -> bool {
        self.setup.is_some()
    }

    pub(crate) fn run_setup<'a>(&self, cx: CaseContext<'a>) -> Option<StepFuture<'a>> {
        self.setup.as_ref().map(|setup| setup(cx))
    }

    /// Rejects duplicate case names and dependency edges that do not point
    /// at an earlier case.
    pub fn validate(&self) -> Result<()> {
        let mut declared: HashSet<&str> = HashSet::new();

        for case in &self.cases {
            for dependency in &case.depends_on {
                if dependency == &case.name {
                    return Err(ContractError::configuration(format!(
                        "Case `{}` in suite `{}` depends on itself",
                        case.name, self.name
                    )));
                }
                if !declared.contains(dependency.as_str()) {
                    return Err(ContractError::configuration(format!(
                        "Case `{}` in suite `{}` depends on `{dependency}`, which is not declared before it",
                        case.name, self.name
                    )));
                }
            }
            if !declared.insert(case.name.as_str()) {
                return Err(ContractError::configuration(format!(
                    "Duplicate case `{}` in suite `{}`",
                    case.name, self.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn noop(name: &str) -> TestCase {
        TestCase::new(name, |_cx| async { Ok(()) }.boxed())
    }

    #[test]
    fn valid_chain() {
        let suite = Suite::new("chain")
            .with_case(noop("a"))
            .with_case(noop("b").depends_on("a"))
            .with_case(noop("c").depends_on("a").depends_on("b"));
        suite.validate().unwrap();
        assert_eq!(suite.cases()[2].dependencies(), ["a", "b"]);
        assert!(!suite.has_setup());
    }

    #[test]
    fn forward_and_unknown_edges_rejected() {
        let forward = Suite::new("forward")
            .with_case(noop("a").depends_on("b"))
            .with_case(noop("b"));
        assert!(matches!(forward.validate(), Err(ContractError::Configuration(_))));

        let unknown = Suite::new("unknown").with_case(noop("a").depends_on("ghost"));
        let err = unknown.validate().unwrap_err();
        assert!(err.to_string().contains("`ghost`"));
    }

    #[test]
    fn self_and_duplicate_rejected() {
        let self_edge = Suite::new("self").with_case(noop("a").depends_on("a"));
        assert!(self_edge.validate().is_err());

        let duplicate = Suite::new("dup").with_case(noop("a")).with_case(noop("a"));
        assert!(duplicate.validate().unwrap_err().to_string().contains("Duplicate"));
    }
}
