//! Run, suite and case verdicts.

use std::fmt::{self, Display, Write as _};

use serde::Serialize;

use crate::error::ContractError;

/// Suite lifecycle: `Pending -> SettingUp -> {Blocked | Running} ->
/// {Passed | Failed | PartiallyFailed}`. Suites without setup go straight
/// from `Pending` to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteStatus {
    Pending,
    SettingUp,
    Blocked,
    Running,
    Passed,
    Failed,
    PartiallyFailed,
}

impl SuiteStatus {
    pub fn can_transition_to(self, next: SuiteStatus) -> bool {
        use SuiteStatus::*;
        matches!(
            (self, next),
            (Pending, SettingUp | Running | Blocked)
                | (SettingUp, Blocked | Running)
                | (Running, Passed | Failed | PartiallyFailed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SuiteStatus::Blocked
                | SuiteStatus::Passed
                | SuiteStatus::Failed
                | SuiteStatus::PartiallyFailed
        )
    }
}

impl Display for SuiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SuiteStatus::Pending => "PENDING",
            SuiteStatus::SettingUp => "SETTING UP",
            SuiteStatus::Blocked => "BLOCKED",
            SuiteStatus::Running => "RUNNING",
            SuiteStatus::Passed => "PASSED",
            SuiteStatus::Failed => "FAILED",
            SuiteStatus::PartiallyFailed => "PARTIALLY FAILED",
        };
        write!(f, "{label}")
    }
}

/// Diagnostic detail of a failed case or setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: String,
    pub message: String,
}

impl Failure {
    pub fn panic(message: impl Into<String>) -> Self {
        Self {
            kind: "panic".into(),
            message: message.into(),
        }
    }
}

impl From<&ContractError> for Failure {
    fn from(err: &ContractError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "case", rename_all = "snake_case")]
pub enum SkipReason {
    SetupFailed,
    DependencyFailed(String),
    SuiteAborted(String),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SetupFailed => write!(f, "setup failed"),
            SkipReason::DependencyFailed(case) => write!(f, "dependency failed: {case}"),
            SkipReason::SuiteAborted(case) => write!(f, "suite aborted by `{case}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum CaseVerdict {
    Passed,
    Failed(Failure),
    Skipped { skip: SkipReason },
}

impl CaseVerdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, CaseVerdict::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CaseVerdict::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CaseVerdict::Skipped { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub name: String,
    #[serde(flatten)]
    pub verdict: CaseVerdict,
    pub duration_ms: u64,
}

impl CaseReport {
    pub fn skipped(name: impl Into<String>, skip: SkipReason) -> Self {
        Self {
            name: name.into(),
            verdict: CaseVerdict::Skipped { skip },
            duration_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub name: String,
    pub status: SuiteStatus,
    /// Why the suite never reached its cases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<Failure>,
    /// Case whose fatal error stopped the suite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted_by: Option<String>,
    pub cases: Vec<CaseReport>,
    pub duration_ms: u64,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|case| case.verdict.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.iter().filter(|case| case.verdict.is_failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.cases.iter().filter(|case| case.verdict.is_skipped()).count()
    }

    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|case| case.name == name)
    }

    pub fn is_success(&self) -> bool {
        self.status == SuiteStatus::Passed
    }
}

/// Summary report for a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub suites: Vec<SuiteReport>,
}

impl RunReport {
    pub fn from_suites(suites: Vec<SuiteReport>, duration_ms: u64) -> Self {
        Self {
            total: suites.iter().map(|suite| suite.cases.len()).sum(),
            passed: suites.iter().map(SuiteReport::passed).sum(),
            failed: suites.iter().map(SuiteReport::failed).sum(),
            skipped: suites.iter().map(SuiteReport::skipped).sum(),
            duration_ms,
            suites,
        }
    }

    pub fn is_success(&self) -> bool {
        self.suites.iter().all(SuiteReport::is_success)
    }

    pub fn suite(&self, name: &str) -> Option<&SuiteReport> {
        self.suites.iter().find(|suite| suite.name == name)
    }
}

/// Human-readable rendering: one line per case, failure detail indented
/// underneath.
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();

    for suite in &report.suites {
        let _ = writeln!(out, "{} [{}] ({} ms)", suite.name, suite.status, suite.duration_ms);
        if let Some(failure) = &suite.blocked_by {
            let _ = writeln!(out, "  setup: {}", failure.message);
        }
        for case in &suite.cases {
            match &case.verdict {
                CaseVerdict::Passed => {
                    let _ = writeln!(out, "  PASS {} ({} ms)", case.name, case.duration_ms);
                }
                CaseVerdict::Failed(failure) => {
                    let _ = writeln!(out, "  FAIL {} ({} ms)", case.name, case.duration_ms);
                    let _ = writeln!(out, "       {}: {}", failure.kind, failure.message);
                }
                CaseVerdict::Skipped { skip } => {
                    let _ = writeln!(out, "  SKIP {} ({skip})", case.name);
                }
            }
        }
    }

    let _ = writeln!(
        out,
        "{} cases: {} passed, {} failed, {} skipped in {} ms",
        report.total, report.passed, report.failed, report.skipped, report.duration_ms
    );
    out
}
