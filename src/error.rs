//! Error taxonomy for contract checks.
//!
//! Assertion errors ([`ContractError::StatusMismatch`],
//! [`ContractError::FieldMismatch`], [`ContractError::UnexpectedPresence`])
//! and transport errors stay inside the verdict of the case that raised
//! them. The remaining variants are suite-authoring defects: see
//! [`ContractError::is_fatal`].

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::http::method::HttpMethod;

pub type Result<T> = std::result::Result<T, ContractError>;

/// How a body field is compared against its expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldMode {
    Equals,
    Contains,
}

impl std::fmt::Display for FieldMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldMode::Equals => write!(f, "equal"),
            FieldMode::Contains => write!(f, "contain"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ContractError {
    /// No response was obtained at all.
    #[error("{method} {path}: transport failure{}: {message}", timeout_suffix(.timeout))]
    Transport {
        method: HttpMethod,
        path: String,
        timeout: Option<Duration>,
        message: String,
    },

    #[error("{method} {path}: expected status {expected}, got {actual} (ok = {ok})")]
    StatusMismatch {
        method: HttpMethod,
        path: String,
        expected: u16,
        actual: u16,
        ok: bool,
    },

    #[error("{method} {path}: field `{field}` expected to {mode} {expected}, actual {}", display_actual(.actual))]
    FieldMismatch {
        method: HttpMethod,
        path: String,
        field: String,
        mode: FieldMode,
        expected: Value,
        actual: Option<Value>,
    },

    #[error("{method} {path}: resource still present after deletion (status {status})")]
    UnexpectedPresence {
        method: HttpMethod,
        path: String,
        status: u16,
    },

    #[error("fixture `{role}` was never set up")]
    FixtureNotFound { role: String },

    #[error("fixture `{role}`: identity field `{field}` cannot be changed")]
    IdentityMutation { role: String, field: String },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ContractError {
    /// Fatal errors invalidate every later verdict in the suite, so the
    /// orchestrator aborts instead of recording an ordinary failure.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ContractError::FixtureNotFound { .. }
                | ContractError::IdentityMutation { .. }
                | ContractError::Configuration(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ContractError::Transport { timeout: Some(_), .. })
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        ContractError::Configuration(message.into())
    }

    /// Short machine-readable label used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ContractError::Transport { .. } => "transport",
            ContractError::StatusMismatch { .. } => "status_mismatch",
            ContractError::FieldMismatch { .. } => "field_mismatch",
            ContractError::UnexpectedPresence { .. } => "unexpected_presence",
            ContractError::FixtureNotFound { .. } => "fixture_not_found",
            ContractError::IdentityMutation { .. } => "identity_mutation",
            ContractError::Configuration(_) => "configuration",
        }
    }
}

fn timeout_suffix(timeout: &Option<Duration>) -> String {
    match timeout {
        Some(limit) => format!(" (timed out after {} ms)", limit.as_millis()),
        None => String::new(),
    }
}

fn display_actual(actual: &Option<Value>) -> String {
    match actual {
        Some(value) => value.to_string(),
        None => "<missing>".to_string(),
    }
}
