//! # Run Environment
//!
//! The validated configuration a contract run consumes: where the service
//! lives, how long a request may take, extra headers, and the literal
//! fixture values the suites pin (password, seed images).
//!
//! Resource paths are written as templates with `{{name}}` placeholders and
//! resolved with [`resolve_path`] before a request is issued.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ContractError, Result};

pub const DEFAULT_BASE_URL: &str = "https://petstore.swagger.io/v2";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Literal fixture values shared by every suite in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestData {
    pub user: UserData,
    pub pet: PetData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetData {
    pub initial_image: String,
    pub updated_image: String,
}

impl Default for TestData {
    fn default() -> Self {
        Self {
            user: UserData {
                password: "Secret1".into(),
            },
            pet: PetData {
                initial_image:
                    "https://upload.wikimedia.org/wikipedia/commons/e/e9/Goldfish3.jpg".into(),
                updated_image:
                    "https://www.madeinsea.co/cdn/shop/articles/bubble-eye-goldfish-biography.jpg?v=1696202268&width=1024"
                        .into(),
            },
        }
    }
}

/// Everything the core needs to talk to the service under test.
#[derive(Debug, Clone)]
pub struct RunEnvironment {
    pub base_url: String,
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
    pub test_data: TestData,
}

impl Default for RunEnvironment {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            headers: Vec::new(),
            test_data: TestData::default(),
        }
    }
}

impl RunEnvironment {
    /// Rejects settings no request could succeed with.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url).map_err(|err| {
            ContractError::configuration(format!("Invalid base URL `{}`: {err}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ContractError::configuration(format!(
                "Base URL `{}` must use http or https",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ContractError::configuration("Request timeout must be greater than zero"));
        }

        let images = [&self.test_data.pet.initial_image, &self.test_data.pet.updated_image];
        if images.iter().any(|image| image.trim().is_empty()) {
            return Err(ContractError::configuration("Pet image URLs cannot be empty"));
        }
        if self.test_data.user.password.is_empty() {
            return Err(ContractError::configuration("User password cannot be empty"));
        }
        Ok(())
    }
}

/// Interpolate `{{key}}` placeholders in a string using the provided variable map.
pub fn interpolate(input: &str, variables: &HashMap<String, String>) -> String {
    let mut result = input.to_string();
    for (key, value) in variables {
        result = result.replace(&format!("{{{{{key}}}}}"), value);
    }
    result
}

/// Resolves a resource path template such as `/pet/{{id}}`. Path
/// parameters are percent-encoded; a placeholder left unresolved is a
/// configuration error rather than a request to a literal `{{id}}`.
pub fn resolve_path(template: &str, params: &[(&str, &str)]) -> Result<String> {
    let variables: HashMap<String, String> = params
        .iter()
        .map(|(key, value)| (key.to_string(), encode_segment(value)))
        .collect();
    let resolved = interpolate(template, &variables);

    if let Some(start) = resolved.find("{{") {
        let rest = &resolved[start..];
        let placeholder = rest.find("}}").map(|end| &rest[..end + 2]).unwrap_or(rest);
        return Err(ContractError::configuration(format!(
            "Unresolved placeholder `{placeholder}` in path template `{template}`"
        )));
    }
    Ok(resolved)
}

fn encode_segment(value: &str) -> String {
    let Ok(mut url) = Url::parse("http://segment.invalid/") else {
        return value.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(value);
    }
    url.path().trim_start_matches('/').to_string()
}
