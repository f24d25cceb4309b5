//! The pet-store contract suites.
//!
//! Resource paths are relative to the configured base URL and use `{{name}}`
//! placeholders resolved with [`crate::environment::resolve_path`].

pub mod pet;
pub mod user;

#[cfg(test)]
pub(crate) mod fake_store;

use crate::error::{ContractError, Result};
use crate::testing::Suite;

pub const USER: &str = "/user";
pub const USER_BY_NAME: &str = "/user/{{username}}";
pub const USER_LOGIN: &str = "/user/login";
pub const USER_LOGOUT: &str = "/user/logout";
pub const USER_CREATE_WITH_LIST: &str = "/user/createWithList";
pub const PET: &str = "/pet";
pub const PET_BY_ID: &str = "/pet/{{id}}";

/// Short names accepted by [`select`].
pub const SUITE_NAMES: [&str; 2] = ["user", "pet"];

pub fn all() -> Vec<Suite> {
    vec![user::suite(), pet::suite()]
}

/// Builds the suites named in `names` (`user`, `pet`), in that order. An
/// empty selection means every suite.
pub fn select(names: &[String]) -> Result<Vec<Suite>> {
    if names.is_empty() {
        return Ok(all());
    }

    names
        .iter()
        .map(|name| match name.trim().to_ascii_lowercase().as_str() {
            "user" | "users" => Ok(user::suite()),
            "pet" | "pets" => Ok(pet::suite()),
            other => Err(ContractError::configuration(format!(
                "Unknown suite `{other}`, expected one of: {}",
                SUITE_NAMES.join(", ")
            ))),
        })
        .collect()
}
