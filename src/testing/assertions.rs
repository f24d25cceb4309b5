//! Contract checks over [`ApiResponse`] values.
//!
//! Every check is a pure comparison; the caller performs the request and
//! passes the response in. Failures carry the originating method and path
//! so a report line is enough to diagnose without re-running.

use serde_json::Value;

use crate::error::{ContractError, FieldMode, Result};
use crate::fixture::Fixture;
use crate::http::ApiResponse;

pub const NOT_FOUND: u16 = 404;

/// Fails with `StatusMismatch` unless the status is exactly `expected`. The
/// ok classification has to agree as well: an expected 2xx must be `ok`,
/// anything else must not be.
pub fn expect_status(response: &ApiResponse, expected: u16) -> Result<()> {
    let expect_ok = (200..300).contains(&expected);
    if response.status == expected && response.ok() == expect_ok {
        return Ok(());
    }
    Err(ContractError::StatusMismatch {
        method: response.method,
        path: response.path.clone(),
        expected,
        actual: response.status,
        ok: response.ok(),
    })
}

pub fn expect_field(
    response: &ApiResponse,
    field: &str,
    expected: impl Into<Value>,
    mode: FieldMode,
) -> Result<()> {
    let expected = expected.into();
    let actual = response.body.as_ref().and_then(|body| json_path_get(body, field));

    let matched = match (mode, actual) {
        (_, None) => false,
        (FieldMode::Equals, Some(actual)) => *actual == expected,
        (FieldMode::Contains, Some(actual)) => contains(actual, &expected),
    };
    if matched {
        return Ok(());
    }

    Err(ContractError::FieldMismatch {
        method: response.method,
        path: response.path.clone(),
        field: field.to_string(),
        mode,
        expected,
        actual: actual.cloned(),
    })
}

/// Equality on several fields; reports the first mismatch.
pub fn expect_fields(response: &ApiResponse, expected: &[(&str, Value)]) -> Result<()> {
    for (field, value) in expected {
        expect_field(response, field, value.clone(), FieldMode::Equals)?;
    }
    Ok(())
}

/// Round-trip check: each named field in the body equals the fixture's
/// last accepted value.
pub fn expect_matches_snapshot(
    response: &ApiResponse,
    fixture: &Fixture,
    fields: &[&str],
) -> Result<()> {
    for field in fields {
        let expected = json_path_get(&fixture.snapshot, field).ok_or_else(|| {
            ContractError::configuration(format!(
                "Fixture `{}` has no field `{field}` to compare",
                fixture.role
            ))
        })?;
        expect_field(response, field, expected.clone(), FieldMode::Equals)?;
    }
    Ok(())
}

/// Post-deletion lookup must be a 404. A success means the resource is
/// still there; any other status is an ordinary status mismatch.
pub fn expect_absence(response: &ApiResponse) -> Result<()> {
    if response.ok() {
        return Err(ContractError::UnexpectedPresence {
            method: response.method,
            path: response.path.clone(),
            status: response.status,
        });
    }
    expect_status(response, NOT_FOUND)
}

/// Containment: substring for strings, membership (or every element of an
/// expected array) for arrays, recursive subset for objects.
fn contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
        (Value::Array(items), Value::Array(wanted)) => {
            wanted.iter().all(|want| items.contains(want))
        }
        (Value::Array(items), wanted) => items.contains(wanted),
        (Value::Object(fields), Value::Object(wanted)) => wanted.iter().all(|(key, want)| {
            fields
                .get(key)
                .is_some_and(|have| have == want || contains(have, want))
        }),
        (actual, expected) => actual == expected,
    }
}

/// Gets a value from a JSON object using a simple path notation.
///
/// Supports:
/// - `field` - Direct field access
/// - `field.nested` - Nested field access
/// - `field[0]` - Array index access
pub fn json_path_get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;

    for part in path.split('.') {
        let (field_name, mut indexes) = match part.find('[') {
            Some(bracket_pos) => (&part[..bracket_pos], &part[bracket_pos..]),
            None => (part, ""),
        };

        if !field_name.is_empty() {
            current = current.get(field_name)?;
        }

        while let Some(rest) = indexes.strip_prefix('[') {
            let close = rest.find(']')?;
            let index: usize = rest[..close].parse().ok()?;
            current = current.get(index)?;
            indexes = &rest[close + 1..];
        }
        if !indexes.is_empty() {
            return None;
        }
    }

    Some(current)
}
