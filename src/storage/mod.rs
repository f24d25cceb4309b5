use std::fs;
use std::path::Path;

use tracing::debug;

use crate::environment::TestData;
use crate::error::{ContractError, Result};
use crate::testing::RunReport;

/// Reads the literal fixture values (`{"user": {...}, "pet": {...}}`).
pub fn load_test_data(path: &Path) -> Result<TestData> {
    let raw = fs::read_to_string(path).map_err(|e| {
        ContractError::configuration(format!(
            "Failed to read test data file `{}`: {e}",
            path.display()
        ))
    })?;
    let data = serde_json::from_str(&raw).map_err(|e| {
        ContractError::configuration(format!(
            "Failed to parse test data file `{}`: {e}",
            path.display()
        ))
    })?;
    debug!(path = %path.display(), "loaded test data");
    Ok(data)
}

/// Writes the run report as pretty JSON, creating parent directories.
pub fn save_report(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            ContractError::configuration(format!(
                "Failed to create report directory `{}`: {e}",
                parent.display()
            ))
        })?;
    }

    let raw = serde_json::to_string_pretty(report)
        .map_err(|e| ContractError::configuration(format!("Failed to serialize report: {e}")))?;
    fs::write(path, raw).map_err(|e| {
        ContractError::configuration(format!(
            "Failed to write report file `{}`: {e}",
            path.display()
        ))
    })
}
