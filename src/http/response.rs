use serde_json::Value;

use super::method::HttpMethod;

/// Normalized outcome of one request. Non-2xx statuses are ordinary
/// responses; only the assertions decide whether they are failures.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub method: HttpMethod,
    pub path: String,
    pub status: u16,
    /// Parsed JSON body, `None` when the body was empty or not JSON.
    pub body: Option<Value>,
    pub text: String,
    pub duration_ms: u64,
}

impl ApiResponse {
    /// 2xx classification, mirroring `fetch`-style `ok`.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn from_parts(
        method: HttpMethod,
        path: impl Into<String>,
        status: u16,
        text: String,
    ) -> Self {
        let body = parse_body(&text);
        Self {
            method,
            path: path.into(),
            status,
            body,
            text,
            duration_ms: 0,
        }
    }
}

fn parse_body(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}
