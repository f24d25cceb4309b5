use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use crate::environment::RunEnvironment;
use crate::error::{ContractError, Result};

use super::method::HttpMethod;
use super::request::ApiRequest;
use super::response::ApiResponse;

/// Thin wrapper over a reqwest client bound to the service's base URL.
///
/// The client never retries and never caches. Anything that produced a
/// status line is returned as an [`ApiResponse`]; only failures to obtain
/// a response become [`ContractError::Transport`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(env: &RunEnvironment) -> Result<Self> {
        let mut headers = build_headers(&env.headers)?;
        headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(env.timeout)
            .build()
            .map_err(|err| {
                ContractError::configuration(format!("Failed to build HTTP client: {err}"))
            })?;

        Ok(Self {
            http,
            base_url: env.base_url.trim_end_matches('/').to_string(),
            timeout: env.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn create(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(ApiRequest::new(HttpMethod::Post, path).json(body)).await
    }

    pub async fn read(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse> {
        let request = query
            .iter()
            .fold(ApiRequest::new(HttpMethod::Get, path), |request, (key, value)| {
                request.query(*key, *value)
            });
        self.send(request).await
    }

    pub async fn update(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(ApiRequest::new(HttpMethod::Put, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::new(HttpMethod::Delete, path)).await
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let ApiRequest {
            method,
            path,
            query,
            body,
            timeout,
        } = request;
        let limit = timeout.unwrap_or(self.timeout);

        let mut url = self.url_for(&path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &query {
                pairs.append_pair(key, value);
            }
        }

        let mut builder = self.http.request(method.into(), url).timeout(limit);
        if let Some(body) = body.filter(|_| method.has_body()) {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        debug!(%method, %path, "sending request");
        let started = Instant::now();
        let transport = |err: reqwest::Error| ContractError::Transport {
            method,
            path: path.clone(),
            timeout: err.is_timeout().then_some(limit),
            message: err.to_string(),
        };

        let response = builder.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport)?;
        let duration_ms = started.elapsed().as_millis() as u64;

        debug!(%method, %path, status, duration_ms, "received response");

        let mut response = ApiResponse::from_parts(method, path.clone(), status, text);
        response.duration_ms = duration_ms;
        Ok(response)
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        let joined = if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        };
        Url::parse(&joined).map_err(|err| {
            ContractError::configuration(format!("Invalid URL `{joined}`: {err}"))
        })
    }
}

pub fn build_headers(input: &[(String, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    for (key, value) in input {
        if key.is_empty() {
            continue;
        }

        let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
            ContractError::configuration(format!("Invalid header name `{key}`: {err}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|err| {
            ContractError::configuration(format!("Invalid header value for `{key}`: {err}"))
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}
