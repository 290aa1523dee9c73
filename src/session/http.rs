//! HTTP utilities for control plane REST calls

use crate::error::{Error, JsonClientError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let char_count = body.chars().count();
    let truncated = if char_count > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Response of a raw (non-JSON) request
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Result<Value> {
        if self.body.is_empty() {
            return Err(Error::EmptyResponse);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// HTTP client wrapper for control plane API calls
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(timeout: Duration, insecure: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mcclient/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure)
            .build()?;

        Ok(Self { client })
    }

    fn prepare(
        &self,
        method: Method,
        url: &str,
        token: &str,
        mut headers: HeaderMap,
    ) -> reqwest::RequestBuilder {
        let request_id = uuid::Uuid::new_v4().to_string();
        if let Ok(v) = HeaderValue::from_str(&request_id) {
            headers.insert(REQUEST_ID_HEADER, v);
        }
        if !token.is_empty() {
            if let Ok(v) = HeaderValue::from_str(token) {
                headers.insert(AUTH_TOKEN_HEADER, v);
            }
        }

        tracing::debug!("{} {} request_id={}", method, url, request_id);
        self.client.request(method, url).headers(headers)
    }

    /// Make a JSON request; an empty response body yields `None`
    pub async fn json_request(
        &self,
        method: Method,
        url: &str,
        token: &str,
        mut headers: HeaderMap,
        body: Option<&Value>,
    ) -> Result<(HeaderMap, Option<Value>)> {
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let is_head = method == Method::HEAD;

        let mut request = self.prepare(method, url, token, headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let resp_headers = response.headers().clone();
        let text = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&text));
            return Err(JsonClientError::from_body(status.as_u16(), &text).into());
        }

        if is_head || text.trim().is_empty() {
            return Ok((resp_headers, None));
        }

        let value = serde_json::from_str(&text)?;
        Ok((resp_headers, Some(value)))
    }

    /// Make a request with an opaque body
    pub async fn raw_request(
        &self,
        method: Method,
        url: &str,
        token: &str,
        mut headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse> {
        let mut request = self.prepare(method, url, token, HeaderMap::new());
        if let Some(body) = body {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/octet-stream"),
                );
            }
            request = request.body(body);
        }
        request = request.headers(headers);

        let response = request.send().await?;
        let status = response.status();
        let resp_headers = response.headers().clone();
        let bytes = response.bytes().await?.to_vec();

        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&text));
            return Err(JsonClientError::from_body(status.as_u16(), &text).into());
        }

        Ok(RawResponse {
            status,
            headers: resp_headers,
            body: bytes,
        })
    }
}
