//! Base manager: versioned paths and raw request dispatch

use super::list::ListResult;
use crate::error::{Error, Result};
use crate::session::{RawResponse, ServiceRef, Session};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::{Map, Value};

/// Service coordinates and request helpers shared by every manager
#[derive(Debug, Clone, Default)]
pub struct BaseManager {
    service_type: String,
    endpoint_type: String,
    version: String,
    api_version: String,
    columns: Vec<String>,
    admin_columns: Vec<String>,
}

impl BaseManager {
    pub fn new(
        service_type: &str,
        endpoint_type: &str,
        version: &str,
        columns: &[&str],
        admin_columns: &[&str],
    ) -> Self {
        Self {
            service_type: service_type.to_string(),
            endpoint_type: endpoint_type.to_string(),
            version: version.to_string(),
            api_version: String::new(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            admin_columns: admin_columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn endpoint_type(&self) -> &str {
        &self.endpoint_type
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn service_ref(&self) -> ServiceRef<'_> {
        ServiceRef {
            service_type: &self.service_type,
            endpoint_type: &self.endpoint_type,
            api_version: &self.api_version,
        }
    }

    /// Columns to show in listings; admin columns only for system admins
    pub fn get_columns(&self, s: &dyn Session) -> Vec<String> {
        let mut cols = self.columns.clone();
        if s.has_system_admin_privilege() {
            cols.extend(self.admin_columns.iter().cloned());
        }
        cols
    }

    /// `/<version>/<path>`, or `/<path>` when no version is configured
    pub fn versioned_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if self.version.is_empty() {
            format!("/{}", path)
        } else {
            format!("/{}/{}", self.version, path)
        }
    }

    pub async fn json_request(
        &self,
        s: &dyn Session,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> Result<(HeaderMap, Option<Value>)> {
        s.json_version_request(
            self.service_ref(),
            method,
            &self.versioned_url(path),
            headers,
            body,
        )
        .await
    }

    pub async fn raw_request(
        &self,
        s: &dyn Session,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse> {
        s.raw_version_request(
            self.service_ref(),
            method,
            &self.versioned_url(path),
            headers,
            body,
        )
        .await
    }

    /// Request against the bare host of the service, e.g. `/version`
    pub async fn raw_base_url_request(
        &self,
        s: &dyn Session,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse> {
        s.raw_base_url_request(self.service_ref(), method, path, headers, body)
            .await
    }

    pub async fn get_version(&self, s: &dyn Session) -> Result<String> {
        let resp = self
            .raw_base_url_request(s, Method::GET, "/version", HeaderMap::new(), None)
            .await?;
        Ok(resp.text().trim().to_string())
    }

    pub async fn get_worker_stats(&self, s: &dyn Session) -> Result<Value> {
        let resp = self
            .raw_base_url_request(s, Method::GET, "/worker_stats", HeaderMap::new(), None)
            .await?;
        resp.json()
    }

    pub(crate) async fn fetch_list(
        &self,
        s: &dyn Session,
        path: &str,
        key: &str,
    ) -> Result<ListResult> {
        let (_, body) = self
            .json_request(s, Method::GET, path, HeaderMap::new(), None)
            .await?;
        let body = body.ok_or(Error::EmptyResponse)?;
        ListResult::from_response(&body, key).ok_or_else(|| Error::MissingField(key.to_string()))
    }

    pub(crate) async fn fetch(&self, s: &dyn Session, path: &str, key: &str) -> Result<Value> {
        let (_, body) = self
            .json_request(s, Method::GET, path, HeaderMap::new(), None)
            .await?;
        let body = body.ok_or(Error::EmptyResponse)?;
        unwrap_key(body, key)
    }

    /// HEAD; headers named `x-<key>-<field>` become `{"<field>": value}`
    pub(crate) async fn fetch_headers(
        &self,
        s: &dyn Session,
        path: &str,
        key: &str,
    ) -> Result<Value> {
        let (headers, _) = self
            .json_request(s, Method::HEAD, path, HeaderMap::new(), None)
            .await?;
        Ok(headers_to_json(&headers, key))
    }

    pub(crate) async fn submit(
        &self,
        s: &dyn Session,
        method: Method,
        path: &str,
        body: Option<&Value>,
        key: &str,
    ) -> Result<Value> {
        let (_, resp) = self.json_request(s, method, path, HeaderMap::new(), body).await?;
        match resp {
            Some(resp) => unwrap_key(resp, key),
            None => Ok(Value::Object(Map::new())),
        }
    }
}

fn unwrap_key(mut body: Value, key: &str) -> Result<Value> {
    if key.is_empty() {
        return Ok(body);
    }
    body.get_mut(key)
        .map(Value::take)
        .ok_or_else(|| Error::MissingField(key.to_string()))
}

pub(crate) fn headers_to_json(headers: &HeaderMap, key: &str) -> Value {
    let prefix = format!("x-{}-", key.to_lowercase());
    let mut obj = Map::new();
    for (name, value) in headers {
        let name = name.as_str().to_lowercase();
        let Some(field) = name.strip_prefix(&prefix) else {
            continue;
        };
        if obj.contains_key(field) {
            continue;
        }
        if let Ok(value) = value.to_str() {
            obj.insert(field.to_string(), Value::String(value.to_string()));
        }
    }
    Value::Object(obj)
}

/// Encode query parameters; nested objects use dotted keys, arrays repeat
/// the key, nulls are skipped
pub fn query_string(params: &Value) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Value::Object(map) = params {
        for (key, value) in map {
            push_query_parts(&mut parts, key, value);
        }
    }
    parts.join("&")
}

fn push_query_parts(parts: &mut Vec<String>, key: &str, value: &Value) {
    match value {
        Value::Null => {},
        Value::String(s) => parts.push(format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(s)
        )),
        Value::Number(n) => parts.push(format!("{}={}", urlencoding::encode(key), n)),
        Value::Bool(b) => parts.push(format!("{}={}", urlencoding::encode(key), b)),
        Value::Array(items) => {
            for item in items {
                push_query_parts(parts, key, item);
            }
        },
        Value::Object(map) => {
            for (sub, value) in map {
                push_query_parts(parts, &format!("{}.{}", key, sub), value);
            }
        },
    }
}

/// Append the query string of `params` to `path`
pub(crate) fn with_query(path: String, params: Option<&Value>) -> String {
    let Some(params) = params else {
        return path;
    };
    let qs = query_string(params);
    if qs.is_empty() {
        path
    } else if path.contains('?') {
        format!("{}&{}", path, qs)
    } else {
        format!("{}?{}", path, qs)
    }
}
