//! In-memory session for unit tests

use crate::error::{Error, JsonClientError, Result};
use crate::session::{RawResponse, ServiceRef, Session};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use std::sync::Mutex;

type Handler = Box<dyn Fn(&Method, &str, Option<&Value>) -> Result<Option<Value>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Session answering every request from a closure and recording what was sent
pub struct FakeSession {
    handler: Handler,
    pub headers: HeaderMap,
    pub admin: bool,
    pub api_version: String,
    pub requests: Mutex<Vec<Recorded>>,
}

impl FakeSession {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Method, &str, Option<&Value>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            headers: HeaderMap::new(),
            admin: false,
            api_version: String::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same body
    pub fn replying(body: Value) -> Self {
        Self::new(move |_, _, _| Ok(Some(body.clone())))
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

pub fn not_found() -> Error {
    Error::Client(JsonClientError::new(404, "ResourceNotFoundError", "not found"))
}

#[async_trait]
impl Session for FakeSession {
    async fn json_version_request(
        &self,
        _svc: ServiceRef<'_>,
        method: Method,
        path: &str,
        _headers: HeaderMap,
        body: Option<&Value>,
    ) -> Result<(HeaderMap, Option<Value>)> {
        self.requests.lock().unwrap().push(Recorded {
            method: method.clone(),
            path: path.to_string(),
            body: body.cloned(),
        });
        let resp = (self.handler)(&method, path, body)?;
        Ok((self.headers.clone(), resp))
    }

    async fn raw_version_request(
        &self,
        svc: ServiceRef<'_>,
        method: Method,
        path: &str,
        headers: HeaderMap,
        _body: Option<Vec<u8>>,
    ) -> Result<RawResponse> {
        let (headers, body) = self
            .json_version_request(svc, method, path, headers, None)
            .await?;
        Ok(RawResponse {
            status: reqwest::StatusCode::OK,
            headers,
            body: body.map(|b| b.to_string().into_bytes()).unwrap_or_default(),
        })
    }

    async fn raw_base_url_request(
        &self,
        svc: ServiceRef<'_>,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse> {
        self.raw_version_request(svc, method, path, headers, body)
            .await
    }

    fn get_service_url(&self, service_type: &str, _endpoint_type: &str) -> Result<String> {
        Ok(format!("http://{}.test", service_type))
    }

    fn get_service_version_url(&self, service_type: &str, _endpoint_type: &str) -> Result<String> {
        Ok(format!("http://{}.test/v2", service_type))
    }

    fn get_api_version(&self) -> &str {
        &self.api_version
    }

    fn get_token(&self) -> &str {
        "test-token"
    }

    fn has_system_admin_privilege(&self) -> bool {
        self.admin
    }
}
