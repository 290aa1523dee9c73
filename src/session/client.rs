//! Client Session
//!
//! Concrete [`Session`] combining the endpoint catalog, the access token and
//! the HTTP transport.

use super::http::{HttpClient, RawResponse};
use super::{split_versioned_url, ServiceRef, Session};
use crate::config::{Config, EndpointConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

const INTERNAL_ENDPOINT_TYPE: &str = "internalURL";

/// Main client session
#[derive(Clone)]
pub struct ClientSession {
    pub http: HttpClient,
    catalog: HashMap<String, EndpointConfig>,
    token: String,
    api_version: String,
    endpoint_type: String,
    is_admin: bool,
}

impl ClientSession {
    /// Create a new session from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let http = HttpClient::new(config.timeout(), config.insecure)?;

        Ok(Self {
            http,
            catalog: config.endpoints.clone(),
            token: config.token.clone().unwrap_or_default(),
            api_version: config.effective_api_version(),
            endpoint_type: config.effective_endpoint_type(),
            is_admin: config.is_admin(),
        })
    }

    /// Switch the API version used for module lookup
    pub fn set_api_version(&mut self, version: &str) {
        self.api_version = version.to_string();
    }

    /// Find the catalog URL for a service, preferring `<service>_<apiversion>`
    fn resolve(&self, service_type: &str, endpoint_type: &str, api_version: &str) -> Result<String> {
        let endpoint = (!api_version.is_empty())
            .then(|| self.catalog.get(&format!("{}_{}", service_type, api_version)))
            .flatten()
            .or_else(|| self.catalog.get(service_type))
            .ok_or_else(|| Error::Endpoint(service_type.to_string()))?;

        let endpoint_type = if endpoint_type.is_empty() {
            self.endpoint_type.as_str()
        } else {
            endpoint_type
        };

        let url = match (endpoint_type, &endpoint.internal_url) {
            (INTERNAL_ENDPOINT_TYPE, Some(internal)) => internal,
            _ => &endpoint.url,
        };

        Ok(url.clone())
    }

    /// Join a request path onto the catalog URL. Versioned paths such as
    /// `/v1/images` replace the catalog's own version segment; other paths
    /// go under it.
    fn request_url(&self, svc: ServiceRef<'_>, path: &str) -> Result<String> {
        let versioned = self.resolve(svc.service_type, svc.endpoint_type, svc.api_version)?;
        let (base, version) = split_versioned_url(&versioned);
        if !version.is_empty() && path_has_version(path, version) {
            return Ok(join_url(base, path));
        }
        Ok(join_url(&versioned, path))
    }

    fn base_request_url(&self, svc: ServiceRef<'_>, path: &str) -> Result<String> {
        let versioned = self.resolve(svc.service_type, svc.endpoint_type, svc.api_version)?;
        let mut url = Url::parse(&versioned)?;
        url.set_path("");
        url.set_query(None);
        url.set_fragment(None);
        Ok(join_url(url.as_str(), path))
    }
}

fn path_has_version(path: &str, version: &str) -> bool {
    let segment = path
        .trim_start_matches('/')
        .split(['/', '?'])
        .next()
        .unwrap_or_default();
    segment.eq_ignore_ascii_case(version)
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[async_trait]
impl Session for ClientSession {
    async fn json_version_request(
        &self,
        svc: ServiceRef<'_>,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> Result<(HeaderMap, Option<Value>)> {
        let url = self.request_url(svc, path)?;
        self.http
            .json_request(method, &url, &self.token, headers, body)
            .await
    }

    async fn raw_version_request(
        &self,
        svc: ServiceRef<'_>,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse> {
        let url = self.request_url(svc, path)?;
        self.http
            .raw_request(method, &url, &self.token, headers, body)
            .await
    }

    async fn raw_base_url_request(
        &self,
        svc: ServiceRef<'_>,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse> {
        let url = self.base_request_url(svc, path)?;
        self.http
            .raw_request(method, &url, &self.token, headers, body)
            .await
    }

    fn get_service_url(&self, service_type: &str, endpoint_type: &str) -> Result<String> {
        let versioned = self.resolve(service_type, endpoint_type, &self.api_version)?;
        Ok(split_versioned_url(&versioned).0.to_string())
    }

    fn get_service_version_url(&self, service_type: &str, endpoint_type: &str) -> Result<String> {
        self.resolve(service_type, endpoint_type, &self.api_version)
    }

    fn get_api_version(&self) -> &str {
        &self.api_version
    }

    fn get_token(&self) -> &str {
        &self.token
    }

    fn has_system_admin_privilege(&self) -> bool {
        self.is_admin
    }
}
