//! Client session
//!
//! The resource managers never talk HTTP themselves: every request goes
//! through a [`Session`], which resolves the service endpoint and carries the
//! credentials.
//!
//! # Module Structure
//!
//! - [`client`] - [`ClientSession`], backed by a static endpoint catalog
//! - [`http`] - HTTP transport for JSON and raw requests

pub mod client;
pub mod http;

pub use client::ClientSession;
pub use http::{HttpClient, RawResponse};

use crate::error::Result;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;

/// Which backend a request is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceRef<'a> {
    pub service_type: &'a str,
    pub endpoint_type: &'a str,
    pub api_version: &'a str,
}

/// Contract between the resource managers and the transport
#[async_trait]
pub trait Session: Send + Sync {
    /// Send a JSON request to `path` under the service URL
    async fn json_version_request(
        &self,
        svc: ServiceRef<'_>,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> Result<(HeaderMap, Option<Value>)>;

    /// Send a request with an opaque body to `path` under the service URL
    async fn raw_version_request(
        &self,
        svc: ServiceRef<'_>,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse>;

    /// Like [`Session::raw_version_request`], but against the bare
    /// scheme://host:port of the service URL
    async fn raw_base_url_request(
        &self,
        svc: ServiceRef<'_>,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse>;

    /// Service URL with any trailing version segment removed
    fn get_service_url(&self, service_type: &str, endpoint_type: &str) -> Result<String>;

    /// Service URL exactly as published in the catalog
    fn get_service_version_url(&self, service_type: &str, endpoint_type: &str) -> Result<String>;

    fn get_api_version(&self) -> &str;

    fn get_token(&self) -> &str;

    fn has_system_admin_privilege(&self) -> bool;
}

/// Split a trailing `/vN` segment off a URL.
///
/// `http://host/api/v2/` → (`http://host/api`, `v2`);
/// a URL without a version segment comes back whole with an empty version.
pub fn split_versioned_url(url: &str) -> (&str, &str) {
    let trimmed = url.trim_end_matches('/');
    if let Some(pos) = trimmed.rfind('/') {
        let segment = &trimmed[pos + 1..];
        let mut chars = segment.chars();
        if matches!(chars.next(), Some('v') | Some('V')) {
            let digits = chars.as_str();
            if !digits.is_empty() && digits.parse::<u32>().is_ok() {
                return (&trimmed[..pos], segment);
            }
        }
    }
    (trimmed, "")
}
