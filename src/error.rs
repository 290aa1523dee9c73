//! Error types
//!
//! Every fallible operation in the library returns [`Result`]. Errors coming
//! back from the control plane with an HTTP status are carried as a
//! [`JsonClientError`], which is also what batch operations record per item.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error returned by the control plane, decoded from a non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{code} {class}: {details}")]
pub struct JsonClientError {
    pub code: u16,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonClientError {
    pub fn new(code: u16, class: &str, details: impl Into<String>) -> Self {
        Self {
            code,
            class: class.to_string(),
            details: details.into(),
            data: None,
        }
    }

    /// Decode an error body. Accepts `{"error": {...}}`, a flat
    /// `{"code", "class", "details"}` object, or anything else as plain text.
    pub fn from_body(status: u16, body: &str) -> Self {
        let fallback_class = default_class(status);

        let Ok(json) = serde_json::from_str::<Value>(body) else {
            return Self::new(status, fallback_class, body.trim());
        };

        let obj = match json.get("error") {
            Some(inner) if inner.is_object() => inner,
            _ => &json,
        };

        if !obj.is_object() {
            return Self::new(status, fallback_class, body.trim());
        }

        let code = obj
            .get("code")
            .and_then(|v| v.as_u64())
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(status);
        let class = obj
            .get("class")
            .and_then(|v| v.as_str())
            .unwrap_or(fallback_class);
        let details = obj
            .get("details")
            .or_else(|| obj.get("message"))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default();

        Self {
            code,
            class: class.to_string(),
            details,
            data: obj.get("data").cloned(),
        }
    }
}

fn default_class(status: u16) -> &'static str {
    match status {
        400 => "InputParameterError",
        401 => "UnauthorizedError",
        403 => "ForbiddenError",
        404 => "ResourceNotFoundError",
        409 => "ConflictError",
        429 => "TooManyRequestsError",
        500..=599 => "InternalServerError",
        _ => "ClientError",
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Client(#[from] JsonClientError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("duplicate {field} {name}")]
    DuplicateName { field: String, name: String },

    #[error("missing field {0} in response")]
    MissingField(String),

    #[error("empty response")]
    EmptyResponse,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("no endpoint for service {0}")]
    Endpoint(String),

    #[error("no such module {0}")]
    NoSuchModule(String),

    #[error("module {0} is not a joint module")]
    NotJoint(String),

    #[error("no version of module {0} matches the service endpoint")]
    VersionMismatch(String),

    #[error("module {keyword} already registered for api version {api_version:?}")]
    DuplicateModule { api_version: String, keyword: String },

    #[error("filter failed: {0}")]
    Filter(String),
}

impl Error {
    /// The error as the control plane would express it, if it maps to a status
    pub fn as_client_error(&self) -> Option<JsonClientError> {
        match self {
            Error::Client(e) => Some(e.clone()),
            Error::NotFound(_) => Some(JsonClientError::new(
                404,
                "ResourceNotFoundError",
                self.to_string(),
            )),
            Error::DuplicateName { .. } => Some(JsonClientError::new(
                409,
                "DuplicateNameError",
                self.to_string(),
            )),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Client(e) => Some(e.code),
            Error::NotFound(_) => Some(404),
            Error::DuplicateName { .. } => Some(409),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Only a 404 from the server counts; used for the id → name fallback
    pub fn is_server_not_found(&self) -> bool {
        matches!(self, Error::Client(e) if e.code == 404)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Format an error for display on the command line
pub fn format_error(error: &anyhow::Error) -> String {
    if let Some(err) = error.downcast_ref::<Error>() {
        match err.status_code() {
            Some(401) => return "Authentication failed. Check your token.".to_string(),
            Some(403) => return "Permission denied.".to_string(),
            Some(404) => return format!("Resource not found: {}", err),
            Some(409) => return format!("Resource conflict: {}", err),
            Some(429) => return "Rate limit exceeded. Please try again later.".to_string(),
            Some(code) if code >= 500 => {
                return "Service temporarily unavailable. Please try again.".to_string()
            },
            _ => {},
        }
    }

    let error_str = format!("{:#}", error);
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(160)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_body_nested_error() {
        let body = r#"{"error": {"code": 404, "class": "ResourceNotFoundError", "details": "server abc not found"}}"#;
        let err = JsonClientError::from_body(404, body);
        assert_eq!(err.code, 404);
        assert_eq!(err.class, "ResourceNotFoundError");
        assert_eq!(err.details, "server abc not found");
    }

    #[test]
    fn test_from_body_flat_error() {
        let body = r#"{"code": 409, "class": "DuplicateNameError", "details": "dup"}"#;
        let err = JsonClientError::from_body(400, body);
        assert_eq!(err.code, 409);
        assert_eq!(err.class, "DuplicateNameError");
    }

    #[test]
    fn test_from_body_plain_text() {
        let err = JsonClientError::from_body(502, "bad gateway\n");
        assert_eq!(err.code, 502);
        assert_eq!(err.class, "InternalServerError");
        assert_eq!(err.details, "bad gateway");
    }

    #[test]
    fn test_name_lookup_errors_map_to_status() {
        assert_eq!(Error::NotFound("x".into()).status_code(), Some(404));
        let dup = Error::DuplicateName {
            field: "name".into(),
            name: "x".into(),
        };
        assert_eq!(dup.as_client_error().map(|e| e.code), Some(409));
        assert!(!Error::NotFound("x".into()).is_server_not_found());
        assert!(Error::Client(JsonClientError::new(404, "", "")).is_server_not_found());
    }

    #[test]
    fn test_format_error_permission() {
        let err = anyhow::Error::new(Error::Client(JsonClientError::new(403, "ForbiddenError", "")));
        assert_eq!(format_error(&err), "Permission denied.");
    }
}
