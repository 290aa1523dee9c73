//! List and batch result types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One page of a list call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResult {
    pub data: Vec<Value>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub next_marker: String,
    pub marker_field: String,
    pub marker_order: String,
}

impl ListResult {
    /// Build a result, inferring `total` from the page when the server did
    /// not report one and no marker paging is in use
    pub fn new(
        data: Vec<Value>,
        total: u64,
        limit: u64,
        offset: u64,
        next_marker: String,
        marker_field: String,
        marker_order: String,
    ) -> Self {
        let total = if next_marker.is_empty() && total == 0 {
            data.len() as u64
        } else {
            total
        };

        Self {
            data,
            total,
            limit,
            offset,
            next_marker,
            marker_field,
            marker_order,
        }
    }

    /// Read a list response whose items sit under `key`.
    /// Returns `None` when `key` is not an array.
    pub fn from_response(body: &Value, key: &str) -> Option<Self> {
        let data = body.get(key)?.as_array()?.clone();
        let int = |k: &str| body.get(k).and_then(Value::as_u64).unwrap_or(0);
        let string = |k: &str| {
            body.get(k)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Some(Self::new(
            data,
            int("total"),
            int("limit"),
            int("offset"),
            string("next_marker"),
            string("marker_field"),
            string("marker_order"),
        ))
    }

    /// Inverse of [`ListResult::to_json`]; a missing `data` array reads as empty
    pub fn from_json(value: &Value) -> Self {
        match Self::from_response(value, "data") {
            Some(result) => result,
            None => Self::from_response(&with_empty_data(value), "data").unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> Value {
        self.to_json_with_key("data")
    }

    /// Serialize with items under `key`; zero and empty fields are omitted
    pub fn to_json_with_key(&self, key: &str) -> Value {
        let mut obj = Map::new();
        if self.total > 0 {
            obj.insert("total".to_string(), self.total.into());
        }
        if self.limit > 0 {
            obj.insert("limit".to_string(), self.limit.into());
        }
        if self.offset > 0 {
            obj.insert("offset".to_string(), self.offset.into());
        }
        if !self.next_marker.is_empty() {
            obj.insert("next_marker".to_string(), self.next_marker.clone().into());
        }
        if !self.marker_field.is_empty() {
            obj.insert("marker_field".to_string(), self.marker_field.clone().into());
        }
        if !self.marker_order.is_empty() {
            obj.insert("marker_order".to_string(), self.marker_order.clone().into());
        }
        obj.insert(key.to_string(), Value::Array(self.data.clone()));
        Value::Object(obj)
    }
}

fn with_empty_data(value: &Value) -> Value {
    let mut obj = value.as_object().cloned().unwrap_or_default();
    obj.insert("data".to_string(), Value::Array(Vec::new()));
    Value::Object(obj)
}

/// Outcome of one item of a batch operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResult {
    pub status: u16,
    pub id: String,
    pub data: Value,
}

impl SubmitResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
