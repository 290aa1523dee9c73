//! Batch fan-out helpers
//!
//! Each helper runs one call per item concurrently and waits for all of them.
//! Results come back in completion order: match them to inputs by
//! [`SubmitResult::id`], never by position. [`batch_do_ordered`] is the
//! variant for callers that need input order.

use super::list::SubmitResult;
use crate::error::{Error, Result};
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::future::Future;

/// Status recorded for failures that carry no status of their own
pub const GENERIC_ERROR_STATUS: u16 = 400;

fn to_submit_result(id: String, outcome: Result<Value>) -> SubmitResult {
    match outcome {
        Ok(data) => SubmitResult {
            status: 200,
            id,
            data,
        },
        Err(err) => match err.as_client_error() {
            Some(client_err) => SubmitResult {
                status: client_err.code,
                id,
                data: serde_json::to_value(&client_err).unwrap_or(Value::Null),
            },
            None => SubmitResult {
                status: GENERIC_ERROR_STATUS,
                id,
                data: Value::String(err.to_string()),
            },
        },
    }
}

/// Run `op` once per id; results in completion order
pub async fn batch_do<I, F, Fut>(ids: I, op: F) -> Vec<SubmitResult>
where
    I: IntoIterator,
    I::Item: Into<String>,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let mut pending: FuturesUnordered<_> = ids
        .into_iter()
        .map(|item| {
            let id: String = item.into();
            let call = op(id.clone());
            async move { to_submit_result(id, call.await) }
        })
        .collect();

    let mut results = Vec::with_capacity(pending.len());
    while let Some(result) = pending.next().await {
        results.push(result);
    }
    results
}

/// Same as [`batch_do`], but results follow the order of `ids`
pub async fn batch_do_ordered<I, F, Fut>(ids: I, op: F) -> Vec<SubmitResult>
where
    I: IntoIterator,
    I::Item: Into<String>,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    join_all(ids.into_iter().map(|item| {
        let id: String = item.into();
        let call = op(id.clone());
        async move { to_submit_result(id, call.await) }
    }))
    .await
}

/// Run `op` once per (id, params) pair; results in completion order.
/// Ids without a matching params entry fail with status 400.
pub async fn batch_params_do<F, Fut>(ids: &[String], params: &[Value], op: F) -> Vec<SubmitResult>
where
    F: Fn(String, Value) -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let mut results = Vec::with_capacity(ids.len());

    let mut pending: FuturesUnordered<_> = ids
        .iter()
        .zip(params.iter())
        .map(|(id, param)| {
            let call = op(id.clone(), param.clone());
            let id = id.clone();
            async move { to_submit_result(id, call.await) }
        })
        .collect();

    for id in ids.iter().skip(params.len()) {
        tracing::warn!("batch item {} has no params", id);
        results.push(SubmitResult {
            status: GENERIC_ERROR_STATUS,
            id: id.clone(),
            data: Value::String(format!("missing params for {}", id)),
        });
    }

    while let Some(result) = pending.next().await {
        results.push(result);
    }
    results
}

/// Run a class action once per params entry; results in completion order.
/// A successful result takes its id from the returned object's `id` field.
pub async fn batch_do_class_action<F, Fut>(batch_params: &[Value], op: F) -> Vec<SubmitResult>
where
    F: Fn(Value) -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let mut pending: FuturesUnordered<_> = batch_params
        .iter()
        .map(|param| {
            let call = op(param.clone());
            async move {
                let outcome = call.await;
                let id = match &outcome {
                    Ok(data) => data
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    Err(_) => String::new(),
                };
                to_submit_result(id, outcome)
            }
        })
        .collect();

    let mut results = Vec::with_capacity(batch_params.len());
    while let Some(result) = pending.next().await {
        results.push(result);
    }
    results
}

/// Turn a batch failure into one result per slot
pub(crate) fn fail_all(count: usize, err: &Error) -> Vec<SubmitResult> {
    let template = match err.as_client_error() {
        Some(client_err) => SubmitResult {
            status: client_err.code,
            id: String::new(),
            data: serde_json::to_value(&client_err).unwrap_or(Value::Null),
        },
        None => SubmitResult {
            status: 500,
            id: String::new(),
            data: Value::String(err.to_string()),
        },
    };
    vec![template; count]
}
