//! Resource Manager
//!
//! CRUD, actions and batch operations for one resource type. Every operation
//! has an `_in_contexts` form taking the chain of parent resources the
//! resource is nested under, e.g. `/hosts/{id}/storages`.

use super::base::{with_query, BaseManager};
use super::batch::{batch_do, batch_do_class_action, batch_params_do, fail_all};
use super::list::{ListResult, SubmitResult};
use super::traits::{Batcher, Getter, Lister, Manager, Mutator};
use crate::error::{Error, Result};
use crate::session::Session;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const DEFAULT_NAME_FIELD: &str = "name";
pub const DEFAULT_ID_FIELD: &str = "id";

const METADATA_SPEC: &str = "metadata";
const PAGING_MARKER_PARAM: &str = "paging_marker";

/// Hook transforming an object on its way to or from the server.
/// Arguments: session, object, query params of the call.
pub type ResourceFilter =
    Arc<dyn Fn(&dyn Session, Value, Option<&Value>) -> Result<Value> + Send + Sync>;

/// A parent resource instance the call is scoped to
#[derive(Clone, Copy)]
pub struct ManagerContext<'a> {
    pub manager: &'a dyn Manager,
    pub instance_id: &'a str,
}

impl<'a> ManagerContext<'a> {
    pub fn new(manager: &'a dyn Manager, instance_id: &'a str) -> Self {
        Self {
            manager,
            instance_id,
        }
    }
}

#[derive(Clone)]
pub struct ResourceManager {
    pub base: BaseManager,
    context: String,
    keyword: String,
    keyword_plural: String,
    read_filter: Option<ResourceFilter>,
    write_filter: Option<ResourceFilter>,
    enable_filter: bool,
    name_field: String,
    id_field: String,
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("service_type", &self.base.service_type())
            .field("version", &self.base.version())
            .field("keyword_plural", &self.keyword_plural)
            .finish()
    }
}

impl ResourceManager {
    pub fn new(base: BaseManager, keyword: &str, keyword_plural: &str) -> Self {
        Self {
            base,
            context: String::new(),
            keyword: keyword.to_string(),
            keyword_plural: keyword_plural.to_string(),
            read_filter: None,
            write_filter: None,
            enable_filter: false,
            name_field: DEFAULT_NAME_FIELD.to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }

    /// Fixed path prefix placed before any parent contexts
    pub fn with_context(mut self, context: &str) -> Self {
        self.context = context.trim_matches('/').to_string();
        self
    }

    pub fn with_read_filter(mut self, filter: ResourceFilter) -> Self {
        self.read_filter = Some(filter);
        self.enable_filter = true;
        self
    }

    pub fn with_write_filter(mut self, filter: ResourceFilter) -> Self {
        self.write_filter = Some(filter);
        self.enable_filter = true;
        self
    }

    pub fn with_filters_enabled(mut self, enable: bool) -> Self {
        self.enable_filter = enable;
        self
    }

    pub fn with_name_field(mut self, field: &str) -> Self {
        self.name_field = field.to_string();
        self
    }

    pub fn with_id_field(mut self, field: &str) -> Self {
        self.id_field = field.to_string();
        self
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn name_field(&self) -> &str {
        &self.name_field
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn get_columns(&self, s: &dyn Session) -> Vec<String> {
        self.base.get_columns(s)
    }

    /// `[context/][parent/id/...]<url_path>`, without a leading slash
    pub fn context_path(&self, ctxs: &[ManagerContext<'_>]) -> String {
        let mut segs: Vec<String> = Vec::new();
        if !self.context.is_empty() {
            segs.push(self.context.clone());
        }
        for ctx in ctxs {
            segs.push(ctx.manager.key_string().to_string());
            if !ctx.instance_id.is_empty() {
                segs.push(urlencoding::encode(ctx.instance_id).into_owned());
            }
        }
        segs.push(self.url_path());
        segs.join("/")
    }

    fn instance_path(&self, ctxs: &[ManagerContext<'_>], id: &str) -> String {
        format!("/{}/{}", self.context_path(ctxs), urlencoding::encode(id))
    }

    fn instance_sub_path(&self, ctxs: &[ManagerContext<'_>], id: &str, sub: &str) -> String {
        format!(
            "{}/{}",
            self.instance_path(ctxs, id),
            urlencoding::encode(sub)
        )
    }

    /// Wrap params under `key`, passing them through the write filter first.
    /// A failing write filter is logged and the params are sent unfiltered.
    pub(crate) fn params_to_body(
        &self,
        s: &dyn Session,
        params: Option<&Value>,
        key: &str,
    ) -> Value {
        let mut body = Map::new();
        if let Some(params) = params {
            let mut params = params.clone();
            if let (true, Some(filter)) = (self.enable_filter, &self.write_filter) {
                match filter(s, params.clone(), None) {
                    Ok(filtered) => params = filtered,
                    Err(e) => tracing::warn!("write filter failed for {}: {}", self.keyword, e),
                }
            }
            body.insert(key.to_string(), params);
        }
        Value::Object(body)
    }

    pub(crate) fn filter_single(
        &self,
        s: &dyn Session,
        obj: Value,
        query: Option<&Value>,
    ) -> Result<Value> {
        match (self.enable_filter, &self.read_filter) {
            (true, Some(filter)) => filter(s, obj, query),
            _ => Ok(obj),
        }
    }

    pub(crate) fn filter_list(
        &self,
        s: &dyn Session,
        mut result: ListResult,
        query: Option<&Value>,
    ) -> Result<ListResult> {
        if let (true, Some(filter)) = (self.enable_filter, &self.read_filter) {
            result.data = result
                .data
                .into_iter()
                .map(|item| filter(s, item, query))
                .collect::<Result<Vec<_>>>()?;
        }
        Ok(result)
    }

    // =========================================================================
    // Read
    // =========================================================================

    pub async fn get_by_id_in_contexts(
        &self,
        s: &dyn Session,
        id: &str,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<Value> {
        let path = with_query(self.instance_path(ctxs, id), params);
        let obj = self.base.fetch(s, &path, &self.keyword).await?;
        self.filter_single(s, obj, params)
    }

    /// List filtered by the name field; exactly one exact match is required
    pub async fn get_by_name_in_contexts(
        &self,
        s: &dyn Session,
        name: &str,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<Value> {
        let mut query = params
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        query.insert(self.name_field.clone(), Value::String(name.to_string()));

        let results = self
            .list_in_contexts(s, Some(&Value::Object(query)), ctxs)
            .await?;

        match results.data.len() {
            0 => Err(Error::NotFound(format!("{} {}", self.keyword, name))),
            1 => {
                let found = results.data.into_iter().next().unwrap_or_default();
                let matches = found
                    .get(&self.name_field)
                    .and_then(Value::as_str)
                    .is_some_and(|n| n == name);
                if matches {
                    Ok(found)
                } else {
                    Err(Error::NotFound(format!("{} {}", self.keyword, name)))
                }
            },
            _ => Err(Error::DuplicateName {
                field: self.name_field.clone(),
                name: name.to_string(),
            }),
        }
    }

    /// Get by id; a 404 from the server retries the lookup by name
    pub async fn get_in_contexts(
        &self,
        s: &dyn Session,
        id: &str,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<Value> {
        match self.get_by_id_in_contexts(s, id, params, ctxs).await {
            Err(e) if e.is_server_not_found() => {
                tracing::debug!("{} {} not found by id, trying name", self.keyword, id);
                self.get_by_name_in_contexts(s, id, params, ctxs).await
            },
            other => other,
        }
    }

    pub async fn get_in_context(
        &self,
        s: &dyn Session,
        id: &str,
        params: Option<&Value>,
        ctx: &dyn Manager,
        ctx_id: &str,
    ) -> Result<Value> {
        self.get_in_contexts(s, id, params, &[ManagerContext::new(ctx, ctx_id)])
            .await
    }

    pub async fn get_id_in_contexts(
        &self,
        s: &dyn Session,
        id_or_name: &str,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<String> {
        let obj = self.get_in_contexts(s, id_or_name, params, ctxs).await?;
        obj.get(&self.id_field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::MissingField(self.id_field.clone()))
    }

    pub async fn get_specific_in_contexts(
        &self,
        s: &dyn Session,
        id: &str,
        spec: &str,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<Value> {
        let path = with_query(self.instance_sub_path(ctxs, id, spec), params);
        self.base.fetch(s, &path, &self.keyword).await
    }

    pub async fn head_in_contexts(
        &self,
        s: &dyn Session,
        id: &str,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<Value> {
        let path = with_query(self.instance_path(ctxs, id), params);
        let obj = self.base.fetch_headers(s, &path, &self.keyword).await?;
        self.filter_single(s, obj, params)
    }

    pub async fn list_in_contexts(
        &self,
        s: &dyn Session,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<ListResult> {
        let path = with_query(format!("/{}", self.context_path(ctxs)), params);
        let results = self.base.fetch_list(s, &path, &self.keyword_plural).await?;
        self.filter_list(s, results, params)
    }

    pub async fn list_in_context(
        &self,
        s: &dyn Session,
        params: Option<&Value>,
        ctx: &dyn Manager,
        ctx_id: &str,
    ) -> Result<ListResult> {
        self.list_in_contexts(s, params, &[ManagerContext::new(ctx, ctx_id)])
            .await
    }

    /// Fetch every page, following `next_marker` or `offset`/`total`
    pub async fn list_all_in_contexts(
        &self,
        s: &dyn Session,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<ListResult> {
        let mut query = params
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let mut all_items = Vec::new();
        let mut last_marker = String::new();
        // Pages may omit `offset`, so count what has been read locally.
        // The counter only grows, which keeps offset paging finite.
        let mut next_offset = query.get("offset").map(query_offset).unwrap_or(0);

        loop {
            let page = self
                .list_in_contexts(s, Some(&Value::Object(query.clone())), ctxs)
                .await?;
            let fetched = page.data.len() as u64;
            all_items.extend(page.data);

            if fetched == 0 {
                break;
            }
            if !page.next_marker.is_empty() {
                if page.next_marker == last_marker {
                    tracing::warn!("{} paging marker did not advance", self.keyword_plural);
                    break;
                }
                last_marker = page.next_marker.clone();
                query.insert(PAGING_MARKER_PARAM.to_string(), page.next_marker.into());
                continue;
            }
            next_offset += fetched;
            if page.limit > 0 && next_offset < page.total {
                query.insert("offset".to_string(), next_offset.into());
                continue;
            }
            break;
        }

        Ok(ListResult::new(
            all_items,
            0,
            0,
            0,
            String::new(),
            String::new(),
            String::new(),
        ))
    }

    // =========================================================================
    // Write
    // =========================================================================

    pub async fn create_in_contexts(
        &self,
        s: &dyn Session,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<Value> {
        let path = format!("/{}", self.context_path(ctxs));
        let body = self.params_to_body(s, params, &self.keyword);
        let result = self
            .base
            .submit(s, Method::POST, &path, Some(&body), &self.keyword)
            .await?;
        self.filter_single(s, result, None)
    }

    pub async fn create_in_context(
        &self,
        s: &dyn Session,
        params: Option<&Value>,
        ctx: &dyn Manager,
        ctx_id: &str,
    ) -> Result<Value> {
        self.create_in_contexts(s, params, &[ManagerContext::new(ctx, ctx_id)])
            .await
    }

    /// Single POST carrying `count`; the server creates the resources and
    /// answers with one `{status, body}` entry per resource
    pub async fn batch_create_in_contexts(
        &self,
        s: &dyn Session,
        params: Option<&Value>,
        count: usize,
        ctxs: &[ManagerContext<'_>],
    ) -> Vec<SubmitResult> {
        let path = format!("/{}", self.context_path(ctxs));
        let mut body = self.params_to_body(s, params, &self.keyword);
        if let Value::Object(map) = &mut body {
            map.insert("count".to_string(), count.into());
        }

        let resp = match self
            .base
            .submit(s, Method::POST, &path, Some(&body), &self.keyword_plural)
            .await
        {
            Ok(resp) => resp,
            Err(e) => return fail_all(count, &e),
        };

        let Some(items) = resp.as_array() else {
            return vec![internal_error("Invalid response"); count];
        };

        let mut results: Vec<SubmitResult> = items
            .iter()
            .map(|item| {
                let status = item
                    .get("status")
                    .and_then(Value::as_u64)
                    .and_then(|v| u16::try_from(v).ok())
                    .unwrap_or(500);
                let mut data = item.get("body").cloned().unwrap_or(Value::Null);
                if let (true, Some(filter)) = (self.enable_filter, &self.read_filter) {
                    match filter(s, data.clone(), None) {
                        Ok(filtered) => data = filtered,
                        Err(e) => tracing::warn!("read filter failed for {}: {}", self.keyword, e),
                    }
                }
                let id = data
                    .get(&self.id_field)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                SubmitResult { status, id, data }
            })
            .collect();

        if results.len() < count {
            tracing::warn!(
                "batch create of {} returned {} of {} results",
                self.keyword_plural,
                results.len(),
                count
            );
            results.resize(count, internal_error("Missing result"));
        }
        results
    }

    pub async fn put_in_contexts(
        &self,
        s: &dyn Session,
        id: &str,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<Value> {
        let path = self.instance_path(ctxs, id);
        let body = self.params_to_body(s, params, &self.keyword);
        let result = self
            .base
            .submit(s, Method::PUT, &path, Some(&body), &self.keyword)
            .await?;
        self.filter_single(s, result, None)
    }

    pub async fn put_in_context(
        &self,
        s: &dyn Session,
        id: &str,
        params: Option<&Value>,
        ctx: &dyn Manager,
        ctx_id: &str,
    ) -> Result<Value> {
        self.put_in_contexts(s, id, params, &[ManagerContext::new(ctx, ctx_id)])
            .await
    }

    pub async fn put_specific_in_contexts(
        &self,
        s: &dyn Session,
        id: &str,
        spec: &str,
        query: Option<&Value>,
        body: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<Value> {
        let path = with_query(self.instance_sub_path(ctxs, id, spec), query);
        let body = body.map(|b| self.params_to_body(s, Some(b), &self.keyword));
        let result = self
            .base
            .submit(s, Method::PUT, &path, body.as_ref(), &self.keyword)
            .await?;
        self.filter_single(s, result, None)
    }

    pub async fn patch_in_contexts(
        &self,
        s: &dyn Session,
        id: &str,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<Value> {
        let path = self.instance_path(ctxs, id);
        let body = self.params_to_body(s, params, &self.keyword);
        let result = self
            .base
            .submit(s, Method::PATCH, &path, Some(&body), &self.keyword)
            .await?;
        self.filter_single(s, result, None)
    }

    pub async fn patch_in_context(
        &self,
        s: &dyn Session,
        id: &str,
        params: Option<&Value>,
        ctx: &dyn Manager,
        ctx_id: &str,
    ) -> Result<Value> {
        self.patch_in_contexts(s, id, params, &[ManagerContext::new(ctx, ctx_id)])
            .await
    }

    pub async fn perform_action_in_contexts(
        &self,
        s: &dyn Session,
        id: &str,
        action: &str,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<Value> {
        let path = self.instance_sub_path(ctxs, id, action);
        let body = self.params_to_body(s, params, &self.keyword);
        let result = self
            .base
            .submit(s, Method::POST, &path, Some(&body), &self.keyword)
            .await?;
        self.filter_single(s, result, None)
    }

    pub async fn perform_action_in_context(
        &self,
        s: &dyn Session,
        id: &str,
        action: &str,
        params: Option<&Value>,
        ctx: &dyn Manager,
        ctx_id: &str,
    ) -> Result<Value> {
        self.perform_action_in_contexts(s, id, action, params, &[ManagerContext::new(ctx, ctx_id)])
            .await
    }

    /// Action on the collection: `POST /<plural>/<action>`, wrapped under the plural keyword
    pub async fn perform_class_action_in_contexts(
        &self,
        s: &dyn Session,
        action: &str,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<Value> {
        let path = format!(
            "/{}/{}",
            self.context_path(ctxs),
            urlencoding::encode(action)
        );
        let body = self.params_to_body(s, params, &self.keyword_plural);
        self.base
            .submit(s, Method::POST, &path, Some(&body), &self.keyword_plural)
            .await
    }

    pub async fn delete_in_contexts(
        &self,
        s: &dyn Session,
        id: &str,
        query: Option<&Value>,
        body: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Result<Value> {
        let path = with_query(self.instance_path(ctxs, id), query);
        let body = body.map(|b| self.params_to_body(s, Some(b), &self.keyword));
        let result = self
            .base
            .submit(s, Method::DELETE, &path, body.as_ref(), &self.keyword)
            .await?;
        self.filter_single(s, result, None)
    }

    pub async fn delete_in_context(
        &self,
        s: &dyn Session,
        id: &str,
        body: Option<&Value>,
        ctx: &dyn Manager,
        ctx_id: &str,
    ) -> Result<Value> {
        self.delete_in_contexts(s, id, None, body, &[ManagerContext::new(ctx, ctx_id)])
            .await
    }

    // =========================================================================
    // Batch (client side fan-out, completion order)
    // =========================================================================

    pub async fn batch_get_in_contexts(
        &self,
        s: &dyn Session,
        ids: &[String],
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Vec<SubmitResult> {
        batch_do(ids.iter().cloned(), move |id| async move {
            self.get_in_contexts(s, &id, params, ctxs).await
        })
        .await
    }

    pub async fn batch_put_in_contexts(
        &self,
        s: &dyn Session,
        ids: &[String],
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Vec<SubmitResult> {
        batch_do(ids.iter().cloned(), move |id| async move {
            self.put_in_contexts(s, &id, params, ctxs).await
        })
        .await
    }

    pub async fn batch_params_put_in_contexts(
        &self,
        s: &dyn Session,
        ids: &[String],
        params: &[Value],
        ctxs: &[ManagerContext<'_>],
    ) -> Vec<SubmitResult> {
        batch_params_do(ids, params, move |id, param| async move {
            self.put_in_contexts(s, &id, Some(&param), ctxs).await
        })
        .await
    }

    pub async fn batch_patch_in_contexts(
        &self,
        s: &dyn Session,
        ids: &[String],
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Vec<SubmitResult> {
        batch_do(ids.iter().cloned(), move |id| async move {
            self.patch_in_contexts(s, &id, params, ctxs).await
        })
        .await
    }

    pub async fn batch_perform_action_in_contexts(
        &self,
        s: &dyn Session,
        ids: &[String],
        action: &str,
        params: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Vec<SubmitResult> {
        batch_do(ids.iter().cloned(), move |id| async move {
            self.perform_action_in_contexts(s, &id, action, params, ctxs)
                .await
        })
        .await
    }

    pub async fn batch_perform_class_action_in_contexts(
        &self,
        s: &dyn Session,
        action: &str,
        batch_params: &[Value],
        ctxs: &[ManagerContext<'_>],
    ) -> Vec<SubmitResult> {
        batch_do_class_action(batch_params, move |params| async move {
            self.perform_class_action_in_contexts(s, action, Some(&params), ctxs)
                .await
        })
        .await
    }

    pub async fn batch_delete_in_contexts(
        &self,
        s: &dyn Session,
        ids: &[String],
        query: Option<&Value>,
        body: Option<&Value>,
        ctxs: &[ManagerContext<'_>],
    ) -> Vec<SubmitResult> {
        batch_do(ids.iter().cloned(), move |id| async move {
            self.delete_in_contexts(s, &id, query, body, ctxs).await
        })
        .await
    }
}

fn internal_error(message: &str) -> SubmitResult {
    SubmitResult {
        status: 500,
        id: String::new(),
        data: Value::String(message.to_string()),
    }
}

/// Starting offset from a list query, given as a number or a numeric string
fn query_offset(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

impl Manager for ResourceManager {
    fn keyword(&self) -> &str {
        &self.keyword
    }

    fn key_string(&self) -> &str {
        &self.keyword_plural
    }

    fn service_type(&self) -> &str {
        self.base.service_type()
    }

    fn endpoint_type(&self) -> &str {
        self.base.endpoint_type()
    }

    fn version(&self) -> &str {
        self.base.version()
    }

    fn api_version(&self) -> &str {
        self.base.api_version()
    }
}

#[async_trait]
impl Lister for ResourceManager {
    async fn list(&self, s: &dyn Session, params: Option<&Value>) -> Result<ListResult> {
        self.list_in_contexts(s, params, &[]).await
    }

    async fn list_all(&self, s: &dyn Session, params: Option<&Value>) -> Result<ListResult> {
        self.list_all_in_contexts(s, params, &[]).await
    }
}

#[async_trait]
impl Getter for ResourceManager {
    async fn get(&self, s: &dyn Session, id: &str, params: Option<&Value>) -> Result<Value> {
        self.get_in_contexts(s, id, params, &[]).await
    }

    async fn get_by_id(&self, s: &dyn Session, id: &str, params: Option<&Value>) -> Result<Value> {
        self.get_by_id_in_contexts(s, id, params, &[]).await
    }

    async fn get_by_name(
        &self,
        s: &dyn Session,
        name: &str,
        params: Option<&Value>,
    ) -> Result<Value> {
        self.get_by_name_in_contexts(s, name, params, &[]).await
    }

    async fn get_id(
        &self,
        s: &dyn Session,
        id_or_name: &str,
        params: Option<&Value>,
    ) -> Result<String> {
        self.get_id_in_contexts(s, id_or_name, params, &[]).await
    }

    async fn get_specific(
        &self,
        s: &dyn Session,
        id: &str,
        spec: &str,
        params: Option<&Value>,
    ) -> Result<Value> {
        self.get_specific_in_contexts(s, id, spec, params, &[]).await
    }

    async fn head(&self, s: &dyn Session, id: &str, params: Option<&Value>) -> Result<Value> {
        self.head_in_contexts(s, id, params, &[]).await
    }

    async fn get_metadata(
        &self,
        s: &dyn Session,
        id: &str,
        params: Option<&Value>,
    ) -> Result<Value> {
        self.get_specific_in_contexts(s, id, METADATA_SPEC, params, &[])
            .await
    }
}

#[async_trait]
impl Mutator for ResourceManager {
    async fn create(&self, s: &dyn Session, params: Option<&Value>) -> Result<Value> {
        self.create_in_contexts(s, params, &[]).await
    }

    async fn update(&self, s: &dyn Session, id: &str, params: Option<&Value>) -> Result<Value> {
        self.put_in_contexts(s, id, params, &[]).await
    }

    async fn put_specific(
        &self,
        s: &dyn Session,
        id: &str,
        spec: &str,
        query: Option<&Value>,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.put_specific_in_contexts(s, id, spec, query, body, &[])
            .await
    }

    async fn patch(&self, s: &dyn Session, id: &str, params: Option<&Value>) -> Result<Value> {
        self.patch_in_contexts(s, id, params, &[]).await
    }

    async fn delete(&self, s: &dyn Session, id: &str, body: Option<&Value>) -> Result<Value> {
        self.delete_in_contexts(s, id, None, body, &[]).await
    }

    async fn delete_with_param(
        &self,
        s: &dyn Session,
        id: &str,
        query: Option<&Value>,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.delete_in_contexts(s, id, query, body, &[]).await
    }

    async fn perform_action(
        &self,
        s: &dyn Session,
        id: &str,
        action: &str,
        params: Option<&Value>,
    ) -> Result<Value> {
        self.perform_action_in_contexts(s, id, action, params, &[])
            .await
    }

    async fn perform_class_action(
        &self,
        s: &dyn Session,
        action: &str,
        params: Option<&Value>,
    ) -> Result<Value> {
        self.perform_class_action_in_contexts(s, action, params, &[])
            .await
    }

    async fn set_metadata(
        &self,
        s: &dyn Session,
        id: &str,
        params: Option<&Value>,
    ) -> Result<Value> {
        self.perform_action_in_contexts(s, id, METADATA_SPEC, params, &[])
            .await
    }
}

#[async_trait]
impl Batcher for ResourceManager {
    async fn batch_get(
        &self,
        s: &dyn Session,
        ids: &[String],
        params: Option<&Value>,
    ) -> Vec<SubmitResult> {
        self.batch_get_in_contexts(s, ids, params, &[]).await
    }

    async fn batch_create(
        &self,
        s: &dyn Session,
        params: Option<&Value>,
        count: usize,
    ) -> Vec<SubmitResult> {
        self.batch_create_in_contexts(s, params, count, &[]).await
    }

    async fn batch_update(
        &self,
        s: &dyn Session,
        ids: &[String],
        params: Option<&Value>,
    ) -> Vec<SubmitResult> {
        self.batch_put_in_contexts(s, ids, params, &[]).await
    }

    async fn batch_params_update(
        &self,
        s: &dyn Session,
        ids: &[String],
        params: &[Value],
    ) -> Vec<SubmitResult> {
        self.batch_params_put_in_contexts(s, ids, params, &[]).await
    }

    async fn batch_patch(
        &self,
        s: &dyn Session,
        ids: &[String],
        params: Option<&Value>,
    ) -> Vec<SubmitResult> {
        self.batch_patch_in_contexts(s, ids, params, &[]).await
    }

    async fn batch_delete(
        &self,
        s: &dyn Session,
        ids: &[String],
        body: Option<&Value>,
    ) -> Vec<SubmitResult> {
        self.batch_delete_in_contexts(s, ids, None, body, &[]).await
    }

    async fn batch_delete_with_param(
        &self,
        s: &dyn Session,
        ids: &[String],
        query: Option<&Value>,
        body: Option<&Value>,
    ) -> Vec<SubmitResult> {
        self.batch_delete_in_contexts(s, ids, query, body, &[]).await
    }

    async fn batch_perform_action(
        &self,
        s: &dyn Session,
        ids: &[String],
        action: &str,
        params: Option<&Value>,
    ) -> Vec<SubmitResult> {
        self.batch_perform_action_in_contexts(s, ids, action, params, &[])
            .await
    }

    async fn batch_perform_class_action(
        &self,
        s: &dyn Session,
        action: &str,
        batch_params: &[Value],
    ) -> Vec<SubmitResult> {
        self.batch_perform_class_action_in_contexts(s, action, batch_params, &[])
            .await
    }
}
