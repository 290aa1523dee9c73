//! Joint Resource Manager
//!
//! A joint resource is the association between a master and a slave
//! resource, e.g. a storage attached to a host. It is only reachable under a
//! specific master or slave instance:
//!
//! - `/<master>/<mid>/<slave>` - slaves of a master
//! - `/<slave>/<sid>/<master>` - masters of a slave
//! - `/<master>/<mid>/<slave>/<sid>` - the association itself

use super::base::with_query;
use super::batch::batch_do;
use super::list::{ListResult, SubmitResult};
use super::resource::ResourceManager;
use super::traits::Manager;
use crate::error::Result;
use crate::session::Session;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct JointResourceManager {
    resource: ResourceManager,
    master: Arc<dyn Manager>,
    slave: Arc<dyn Manager>,
}

impl std::fmt::Debug for JointResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JointResourceManager")
            .field("keyword_plural", &self.resource.key_string())
            .field("master", &self.master.key_string())
            .field("slave", &self.slave.key_string())
            .finish()
    }
}

impl JointResourceManager {
    pub fn new<M, S>(resource: ResourceManager, master: Arc<M>, slave: Arc<S>) -> Self
    where
        M: Manager + 'static,
        S: Manager + 'static,
    {
        Self {
            resource,
            master,
            slave,
        }
    }

    pub fn resource(&self) -> &ResourceManager {
        &self.resource
    }

    pub fn master(&self) -> &dyn Manager {
        self.master.as_ref()
    }

    pub fn slave(&self) -> &dyn Manager {
        self.slave.as_ref()
    }

    /// `/<first>/<first_id>/<second>[/<second_id>]`
    fn path(
        &self,
        first: &dyn Manager,
        first_id: &str,
        second: &dyn Manager,
        second_id: Option<&str>,
    ) -> String {
        let mut path = String::from("/");
        let context = self.resource.context();
        if !context.is_empty() {
            path.push_str(context);
            path.push('/');
        }
        path.push_str(&first.url_path());
        path.push('/');
        path.push_str(&urlencoding::encode(first_id));
        path.push('/');
        path.push_str(&second.url_path());
        if let Some(id) = second_id {
            path.push('/');
            path.push_str(&urlencoding::encode(id));
        }
        path
    }

    fn pair_path(&self, mid: &str, sid: &str) -> String {
        self.path(self.master(), mid, self.slave(), Some(sid))
    }

    async fn submit(
        &self,
        s: &dyn Session,
        method: Method,
        path: &str,
        params: Option<&Value>,
    ) -> Result<Value> {
        let body = self.resource.params_to_body(s, params, self.keyword());
        let result = self
            .resource
            .base
            .submit(s, method, path, Some(&body), self.keyword())
            .await?;
        self.resource.filter_single(s, result, None)
    }

    pub async fn get(
        &self,
        s: &dyn Session,
        mid: &str,
        sid: &str,
        params: Option<&Value>,
    ) -> Result<Value> {
        let path = with_query(self.pair_path(mid, sid), params);
        let obj = self.resource.base.fetch(s, &path, self.keyword()).await?;
        self.resource.filter_single(s, obj, params)
    }

    /// Slaves attached to master `mid`
    pub async fn list_descendent(
        &self,
        s: &dyn Session,
        mid: &str,
        params: Option<&Value>,
    ) -> Result<ListResult> {
        let path = with_query(self.path(self.master(), mid, self.slave(), None), params);
        self.list_at(s, &path, params).await
    }

    /// Masters attached to slave `sid`
    pub async fn list_ascendent(
        &self,
        s: &dyn Session,
        sid: &str,
        params: Option<&Value>,
    ) -> Result<ListResult> {
        let path = with_query(self.path(self.slave(), sid, self.master(), None), params);
        self.list_at(s, &path, params).await
    }

    async fn list_at(
        &self,
        s: &dyn Session,
        path: &str,
        params: Option<&Value>,
    ) -> Result<ListResult> {
        let results = self
            .resource
            .base
            .fetch_list(s, path, self.key_string())
            .await?;
        self.resource.filter_list(s, results, params)
    }

    pub async fn attach(
        &self,
        s: &dyn Session,
        mid: &str,
        sid: &str,
        params: Option<&Value>,
    ) -> Result<Value> {
        self.submit(s, Method::POST, &self.pair_path(mid, sid), params)
            .await
    }

    pub async fn detach(
        &self,
        s: &dyn Session,
        mid: &str,
        sid: &str,
        query: Option<&Value>,
    ) -> Result<Value> {
        let path = with_query(self.pair_path(mid, sid), query);
        let result = self
            .resource
            .base
            .submit(s, Method::DELETE, &path, None, self.keyword())
            .await?;
        self.resource.filter_single(s, result, None)
    }

    pub async fn update(
        &self,
        s: &dyn Session,
        mid: &str,
        sid: &str,
        params: Option<&Value>,
    ) -> Result<Value> {
        self.submit(s, Method::PUT, &self.pair_path(mid, sid), params)
            .await
    }

    pub async fn patch(
        &self,
        s: &dyn Session,
        mid: &str,
        sid: &str,
        params: Option<&Value>,
    ) -> Result<Value> {
        self.submit(s, Method::PATCH, &self.pair_path(mid, sid), params)
            .await
    }

    pub async fn batch_attach(
        &self,
        s: &dyn Session,
        mid: &str,
        sids: &[String],
        params: Option<&Value>,
    ) -> Vec<SubmitResult> {
        batch_do(sids.iter().cloned(), move |sid| async move {
            self.attach(s, mid, &sid, params).await
        })
        .await
    }

    pub async fn batch_detach(
        &self,
        s: &dyn Session,
        mid: &str,
        sids: &[String],
    ) -> Vec<SubmitResult> {
        batch_do(sids.iter().cloned(), move |sid| async move {
            self.detach(s, mid, &sid, None).await
        })
        .await
    }

    pub async fn batch_update(
        &self,
        s: &dyn Session,
        mid: &str,
        sids: &[String],
        params: Option<&Value>,
    ) -> Vec<SubmitResult> {
        batch_do(sids.iter().cloned(), move |sid| async move {
            self.update(s, mid, &sid, params).await
        })
        .await
    }

    pub async fn batch_patch(
        &self,
        s: &dyn Session,
        mid: &str,
        sids: &[String],
        params: Option<&Value>,
    ) -> Vec<SubmitResult> {
        batch_do(sids.iter().cloned(), move |sid| async move {
            self.patch(s, mid, &sid, params).await
        })
        .await
    }
}

impl Manager for JointResourceManager {
    fn keyword(&self) -> &str {
        self.resource.keyword()
    }

    fn key_string(&self) -> &str {
        self.resource.key_string()
    }

    fn service_type(&self) -> &str {
        self.resource.service_type()
    }

    fn endpoint_type(&self) -> &str {
        self.resource.endpoint_type()
    }

    fn version(&self) -> &str {
        self.resource.version()
    }

    fn api_version(&self) -> &str {
        self.resource.api_version()
    }
}
