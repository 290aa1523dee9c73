//! Manager capabilities
//!
//! [`Manager`] is the identity every resource manager carries. The async
//! capability traits split the operation set so a resource type only needs to
//! offer what its endpoint actually supports.

use super::list::{ListResult, SubmitResult};
use crate::error::Result;
use crate::session::Session;
use async_trait::async_trait;
use serde_json::Value;

pub trait Manager: Send + Sync {
    fn keyword(&self) -> &str;

    /// Plural keyword, unique per API version
    fn key_string(&self) -> &str;

    fn service_type(&self) -> &str;

    fn endpoint_type(&self) -> &str;

    fn version(&self) -> &str;

    fn api_version(&self) -> &str;

    /// Plural keyword as a URL path, `:` separating nested segments
    fn url_path(&self) -> String {
        self.key_string().replace(':', "/")
    }
}

#[async_trait]
pub trait Lister: Manager {
    async fn list(&self, s: &dyn Session, params: Option<&Value>) -> Result<ListResult>;

    /// Follow paging until every item has been fetched
    async fn list_all(&self, s: &dyn Session, params: Option<&Value>) -> Result<ListResult>;
}

#[async_trait]
pub trait Getter: Manager {
    /// Get by id, falling back to a name lookup when the id is unknown
    async fn get(&self, s: &dyn Session, id: &str, params: Option<&Value>) -> Result<Value>;

    async fn get_by_id(&self, s: &dyn Session, id: &str, params: Option<&Value>) -> Result<Value>;

    async fn get_by_name(&self, s: &dyn Session, name: &str, params: Option<&Value>)
        -> Result<Value>;

    async fn get_id(&self, s: &dyn Session, id_or_name: &str, params: Option<&Value>)
        -> Result<String>;

    async fn get_specific(
        &self,
        s: &dyn Session,
        id: &str,
        spec: &str,
        params: Option<&Value>,
    ) -> Result<Value>;

    async fn head(&self, s: &dyn Session, id: &str, params: Option<&Value>) -> Result<Value>;

    async fn get_metadata(&self, s: &dyn Session, id: &str, params: Option<&Value>)
        -> Result<Value>;
}

#[async_trait]
pub trait Mutator: Manager {
    async fn create(&self, s: &dyn Session, params: Option<&Value>) -> Result<Value>;

    async fn update(&self, s: &dyn Session, id: &str, params: Option<&Value>) -> Result<Value>;

    async fn put_specific(
        &self,
        s: &dyn Session,
        id: &str,
        spec: &str,
        query: Option<&Value>,
        body: Option<&Value>,
    ) -> Result<Value>;

    async fn patch(&self, s: &dyn Session, id: &str, params: Option<&Value>) -> Result<Value>;

    async fn delete(&self, s: &dyn Session, id: &str, body: Option<&Value>) -> Result<Value>;

    async fn delete_with_param(
        &self,
        s: &dyn Session,
        id: &str,
        query: Option<&Value>,
        body: Option<&Value>,
    ) -> Result<Value>;

    async fn perform_action(
        &self,
        s: &dyn Session,
        id: &str,
        action: &str,
        params: Option<&Value>,
    ) -> Result<Value>;

    async fn perform_class_action(
        &self,
        s: &dyn Session,
        action: &str,
        params: Option<&Value>,
    ) -> Result<Value>;

    async fn set_metadata(&self, s: &dyn Session, id: &str, params: Option<&Value>)
        -> Result<Value>;
}

/// Batch operations. Unless noted, results arrive in completion order.
#[async_trait]
pub trait Batcher: Manager {
    async fn batch_get(
        &self,
        s: &dyn Session,
        ids: &[String],
        params: Option<&Value>,
    ) -> Vec<SubmitResult>;

    /// One request, `count` resources created server side
    async fn batch_create(
        &self,
        s: &dyn Session,
        params: Option<&Value>,
        count: usize,
    ) -> Vec<SubmitResult>;

    async fn batch_update(
        &self,
        s: &dyn Session,
        ids: &[String],
        params: Option<&Value>,
    ) -> Vec<SubmitResult>;

    async fn batch_params_update(
        &self,
        s: &dyn Session,
        ids: &[String],
        params: &[Value],
    ) -> Vec<SubmitResult>;

    async fn batch_patch(
        &self,
        s: &dyn Session,
        ids: &[String],
        params: Option<&Value>,
    ) -> Vec<SubmitResult>;

    async fn batch_delete(
        &self,
        s: &dyn Session,
        ids: &[String],
        body: Option<&Value>,
    ) -> Vec<SubmitResult>;

    async fn batch_delete_with_param(
        &self,
        s: &dyn Session,
        ids: &[String],
        query: Option<&Value>,
        body: Option<&Value>,
    ) -> Vec<SubmitResult>;

    async fn batch_perform_action(
        &self,
        s: &dyn Session,
        ids: &[String],
        action: &str,
        params: Option<&Value>,
    ) -> Vec<SubmitResult>;

    async fn batch_perform_class_action(
        &self,
        s: &dyn Session,
        action: &str,
        batch_params: &[Value],
    ) -> Vec<SubmitResult>;
}
