//! Resource manager framework
//!
//! Generic CRUD-over-HTTP managers shared by every module.
//!
//! # Module Structure
//!
//! - [`base`] - [`BaseManager`]: service coordinates, versioned paths, request helpers
//! - [`resource`] - [`ResourceManager`]: CRUD, actions, context nesting, batches
//! - [`joint`] - [`JointResourceManager`]: master/slave associations
//! - [`batch`] - concurrent fan-out helpers
//! - [`list`] - [`ListResult`] and [`SubmitResult`]
//! - [`registry`] - [`Registry`] lookup by API version and keyword
//! - [`traits`] - capability traits

pub mod base;
pub mod batch;
pub mod joint;
pub mod list;
pub mod registry;
pub mod resource;
pub mod traits;

pub use base::{query_string, BaseManager};
pub use batch::{batch_do, batch_do_class_action, batch_do_ordered, batch_params_do};
pub use joint::JointResourceManager;
pub use list::{ListResult, SubmitResult};
pub use registry::{Module, Registry, RegistryBuilder};
pub use resource::{ManagerContext, ResourceFilter, ResourceManager};
pub use traits::{Batcher, Getter, Lister, Manager, Mutator};
