//! Client SDK for a multi-cloud IaaS control plane.
//!
//! Resource managers expose uniform CRUD, action and batch operations over a
//! JSON/HTTP API. Requests go through a [`session::Session`]; managers are
//! declared in [`modules`] and looked up through a [`modulebase::Registry`].

pub mod config;
pub mod error;
pub mod modulebase;
pub mod modules;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
