//! Module declarations
//!
//! Every service's managers are declared in an embedded JSON file and turned
//! into [`ResourceManager`]s and [`JointResourceManager`]s at startup.

use crate::error::{Error, Result};
use crate::modulebase::{
    BaseManager, JointResourceManager, Registry, RegistryBuilder, ResourceManager,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Embedded module declarations (compiled into the binary)
const MODULE_FILES: &[&str] = &[include_str!("compute.json"), include_str!("image.json")];

/// One service and the modules it serves
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDef {
    pub service_type: String,
    #[serde(default)]
    pub endpoint_type: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub resources: Vec<ResourceDef>,
    #[serde(default)]
    pub joints: Vec<JointDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub keyword: String,
    pub keyword_plural: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub admin_columns: Vec<String>,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JointDef {
    pub keyword: String,
    pub keyword_plural: String,
    /// Plural keyword of the master resource, declared in the same service
    pub master: String,
    pub slave: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub admin_columns: Vec<String>,
}

/// Parse the embedded declarations
pub fn service_defs() -> Result<Vec<ServiceDef>> {
    MODULE_FILES
        .iter()
        .map(|content| serde_json::from_str(content).map_err(Error::from))
        .collect()
}

impl ServiceDef {
    fn base(&self, columns: &[String], admin_columns: &[String]) -> BaseManager {
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        let admin_columns: Vec<&str> = admin_columns.iter().map(String::as_str).collect();
        BaseManager::new(
            &self.service_type,
            &self.endpoint_type,
            &self.version,
            &columns,
            &admin_columns,
        )
        .with_api_version(&self.api_version)
    }

    /// Build and register every manager this service declares
    pub fn register_into(&self, builder: &mut RegistryBuilder) -> Result<()> {
        let mut resources: HashMap<&str, Arc<ResourceManager>> = HashMap::new();

        for def in &self.resources {
            let mut manager = ResourceManager::new(
                self.base(&def.columns, &def.admin_columns),
                &def.keyword,
                &def.keyword_plural,
            );
            if let Some(context) = &def.context {
                manager = manager.with_context(context);
            }
            let manager = Arc::new(manager);
            resources.insert(def.keyword_plural.as_str(), Arc::clone(&manager));
            builder.register(manager);
        }

        for def in &self.joints {
            let master = resources
                .get(def.master.as_str())
                .ok_or_else(|| Error::NoSuchModule(def.master.clone()))?;
            let slave = resources
                .get(def.slave.as_str())
                .ok_or_else(|| Error::NoSuchModule(def.slave.clone()))?;
            let joint = JointResourceManager::new(
                ResourceManager::new(
                    self.base(&def.columns, &def.admin_columns),
                    &def.keyword,
                    &def.keyword_plural,
                ),
                Arc::clone(master),
                Arc::clone(slave),
            );
            builder.register(joint);
        }

        Ok(())
    }
}

/// Registry holding every declared module
pub fn default_registry() -> Result<Registry> {
    let mut builder = Registry::builder();
    for service in service_defs()? {
        service.register_into(&mut builder)?;
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modulebase::Manager;
    use crate::testing::FakeSession;
    use serde_json::json;

    #[test]
    fn test_declarations_parse() {
        let defs = service_defs().unwrap();
        assert!(defs.iter().any(|d| d.service_type == "compute_v2"));
        let image = defs.iter().find(|d| d.service_type == "image").unwrap();
        assert_eq!(image.version, "v1");
    }

    #[test]
    fn test_default_registry_contents() {
        let registry = default_registry().unwrap();
        assert_eq!(
            registry.registered_modules(""),
            vec![
                "disks",
                "guestdisks",
                "hosts",
                "hoststorages",
                "images",
                "networks",
                "servers",
                "storages",
                "wires",
                "zones"
            ]
        );
    }

    #[test]
    fn test_default_joints() {
        let registry = default_registry().unwrap();
        let s = FakeSession::replying(json!({}));

        let hosts = registry.get_module(&s, "hosts").unwrap();
        let storages = registry.get_module(&s, "storages").unwrap();
        let joint = registry
            .get_joint_module2(&s, hosts.manager(), storages.manager())
            .unwrap();
        assert_eq!(joint.keyword(), "hoststorage");

        let guestdisks = registry.get_joint_module(&s, "guestdisks").unwrap();
        assert_eq!(guestdisks.master().key_string(), "servers");
        assert_eq!(guestdisks.slave().key_string(), "disks");
    }

    #[test]
    fn test_unknown_joint_member() {
        let def: ServiceDef = serde_json::from_value(json!({
            "service_type": "compute_v2",
            "joints": [{"keyword": "x", "keyword_plural": "xs", "master": "hosts", "slave": "disks"}]
        }))
        .unwrap();
        let mut builder = Registry::builder();
        assert!(matches!(
            def.register_into(&mut builder),
            Err(Error::NoSuchModule(_))
        ));
    }
}
