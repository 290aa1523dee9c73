//! Module Registry
//!
//! Managers are registered once at startup through a [`RegistryBuilder`] and
//! looked up afterwards from an immutable [`Registry`]. Modules are keyed by
//! API version and plural keyword. Several managers may share a keyword when
//! they talk to different versions of a service; lookups pick the one whose
//! version matches the endpoint the session resolves.

use super::joint::JointResourceManager;
use super::resource::ResourceManager;
use super::traits::Manager;
use crate::error::{Error, Result};
use crate::session::{split_versioned_url, Session};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

/// A registered manager
#[derive(Debug, Clone)]
pub enum Module {
    Resource(Arc<ResourceManager>),
    Joint(Arc<JointResourceManager>),
}

impl Module {
    pub fn manager(&self) -> &dyn Manager {
        match self {
            Module::Resource(m) => m.as_ref(),
            Module::Joint(m) => m.as_ref(),
        }
    }

    /// The underlying resource manager; joint modules expose theirs
    pub fn resource(&self) -> &ResourceManager {
        match self {
            Module::Resource(m) => m,
            Module::Joint(m) => m.resource(),
        }
    }

    pub fn as_joint(&self) -> Option<&Arc<JointResourceManager>> {
        match self {
            Module::Joint(m) => Some(m),
            Module::Resource(_) => None,
        }
    }
}

impl From<ResourceManager> for Module {
    fn from(m: ResourceManager) -> Self {
        Module::Resource(Arc::new(m))
    }
}

impl From<Arc<ResourceManager>> for Module {
    fn from(m: Arc<ResourceManager>) -> Self {
        Module::Resource(m)
    }
}

impl From<JointResourceManager> for Module {
    fn from(m: JointResourceManager) -> Self {
        Module::Joint(Arc::new(m))
    }
}

/// api version -> plural keyword -> managers
type ModuleTable = HashMap<String, BTreeMap<String, Vec<Module>>>;

/// api version -> "<master>-<slave>" -> joint managers
type JointTable = HashMap<String, HashMap<String, Vec<Arc<JointResourceManager>>>>;

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    modules: ModuleTable,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module. Fails when a manager for the same service type and
    /// version is already registered under the same keyword.
    pub fn try_register(&mut self, module: impl Into<Module>) -> Result<&mut Self> {
        let module = module.into();
        let (api_version, keyword) = {
            let m = module.manager();
            (m.api_version().to_string(), m.key_string().to_string())
        };

        let entries = self
            .modules
            .entry(api_version.clone())
            .or_default()
            .entry(keyword.clone())
            .or_default();

        let new = module.manager();
        let conflict = entries.iter().any(|existing| {
            let existing = existing.manager();
            existing.service_type() == new.service_type() && existing.version() == new.version()
        });
        if conflict {
            return Err(Error::DuplicateModule {
                api_version,
                keyword,
            });
        }

        tracing::debug!("registered module {} (api version {:?})", keyword, api_version);
        entries.push(module);
        Ok(self)
    }

    /// Add a module; a conflicting registration is a programming error and panics
    pub fn register(&mut self, module: impl Into<Module>) -> &mut Self {
        if let Err(e) = self.try_register(module) {
            tracing::error!("module registration failed: {}", e);
            panic!("{}", e);
        }
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            modules: self.modules,
            joints: OnceLock::new(),
        }
    }
}

#[derive(Debug)]
pub struct Registry {
    modules: ModuleTable,
    joints: OnceLock<JointTable>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Find the module for `keyword` under the session's API version
    pub fn get_module(&self, s: &dyn Session, keyword: &str) -> Result<Module> {
        let candidates = self
            .modules
            .get(s.get_api_version())
            .and_then(|table| table.get(keyword))
            .ok_or_else(|| Error::NoSuchModule(keyword.to_string()))?;

        pick_version(s, keyword, candidates, Module::manager).cloned()
    }

    pub fn get_joint_module(
        &self,
        s: &dyn Session,
        keyword: &str,
    ) -> Result<Arc<JointResourceManager>> {
        match self.get_module(s, keyword)? {
            Module::Joint(m) => Ok(m),
            Module::Resource(_) => Err(Error::NotJoint(keyword.to_string())),
        }
    }

    /// Find the joint module between `master` and `slave`
    pub fn get_joint_module2(
        &self,
        s: &dyn Session,
        master: &dyn Manager,
        slave: &dyn Manager,
    ) -> Result<Arc<JointResourceManager>> {
        let key = joint_key(master.key_string(), slave.key_string());
        let candidates = self
            .joint_index()
            .get(s.get_api_version())
            .and_then(|table| table.get(&key))
            .ok_or_else(|| Error::NoSuchModule(key.clone()))?;

        pick_version(s, &key, candidates, |m| &**m as &dyn Manager).cloned()
    }

    /// Plural keywords registered for `api_version`, sorted
    pub fn registered_modules(&self, api_version: &str) -> Vec<String> {
        self.modules
            .get(api_version)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Modules registered for `api_version` with their plural keywords
    pub fn modules(&self, api_version: &str) -> impl Iterator<Item = (&str, &Module)> {
        self.modules
            .get(api_version)
            .into_iter()
            .flat_map(|table| table.iter())
            .flat_map(|(keyword, mods)| mods.iter().map(move |m| (keyword.as_str(), m)))
    }

    fn joint_index(&self) -> &JointTable {
        self.joints.get_or_init(|| {
            let mut index: JointTable = HashMap::new();
            for (api_version, table) in &self.modules {
                for module in table.values().flatten() {
                    if let Module::Joint(joint) = module {
                        let key = joint_key(joint.master().key_string(), joint.slave().key_string());
                        index
                            .entry(api_version.clone())
                            .or_default()
                            .entry(key)
                            .or_default()
                            .push(Arc::clone(joint));
                    }
                }
            }
            index
        })
    }
}

fn joint_key(master: &str, slave: &str) -> String {
    format!("{}-{}", master, slave)
}

/// With one candidate, take it. Otherwise take the candidate whose version
/// matches the version segment of the endpoint its service resolves to.
fn pick_version<'a, T>(
    s: &dyn Session,
    keyword: &str,
    candidates: &'a [T],
    manager: impl Fn(&T) -> &dyn Manager,
) -> Result<&'a T> {
    match candidates {
        [] => Err(Error::NoSuchModule(keyword.to_string())),
        [only] => Ok(only),
        _ => {
            for candidate in candidates {
                let m = manager(candidate);
                let url = s.get_service_version_url(m.service_type(), m.endpoint_type())?;
                let (_, url_version) = split_versioned_url(&url);
                if same_version(url_version, m.version()) {
                    return Ok(candidate);
                }
            }
            Err(Error::VersionMismatch(keyword.to_string()))
        },
    }
}

fn same_version(a: &str, b: &str) -> bool {
    let strip = |v: &str| v.trim_start_matches(['v', 'V']).to_string();
    strip(a) == strip(b)
}
