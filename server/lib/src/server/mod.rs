//! `DirectoryServer` is the composition root of the write path - the
//! explicit bundle of backends, schema, configuration, the lock table and
//! the extension registries. Operations receive it as a dependency; nothing
//! in the core reaches for global state.

pub mod access;
pub mod modify_dn;

use std::sync::{Arc, RwLock};

use self::access::{AccessControlHandler, AllowAllAccessHandler};
use crate::be::Backend;
use crate::config::ServerConfig;
use crate::dn::Dn;
use crate::error::DirectoryError;
use crate::locking::LockManager;
use crate::plugins::{ChangeListenerRegistry, PluginRegistry};
use crate::prelude::*;
use crate::repl::SyncProviderRegistry;
use crate::schema::Schema;

pub struct DirectoryServer {
    config: ServerConfig,
    schema: Schema,
    backends: RwLock<Vec<Arc<dyn Backend>>>,
    lock_manager: LockManager,
    access_handler: RwLock<Arc<dyn AccessControlHandler>>,
    plugin_registry: PluginRegistry,
    sync_registry: SyncProviderRegistry,
    change_listeners: ChangeListenerRegistry,
}

impl DirectoryServer {
    pub fn new(config: ServerConfig, schema: Schema) -> Self {
        DirectoryServer {
            config,
            schema,
            backends: RwLock::new(Vec::new()),
            lock_manager: LockManager::new(),
            access_handler: RwLock::new(Arc::new(AllowAllAccessHandler)),
            plugin_registry: PluginRegistry::new(),
            sync_registry: SyncProviderRegistry::new(),
            change_listeners: ChangeListenerRegistry::new(),
        }
    }

    pub fn register_backend(&self, backend: Arc<dyn Backend>) {
        self.backends
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(backend)
    }

    pub fn set_access_handler(&self, handler: Arc<dyn AccessControlHandler>) {
        *self
            .access_handler
            .write()
            .unwrap_or_else(|poison| poison.into_inner()) = handler;
    }

    pub(crate) fn access_handler(&self) -> Arc<dyn AccessControlHandler> {
        self.access_handler
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugin_registry
    }

    pub fn sync_providers(&self) -> &SyncProviderRegistry {
        &self.sync_registry
    }

    pub fn change_listeners(&self) -> &ChangeListenerRegistry {
        &self.change_listeners
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }

    pub fn check_schema(&self) -> bool {
        self.config.check_schema
    }

    pub fn writability_mode(&self) -> WritabilityMode {
        self.config.writability_mode
    }

    pub fn server_error_result_code(&self) -> ResultCode {
        self.config.server_error_result_code
    }

    fn backends_snapshot(&self) -> Vec<Arc<dyn Backend>> {
        self.backends
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    /// Route a DN to the backend with the most specific matching suffix.
    pub fn backend_for_dn(&self, dn: &Dn) -> Option<Arc<dyn Backend>> {
        let mut best: Option<(usize, Arc<dyn Backend>)> = None;
        for backend in self.backends_snapshot() {
            for suffix in backend.suffixes() {
                if dn.ends_with(&suffix) {
                    let depth = suffix.depth();
                    if best.as_ref().map(|(d, _)| depth > *d).unwrap_or(true) {
                        best = Some((depth, backend.clone()));
                    }
                }
            }
        }
        best.map(|(_, backend)| backend)
    }

    /// Does an entry exist at `dn` in any registered backend?
    pub fn entry_exists(&self, dn: &Dn) -> Result<bool, DirectoryError> {
        match self.backend_for_dn(dn) {
            Some(backend) => backend.entry_exists(dn),
            None => Ok(false),
        }
    }

    /// The parent of `dn` within its naming context: `None` when `dn` is a
    /// suffix root, the null DN, or an immediate child of the root DSE.
    pub fn parent_in_suffix(&self, dn: &Dn) -> Option<Dn> {
        let is_suffix = self
            .backends_snapshot()
            .iter()
            .any(|backend| backend.suffixes().iter().any(|suffix| suffix == dn));
        if is_suffix {
            return None;
        }
        let parent = dn.parent()?;
        if parent.is_null() {
            None
        } else {
            Some(parent)
        }
    }
}
