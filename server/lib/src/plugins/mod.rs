//! Plugins allow an operation to be inspected and transformed during the
//! write paths of the server. Pre-operation plugins run before the backend
//! commit and may append modifications to the candidate entry or direct the
//! core to stop; post-operation and post-synchronization plugins observe the
//! outcome. Change notification listeners are informed of successful renames
//! after the response state is final.
//!
//! Dispatch takes a snapshot of the registry at entry to each phase, so a
//! registration that races an in-flight operation does not change which
//! collaborators that operation observes.

use std::sync::{Arc, RwLock};

use crate::entry::Entry;
use crate::error::DirectoryError;
use crate::prelude::*;
use crate::server::modify_dn::ModifyDnOperation;

/// What a plugin directs the core to do next. This replaces a set of
/// ambiguous boolean flags - exactly one of these states holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginDirective {
    /// Proceed with the operation.
    Continue,
    /// Stop core processing but still run post-operation plugins.
    SkipCoreProcessing,
    /// Stop core processing and respond without post-operation plugins.
    SendResponseImmediately,
    /// The client connection is gone; abandon the operation.
    ConnectionTerminated,
}

pub trait ModifyDnPlugin: Send + Sync {
    fn id(&self) -> &'static str;

    fn pre_operation_modify_dn(&self, _op: &mut ModifyDnOperation) -> PluginDirective {
        PluginDirective::Continue
    }

    fn post_operation_modify_dn(&self, _op: &mut ModifyDnOperation) -> PluginDirective {
        PluginDirective::Continue
    }

    fn post_synchronization_modify_dn(&self, _op: &ModifyDnOperation) {}
}

pub trait ChangeNotificationListener: Send + Sync {
    fn id(&self) -> &'static str;

    fn handle_modify_dn_operation(
        &self,
        op: &ModifyDnOperation,
        old_entry: &Entry,
        new_entry: &Entry,
    ) -> Result<(), DirectoryError>;
}

/// Ordered plugin registration. Iteration order is registration order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: RwLock<Vec<Arc<dyn ModifyDnPlugin>>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        PluginRegistry::default()
    }

    pub fn register(&self, plugin: Arc<dyn ModifyDnPlugin>) {
        self.plugins
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(plugin)
    }

    pub fn snapshot(&self) -> Vec<Arc<dyn ModifyDnPlugin>> {
        self.plugins
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

#[derive(Default)]
pub struct ChangeListenerRegistry {
    listeners: RwLock<Vec<Arc<dyn ChangeNotificationListener>>>,
}

impl ChangeListenerRegistry {
    pub fn new() -> Self {
        ChangeListenerRegistry::default()
    }

    pub fn register(&self, listener: Arc<dyn ChangeNotificationListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(listener)
    }

    pub fn snapshot(&self) -> Vec<Arc<dyn ChangeNotificationListener>> {
        self.listeners
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

pub struct Plugins {}

impl Plugins {
    /// Run the pre-operation plugins in order. The first directive other
    /// than `Continue` stops the walk and is returned.
    #[instrument(level = "debug", name = "plugins::run_pre_operation_modify_dn", skip_all)]
    pub fn run_pre_operation_modify_dn(
        plugins: &[Arc<dyn ModifyDnPlugin>],
        op: &mut ModifyDnOperation,
    ) -> PluginDirective {
        for plugin in plugins {
            let directive = plugin.pre_operation_modify_dn(op);
            if directive != PluginDirective::Continue {
                admin_info!(
                    plugin = plugin.id(),
                    ?directive,
                    "pre-operation plugin interrupted processing"
                );
                return directive;
            }
        }
        PluginDirective::Continue
    }

    #[instrument(level = "debug", name = "plugins::run_post_operation_modify_dn", skip_all)]
    pub fn run_post_operation_modify_dn(
        plugins: &[Arc<dyn ModifyDnPlugin>],
        op: &mut ModifyDnOperation,
    ) -> PluginDirective {
        for plugin in plugins {
            let directive = plugin.post_operation_modify_dn(op);
            if directive != PluginDirective::Continue {
                admin_info!(
                    plugin = plugin.id(),
                    ?directive,
                    "post-operation plugin interrupted processing"
                );
                return directive;
            }
        }
        PluginDirective::Continue
    }

    /// Fire and forget - post-synchronization plugins cannot affect the
    /// response.
    #[instrument(
        level = "debug",
        name = "plugins::run_post_synchronization_modify_dn",
        skip_all
    )]
    pub fn run_post_synchronization_modify_dn(
        plugins: &[Arc<dyn ModifyDnPlugin>],
        op: &ModifyDnOperation,
    ) {
        for plugin in plugins {
            plugin.post_synchronization_modify_dn(op);
        }
    }

    /// Notify change listeners of a completed rename. Listener failures are
    /// logged and never surface on the response.
    #[instrument(level = "debug", name = "plugins::run_change_notification", skip_all)]
    pub fn run_change_notification(
        listeners: &[Arc<dyn ChangeNotificationListener>],
        op: &ModifyDnOperation,
        old_entry: &Entry,
        new_entry: &Entry,
    ) {
        for listener in listeners {
            if let Err(e) = listener.handle_modify_dn_operation(op, old_entry, new_entry) {
                admin_error!(
                    listener = listener.id(),
                    err = %e,
                    "error notifying change listener of modify DN operation"
                );
            }
        }
    }
}
