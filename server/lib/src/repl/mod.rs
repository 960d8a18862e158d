//! Synchronization providers participate in the write path at three points:
//! conflict resolution once the current entry is known, a pre-operation hook
//! immediately before the backend commit, and a post-operation hook inside
//! the cleanup block. A provider that stops the operation is expected to
//! have stamped the result fields on the operation itself.

use std::sync::{Arc, RwLock};

use crate::error::DirectoryError;
use crate::server::modify_dn::ModifyDnOperation;

/// Whether the core should continue after a provider hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynchronizationProviderResult {
    continue_processing: bool,
}

impl SynchronizationProviderResult {
    pub fn continue_processing() -> Self {
        SynchronizationProviderResult {
            continue_processing: true,
        }
    }

    pub fn stop_processing() -> Self {
        SynchronizationProviderResult {
            continue_processing: false,
        }
    }

    pub fn continues(self) -> bool {
        self.continue_processing
    }
}

pub trait SynchronizationProvider: Send + Sync {
    fn id(&self) -> &'static str;

    /// Resolve replication conflicts against the current entry. Stopping
    /// here aborts the operation without the core recording an error.
    fn handle_conflict_resolution(
        &self,
        _op: &mut ModifyDnOperation,
    ) -> Result<SynchronizationProviderResult, DirectoryError> {
        Ok(SynchronizationProviderResult::continue_processing())
    }

    /// Last hook before the backend commit.
    fn do_pre_operation(
        &self,
        _op: &mut ModifyDnOperation,
    ) -> Result<SynchronizationProviderResult, DirectoryError> {
        Ok(SynchronizationProviderResult::continue_processing())
    }

    /// Runs inside the cleanup block on every operation that reached the
    /// locked phase, whatever the outcome.
    fn do_post_operation(&self, _op: &mut ModifyDnOperation) -> Result<(), DirectoryError> {
        Ok(())
    }
}

/// Ordered provider registration. Iteration order is registration order.
#[derive(Default)]
pub struct SyncProviderRegistry {
    providers: RwLock<Vec<Arc<dyn SynchronizationProvider>>>,
}

impl SyncProviderRegistry {
    pub fn new() -> Self {
        SyncProviderRegistry::default()
    }

    pub fn register(&self, provider: Arc<dyn SynchronizationProvider>) {
        self.providers
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(provider)
    }

    pub fn snapshot(&self) -> Vec<Arc<dyn SynchronizationProvider>> {
        self.providers
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}
