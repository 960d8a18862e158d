//! Test tooling: an in-memory [`Backend`] with fault injection and call
//! counting, plus helpers to assemble a server around it. Integration tests
//! and the in-module test sections build on these rather than a real
//! storage engine.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::be::Backend;
use crate::config::ServerConfig;
use crate::dn::Dn;
use crate::entry::Entry;
use crate::error::{CancelledOperationError, DirectoryError, RenameEntryError};
use crate::event::CancelToken;
use crate::prelude::*;
use crate::schema::Schema;
use crate::server::DirectoryServer;

/// A toy storage engine: a map of DN to entry behind a mutex. Counts
/// renames, honours cancellation, and can be told to fail the next rename.
pub struct MemBackend {
    id: String,
    suffixes: Vec<Dn>,
    private_backend: bool,
    entries: Mutex<BTreeMap<Dn, Entry>>,
    writability: Mutex<WritabilityMode>,
    supported_controls: Mutex<BTreeSet<String>>,
    rename_count: AtomicUsize,
    fail_next_rename: Mutex<Option<DirectoryError>>,
}

impl MemBackend {
    pub fn new(id: &str, suffixes: &[&str]) -> Self {
        MemBackend {
            id: id.to_string(),
            suffixes: suffixes
                .iter()
                .map(|s| s.parse().expect("invalid suffix dn"))
                .collect(),
            private_backend: false,
            entries: Mutex::new(BTreeMap::new()),
            writability: Mutex::new(WritabilityMode::Enabled),
            supported_controls: Mutex::new(BTreeSet::new()),
            rename_count: AtomicUsize::new(0),
            fail_next_rename: Mutex::new(None),
        }
    }

    pub fn new_private(id: &str, suffixes: &[&str]) -> Self {
        let mut be = MemBackend::new(id, suffixes);
        be.private_backend = true;
        be
    }

    pub fn with_entry(self, entry: Entry) -> Self {
        self.insert_entry(entry);
        self
    }

    pub fn insert_entry(&self, entry: Entry) {
        self.entries
            .lock()
            .unwrap()
            .insert(entry.dn().clone(), entry);
    }

    pub fn set_writability(&self, mode: WritabilityMode) {
        *self.writability.lock().unwrap() = mode;
    }

    pub fn add_supported_control(&self, oid: &str) {
        self.supported_controls.lock().unwrap().insert(oid.to_string());
    }

    pub fn fail_next_rename_with(&self, error: DirectoryError) {
        *self.fail_next_rename.lock().unwrap() = Some(error);
    }

    pub fn rename_count(&self) -> usize {
        self.rename_count.load(Ordering::SeqCst)
    }

    pub fn get(&self, dn: &Dn) -> Option<Entry> {
        self.entries.lock().unwrap().get(dn).cloned()
    }

    /// Canonical forms of every DN currently held, sorted. Handy for
    /// comparing whole-backend states.
    pub fn dns(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .keys()
            .map(|dn| dn.to_string())
            .collect()
    }
}

impl Backend for MemBackend {
    fn backend_id(&self) -> &str {
        &self.id
    }

    fn suffixes(&self) -> Vec<Dn> {
        self.suffixes.clone()
    }

    fn entry_exists(&self, dn: &Dn) -> Result<bool, DirectoryError> {
        Ok(self.entries.lock().unwrap().contains_key(dn))
    }

    fn get_entry(&self, dn: &Dn) -> Result<Option<Entry>, DirectoryError> {
        Ok(self.entries.lock().unwrap().get(dn).cloned())
    }

    fn rename_entry(
        &self,
        current_dn: &Dn,
        new_entry: &Entry,
        cancel: &CancelToken,
    ) -> Result<(), RenameEntryError> {
        if let Some(error) = self.fail_next_rename.lock().unwrap().take() {
            return Err(RenameEntryError::Directory(error));
        }
        if cancel.is_requested() {
            return Err(RenameEntryError::Cancelled(CancelledOperationError {
                cancel_result: CancelResult::Canceled,
                message: "the backend observed a cancellation request".to_string(),
            }));
        }
        let mut entries = self.entries.lock().unwrap();
        if entries.remove(current_dn).is_none() {
            return Err(RenameEntryError::Directory(DirectoryError::new(
                ResultCode::NoSuchObject,
                format!("no entry at {current_dn} to rename"),
            )));
        }
        entries.insert(new_entry.dn().clone(), new_entry.clone());
        self.rename_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_private_backend(&self) -> bool {
        self.private_backend
    }

    fn writability_mode(&self) -> WritabilityMode {
        *self.writability.lock().unwrap()
    }

    fn supports_control(&self, oid: &str) -> bool {
        self.supported_controls.lock().unwrap().contains(oid)
    }
}

/// A server with the core schema, default config and one backend.
pub fn test_server(backend: Arc<MemBackend>) -> DirectoryServer {
    test_server_with_config(ServerConfig::default(), backend)
}

pub fn test_server_with_config(
    config: ServerConfig,
    backend: Arc<MemBackend>,
) -> DirectoryServer {
    let server = DirectoryServer::new(config, Schema::core());
    server.register_backend(backend);
    server
}
