//! The storage backend contract. The engine behind it - b-tree files, an
//! embedded database, whatever - is opaque to the write path; the core only
//! needs the operations below, and holds the per-DN write locks while it
//! calls them.

use crate::dn::Dn;
use crate::entry::Entry;
use crate::error::{DirectoryError, RenameEntryError};
use crate::event::CancelToken;
use crate::prelude::*;

pub trait Backend: Send + Sync {
    /// Stable identifier, used to tell whether two DNs resolve to the same
    /// backend instance.
    fn backend_id(&self) -> &str;

    /// The naming contexts this backend serves.
    fn suffixes(&self) -> Vec<Dn>;

    fn entry_exists(&self, dn: &Dn) -> Result<bool, DirectoryError>;

    /// Fetch the entry at `dn`, or `None` when no such entry exists.
    fn get_entry(&self, dn: &Dn) -> Result<Option<Entry>, DirectoryError>;

    /// Atomically move the entry at `current_dn` to `new_entry` (whose DN is
    /// the target name). The backend may observe `cancel` and abandon the
    /// write with a cancellation error before it becomes durable.
    fn rename_entry(
        &self,
        current_dn: &Dn,
        new_entry: &Entry,
        cancel: &CancelToken,
    ) -> Result<(), RenameEntryError>;

    /// Private backends hold server internal data and are exempt from the
    /// writability gates.
    fn is_private_backend(&self) -> bool {
        false
    }

    fn writability_mode(&self) -> WritabilityMode {
        WritabilityMode::Enabled
    }

    /// Whether a request control with this OID is supported by the engine.
    fn supports_control(&self, _oid: &str) -> bool {
        false
    }

    /// Does this backend serve `dn`?
    fn handles_dn(&self, dn: &Dn) -> bool {
        self.suffixes().iter().any(|suffix| dn.ends_with(suffix))
    }
}
