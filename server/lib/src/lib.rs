//! The Boreal server core library. This implements the write-path coordination
//! of the directory server - how a single LDAP primitive is resolved against a
//! local storage backend while schema rules, access controls, request controls,
//! plugins and synchronization providers are applied in a precise order.

#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::trivially_copy_pass_by_ref)]

#[macro_use]
extern crate tracing;

// This has to be before the other modules so the macro import order works.
#[macro_use]
pub mod macros;

pub mod be;
pub mod config;
pub mod controls;
pub mod dn;
pub mod entry;
pub mod error;
pub mod event;
pub mod filter;
pub mod identity;
pub mod locking;
pub mod modify;
pub mod plugins;
pub mod repl;
pub mod schema;
pub mod server;
pub mod testkit;
pub mod utils;

/// A prelude of imports that should be imported by all other Boreal modules
/// to help make imports cleaner.
pub mod prelude {
    pub use boreal_proto::constants::*;
    pub use boreal_proto::internal::{
        CancelResult, Privilege, ResultCode, SchemaError, WritabilityMode,
    };
    pub use sketching::{
        admin_debug, admin_error, admin_info, admin_warn, perf_trace, request_error, request_info,
        request_trace, request_warn, security_access, security_critical, security_error,
        security_info, EventTag,
    };
    pub use smartstring::alias::String as AttrString;
    pub use uuid::Uuid;

    pub use crate::be::Backend;
    pub use crate::config::ServerConfig;
    pub use crate::controls::{
        AssertionRequestControl, Control, ProxiedAuthControl, ReadEntryRequestControl,
        ReadEntryResponseControl, ResponseControl, UnknownControl,
    };
    pub use crate::dn::{Ava, Dn, Rdn};
    pub use crate::entry::{Attribute, AttributeDescription, Entry};
    pub use crate::error::{CancelledOperationError, DirectoryError, RenameEntryError};
    pub use crate::event::{CancelToken, ModifyDnEvent};
    pub use crate::filter::{f_and, f_andnot, f_eq, f_or, f_pres, f_sub, SearchFilter};
    pub use crate::identity::{IdentType, Identity};
    pub use crate::locking::{DnLockPair, DnWriteLock, LockManager};
    pub use crate::modify::{
        m_add, m_delete, m_increment, m_replace, Modification, ModificationType, ModifyList,
    };
    pub use crate::plugins::{
        ChangeListenerRegistry, ChangeNotificationListener, ModifyDnPlugin, PluginDirective,
        PluginRegistry, Plugins,
    };
    pub use crate::repl::{
        SyncProviderRegistry, SynchronizationProvider, SynchronizationProviderResult,
    };
    pub use crate::schema::{Schema, SchemaAttribute, SchemaClass};
    pub use crate::server::access::AccessControlHandler;
    pub use crate::server::modify_dn::ModifyDnOperation;
    pub use crate::server::DirectoryServer;
    pub use crate::utils::duration_from_epoch_now;
}
