//! Internal types shared between the server core and its front ends.

mod error;

pub use self::error::*;

use serde::{Deserialize, Serialize};

/// A server- or backend-level write gate. `InternalOnly` still admits
/// internal and synchronization operations.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WritabilityMode {
    #[default]
    Enabled,
    Disabled,
    #[serde(rename = "internal-only")]
    InternalOnly,
}

/// Privileges a bound client connection may hold. Controls that act on
/// behalf of another identity require these to be granted explicitly.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    #[serde(rename = "bypass-acl")]
    BypassAcl,
    #[serde(rename = "proxied-auth")]
    ProxiedAuth,
    #[serde(rename = "server-admin")]
    ServerAdmin,
}
