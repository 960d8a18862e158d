//! The identity that initiated an operation. Access decisions, writability
//! gates and privilege checks all key from this - internal and
//! synchronization origins bypass gates that bind client connections.

use std::collections::BTreeSet;
use std::fmt;

use crate::dn::Dn;
use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentType {
    /// Work the server has generated itself.
    Internal,
    /// Changes arriving through a synchronization provider.
    Synchronization,
    /// A bound client connection.
    Bound { dn: Dn },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    origin: IdentType,
    privileges: BTreeSet<Privilege>,
}

impl Identity {
    pub fn internal() -> Self {
        Identity {
            origin: IdentType::Internal,
            privileges: BTreeSet::new(),
        }
    }

    pub fn synchronization() -> Self {
        Identity {
            origin: IdentType::Synchronization,
            privileges: BTreeSet::new(),
        }
    }

    pub fn bound(dn: Dn) -> Self {
        Identity {
            origin: IdentType::Bound { dn },
            privileges: BTreeSet::new(),
        }
    }

    pub fn bound_with_privileges(dn: Dn, privileges: impl IntoIterator<Item = Privilege>) -> Self {
        Identity {
            origin: IdentType::Bound { dn },
            privileges: privileges.into_iter().collect(),
        }
    }

    pub fn origin(&self) -> &IdentType {
        &self.origin
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.origin, IdentType::Internal)
    }

    pub fn is_synchronization(&self) -> bool {
        matches!(self.origin, IdentType::Synchronization)
    }

    /// Internal operations implicitly hold every privilege.
    pub fn has_privilege(&self, p: Privilege) -> bool {
        self.is_internal() || self.privileges.contains(&p)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            IdentType::Internal => write!(f, "internal"),
            IdentType::Synchronization => write!(f, "synchronization"),
            IdentType::Bound { dn } => {
                if dn.is_null() {
                    write!(f, "anonymous")
                } else {
                    write!(f, "{dn}")
                }
            }
        }
    }
}
