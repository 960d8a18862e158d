//! Constant, system-wide strings.
//!
//! Because consistency is great!

// IF YOU CHANGE THESE VALUES YOU BREAK LDAP WIRE COMPATIBILITY
pub const OID_LDAP_ASSERTION: &str = "1.3.6.1.1.12";
pub const OID_LDAP_NOOP_OPENLDAP_ASSIGNED: &str = "1.3.6.1.4.1.4203.1.10.2";
pub const OID_LDAP_READENTRY_PREREAD: &str = "1.3.6.1.1.13.1";
pub const OID_LDAP_READENTRY_POSTREAD: &str = "1.3.6.1.1.13.2";
pub const OID_PROXIED_AUTH_V1: &str = "2.16.840.1.113730.3.4.12";
pub const OID_PROXIED_AUTH_V2: &str = "2.16.840.1.113730.3.4.18";

pub const ATTR_OBJECTCLASS: &str = "objectclass";
pub const ATTR_CN: &str = "cn";
pub const ATTR_OU: &str = "ou";
pub const ATTR_DC: &str = "dc";
pub const ATTR_SN: &str = "sn";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_CREATORS_NAME: &str = "creatorsname";
pub const ATTR_CREATE_TIMESTAMP: &str = "createtimestamp";
pub const ATTR_MODIFIERS_NAME: &str = "modifiersname";
pub const ATTR_MODIFY_TIMESTAMP: &str = "modifytimestamp";
pub const ATTR_ENTRYUUID: &str = "entryuuid";

/// All-user-attributes marker in a read-entry attribute selection.
pub const SELECTOR_ALL_USER: &str = "*";
/// All-operational-attributes marker in a read-entry attribute selection.
pub const SELECTOR_ALL_OPERATIONAL: &str = "+";

/// How many times a per-DN write lock acquisition is attempted before the
/// operation fails with the configured server error code.
pub const DN_LOCK_ATTEMPTS: usize = 3;
