//! Typed request and response controls. The wire codec lives in the front
//! end; by the time a control reaches this core it is either one of the
//! typed forms below or an [`UnknownControl`] carrying the raw payload. The
//! pipeline dispatches on the type, and `Unknown` carrying a recognized OID
//! means upstream decoding failed - the only recognized control accepted in
//! raw form is no-op, which carries no payload.

use std::collections::BTreeSet;

use crate::entry::Entry;
use crate::filter::SearchFilter;
use crate::prelude::*;
use crate::schema::Schema;
use crate::utils::value_fold;

/// A control this core has no typed decoding for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownControl {
    pub oid: String,
    pub critical: bool,
    pub payload: Vec<u8>,
}

/// RFC 4528 assertion: the operation proceeds only if the filter matches the
/// current entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionRequestControl {
    pub critical: bool,
    pub filter: SearchFilter,
}

/// RFC 4527 read-entry request, shared by pre-read and post-read. The
/// attribute selection uses the search-style markers: an empty selection or
/// `*` returns all user attributes, `+` returns all operational attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadEntryRequestControl {
    pub critical: bool,
    pub attributes: BTreeSet<AttrString>,
}

impl ReadEntryRequestControl {
    pub fn all() -> Self {
        ReadEntryRequestControl::default()
    }

    pub fn with_attributes<'a>(attrs: impl IntoIterator<Item = &'a str>) -> Self {
        ReadEntryRequestControl {
            critical: false,
            attributes: attrs
                .into_iter()
                .map(|a| AttrString::from(value_fold(a)))
                .collect(),
        }
    }

    pub fn returns_all_user_attributes(&self) -> bool {
        self.attributes.is_empty() || self.attributes.contains(SELECTOR_ALL_USER)
    }

    pub fn returns_all_operational_attributes(&self) -> bool {
        self.attributes.contains(SELECTOR_ALL_OPERATIONAL)
    }

    /// Is this attribute named by the selection? An empty selection admits
    /// everything. The `*` and `+` markers are handled by the all-user /
    /// all-operational sweeps, not here.
    pub fn allows_attribute(&self, name: &str) -> bool {
        self.attributes.is_empty() || self.attributes.contains(value_fold(name).as_str())
    }
}

/// Proxied authorization (v1 and v2 share the decoded shape). The
/// authorization entry is resolved by the front end; `None` is an anonymous
/// authorization identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxiedAuthControl {
    pub critical: bool,
    pub authorization_entry: Option<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Assertion(AssertionRequestControl),
    NoOp { critical: bool },
    PreRead(ReadEntryRequestControl),
    PostRead(ReadEntryRequestControl),
    ProxiedAuthV1(ProxiedAuthControl),
    ProxiedAuthV2(ProxiedAuthControl),
    Unknown(UnknownControl),
}

impl Control {
    pub fn oid(&self) -> &str {
        match self {
            Control::Assertion(_) => OID_LDAP_ASSERTION,
            Control::NoOp { .. } => OID_LDAP_NOOP_OPENLDAP_ASSIGNED,
            Control::PreRead(_) => OID_LDAP_READENTRY_PREREAD,
            Control::PostRead(_) => OID_LDAP_READENTRY_POSTREAD,
            Control::ProxiedAuthV1(_) => OID_PROXIED_AUTH_V1,
            Control::ProxiedAuthV2(_) => OID_PROXIED_AUTH_V2,
            Control::Unknown(u) => &u.oid,
        }
    }

    pub fn is_critical(&self) -> bool {
        match self {
            Control::Assertion(c) => c.critical,
            Control::NoOp { critical } => *critical,
            Control::PreRead(c) => c.critical,
            Control::PostRead(c) => c.critical,
            // V2 is critical by definition on the wire.
            Control::ProxiedAuthV1(c) => c.critical,
            Control::ProxiedAuthV2(_) => true,
            Control::Unknown(u) => u.critical,
        }
    }
}

/// Is this one of the OIDs the pipeline has a typed decoding for?
pub fn is_recognized_oid(oid: &str) -> bool {
    matches!(
        oid,
        OID_LDAP_ASSERTION
            | OID_LDAP_NOOP_OPENLDAP_ASSIGNED
            | OID_LDAP_READENTRY_PREREAD
            | OID_LDAP_READENTRY_POSTREAD
            | OID_PROXIED_AUTH_V1
            | OID_PROXIED_AUTH_V2
    )
}

/// RFC 4527 read-entry response - the filtered image of the entry before or
/// after the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadEntryResponseControl {
    pub critical: bool,
    pub entry: Entry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseControl {
    PreRead(ReadEntryResponseControl),
    PostRead(ReadEntryResponseControl),
}

impl ResponseControl {
    pub fn oid(&self) -> &str {
        match self {
            ResponseControl::PreRead(_) => OID_LDAP_READENTRY_PREREAD,
            ResponseControl::PostRead(_) => OID_LDAP_READENTRY_POSTREAD,
        }
    }
}

/// Produce the read-entry image: a copy of `entry` reduced to the attributes
/// the request selects, honouring the object class inclusion, the
/// all-user-attributes and the all-operational-attributes markers.
pub fn filter_read_entry(
    entry: &Entry,
    schema: &Schema,
    req: &ReadEntryRequestControl,
) -> Entry {
    let mut image = entry.clone();

    if !req.allows_attribute(ATTR_OBJECTCLASS) {
        image.remove_attribute_type(ATTR_OBJECTCLASS);
    }

    if !req.returns_all_user_attributes() {
        image.retain_attributes(|a| {
            let name = a.description().attr();
            name == ATTR_OBJECTCLASS
                || schema.is_operational(name)
                || req.allows_attribute(name)
        });
    }

    if !req.returns_all_operational_attributes() {
        image.retain_attributes(|a| {
            let name = a.description().attr();
            !schema.is_operational(name) || req.allows_attribute(name)
        });
    }

    image
}
