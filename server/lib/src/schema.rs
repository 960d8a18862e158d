//! The schema is the metadata of attribute types and object classes the
//! server enforces on write. The gate here is deliberately narrow: object
//! class presence and validity, must-attribute coverage and single-value
//! constraints. Syntax checking of individual values is the concern of the
//! attribute syntax validators, which sit outside this core.

use std::collections::BTreeMap;

use crate::entry::Entry;
use crate::prelude::*;
use crate::utils::value_fold;

/// Metadata for one attribute type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaAttribute {
    pub name: AttrString,
    pub oid: Option<String>,
    pub description: String,
    pub multivalue: bool,
    pub operational: bool,
    pub no_user_modification: bool,
    pub obsolete: bool,
}

impl SchemaAttribute {
    pub fn user(name: &str, multivalue: bool) -> Self {
        SchemaAttribute {
            name: AttrString::from(name),
            oid: None,
            description: String::new(),
            multivalue,
            operational: false,
            no_user_modification: false,
            obsolete: false,
        }
    }

    pub fn operational(name: &str) -> Self {
        SchemaAttribute {
            name: AttrString::from(name),
            oid: None,
            description: String::new(),
            multivalue: false,
            operational: true,
            no_user_modification: true,
            obsolete: false,
        }
    }

    /// The permissive fallback for attribute types the schema does not know.
    /// Value syntax enforcement for these is delegated outward, the core only
    /// needs something to hang the modification flags from.
    pub fn default_type(name: &str) -> Self {
        SchemaAttribute::user(name, true)
    }

    pub fn name_or_oid(&self) -> &str {
        match &self.oid {
            Some(oid) => oid,
            None => &self.name,
        }
    }
}

/// Metadata for one object class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaClass {
    pub name: AttrString,
    pub description: String,
    pub systemmust: Vec<AttrString>,
    pub systemmay: Vec<AttrString>,
}

impl SchemaClass {
    pub fn new(name: &str, systemmust: &[&str], systemmay: &[&str]) -> Self {
        SchemaClass {
            name: AttrString::from(name),
            description: String::new(),
            systemmust: systemmust.iter().map(|a| AttrString::from(*a)).collect(),
            systemmay: systemmay.iter().map(|a| AttrString::from(*a)).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    attributes: BTreeMap<AttrString, SchemaAttribute>,
    classes: BTreeMap<AttrString, SchemaClass>,
}

impl Schema {
    pub fn new() -> Self {
        Schema {
            attributes: BTreeMap::new(),
            classes: BTreeMap::new(),
        }
    }

    /// The built in core schema - enough for the standard naming attributes
    /// and the operational attributes the server stamps.
    pub fn core() -> Self {
        let mut schema = Schema::new();
        for a in [
            SchemaAttribute::user(ATTR_OBJECTCLASS, true),
            SchemaAttribute::user(ATTR_CN, true),
            SchemaAttribute::user(ATTR_SN, true),
            SchemaAttribute::user(ATTR_OU, true),
            SchemaAttribute::user(ATTR_DC, false),
            SchemaAttribute::user("uid", true),
            SchemaAttribute::user("mail", true),
            SchemaAttribute::user(ATTR_DESCRIPTION, true),
            SchemaAttribute::user("displayname", false),
            SchemaAttribute::user("telephonenumber", true),
            SchemaAttribute::user("uidnumber", false),
            SchemaAttribute::operational(ATTR_CREATORS_NAME),
            SchemaAttribute::operational(ATTR_CREATE_TIMESTAMP),
            SchemaAttribute::operational(ATTR_MODIFIERS_NAME),
            SchemaAttribute::operational(ATTR_MODIFY_TIMESTAMP),
            SchemaAttribute::operational(ATTR_ENTRYUUID),
        ] {
            schema.upsert_attribute(a);
        }
        for c in [
            SchemaClass::new("top", &[ATTR_OBJECTCLASS], &[]),
            SchemaClass::new(
                "person",
                &[ATTR_CN, ATTR_SN],
                &[ATTR_DESCRIPTION, "telephonenumber"],
            ),
            SchemaClass::new(
                "inetorgperson",
                &[ATTR_CN, ATTR_SN],
                &["uid", "mail", "displayname", ATTR_DESCRIPTION],
            ),
            SchemaClass::new("organizationalunit", &[ATTR_OU], &[ATTR_DESCRIPTION]),
            SchemaClass::new("domain", &[ATTR_DC], &[ATTR_DESCRIPTION]),
            SchemaClass::new("device", &[ATTR_CN], &[ATTR_DESCRIPTION]),
        ] {
            schema.upsert_class(c);
        }
        schema
    }

    pub fn upsert_attribute(&mut self, a: SchemaAttribute) {
        self.attributes.insert(AttrString::from(value_fold(&a.name)), a);
    }

    pub fn upsert_class(&mut self, c: SchemaClass) {
        self.classes.insert(AttrString::from(value_fold(&c.name)), c);
    }

    pub fn get_attribute(&self, name: &str) -> Option<&SchemaAttribute> {
        self.attributes.get(value_fold(name).as_str())
    }

    pub fn get_class(&self, name: &str) -> Option<&SchemaClass> {
        self.classes.get(value_fold(name).as_str())
    }

    /// Resolve an attribute type, falling back to the permissive default for
    /// unknown names.
    pub fn attribute_type(&self, name: &str) -> SchemaAttribute {
        self.get_attribute(name)
            .cloned()
            .unwrap_or_else(|| SchemaAttribute::default_type(name))
    }

    pub fn is_operational(&self, name: &str) -> bool {
        self.get_attribute(name).map(|a| a.operational).unwrap_or(false)
    }

    /// Does the candidate entry conform? Checks class presence and validity,
    /// must-attribute coverage across its classes, and single value
    /// constraints for known attribute types.
    pub fn validate_entry(&self, entry: &Entry) -> Result<(), SchemaError> {
        let classes = entry.object_classes();
        if classes.is_empty() {
            return Err(SchemaError::NoClassFound);
        }

        let unknown: Vec<String> = classes
            .iter()
            .filter(|c| self.get_class(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !unknown.is_empty() {
            return Err(SchemaError::InvalidClass(unknown));
        }

        for a in entry.attributes() {
            if a.is_empty() {
                return Err(SchemaError::EmptyValueSet(a.name().to_string()));
            }
            if let Some(sa) = self.get_attribute(a.description().attr()) {
                if !sa.multivalue && a.values().len() > 1 {
                    return Err(SchemaError::SingleValueConstraint(a.name().to_string()));
                }
            }
        }

        let missing: Vec<String> = classes
            .iter()
            .filter_map(|c| self.get_class(c))
            .flat_map(|c| c.systemmust.iter())
            .filter(|must| !entry.has_attribute(must))
            .map(|must| must.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingMustAttribute(missing));
        }

        Ok(())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Schema::core()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_entry_conformant() {
        let schema = Schema::core();
        let e = entry_init!(
            "cn=alice,ou=people,dc=ex,dc=com",
            (ATTR_OBJECTCLASS, "top", "person"),
            ("cn", "alice"),
            ("sn", "a")
        );
        assert_eq!(schema.validate_entry(&e), Ok(()));
    }

    #[test]
    fn test_validate_entry_no_class() {
        let schema = Schema::core();
        let e = entry_init!("cn=alice,ou=people,dc=ex,dc=com", ("cn", "alice"));
        assert_eq!(schema.validate_entry(&e), Err(SchemaError::NoClassFound));
    }

    #[test]
    fn test_validate_entry_unknown_class() {
        let schema = Schema::core();
        let e = entry_init!(
            "cn=alice,ou=people,dc=ex,dc=com",
            (ATTR_OBJECTCLASS, "top", "starfleet"),
            ("cn", "alice"),
            ("sn", "a")
        );
        assert_eq!(
            schema.validate_entry(&e),
            Err(SchemaError::InvalidClass(vec!["starfleet".to_string()]))
        );
    }

    #[test]
    fn test_validate_entry_missing_must() {
        let schema = Schema::core();
        let e = entry_init!(
            "cn=alice,ou=people,dc=ex,dc=com",
            (ATTR_OBJECTCLASS, "top", "person"),
            ("cn", "alice")
        );
        assert_eq!(
            schema.validate_entry(&e),
            Err(SchemaError::MissingMustAttribute(vec!["sn".to_string()]))
        );
    }

    #[test]
    fn test_validate_entry_single_value() {
        let schema = Schema::core();
        let e = entry_init!(
            "dc=ex,dc=com",
            (ATTR_OBJECTCLASS, "top", "domain"),
            (ATTR_DC, "ex", "other")
        );
        assert_eq!(
            schema.validate_entry(&e),
            Err(SchemaError::SingleValueConstraint("dc".to_string()))
        );
    }

    #[test]
    fn test_attribute_type_fallback() {
        let schema = Schema::core();
        let t = schema.attribute_type("x-custom-thing");
        assert!(t.multivalue);
        assert!(!t.no_user_modification);
        assert!(!t.obsolete);
        assert!(schema.is_operational(ATTR_MODIFY_TIMESTAMP));
        assert!(!schema.is_operational("cn"));
    }
}
