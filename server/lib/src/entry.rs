//! Entries are the unit of storage the server core manipulates. An [`Entry`]
//! is a DN plus a collection of attribute-value sets. Values are held in
//! insertion order with set semantics - adding a value that is already
//! present is not an error, the duplicate is reported back through the
//! caller's scratch list, mirroring how the write path accounts for
//! modifications that turn out to be no-ops.
//!
//! Attribute identity is the normalised base name plus the (possibly empty)
//! set of attribute options. Whether an attribute is user or operational is
//! not a property of the entry - that is resolved through the [`crate::schema`]
//! module at the point of use.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::dn::Dn;
use crate::prelude::*;
use crate::utils::{value_eq_fold, value_fold};

/// Normalised attribute identity - base type name plus options, as in
/// `cn` or `description;lang-en`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttributeDescription {
    attr: AttrString,
    options: BTreeSet<AttrString>,
}

impl AttributeDescription {
    /// Parse a description from its string form. Options follow the base
    /// name, separated with `;`.
    pub fn new(name: &str) -> Self {
        let mut parts = name.split(';');
        let base = parts.next().unwrap_or("");
        AttributeDescription {
            attr: AttrString::from(value_fold(base)),
            options: parts
                .filter(|o| !o.is_empty())
                .map(|o| AttrString::from(value_fold(o)))
                .collect(),
        }
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }

    pub fn options(&self) -> &BTreeSet<AttrString> {
        &self.options
    }
}

impl fmt::Display for AttributeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.attr)?;
        for o in &self.options {
            write!(f, ";{o}")?;
        }
        Ok(())
    }
}

/// An attribute: a name (with options, as presented), its normalised
/// description, and an ordered set of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: AttrString,
    desc: AttributeDescription,
    values: Vec<String>,
}

impl Attribute {
    /// Build an attribute. `name` may carry options (`cn;x-archive`).
    /// Duplicate values in the input are collapsed.
    pub fn new(name: &str, values: Vec<String>) -> Self {
        let mut a = Attribute {
            name: AttrString::from(name),
            desc: AttributeDescription::new(name),
            values: Vec::with_capacity(values.len()),
        };
        for v in values {
            if !a.contains_value(&v) {
                a.values.push(v);
            }
        }
        a
    }

    pub fn single(name: &str, value: &str) -> Self {
        Attribute::new(name, vec![value.to_string()])
    }

    /// The attribute name as presented, including options.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &AttributeDescription {
        &self.desc
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| value_eq_fold(v, value))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.name, self.values)
    }
}

/// A DN plus attribute-value sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    dn: Dn,
    attrs: BTreeMap<AttributeDescription, Attribute>,
}

impl Entry {
    pub fn new(dn: Dn) -> Self {
        Entry {
            dn,
            attrs: BTreeMap::new(),
        }
    }

    pub fn dn(&self) -> &Dn {
        &self.dn
    }

    pub fn set_dn(&mut self, dn: Dn) {
        self.dn = dn;
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.values()
    }

    pub fn attribute_count(&self) -> usize {
        self.attrs.len()
    }

    pub fn get_attribute(&self, desc: &AttributeDescription) -> Option<&Attribute> {
        self.attrs.get(desc)
    }

    /// All attributes whose base type matches `attr`, across every options
    /// variant.
    pub fn attributes_named<'a>(&'a self, attr: &str) -> impl Iterator<Item = &'a Attribute> {
        let folded = value_fold(attr);
        self.attrs
            .values()
            .filter(move |a| a.desc.attr() == folded)
    }

    pub fn has_attribute(&self, attr: &str) -> bool {
        self.attributes_named(attr).next().is_some()
    }

    pub fn has_attribute_value(&self, attr: &str, value: &str) -> bool {
        self.attributes_named(attr).any(|a| a.contains_value(value))
    }

    /// Merge `a` into the entry. Values already present are not added again;
    /// they are pushed onto `duplicate_values` so the caller can tell whether
    /// the addition changed anything.
    pub fn add_attribute(&mut self, a: Attribute, duplicate_values: &mut Vec<String>) {
        match self.attrs.get_mut(&a.desc) {
            Some(existing) => {
                for v in a.values {
                    if existing.contains_value(&v) {
                        duplicate_values.push(v);
                    } else {
                        existing.values.push(v);
                    }
                }
            }
            None => {
                self.attrs.insert(a.desc.clone(), a);
            }
        }
    }

    /// Remove the values of `a` from the entry. Values that were not present
    /// are pushed onto `missing_values`. An attribute left with no values is
    /// dropped from the entry. If `a` itself carries no values the whole
    /// attribute is removed.
    pub fn remove_attribute(&mut self, a: &Attribute, missing_values: &mut Vec<String>) {
        let Some(existing) = self.attrs.get_mut(&a.desc) else {
            missing_values.extend(a.values.iter().cloned());
            return;
        };
        if a.values.is_empty() {
            self.attrs.remove(&a.desc);
            return;
        }
        for v in &a.values {
            let before = existing.values.len();
            existing.values.retain(|ev| !value_eq_fold(ev, v));
            if existing.values.len() == before {
                missing_values.push(v.clone());
            }
        }
        if existing.values.is_empty() {
            self.attrs.remove(&a.desc);
        }
    }

    /// Remove every options variant of the attribute type `attr`.
    pub fn remove_attribute_type(&mut self, attr: &str) {
        let folded = value_fold(attr);
        self.attrs.retain(|d, _| d.attr() != folded);
    }

    /// Remove exactly the attribute with this description.
    pub fn remove_by_description(&mut self, desc: &AttributeDescription) -> Option<Attribute> {
        self.attrs.remove(desc)
    }

    /// Replace the attribute with this description wholesale.
    pub fn put_attribute(&mut self, a: Attribute) {
        self.attrs.insert(a.desc.clone(), a);
    }

    pub fn retain_attributes<F>(&mut self, mut f: F)
    where
        F: FnMut(&Attribute) -> bool,
    {
        self.attrs.retain(|_, a| f(a));
    }

    pub fn object_classes(&self) -> Vec<&str> {
        self.attributes_named(ATTR_OBJECTCLASS)
            .flat_map(|a| a.values().iter().map(|v| v.as_str()))
            .collect()
    }
}
