//! Distinguished names and their components. A [`Dn`] is an ordered sequence
//! of [`Rdn`]s stored leaf first - index zero is the leftmost naming
//! component. Attribute type names are normalised (case folded) at parse
//! time, values are matched with the caseIgnore rule.
//!
//! Full RFC 4514 escaping belongs to the DN codec in the front end; the
//! parser here understands backslash escaped separators, which is enough for
//! server-internal construction, and preserves escape sequences verbatim so
//! the canonical form round-trips.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::DirectoryError;
use crate::prelude::*;
use crate::utils::value_fold;

/// A single attribute-value assertion within an RDN.
#[derive(Debug, Clone)]
pub struct Ava {
    // Normalised (case folded) attribute type name.
    attr: AttrString,
    // The attribute name as presented by the client.
    name: AttrString,
    value: String,
    norm_value: String,
}

impl Ava {
    pub fn new(name: &str, value: &str) -> Result<Self, DirectoryError> {
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            return Err(DirectoryError::new(
                ResultCode::InvalidDnSyntax,
                format!("invalid attribute value assertion \"{name}={value}\""),
            ));
        }
        Ok(Ava {
            attr: AttrString::from(value_fold(name)),
            name: AttrString::from(name),
            value: value.to_string(),
            norm_value: value_fold(value),
        })
    }

    /// The normalised attribute type name.
    pub fn attr(&self) -> &str {
        &self.attr
    }

    /// The attribute name as presented.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl PartialEq for Ava {
    fn eq(&self, other: &Self) -> bool {
        self.attr == other.attr && self.norm_value == other.norm_value
    }
}

impl Eq for Ava {}

impl PartialOrd for Ava {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ava {
    fn cmp(&self, other: &Self) -> Ordering {
        self.attr
            .cmp(&other.attr)
            .then_with(|| self.norm_value.cmp(&other.norm_value))
    }
}

impl Hash for Ava {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attr.hash(state);
        self.norm_value.hash(state);
    }
}

impl fmt::Display for Ava {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// A relative distinguished name - a non empty set of AVAs. Multi valued
/// RDNs are joined with `+` in the string form and compared as a set.
#[derive(Debug, Clone)]
pub struct Rdn {
    avas: Vec<Ava>,
}

impl Rdn {
    pub fn new(avas: Vec<Ava>) -> Result<Self, DirectoryError> {
        if avas.is_empty() {
            return Err(DirectoryError::new(
                ResultCode::InvalidDnSyntax,
                "an RDN requires at least one attribute value assertion".to_string(),
            ));
        }
        Ok(Rdn { avas })
    }

    pub fn from_ava(name: &str, value: &str) -> Result<Self, DirectoryError> {
        Ok(Rdn {
            avas: vec![Ava::new(name, value)?],
        })
    }

    pub fn num_values(&self) -> usize {
        self.avas.len()
    }

    pub fn avas(&self) -> &[Ava] {
        &self.avas
    }

    fn normalized(&self) -> Vec<&Ava> {
        let mut v: Vec<&Ava> = self.avas.iter().collect();
        v.sort();
        v
    }
}

impl PartialEq for Rdn {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Rdn {}

impl PartialOrd for Rdn {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rdn {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized().cmp(&other.normalized())
    }
}

impl Hash for Rdn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for ava in self.normalized() {
            ava.hash(state);
        }
    }
}

impl FromStr for Rdn {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let avas = split_unescaped(s, '+')
            .iter()
            .map(|part| {
                let (name, value) = split_first_unescaped(part, '=').ok_or_else(|| {
                    DirectoryError::new(
                        ResultCode::InvalidDnSyntax,
                        format!("the RDN component \"{part}\" has no attribute value"),
                    )
                })?;
                Ava::new(name, value)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Rdn::new(avas)
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for ava in &self.avas {
            if !first {
                write!(f, "+")?;
            }
            first = false;
            write!(f, "{ava}")?;
        }
        Ok(())
    }
}

/// A distinguished name. RDNs are stored leaf first: `rdns()[0]` is the
/// leftmost component of the string form. The empty sequence is the null DN.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dn {
    rdns: Vec<Rdn>,
}

impl Dn {
    pub fn null() -> Self {
        Dn { rdns: Vec::new() }
    }

    pub fn new(rdns: Vec<Rdn>) -> Self {
        Dn { rdns }
    }

    pub fn is_null(&self) -> bool {
        self.rdns.is_empty()
    }

    /// The leaf (leftmost) RDN, if any.
    pub fn rdn(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    pub fn depth(&self) -> usize {
        self.rdns.len()
    }

    /// The immediate superior of this DN - the null DN has no parent. The
    /// parent of a single-RDN name is the null DN.
    pub fn parent(&self) -> Option<Dn> {
        if self.rdns.is_empty() {
            None
        } else {
            Some(Dn {
                rdns: self.rdns[1..].to_vec(),
            })
        }
    }

    /// Treat `self` as a parent and produce the subordinate name `rdn,self`.
    pub fn concat(&self, rdn: Rdn) -> Dn {
        let mut rdns = Vec::with_capacity(self.rdns.len() + 1);
        rdns.push(rdn);
        rdns.extend(self.rdns.iter().cloned());
        Dn { rdns }
    }

    /// True when `suffix` names this entry or one of its ancestors. The null
    /// DN is a suffix of everything.
    pub fn ends_with(&self, suffix: &Dn) -> bool {
        if suffix.rdns.len() > self.rdns.len() {
            return false;
        }
        let skip = self.rdns.len() - suffix.rdns.len();
        self.rdns[skip..] == suffix.rdns[..]
    }
}

impl FromStr for Dn {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Dn::null());
        }
        let rdns = split_unescaped(s, ',')
            .iter()
            .map(|part| Rdn::from_str(part))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dn { rdns })
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for rdn in &self.rdns {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            write!(f, "{rdn}")?;
        }
        Ok(())
    }
}

fn split_unescaped(s: &str, sep: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            current.push(c);
            escaped = true;
        } else if c == sep {
            out.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    out.push(current);
    out
}

fn split_first_unescaped(s: &str, sep: char) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == sep {
            return Some((&s[..i], &s[i + c.len_utf8()..]));
        }
    }
    None
}
