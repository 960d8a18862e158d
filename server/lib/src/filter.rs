//! Search filters, as consumed by the assertion control. The write path only
//! ever evaluates a filter against a single candidate entry, so this stays a
//! simple recursive matcher - indexing and resolution against the database
//! belong to the search path, which is not part of this core.

use crate::entry::Entry;
use crate::error::DirectoryError;
use crate::prelude::*;
use crate::utils::value_fold;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringFilter {
    pub initial: Option<String>,
    pub any: Vec<String>,
    pub final_part: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    Eq(AttrString, String),
    Pres(AttrString),
    Sub(AttrString, SubstringFilter),
    And(Vec<SearchFilter>),
    Or(Vec<SearchFilter>),
    Not(Box<SearchFilter>),
}

pub fn f_eq(attr: &str, value: &str) -> SearchFilter {
    SearchFilter::Eq(AttrString::from(attr), value.to_string())
}

pub fn f_pres(attr: &str) -> SearchFilter {
    SearchFilter::Pres(AttrString::from(attr))
}

pub fn f_sub(attr: &str, sub: SubstringFilter) -> SearchFilter {
    SearchFilter::Sub(AttrString::from(attr), sub)
}

pub fn f_and(subs: Vec<SearchFilter>) -> SearchFilter {
    SearchFilter::And(subs)
}

pub fn f_or(subs: Vec<SearchFilter>) -> SearchFilter {
    SearchFilter::Or(subs)
}

pub fn f_andnot(f: SearchFilter) -> SearchFilter {
    SearchFilter::Not(Box::new(f))
}

impl SearchFilter {
    /// Evaluate this filter against a single entry. A malformed component -
    /// a substring assertion with no parts - is an evaluation error so the
    /// caller can report a protocol problem rather than a silent non-match.
    pub fn matches_entry(&self, entry: &Entry) -> Result<bool, DirectoryError> {
        match self {
            SearchFilter::Eq(attr, value) => Ok(entry.has_attribute_value(attr, value)),
            SearchFilter::Pres(attr) => Ok(entry.has_attribute(attr)),
            SearchFilter::Sub(attr, sub) => {
                if sub.initial.is_none() && sub.any.is_empty() && sub.final_part.is_none() {
                    return Err(DirectoryError::new(
                        ResultCode::ProtocolError,
                        format!("substring assertion for {attr} has no components"),
                    ));
                }
                Ok(entry
                    .attributes_named(attr)
                    .flat_map(|a| a.values().iter())
                    .any(|v| sub.matches(v)))
            }
            SearchFilter::And(subs) => {
                for f in subs {
                    if !f.matches_entry(entry)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            SearchFilter::Or(subs) => {
                for f in subs {
                    if f.matches_entry(entry)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            SearchFilter::Not(f) => f.matches_entry(entry).map(|r| !r),
        }
    }
}

impl SubstringFilter {
    fn matches(&self, value: &str) -> bool {
        let folded = value_fold(value);
        let mut pos = 0;
        if let Some(initial) = &self.initial {
            let initial = value_fold(initial);
            if !folded.starts_with(&initial) {
                return false;
            }
            pos = initial.len();
        }
        for any in &self.any {
            let any = value_fold(any);
            match folded[pos..].find(&any) {
                Some(at) => pos += at + any.len(),
                None => return false,
            }
        }
        if let Some(final_part) = &self.final_part {
            let final_part = value_fold(final_part);
            return folded.len() >= pos + final_part.len() && folded.ends_with(&final_part);
        }
        true
    }
}
