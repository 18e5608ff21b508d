//! Namespaced attribute storage
//!
//! Attribute views (basic, owner, posix, dos, acl, user, ...) live outside
//! this crate. Each one stores its state here under its own view name, and the
//! table never interprets the values it holds.

use alloc::{
    collections::{BTreeMap, BTreeSet},
    format,
    string::{String, ToString},
    vec::Vec,
};

use serde::{Deserialize, Serialize};

use crate::time::TimeSpec;

/// A value stored by an attribute view.
///
/// `Null` is a real stored value. An attribute that was never set is
/// reported as `None` by lookups, not as `Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Time(TimeSpec),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<AttrValue>),
}

impl AttrValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            AttrValue::Uint(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<TimeSpec> {
        match self {
            AttrValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AttrValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(l) => Some(l),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        AttrValue::Uint(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Uint(value as u64)
    }
}

impl From<TimeSpec> for AttrValue {
    fn from(value: TimeSpec) -> Self {
        AttrValue::Time(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<Vec<u8>> for AttrValue {
    fn from(value: Vec<u8>) -> Self {
        AttrValue::Bytes(value)
    }
}

impl From<Vec<AttrValue>> for AttrValue {
    fn from(value: Vec<AttrValue>) -> Self {
        AttrValue::List(value)
    }
}

/// Two-level table of view name -> attribute name -> value.
///
/// A view with no attributes left is dropped from the table, so
/// [`AttributeTable::views`] only reports views that hold something.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AttributeTable {
    views: BTreeMap<String, BTreeMap<String, AttrValue>>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, view: &str, name: &str) -> Option<&AttrValue> {
        self.views.get(view)?.get(name)
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn set(&mut self, view: &str, name: &str, value: AttrValue) -> Option<AttrValue> {
        self.views
            .entry(view.to_string())
            .or_default()
            .insert(name.to_string(), value)
    }

    /// Removes a value, returning it if it was present.
    pub fn remove(&mut self, view: &str, name: &str) -> Option<AttrValue> {
        let row = self.views.get_mut(view)?;
        let removed = row.remove(name);
        if row.is_empty() {
            self.views.remove(view);
        }
        removed
    }

    /// Names of the attributes stored under `view`.
    pub fn names(&self, view: &str) -> BTreeSet<String> {
        self.views
            .get(view)
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn views(&self) -> BTreeSet<String> {
        self.views.keys().cloned().collect()
    }

    /// Every key in the table, formatted as `view:name`.
    pub fn keys(&self) -> BTreeSet<String> {
        self.iter()
            .map(|(view, name, _)| format!("{}:{}", view, name))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &AttrValue)> {
        self.views.iter().flat_map(|(view, row)| {
            row.iter()
                .map(move |(name, value)| (view.as_str(), name.as_str(), value))
        })
    }

    /// Copies every entry of `other` into this table.
    ///
    /// Entries present in both are overwritten by `other`; entries only in
    /// this table are kept.
    pub fn merge_from(&mut self, other: &AttributeTable) {
        for (view, row) in &other.views {
            let dst = self.views.entry(view.clone()).or_default();
            for (name, value) in row {
                dst.insert(name.clone(), value.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.views.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
