//! Detail Store
//!
//! Typed dynamic property bag owned by a content node. Values are keyed by
//! name and read back with a caller-supplied default, so an absent detail is
//! an ordinary state rather than an error.
//!
//! # Default-value policy
//!
//! Content types commonly avoid persisting meaningless empty values. Under
//! [`PersistPolicy::SkipDefaults`] (the store default) setting the zero value
//! of a kind when no detail of that name exists is a no-op. Properties that
//! must always materialise a row use [`PersistPolicy::Always`].
//!
//! # Examples
//!
//! ```rust
//! use zeus_core::models::DetailStore;
//!
//! let mut details = DetailStore::new();
//! details.set("Title", String::new());
//! assert!(details.is_empty());
//! assert_eq!(details.get("Title", String::new()), "");
//!
//! details.set("Views", 42i64);
//! assert_eq!(details.get("Views", 0i64), 42);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::detail::{Detail, DetailType, DetailValue};

/// Whether an empty value is written when no detail exists yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PersistPolicy {
    /// Skip writing the zero/empty value of a kind when the detail is absent
    #[default]
    SkipDefaults,
    /// Always write the value, even when it is empty
    Always,
}

/// A named, ordered group of details (a repeated property set)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetailCollection {
    pub name: String,
    details: Vec<Detail>,
}

impl DetailCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            details: Vec::new(),
        }
    }

    /// Rebuild a collection from persisted details, keeping their order
    pub fn from_details(name: impl Into<String>, details: Vec<Detail>) -> Self {
        Self {
            name: name.into(),
            details,
        }
    }

    /// Append a detail, replacing any existing detail with the same name
    ///
    /// A replaced detail keeps its position so collection order stays stable.
    pub fn push(&mut self, detail: Detail) {
        match self.details.iter_mut().find(|d| d.name == detail.name) {
            Some(existing) => existing.value = detail.value,
            None => self.details.push(detail),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Detail> {
        self.details.iter().find(|d| d.name == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Detail> {
        let position = self.details.iter().position(|d| d.name == name)?;
        Some(self.details.remove(position))
    }

    pub fn clear(&mut self) {
        self.details.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detail> {
        self.details.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &DetailValue> {
        self.details.iter().map(|d| &d.value)
    }

    pub fn len(&self) -> usize {
        self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }
}

/// Property bag for a single content node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailStore {
    details: BTreeMap<String, DetailValue>,
    collections: BTreeMap<String, DetailCollection>,
    #[serde(skip)]
    dirty: bool,
}

// The dirty flag is bookkeeping, not content
impl PartialEq for DetailStore {
    fn eq(&self, other: &Self) -> bool {
        self.details == other.details && self.collections == other.collections
    }
}

impl DetailStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted rows; the result is clean
    pub fn from_parts(details: Vec<Detail>, collections: Vec<DetailCollection>) -> Self {
        Self {
            details: details.into_iter().map(|d| (d.name, d.value)).collect(),
            collections: collections
                .into_iter()
                .map(|c| (c.name.clone(), c))
                .collect(),
            dirty: false,
        }
    }

    /// Read a detail converted to the default's type, or the default itself
    ///
    /// A stored value of an incompatible kind also yields the default.
    pub fn get<T: DetailType>(&self, name: &str, default: T) -> T {
        self.details
            .get(name)
            .and_then(T::from_detail)
            .unwrap_or(default)
    }

    /// Raw access to a stored value
    pub fn value(&self, name: &str) -> Option<&DetailValue> {
        self.details.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.details.contains_key(name)
    }

    /// Upsert a detail under [`PersistPolicy::SkipDefaults`]
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<DetailValue>) {
        self.set_with_policy(name, value, PersistPolicy::SkipDefaults);
    }

    /// Upsert a detail under an explicit policy
    ///
    /// Returns `true` when the store changed.
    pub fn set_with_policy(
        &mut self,
        name: impl Into<String>,
        value: impl Into<DetailValue>,
        policy: PersistPolicy,
    ) -> bool {
        let name = name.into();
        let value = value.into();

        match self.details.get_mut(&name) {
            Some(existing) => {
                if *existing == value {
                    return false;
                }
                *existing = value;
            }
            None => {
                if policy == PersistPolicy::SkipDefaults && value.is_empty_value() {
                    return false;
                }
                self.details.insert(name, value);
            }
        }

        self.dirty = true;
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<DetailValue> {
        let removed = self.details.remove(name);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn collection(&self, name: &str) -> Option<&DetailCollection> {
        self.collections.get(name)
    }

    /// Mutable access to a collection, creating it when asked to
    ///
    /// The store is marked dirty whenever a collection is handed out for
    /// mutation, since changes through the reference are not observable here.
    pub fn collection_mut(
        &mut self,
        name: &str,
        create_if_missing: bool,
    ) -> Option<&mut DetailCollection> {
        if !self.collections.contains_key(name) {
            if !create_if_missing {
                return None;
            }
            self.collections
                .insert(name.to_string(), DetailCollection::new(name));
        }
        self.dirty = true;
        self.collections.get_mut(name)
    }

    pub fn remove_collection(&mut self, name: &str) -> Option<DetailCollection> {
        let removed = self.collections.remove(name);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Details in name order
    pub fn details(&self) -> impl Iterator<Item = Detail> + '_ {
        self.details.iter().map(|(name, value)| Detail {
            name: name.clone(),
            value: value.clone(),
        })
    }

    /// Collections in name order
    pub fn collections(&self) -> impl Iterator<Item = &DetailCollection> {
        self.collections.values()
    }

    pub fn len(&self) -> usize {
        self.details.len()
    }

    /// True when the store holds neither details nor collections
    pub fn is_empty(&self) -> bool {
        self.details.is_empty() && self.collections.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
