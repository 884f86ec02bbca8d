//! Inbound shapes for nested tag/ingredient collections.
//!
//! A relation field in a write payload has three states that must stay
//! distinct: absent, present and empty, present with items. [`RelationUpdate`]
//! keeps "absent" apart from "empty" and [`RelationUpdate::resolve`] applies
//! the write mode on top.

use serde::{Deserialize, Deserializer};

use crate::error::{CoreError, Result};
use crate::model::check_length;

/// Natural-key attributes identifying a tag or ingredient within an owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ChildDescriptor {
    pub name: String,
}

impl ChildDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the trimmed natural key, or an error if it is unusable.
    pub fn natural_key(&self) -> Result<&str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CoreError::invalid_field("name", "This field may not be blank."));
        }
        check_length("name", name)?;
        Ok(name)
    }
}

/// How a write treats fields missing from its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Only supplied fields are touched (PATCH).
    Partial,
    /// Every field is replaced; missing relations mean "empty" (PUT).
    Full,
}

/// A relation field as it arrived in a payload.
///
/// Use with `#[serde(default)]` so a missing key becomes `Unchanged`. A JSON
/// `null` is rejected rather than read as either state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationUpdate<T> {
    /// The key was not in the payload.
    Unchanged,
    /// The key was present; the list may be empty.
    Replace(Vec<T>),
}

impl<T> Default for RelationUpdate<T> {
    fn default() -> Self {
        Self::Unchanged
    }
}

impl<T> RelationUpdate<T> {
    /// Items to install under `mode`, or `None` to leave the relation alone.
    ///
    /// `Some` always means clear first; an empty slice clears without
    /// reconciling anything.
    pub fn resolve(&self, mode: WriteMode) -> Option<&[T]> {
        match (self, mode) {
            (Self::Replace(items), _) => Some(items.as_slice()),
            (Self::Unchanged, WriteMode::Full) => Some(&[][..]),
            (Self::Unchanged, WriteMode::Partial) => None,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

impl<'de, T> Deserialize<'de> for RelationUpdate<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<T>::deserialize(deserializer).map(Self::Replace)
    }
}

/// Deserializes an optional field that may be omitted but not sent as `null`.
///
/// Pair with `#[serde(default)]`.
pub fn non_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
